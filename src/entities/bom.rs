//! Bills of materials and production orders

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::workbook::{Cell, Sheet};
use crate::entities::{find_column, number_at, parse_datetime, text_at, SchemaError};

/// One BOM line: how much of a raw component each produced unit consumes.
///
/// The aliases accept the legacy field names the workbook-era orders used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BomLine {
    #[serde(alias = "mp_id", alias = "component_id")]
    pub component: String,

    #[serde(alias = "qty_per_product")]
    pub qty_per_unit: f64,
}

/// One logged production order. The BOM is carried as opaque JSON text:
/// it is validated when the order is created, never re-interpreted after.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionOrder {
    pub id: i64,
    pub product: String,
    pub quantity: f64,
    pub bom: String,
    pub created_at: DateTime<Utc>,
}

impl ProductionOrder {
    pub const COLUMNS: [&'static str; 5] = ["Id", "Product", "Quantity", "BOM", "Created At"];

    pub fn from_sheet(sheet_name: &str, sheet: &Sheet) -> Result<Vec<ProductionOrder>, SchemaError> {
        let id = find_column(sheet, &["id"]);
        let product = find_column(sheet, &["product", "produto"]);
        let quantity = find_column(sheet, &["quantity", "qty", "qtd"]);
        let bom = find_column(sheet, &["bom"]);
        let created = find_column(sheet, &["created at", "created", "data"]);

        let mut orders = Vec::with_capacity(sheet.len());
        for row in 0..sheet.len() {
            orders.push(ProductionOrder {
                id: number_at(sheet_name, "Id", sheet, row, id)? as i64,
                product: text_at(sheet, row, product),
                quantity: number_at(sheet_name, "Quantity", sheet, row, quantity)?,
                bom: text_at(sheet, row, bom),
                created_at: parse_datetime(&text_at(sheet, row, created)),
            });
        }
        Ok(orders)
    }

    pub fn to_sheet(orders: &[ProductionOrder]) -> Sheet {
        let mut sheet = Sheet::new(Self::COLUMNS);
        for o in orders {
            sheet.push_row(vec![
                Cell::from(o.id as f64),
                Cell::from(o.product.as_str()),
                Cell::from(o.quantity),
                Cell::from(o.bom.as_str()),
                Cell::Text(o.created_at.to_rfc3339()),
            ]);
        }
        sheet
    }
}
