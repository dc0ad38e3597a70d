//! Stock items and the movement ledger

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::workbook::{Cell, Sheet};
use crate::entities::{find_column, number_at, text_at, SchemaError};

/// Which stock table a row lives in.
///
/// Raw materials feed production orders; finished goods are what movements
/// book against by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Warehouse {
    Raw,
    Finished,
}

impl Warehouse {
    /// Mirror table backing this warehouse.
    pub fn table(&self) -> &'static str {
        match self {
            Warehouse::Raw => "stock_raw",
            Warehouse::Finished => "stock_finished",
        }
    }
}

impl std::fmt::Display for Warehouse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warehouse::Raw => write!(f, "raw"),
            Warehouse::Finished => write!(f, "finished"),
        }
    }
}

impl std::str::FromStr for Warehouse {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "raw" | "mp" => Ok(Warehouse::Raw),
            "finished" | "fg" => Ok(Warehouse::Finished),
            _ => Err(format!("Invalid warehouse: {}. Use raw or finished", s)),
        }
    }
}

/// One stock row. SKUs are not unique across rows: the same material can
/// appear once per lot or location, and consumption walks the rows in
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockItem {
    /// Mirror row id; `None` until the row has been persisted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub sku: String,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    pub location: String,
}

impl StockItem {
    pub const COLUMNS: [&'static str; 5] = ["SKU", "Name", "Quantity", "Unit", "Location"];

    /// Decode a stock sheet. Header aliases cover the legacy workbook
    /// column names (`mp_id`, `quantidade`, ...).
    pub fn from_sheet(sheet_name: &str, sheet: &Sheet) -> Result<Vec<StockItem>, SchemaError> {
        let sku = find_column(sheet, &["sku", "code", "mp_id"]);
        let name = find_column(sheet, &["name", "nome", "mp_nome"]);
        let quantity = find_column(sheet, &["quantity", "qty", "quantidade"]);
        let unit = find_column(sheet, &["unit", "unidade"]);
        let location = find_column(sheet, &["location", "local"]);

        let mut items = Vec::with_capacity(sheet.len());
        for row in 0..sheet.len() {
            items.push(StockItem {
                id: None,
                sku: text_at(sheet, row, sku),
                name: text_at(sheet, row, name),
                quantity: number_at(sheet_name, "Quantity", sheet, row, quantity)?,
                unit: text_at(sheet, row, unit),
                location: text_at(sheet, row, location),
            });
        }
        Ok(items)
    }

    pub fn to_sheet(items: &[StockItem]) -> Sheet {
        let mut sheet = Sheet::new(Self::COLUMNS);
        for item in items {
            sheet.push_row(vec![
                Cell::from(item.sku.as_str()),
                Cell::from(item.name.as_str()),
                Cell::from(item.quantity),
                Cell::from(item.unit.as_str()),
                Cell::from(item.location.as_str()),
            ]);
        }
        sheet
    }
}

/// One ledger entry. Append-only and immutable; positive quantities are
/// receipts, negative are issues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub id: i64,
    pub sku: String,
    pub name: String,
    pub qty: f64,
    pub reason: String,
    pub operator: String,
    pub created_at: DateTime<Utc>,
}
