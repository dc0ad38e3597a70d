//! BOM-driven production orders
//!
//! An order consumes raw stock proportionally to its bill of materials.
//! Feasibility is checked over the whole order before anything mutates:
//! either every component is covered and the order commits, or every
//! shortage is reported together and nothing changes.

use thiserror::Error;

use crate::core::mirror::{Mirror, TableKind};
use crate::core::sync::{export_tables, SyncContext, SyncError};
use crate::entities::{BomLine, ProductionOrder, Warehouse};

/// Tolerance for floating-point stock comparisons.
pub const STOCK_EPSILON: f64 = 1e-9;

/// One component the order cannot cover.
#[derive(Debug, Clone, PartialEq)]
pub struct Shortage {
    pub component: String,
    pub required: f64,
    pub available: f64,
}

impl std::fmt::Display for Shortage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (need {}, have {})",
            self.component, self.required, self.available
        )
    }
}

/// Errors that can occur while creating a production order
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("invalid BOM: {0}")]
    InvalidBom(#[from] serde_json::Error),

    #[error("BOM has no lines")]
    EmptyBom,

    #[error("order quantity must be positive (got {0})")]
    InvalidQuantity(f64),

    #[error("insufficient stock: {}", format_shortages(.0))]
    InsufficientStock(Vec<Shortage>),

    #[error(transparent)]
    Sync(#[from] SyncError),
}

fn format_shortages(shortages: &[Shortage]) -> String {
    shortages
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse BOM JSON text into lines. Accepts the legacy field names via
/// serde aliases.
pub fn parse_bom(text: &str) -> Result<Vec<BomLine>, OrderError> {
    Ok(serde_json::from_str(text)?)
}

/// Create a production order: check feasibility over the whole BOM, consume
/// raw stock greedily in row insertion order, log the order, book one issue
/// movement per component, and export the raw-stock and orders sheets in
/// the same workbook write.
pub fn create_order(
    ctx: &SyncContext,
    mirror: &mut Mirror,
    product: &str,
    quantity: f64,
    bom: &[BomLine],
    operator: &str,
) -> Result<ProductionOrder, OrderError> {
    if quantity <= 0.0 {
        return Err(OrderError::InvalidQuantity(quantity));
    }
    if bom.is_empty() {
        return Err(OrderError::EmptyBom);
    }

    let mut rows = mirror.stock_items(Warehouse::Raw).map_err(SyncError::from)?;

    // Feasibility first, over the entire order.
    let mut shortages = Vec::new();
    for line in bom {
        let need = line.qty_per_unit * quantity;
        let matching: Vec<&_> = rows.iter().filter(|r| r.sku == line.component).collect();
        let available: f64 = matching.iter().map(|r| r.quantity).sum();
        if matching.is_empty() || available + STOCK_EPSILON < need {
            shortages.push(Shortage {
                component: line.component.clone(),
                required: need,
                available,
            });
        }
    }
    if !shortages.is_empty() {
        return Err(OrderError::InsufficientStock(shortages));
    }

    // Consume greedily, first row first, never driving a row negative.
    let mut consumed: Vec<(String, String, f64)> = Vec::new();
    for line in bom {
        let mut need = line.qty_per_unit * quantity;
        let mut first_name = String::new();
        for row in rows.iter_mut().filter(|r| r.sku == line.component) {
            if first_name.is_empty() {
                first_name = row.name.clone();
            }
            if need <= STOCK_EPSILON {
                break;
            }
            let take = need.min(row.quantity).max(0.0);
            row.quantity -= take;
            need -= take;
        }
        consumed.push((line.component.clone(), first_name, line.qty_per_unit * quantity));
    }

    for row in &rows {
        let id = row.id.expect("persisted rows carry ids");
        mirror
            .set_stock_quantity(Warehouse::Raw, id, row.quantity)
            .map_err(SyncError::from)?;
    }

    let bom_json = serde_json::to_string(bom)?;
    let order = mirror
        .append_order(product, quantity, &bom_json)
        .map_err(SyncError::from)?;

    // The original dashboard never wrote ledger entries for BOM-driven
    // consumption, leaving the ledger blind to it; here each component
    // gets an issue movement tied to the order id.
    let reason = format!("production order #{}", order.id);
    for (component, name, qty) in &consumed {
        mirror
            .append_movement(component, name, -qty, &reason, operator)
            .map_err(SyncError::from)?;
    }

    export_tables(ctx, mirror, &[TableKind::StockRaw, TableKind::Orders])?;
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SheetNames;
    use crate::core::lock::LockSettings;
    use crate::entities::StockItem;
    use tempfile::tempdir;

    fn ctx_for(dir: &std::path::Path) -> SyncContext {
        SyncContext {
            workbook: dir.join("plant.xlsx"),
            sheets: SheetNames::default(),
            lock: LockSettings::default(),
        }
    }

    fn raw(sku: &str, qty: f64) -> StockItem {
        StockItem {
            id: None,
            sku: sku.to_string(),
            name: format!("{} material", sku),
            quantity: qty,
            unit: "kg".to_string(),
            location: String::new(),
        }
    }

    fn line(component: &str, qty_per_unit: f64) -> BomLine {
        BomLine {
            component: component.to_string(),
            qty_per_unit,
        }
    }

    #[test]
    fn test_order_consumes_first_row_first() {
        let tmp = tempdir().unwrap();
        let ctx = ctx_for(tmp.path());
        let mut mirror = Mirror::open_in_memory().unwrap();
        mirror
            .replace_stock(Warehouse::Raw, &[raw("M1", 3.0), raw("M1", 4.0)])
            .unwrap();

        let order =
            create_order(&ctx, &mut mirror, "P1", 10.0, &[line("M1", 0.5)], "ana").unwrap();

        assert_eq!(order.id, 1);
        assert_eq!(order.quantity, 10.0);

        let rows = mirror.stock_items(Warehouse::Raw).unwrap();
        assert_eq!(rows[0].quantity, 0.0);
        assert_eq!(rows[1].quantity, 2.0);

        let orders = mirror.orders().unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].product, "P1");
    }

    #[test]
    fn test_shortage_aborts_whole_order() {
        let tmp = tempdir().unwrap();
        let ctx = ctx_for(tmp.path());
        let mut mirror = Mirror::open_in_memory().unwrap();
        mirror
            .replace_stock(Warehouse::Raw, &[raw("M1", 1.0), raw("M1", 3.0)])
            .unwrap();

        let err = create_order(&ctx, &mut mirror, "P1", 10.0, &[line("M1", 0.5)], "ana")
            .unwrap_err();

        match err {
            OrderError::InsufficientStock(shortages) => {
                assert_eq!(shortages.len(), 1);
                assert_eq!(shortages[0].component, "M1");
                assert_eq!(shortages[0].required, 5.0);
                assert_eq!(shortages[0].available, 4.0);
            }
            other => panic!("expected shortage, got {other:?}"),
        }

        // No mutation at all.
        let rows = mirror.stock_items(Warehouse::Raw).unwrap();
        assert_eq!(rows[0].quantity, 1.0);
        assert_eq!(rows[1].quantity, 3.0);
        assert!(mirror.orders().unwrap().is_empty());
        assert!(mirror.movements().unwrap().is_empty());
    }

    #[test]
    fn test_all_shortages_reported_together() {
        let tmp = tempdir().unwrap();
        let ctx = ctx_for(tmp.path());
        let mut mirror = Mirror::open_in_memory().unwrap();
        mirror.replace_stock(Warehouse::Raw, &[raw("M1", 1.0)]).unwrap();

        let err = create_order(
            &ctx,
            &mut mirror,
            "P1",
            10.0,
            &[line("M1", 0.5), line("M2", 1.0)],
            "ana",
        )
        .unwrap_err();

        match err {
            OrderError::InsufficientStock(shortages) => {
                assert_eq!(shortages.len(), 2);
                assert_eq!(shortages[0].component, "M1");
                // Unknown component reports zero available.
                assert_eq!(shortages[1].component, "M2");
                assert_eq!(shortages[1].available, 0.0);
            }
            other => panic!("expected shortage, got {other:?}"),
        }
    }

    #[test]
    fn test_exact_stock_is_feasible_within_tolerance() {
        let tmp = tempdir().unwrap();
        let ctx = ctx_for(tmp.path());
        let mut mirror = Mirror::open_in_memory().unwrap();
        // 0.1 * 3 accumulates binary error; the epsilon absorbs it.
        mirror
            .replace_stock(Warehouse::Raw, &[raw("M1", 0.1 + 0.1 + 0.1)])
            .unwrap();

        create_order(&ctx, &mut mirror, "P1", 3.0, &[line("M1", 0.1)], "ana").unwrap();

        let rows = mirror.stock_items(Warehouse::Raw).unwrap();
        assert!(rows[0].quantity.abs() < 1e-6);
    }

    #[test]
    fn test_order_books_issue_movements() {
        let tmp = tempdir().unwrap();
        let ctx = ctx_for(tmp.path());
        let mut mirror = Mirror::open_in_memory().unwrap();
        mirror
            .replace_stock(Warehouse::Raw, &[raw("M1", 10.0), raw("M2", 10.0)])
            .unwrap();

        create_order(
            &ctx,
            &mut mirror,
            "P1",
            4.0,
            &[line("M1", 0.5), line("M2", 1.0)],
            "ana",
        )
        .unwrap();

        let ledger = mirror.movements().unwrap();
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger[0].sku, "M1");
        assert_eq!(ledger[0].qty, -2.0);
        assert_eq!(ledger[1].sku, "M2");
        assert_eq!(ledger[1].qty, -4.0);
        assert_eq!(ledger[0].reason, "production order #1");
    }

    #[test]
    fn test_order_exports_stock_and_orders_sheets() {
        let tmp = tempdir().unwrap();
        let ctx = ctx_for(tmp.path());
        let mut mirror = Mirror::open_in_memory().unwrap();
        mirror.replace_stock(Warehouse::Raw, &[raw("M1", 5.0)]).unwrap();

        create_order(&ctx, &mut mirror, "P1", 2.0, &[line("M1", 1.0)], "ana").unwrap();

        let names = crate::core::workbook::sheet_names(&ctx.workbook);
        assert!(names.contains(&"Raw Materials".to_string()));
        assert!(names.contains(&"Orders".to_string()));
    }

    #[test]
    fn test_invalid_bom_and_quantity_rejected() {
        assert!(matches!(parse_bom("not json"), Err(OrderError::InvalidBom(_))));

        let tmp = tempdir().unwrap();
        let ctx = ctx_for(tmp.path());
        let mut mirror = Mirror::open_in_memory().unwrap();
        assert!(matches!(
            create_order(&ctx, &mut mirror, "P1", 0.0, &[line("M1", 1.0)], "ana"),
            Err(OrderError::InvalidQuantity(_))
        ));
        assert!(matches!(
            create_order(&ctx, &mut mirror, "P1", 1.0, &[], "ana"),
            Err(OrderError::EmptyBom)
        ));
    }
}
