//! Stock ledger
//!
//! Movements are the audit trail; quantity-on-hand is denormalized onto the
//! stock rows and must be kept consistent by every writer. The ledger entry
//! is committed before the stock mutation, so a degraded stock update never
//! loses the audit record.

use crate::core::mirror::{Mirror, TableKind};
use crate::core::sync::{export_tables, SyncContext, SyncError};
use crate::entities::{Movement, StockItem, Warehouse};

/// A movement to book: positive `qty` is a receipt, negative an issue.
#[derive(Debug, Clone)]
pub struct MovementRequest {
    pub sku: String,
    pub name: String,
    pub qty: f64,
    pub reason: String,
    pub operator: String,
}

/// Append a ledger entry and fold its delta into quantity-on-hand.
///
/// The first stock row matching the SKU (insertion order) absorbs the whole
/// delta; with no matching row a new one is appended carrying the movement's
/// name. The warehouse sheet is exported before returning.
pub fn record_movement(
    ctx: &SyncContext,
    mirror: &mut Mirror,
    warehouse: Warehouse,
    request: &MovementRequest,
) -> Result<Movement, SyncError> {
    let movement = mirror.append_movement(
        &request.sku,
        &request.name,
        request.qty,
        &request.reason,
        &request.operator,
    )?;

    apply_delta(mirror, warehouse, &request.sku, &request.name, request.qty)?;

    export_tables(ctx, mirror, &[TableKind::from(warehouse)])?;
    Ok(movement)
}

/// Fold a signed delta into the first row matching `sku`, appending a new
/// row when none matches.
pub(crate) fn apply_delta(
    mirror: &Mirror,
    warehouse: Warehouse,
    sku: &str,
    name: &str,
    delta: f64,
) -> Result<(), SyncError> {
    let items = mirror.stock_items(warehouse)?;
    match items.iter().find(|item| item.sku == sku) {
        Some(item) => {
            let id = item.id.expect("persisted rows carry ids");
            mirror.set_stock_quantity(warehouse, id, item.quantity + delta)?;
        }
        None => {
            mirror.insert_stock(
                warehouse,
                &StockItem {
                    id: None,
                    sku: sku.to_string(),
                    name: name.to_string(),
                    quantity: delta,
                    unit: String::new(),
                    location: String::new(),
                },
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SheetNames;
    use crate::core::lock::LockSettings;
    use tempfile::tempdir;

    fn ctx_for(dir: &std::path::Path) -> SyncContext {
        SyncContext {
            workbook: dir.join("plant.xlsx"),
            sheets: SheetNames::default(),
            lock: LockSettings::default(),
        }
    }

    fn request(sku: &str, qty: f64) -> MovementRequest {
        MovementRequest {
            sku: sku.to_string(),
            name: "Widget".to_string(),
            qty,
            reason: "test".to_string(),
            operator: "ana".to_string(),
        }
    }

    #[test]
    fn test_movement_on_empty_table_creates_single_row() {
        let tmp = tempdir().unwrap();
        let ctx = ctx_for(tmp.path());
        let mut mirror = Mirror::open_in_memory().unwrap();

        record_movement(&ctx, &mut mirror, Warehouse::Finished, &request("X", 5.0)).unwrap();

        let items = mirror.stock_items(Warehouse::Finished).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].sku, "X");
        assert_eq!(items[0].name, "Widget");
        assert_eq!(items[0].quantity, 5.0);
    }

    #[test]
    fn test_second_movement_updates_same_row_and_ledger_keeps_order() {
        let tmp = tempdir().unwrap();
        let ctx = ctx_for(tmp.path());
        let mut mirror = Mirror::open_in_memory().unwrap();

        record_movement(&ctx, &mut mirror, Warehouse::Finished, &request("X", 5.0)).unwrap();
        record_movement(&ctx, &mut mirror, Warehouse::Finished, &request("X", -2.0)).unwrap();

        let items = mirror.stock_items(Warehouse::Finished).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 3.0);

        let ledger = mirror.movements().unwrap();
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger[0].qty, 5.0);
        assert_eq!(ledger[1].qty, -2.0);
        assert!(ledger[0].id < ledger[1].id);
    }

    #[test]
    fn test_delta_lands_on_first_matching_row_only() {
        let tmp = tempdir().unwrap();
        let ctx = ctx_for(tmp.path());
        let mut mirror = Mirror::open_in_memory().unwrap();

        let item = |qty| StockItem {
            id: None,
            sku: "X".to_string(),
            name: "Widget".to_string(),
            quantity: qty,
            unit: String::new(),
            location: String::new(),
        };
        mirror
            .replace_stock(Warehouse::Finished, &[item(1.0), item(2.0)])
            .unwrap();

        record_movement(&ctx, &mut mirror, Warehouse::Finished, &request("X", 10.0)).unwrap();

        let items = mirror.stock_items(Warehouse::Finished).unwrap();
        assert_eq!(items[0].quantity, 11.0);
        assert_eq!(items[1].quantity, 2.0);
    }

    #[test]
    fn test_movement_exports_warehouse_sheet() {
        let tmp = tempdir().unwrap();
        let ctx = ctx_for(tmp.path());
        let mut mirror = Mirror::open_in_memory().unwrap();

        record_movement(&ctx, &mut mirror, Warehouse::Finished, &request("X", 5.0)).unwrap();

        let sheets =
            crate::core::workbook::read_sheets(&ctx.workbook, &["Finished Goods".to_string()]);
        assert_eq!(sheets["Finished Goods"].len(), 1);
    }
}
