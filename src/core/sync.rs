//! Workbook ⇄ mirror synchronization
//!
//! One-directional bootstrap import (workbook → mirror) on first run or on
//! demand, and per-edit export (mirror → workbook) after every successful
//! mutating action. Exports are never batched or deferred.
//!
//! Known gap: a crash between a mirror write and the following export
//! leaves the two stores divergent. There is no write-ahead marker;
//! `sync export` (the mirror is right) or `sync import --force` (the
//! workbook is right) reconcile manually.

use std::path::PathBuf;

use thiserror::Error;

use crate::core::config::{Config, SheetNames};
use crate::core::lock::LockSettings;
use crate::core::mirror::{Mirror, MirrorError, TableKind};
use crate::core::plant::Plant;
use crate::core::workbook::{self, Sheet, WorkbookError};
use crate::entities::{ProductionOrder, ProductionRecord, SchemaError, StockItem, Warehouse};

/// Everything the sync paths need to know about a workspace.
#[derive(Debug, Clone)]
pub struct SyncContext {
    pub workbook: PathBuf,
    pub sheets: SheetNames,
    pub lock: LockSettings,
}

impl SyncContext {
    pub fn new(plant: &Plant, config: &Config) -> Self {
        Self {
            workbook: config.workbook_path(plant),
            sheets: config.sheets(),
            lock: config.lock_settings(),
        }
    }
}

/// What a bootstrap import touched.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImportStats {
    pub sheets_imported: usize,
    pub rows_imported: usize,
    pub sheets_missing: usize,
}

/// Errors that can occur while syncing
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Workbook(#[from] WorkbookError),

    #[error(transparent)]
    Mirror(#[from] MirrorError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Import every configured sheet into its mirror table. Sheets absent from
/// the workbook leave their table untouched for that pass.
pub fn bootstrap_import(ctx: &SyncContext, mirror: &mut Mirror) -> Result<ImportStats, SyncError> {
    let names: Vec<String> = ctx.sheets.pairs().into_iter().map(|(s, _)| s).collect();
    let sheets = workbook::read_sheets(&ctx.workbook, &names);

    let mut stats = ImportStats::default();
    for (sheet_name, table) in ctx.sheets.pairs() {
        let Some(sheet) = sheets.get(&sheet_name) else {
            stats.sheets_missing += 1;
            continue;
        };
        stats.rows_imported += import_sheet(mirror, table, &sheet_name, sheet)?;
        stats.sheets_imported += 1;
    }
    Ok(stats)
}

fn import_sheet(
    mirror: &mut Mirror,
    table: TableKind,
    sheet_name: &str,
    sheet: &Sheet,
) -> Result<usize, SyncError> {
    let rows = match table {
        TableKind::StockRaw => {
            let items = StockItem::from_sheet(sheet_name, sheet)?;
            mirror.replace_stock(Warehouse::Raw, &items)?;
            items.len()
        }
        TableKind::StockFinished => {
            let items = StockItem::from_sheet(sheet_name, sheet)?;
            mirror.replace_stock(Warehouse::Finished, &items)?;
            items.len()
        }
        TableKind::Production => {
            let records = ProductionRecord::from_sheet(sheet_name, sheet)?;
            mirror.replace_production(&records)?;
            records.len()
        }
        TableKind::Orders => {
            let orders = ProductionOrder::from_sheet(sheet_name, sheet)?;
            mirror.replace_orders(&orders)?;
            orders.len()
        }
    };
    Ok(rows)
}

/// Snapshot the given tables and rewrite their sheets in one lock-guarded
/// workbook write.
pub fn export_tables(
    ctx: &SyncContext,
    mirror: &Mirror,
    tables: &[TableKind],
) -> Result<(), SyncError> {
    let mut replacements = Vec::with_capacity(tables.len());
    for table in tables {
        let sheet = match table {
            TableKind::StockRaw => StockItem::to_sheet(&mirror.stock_items(Warehouse::Raw)?),
            TableKind::StockFinished => {
                StockItem::to_sheet(&mirror.stock_items(Warehouse::Finished)?)
            }
            TableKind::Production => {
                ProductionRecord::to_sheet(&mirror.production_records()?)
            }
            TableKind::Orders => ProductionOrder::to_sheet(&mirror.orders()?),
        };
        replacements.push((ctx.sheets.sheet_for(*table).to_string(), sheet));
    }
    workbook::write_sheets(&ctx.workbook, &replacements, ctx.lock)?;
    Ok(())
}

/// Open the mirror, importing from the workbook on first run: when the
/// mirror database does not exist yet but the workbook does.
pub fn open_mirror(
    plant: &Plant,
    config: &Config,
) -> Result<(Mirror, Option<ImportStats>), SyncError> {
    let mirror_path = config.mirror_path(plant);
    let ctx = SyncContext::new(plant, config);

    let first_run = !mirror_path.exists() && ctx.workbook.exists();
    let mut mirror = Mirror::open(&mirror_path)?;

    if first_run {
        let stats = bootstrap_import(&ctx, &mut mirror)?;
        return Ok((mirror, Some(stats)));
    }
    Ok((mirror, None))
}
