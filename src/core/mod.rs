//! Core module - synchronization and stock logic

pub mod config;
pub mod ledger;
pub mod lock;
pub mod metrics;
pub mod mirror;
pub mod orders;
pub mod plant;
pub mod sync;
pub mod workbook;

pub use config::{Config, SheetNames};
pub use ledger::{record_movement, MovementRequest};
pub use lock::{LockError, LockFile, LockSettings};
pub use metrics::{
    efficiency_by_operator, product_summary, totals, OperatorEfficiency, ProductSummary,
    ProductionFilter, ProductionTotals,
};
pub use mirror::{Mirror, MirrorError, TableKind};
pub use orders::{create_order, parse_bom, OrderError, Shortage, STOCK_EPSILON};
pub use plant::{Plant, PlantError};
pub use sync::{bootstrap_import, export_tables, open_mirror, ImportStats, SyncContext, SyncError};
pub use workbook::{Cell, Sheet, WorkbookError};
