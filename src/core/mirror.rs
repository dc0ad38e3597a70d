//! SQLite mirror of the workbook data
//!
//! The mirror is the queryable copy used for every read and edit during a
//! session; the workbook stays the durable interchange copy. The schema is
//! created up front, so reads against tables that have never been written
//! return empty collections rather than errors.
//!
//! Writes are keyed wherever a key exists: movements append, machine rows
//! upsert by name, stock quantities update by row id. Whole-table
//! replacement is reserved for operations that are snapshots by nature
//! (bootstrap import, full-table edits).

use std::fs;
use std::path::Path;

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use crate::entities::{
    parse_datetime, MachineState, MachineStatus, Movement, ProductionOrder, ProductionRecord,
    StockItem, Warehouse,
};

/// Current schema version; recorded for future migrations.
const SCHEMA_VERSION: i32 = 1;

/// The tables that sync against workbook sheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    StockRaw,
    StockFinished,
    Production,
    Orders,
}

impl TableKind {
    pub const ALL: [TableKind; 4] = [
        TableKind::StockRaw,
        TableKind::StockFinished,
        TableKind::Production,
        TableKind::Orders,
    ];

    pub fn table(&self) -> &'static str {
        match self {
            TableKind::StockRaw => "stock_raw",
            TableKind::StockFinished => "stock_finished",
            TableKind::Production => "production",
            TableKind::Orders => "orders",
        }
    }
}

impl From<Warehouse> for TableKind {
    fn from(w: Warehouse) -> Self {
        match w {
            Warehouse::Raw => TableKind::StockRaw,
            Warehouse::Finished => TableKind::StockFinished,
        }
    }
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table())
    }
}

impl std::str::FromStr for TableKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stock_raw" | "raw" => Ok(TableKind::StockRaw),
            "stock_finished" | "finished" => Ok(TableKind::StockFinished),
            "production" => Ok(TableKind::Production),
            "orders" => Ok(TableKind::Orders),
            _ => Err(format!(
                "Invalid table: {}. Use stock_raw, stock_finished, production, or orders",
                s
            )),
        }
    }
}

/// Errors that can occur against the mirror database
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The mirror database handle.
pub struct Mirror {
    conn: Connection,
}

impl Mirror {
    /// Open (creating if needed) the mirror at `path`.
    pub fn open(path: &Path) -> Result<Self, MirrorError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        let mirror = Self { conn };
        mirror.init_schema()?;
        Ok(mirror)
    }

    /// In-memory mirror for tests.
    pub fn open_in_memory() -> Result<Self, MirrorError> {
        let conn = Connection::open_in_memory()?;
        let mirror = Self { conn };
        mirror.init_schema()?;
        Ok(mirror)
    }

    fn init_schema(&self) -> Result<(), MirrorError> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS stock_raw (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                sku TEXT NOT NULL,
                name TEXT NOT NULL DEFAULT '',
                quantity REAL NOT NULL DEFAULT 0,
                unit TEXT NOT NULL DEFAULT '',
                location TEXT NOT NULL DEFAULT ''
            );
            CREATE INDEX IF NOT EXISTS idx_stock_raw_sku ON stock_raw(sku);

            CREATE TABLE IF NOT EXISTS stock_finished (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                sku TEXT NOT NULL,
                name TEXT NOT NULL DEFAULT '',
                quantity REAL NOT NULL DEFAULT 0,
                unit TEXT NOT NULL DEFAULT '',
                location TEXT NOT NULL DEFAULT ''
            );
            CREATE INDEX IF NOT EXISTS idx_stock_finished_sku ON stock_finished(sku);

            CREATE TABLE IF NOT EXISTS production (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                date TEXT,
                machine TEXT NOT NULL DEFAULT '',
                product TEXT NOT NULL DEFAULT '',
                shift TEXT NOT NULL DEFAULT '',
                operator TEXT NOT NULL DEFAULT '',
                scheduled REAL NOT NULL DEFAULT 0,
                produced REAL NOT NULL DEFAULT 0,
                efficiency REAL NOT NULL DEFAULT 0,
                cycles REAL NOT NULL DEFAULT 0,
                scrap_kg REAL NOT NULL DEFAULT 0,
                notes TEXT NOT NULL DEFAULT ''
            );

            CREATE TABLE IF NOT EXISTS movements (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                sku TEXT NOT NULL,
                name TEXT NOT NULL DEFAULT '',
                qty REAL NOT NULL,
                reason TEXT NOT NULL DEFAULT '',
                operator TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS machines (
                machine TEXT PRIMARY KEY,
                product TEXT NOT NULL DEFAULT '',
                operator TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS orders (
                id INTEGER PRIMARY KEY,
                product TEXT NOT NULL,
                quantity REAL NOT NULL,
                bom TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL
            );
            "#,
        )?;

        let has_version: Option<i32> = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()?;
        if has_version.is_none() {
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![SCHEMA_VERSION],
            )?;
        }
        Ok(())
    }

    // ---- stock ----

    /// All rows of a warehouse in insertion order. This ordering is the
    /// consumption order for movements and production orders.
    pub fn stock_items(&self, warehouse: Warehouse) -> Result<Vec<StockItem>, MirrorError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, sku, name, quantity, unit, location FROM {} ORDER BY id",
            warehouse.table()
        ))?;
        let rows = stmt.query_map([], |row| {
            Ok(StockItem {
                id: Some(row.get(0)?),
                sku: row.get(1)?,
                name: row.get(2)?,
                quantity: row.get(3)?,
                unit: row.get(4)?,
                location: row.get(5)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Replace a warehouse's rows with a full snapshot. Row ids are
    /// reassigned in snapshot order.
    pub fn replace_stock(
        &mut self,
        warehouse: Warehouse,
        items: &[StockItem],
    ) -> Result<(), MirrorError> {
        let tx = self.conn.transaction()?;
        tx.execute(&format!("DELETE FROM {}", warehouse.table()), [])?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} (sku, name, quantity, unit, location) VALUES (?1, ?2, ?3, ?4, ?5)",
                warehouse.table()
            ))?;
            for item in items {
                stmt.execute(params![
                    item.sku,
                    item.name,
                    item.quantity,
                    item.unit,
                    item.location
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Append one stock row, returning its assigned id.
    pub fn insert_stock(
        &self,
        warehouse: Warehouse,
        item: &StockItem,
    ) -> Result<i64, MirrorError> {
        self.conn.execute(
            &format!(
                "INSERT INTO {} (sku, name, quantity, unit, location) VALUES (?1, ?2, ?3, ?4, ?5)",
                warehouse.table()
            ),
            params![item.sku, item.name, item.quantity, item.unit, item.location],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Set the quantity of one stock row, keyed by row id.
    pub fn set_stock_quantity(
        &self,
        warehouse: Warehouse,
        id: i64,
        quantity: f64,
    ) -> Result<(), MirrorError> {
        self.conn.execute(
            &format!("UPDATE {} SET quantity = ?1 WHERE id = ?2", warehouse.table()),
            params![quantity, id],
        )?;
        Ok(())
    }

    // ---- movements ----

    /// Append a ledger entry. Entries are immutable once written.
    pub fn append_movement(
        &self,
        sku: &str,
        name: &str,
        qty: f64,
        reason: &str,
        operator: &str,
    ) -> Result<Movement, MirrorError> {
        let created_at = Utc::now();
        self.conn.execute(
            "INSERT INTO movements (sku, name, qty, reason, operator, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![sku, name, qty, reason, operator, created_at.to_rfc3339()],
        )?;
        Ok(Movement {
            id: self.conn.last_insert_rowid(),
            sku: sku.to_string(),
            name: name.to_string(),
            qty,
            reason: reason.to_string(),
            operator: operator.to_string(),
            created_at,
        })
    }

    /// The full ledger in insertion order.
    pub fn movements(&self) -> Result<Vec<Movement>, MirrorError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, sku, name, qty, reason, operator, created_at FROM movements ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Movement {
                id: row.get(0)?,
                sku: row.get(1)?,
                name: row.get(2)?,
                qty: row.get(3)?,
                reason: row.get(4)?,
                operator: row.get(5)?,
                created_at: parse_datetime(&row.get::<_, String>(6)?),
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    // ---- production ----

    pub fn production_records(&self) -> Result<Vec<ProductionRecord>, MirrorError> {
        let mut stmt = self.conn.prepare(
            "SELECT date, machine, product, shift, operator, scheduled, produced,
                    efficiency, cycles, scrap_kg, notes
             FROM production ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            let date: Option<String> = row.get(0)?;
            Ok(ProductionRecord {
                date: date.and_then(|d| d.parse().ok()),
                machine: row.get(1)?,
                product: row.get(2)?,
                shift: row.get(3)?,
                operator: row.get(4)?,
                scheduled: row.get(5)?,
                produced: row.get(6)?,
                efficiency: row.get(7)?,
                cycles: row.get(8)?,
                scrap_kg: row.get(9)?,
                notes: row.get(10)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn replace_production(
        &mut self,
        records: &[ProductionRecord],
    ) -> Result<(), MirrorError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM production", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO production (date, machine, product, shift, operator, scheduled,
                                         produced, efficiency, cycles, scrap_kg, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            )?;
            for r in records {
                stmt.execute(params![
                    r.date.map(|d| d.format("%Y-%m-%d").to_string()),
                    r.machine,
                    r.product,
                    r.shift,
                    r.operator,
                    r.scheduled,
                    r.produced,
                    r.efficiency,
                    r.cycles,
                    r.scrap_kg,
                    r.notes
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn append_production(&self, r: &ProductionRecord) -> Result<(), MirrorError> {
        self.conn.execute(
            "INSERT INTO production (date, machine, product, shift, operator, scheduled,
                                     produced, efficiency, cycles, scrap_kg, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                r.date.map(|d| d.format("%Y-%m-%d").to_string()),
                r.machine,
                r.product,
                r.shift,
                r.operator,
                r.scheduled,
                r.produced,
                r.efficiency,
                r.cycles,
                r.scrap_kg,
                r.notes
            ],
        )?;
        Ok(())
    }

    // ---- orders ----

    pub fn orders(&self) -> Result<Vec<ProductionOrder>, MirrorError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, product, quantity, bom, created_at FROM orders ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ProductionOrder {
                id: row.get(0)?,
                product: row.get(1)?,
                quantity: row.get(2)?,
                bom: row.get(3)?,
                created_at: parse_datetime(&row.get::<_, String>(4)?),
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Append an order row; the id is max existing id + 1, starting at 1.
    pub fn append_order(
        &self,
        product: &str,
        quantity: f64,
        bom: &str,
    ) -> Result<ProductionOrder, MirrorError> {
        let created_at = Utc::now();
        let id: i64 = self
            .conn
            .query_row("SELECT COALESCE(MAX(id), 0) + 1 FROM orders", [], |row| {
                row.get(0)
            })?;
        self.conn.execute(
            "INSERT INTO orders (id, product, quantity, bom, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, product, quantity, bom, created_at.to_rfc3339()],
        )?;
        Ok(ProductionOrder {
            id,
            product: product.to_string(),
            quantity,
            bom: bom.to_string(),
            created_at,
        })
    }

    pub fn replace_orders(&mut self, orders: &[ProductionOrder]) -> Result<(), MirrorError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM orders", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO orders (id, product, quantity, bom, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for o in orders {
                stmt.execute(params![
                    o.id,
                    o.product,
                    o.quantity,
                    o.bom,
                    o.created_at.to_rfc3339()
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    // ---- machines ----

    pub fn machine_statuses(&self) -> Result<Vec<MachineStatus>, MirrorError> {
        let mut stmt = self.conn.prepare(
            "SELECT machine, product, operator, status, updated_at FROM machines ORDER BY machine",
        )?;
        let rows = stmt.query_map([], machine_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn machine_status(&self, machine: &str) -> Result<Option<MachineStatus>, MirrorError> {
        Ok(self
            .conn
            .query_row(
                "SELECT machine, product, operator, status, updated_at FROM machines WHERE machine = ?1",
                params![machine],
                machine_from_row,
            )
            .optional()?)
    }

    /// Upsert one machine's status, keyed by machine name.
    pub fn upsert_machine(&self, status: &MachineStatus) -> Result<(), MirrorError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO machines (machine, product, operator, status, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                status.machine,
                status.product,
                status.operator,
                status.status.to_string(),
                status.updated_at.to_rfc3339()
            ],
        )?;
        Ok(())
    }

    /// Row counts per synced table, for `sync status`.
    pub fn table_counts(&self) -> Result<Vec<(TableKind, i64)>, MirrorError> {
        let mut counts = Vec::new();
        for kind in TableKind::ALL {
            let n: i64 = self.conn.query_row(
                &format!("SELECT COUNT(*) FROM {}", kind.table()),
                [],
                |row| row.get(0),
            )?;
            counts.push((kind, n));
        }
        Ok(counts)
    }
}

fn machine_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MachineStatus> {
    let status: String = row.get(3)?;
    Ok(MachineStatus {
        machine: row.get(0)?,
        product: row.get(1)?,
        operator: row.get(2)?,
        status: status.parse::<MachineState>().unwrap_or_default(),
        updated_at: parse_datetime(&row.get::<_, String>(4)?),
    })
}
