//! `plantops stock` - Stock table management

use clap::Subcommand;
use console::style;
use miette::Result;
use std::collections::BTreeMap;

use crate::cli::args::GlobalOpts;
use crate::cli::helpers::{emit, format_qty, open_session, Session};
use crate::core::mirror::TableKind;
use crate::core::sync::export_tables;
use crate::entities::{StockItem, Warehouse};

#[derive(Subcommand, Debug)]
pub enum StockCommands {
    /// List stock rows
    List {
        /// Warehouse to list (default: both)
        #[arg(long)]
        warehouse: Option<String>,
    },

    /// Quantity-on-hand per SKU, summed across rows
    Totals {
        /// Warehouse to total (default: finished)
        #[arg(long, default_value = "finished")]
        warehouse: String,
    },

    /// Insert a stock row directly
    Add {
        /// SKU / material code
        sku: String,

        #[arg(long, default_value = "")]
        name: String,

        #[arg(long, allow_hyphen_values = true, default_value_t = 0.0)]
        qty: f64,

        #[arg(long, default_value = "")]
        unit: String,

        #[arg(long, default_value = "")]
        location: String,

        #[arg(long, default_value = "raw")]
        warehouse: String,
    },

    /// Set the quantity of the first row matching a SKU
    Set {
        /// SKU / material code
        sku: String,

        #[arg(long, allow_hyphen_values = true)]
        qty: f64,

        #[arg(long, default_value = "raw")]
        warehouse: String,
    },
}

pub fn run(cmd: StockCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        StockCommands::List { warehouse } => run_list(global, warehouse),
        StockCommands::Totals { warehouse } => run_totals(global, &warehouse),
        StockCommands::Add {
            sku,
            name,
            qty,
            unit,
            location,
            warehouse,
        } => run_add(global, sku, name, qty, unit, location, &warehouse),
        StockCommands::Set {
            sku,
            qty,
            warehouse,
        } => run_set(global, &sku, qty, &warehouse),
    }
}

fn parse_warehouse(s: &str) -> Result<Warehouse> {
    s.parse::<Warehouse>().map_err(|e| miette::miette!("{}", e))
}

fn item_rows(items: &[StockItem]) -> Vec<Vec<String>> {
    items
        .iter()
        .map(|i| {
            vec![
                i.sku.clone(),
                i.name.clone(),
                format_qty(i.quantity),
                i.unit.clone(),
                i.location.clone(),
            ]
        })
        .collect()
}

fn run_list(global: &GlobalOpts, warehouse: Option<String>) -> Result<()> {
    let session = open_session(global)?;

    let warehouses = match warehouse {
        Some(w) => vec![parse_warehouse(&w)?],
        None => vec![Warehouse::Raw, Warehouse::Finished],
    };

    for w in warehouses {
        let items = session
            .mirror
            .stock_items(w)
            .map_err(|e| miette::miette!("{}", e))?;
        if !global.quiet {
            println!("{}", style(format!("{} ({} row(s))", w.table(), items.len())).bold());
        }
        emit(
            global.format,
            &["SKU", "Name", "Quantity", "Unit", "Location"],
            &item_rows(&items),
            serde_json::to_value(&items).unwrap_or_default(),
        )?;
    }
    Ok(())
}

fn run_totals(global: &GlobalOpts, warehouse: &str) -> Result<()> {
    let session = open_session(global)?;
    let w = parse_warehouse(warehouse)?;

    let items = session
        .mirror
        .stock_items(w)
        .map_err(|e| miette::miette!("{}", e))?;

    let mut totals: BTreeMap<(String, String), f64> = BTreeMap::new();
    for item in &items {
        *totals
            .entry((item.sku.clone(), item.name.clone()))
            .or_insert(0.0) += item.quantity;
    }
    let mut rows: Vec<((String, String), f64)> = totals.into_iter().collect();
    rows.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let table_rows: Vec<Vec<String>> = rows
        .iter()
        .map(|((sku, name), qty)| vec![sku.clone(), name.clone(), format_qty(*qty)])
        .collect();
    let json = serde_json::Value::Array(
        rows.iter()
            .map(|((sku, name), qty)| {
                serde_json::json!({ "sku": sku, "name": name, "quantity": qty })
            })
            .collect(),
    );
    emit(global.format, &["SKU", "Name", "Quantity"], &table_rows, json)
}

fn run_add(
    global: &GlobalOpts,
    sku: String,
    name: String,
    qty: f64,
    unit: String,
    location: String,
    warehouse: &str,
) -> Result<()> {
    let session = open_session(global)?;
    let w = parse_warehouse(warehouse)?;

    session
        .mirror
        .insert_stock(
            w,
            &StockItem {
                id: None,
                sku: sku.clone(),
                name,
                quantity: qty,
                unit,
                location,
            },
        )
        .map_err(|e| miette::miette!("{}", e))?;

    export(&session, w)?;

    if !global.quiet {
        println!(
            "{} Added {} to {} (qty {})",
            style("✓").green(),
            sku,
            w.table(),
            format_qty(qty)
        );
    }
    Ok(())
}

fn run_set(global: &GlobalOpts, sku: &str, qty: f64, warehouse: &str) -> Result<()> {
    let session = open_session(global)?;
    let w = parse_warehouse(warehouse)?;

    let items = session
        .mirror
        .stock_items(w)
        .map_err(|e| miette::miette!("{}", e))?;
    let Some(item) = items.iter().find(|i| i.sku == sku) else {
        return Err(miette::miette!(
            "no stock row with SKU `{}` in {}. Use 'plantops stock add' to create one.",
            sku,
            w.table()
        ));
    };

    session
        .mirror
        .set_stock_quantity(w, item.id.expect("persisted rows carry ids"), qty)
        .map_err(|e| miette::miette!("{}", e))?;

    export(&session, w)?;

    if !global.quiet {
        println!(
            "{} {} now at {} (was {})",
            style("✓").green(),
            sku,
            format_qty(qty),
            format_qty(item.quantity)
        );
    }
    Ok(())
}

fn export(session: &Session, w: Warehouse) -> Result<()> {
    export_tables(&session.ctx, &session.mirror, &[TableKind::from(w)])
        .map_err(|e| miette::miette!("{}", e))
}
