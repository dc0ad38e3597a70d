//! `plantops mov` - Stock movement ledger

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::args::GlobalOpts;
use crate::cli::helpers::{emit, format_qty, open_session};
use crate::core::ledger::{record_movement, MovementRequest};
use crate::entities::Warehouse;

#[derive(Subcommand, Debug)]
pub enum MovCommands {
    /// Book a movement (positive qty = receipt, negative = issue)
    Add {
        /// SKU / product code
        sku: String,

        /// Display name, carried onto a newly created stock row
        #[arg(long, default_value = "")]
        name: String,

        #[arg(long, allow_hyphen_values = true)]
        qty: f64,

        #[arg(long, default_value = "")]
        reason: String,

        /// Operator (default: configured operator)
        #[arg(long)]
        operator: Option<String>,

        #[arg(long, default_value = "finished")]
        warehouse: String,
    },

    /// Show the ledger, newest last
    List {
        /// Only the last N entries
        #[arg(long)]
        limit: Option<usize>,
    },
}

pub fn run(cmd: MovCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        MovCommands::Add {
            sku,
            name,
            qty,
            reason,
            operator,
            warehouse,
        } => run_add(global, sku, name, qty, reason, operator, &warehouse),
        MovCommands::List { limit } => run_list(global, limit),
    }
}

fn run_add(
    global: &GlobalOpts,
    sku: String,
    name: String,
    qty: f64,
    reason: String,
    operator: Option<String>,
    warehouse: &str,
) -> Result<()> {
    let mut session = open_session(global)?;
    let w = warehouse
        .parse::<Warehouse>()
        .map_err(|e| miette::miette!("{}", e))?;
    let operator = operator.unwrap_or_else(|| session.config.operator());

    let movement = record_movement(
        &session.ctx,
        &mut session.mirror,
        w,
        &MovementRequest {
            sku,
            name,
            qty,
            reason,
            operator,
        },
    )
    .map_err(|e| miette::miette!("{}", e))?;

    if !global.quiet {
        let kind = if movement.qty >= 0.0 { "receipt" } else { "issue" };
        println!(
            "{} Movement #{} booked: {} {} of {}",
            style("✓").green(),
            movement.id,
            kind,
            format_qty(movement.qty.abs()),
            movement.sku
        );
    }
    Ok(())
}

fn run_list(global: &GlobalOpts, limit: Option<usize>) -> Result<()> {
    let session = open_session(global)?;
    let mut movements = session
        .mirror
        .movements()
        .map_err(|e| miette::miette!("{}", e))?;

    if let Some(limit) = limit {
        let skip = movements.len().saturating_sub(limit);
        movements.drain(..skip);
    }

    let rows: Vec<Vec<String>> = movements
        .iter()
        .map(|m| {
            vec![
                m.id.to_string(),
                m.sku.clone(),
                m.name.clone(),
                format_qty(m.qty),
                m.reason.clone(),
                m.operator.clone(),
                m.created_at.format("%Y-%m-%d %H:%M").to_string(),
            ]
        })
        .collect();

    emit(
        global.format,
        &["Id", "SKU", "Name", "Qty", "Reason", "Operator", "At"],
        &rows,
        serde_json::to_value(&movements).unwrap_or_default(),
    )
}
