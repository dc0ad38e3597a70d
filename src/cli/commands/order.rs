//! `plantops order` - Production orders with BOM consumption

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::args::GlobalOpts;
use crate::cli::helpers::{emit, format_qty, open_session, truncate_str};
use crate::core::orders::{create_order, parse_bom, OrderError};

#[derive(Subcommand, Debug)]
pub enum OrderCommands {
    /// Create an order, consuming raw stock per the BOM
    Create {
        /// Product code
        product: String,

        /// Units to produce
        #[arg(long)]
        qty: f64,

        /// BOM as JSON, e.g. '[{"component":"M1","qty_per_unit":0.5}]',
        /// or @path to read it from a file
        #[arg(long)]
        bom: String,

        /// Operator (default: configured operator)
        #[arg(long)]
        operator: Option<String>,
    },

    /// List logged orders
    List,
}

pub fn run(cmd: OrderCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        OrderCommands::Create {
            product,
            qty,
            bom,
            operator,
        } => run_create(global, &product, qty, &bom, operator),
        OrderCommands::List => run_list(global),
    }
}

fn run_create(
    global: &GlobalOpts,
    product: &str,
    qty: f64,
    bom: &str,
    operator: Option<String>,
) -> Result<()> {
    let bom_text = if let Some(path) = bom.strip_prefix('@') {
        std::fs::read_to_string(path)
            .map_err(|e| miette::miette!("failed to read BOM file {}: {}", path, e))?
    } else {
        bom.to_string()
    };
    let lines = parse_bom(&bom_text).map_err(|e| miette::miette!("{}", e))?;

    let mut session = open_session(global)?;
    let operator = operator.unwrap_or_else(|| session.config.operator());

    match create_order(&session.ctx, &mut session.mirror, product, qty, &lines, &operator) {
        Ok(order) => {
            if !global.quiet {
                println!(
                    "{} Order #{} created: {} × {}",
                    style("✓").green(),
                    order.id,
                    format_qty(order.quantity),
                    order.product
                );
                for line in &lines {
                    println!(
                        "  consumed {} of {}",
                        format_qty(line.qty_per_unit * qty),
                        line.component
                    );
                }
            }
            Ok(())
        }
        Err(OrderError::InsufficientStock(shortages)) => {
            eprintln!("{} Insufficient stock; order aborted:", style("✗").red());
            for s in &shortages {
                eprintln!(
                    "  {}: need {}, have {}",
                    style(&s.component).red(),
                    format_qty(s.required),
                    format_qty(s.available)
                );
            }
            Err(miette::miette!(
                "insufficient stock for {} component(s)",
                shortages.len()
            ))
        }
        Err(e) => Err(miette::miette!("{}", e)),
    }
}

fn run_list(global: &GlobalOpts) -> Result<()> {
    let session = open_session(global)?;
    let orders = session
        .mirror
        .orders()
        .map_err(|e| miette::miette!("{}", e))?;

    let rows: Vec<Vec<String>> = orders
        .iter()
        .map(|o| {
            vec![
                o.id.to_string(),
                o.product.clone(),
                format_qty(o.quantity),
                truncate_str(&o.bom, 48),
                o.created_at.format("%Y-%m-%d %H:%M").to_string(),
            ]
        })
        .collect();

    emit(
        global.format,
        &["Id", "Product", "Quantity", "BOM", "Created"],
        &rows,
        serde_json::to_value(&orders).unwrap_or_default(),
    )
}
