//! `plantops prod` - Production log and KPI reports

use clap::Subcommand;
use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::cli::args::{GlobalOpts, OutputFormat};
use crate::cli::helpers::{emit, format_qty, open_session, parse_date, truncate_str};
use crate::core::metrics::{efficiency_by_operator, product_summary, totals, ProductionFilter};
use crate::core::mirror::TableKind;
use crate::core::sync::export_tables;
use crate::entities::ProductionRecord;

/// Filter flags shared by the read commands.
#[derive(clap::Args, Debug, Default)]
pub struct FilterArgs {
    /// Start date (inclusive)
    #[arg(long)]
    pub from: Option<String>,

    /// End date (inclusive)
    #[arg(long)]
    pub to: Option<String>,

    /// Restrict to these machines (repeatable)
    #[arg(long = "machine")]
    pub machines: Vec<String>,

    /// Restrict to these products (repeatable)
    #[arg(long = "product")]
    pub products: Vec<String>,

    /// Restrict to these shifts (repeatable)
    #[arg(long = "shift")]
    pub shifts: Vec<String>,

    /// Restrict to these operators (repeatable)
    #[arg(long = "operator")]
    pub operators: Vec<String>,
}

impl FilterArgs {
    fn to_filter(&self) -> Result<ProductionFilter> {
        Ok(ProductionFilter {
            from: self.from.as_deref().map(parse_date).transpose()?,
            to: self.to.as_deref().map(parse_date).transpose()?,
            machines: self.machines.clone(),
            products: self.products.clone(),
            shifts: self.shifts.clone(),
            operators: self.operators.clone(),
        })
    }
}

#[derive(Subcommand, Debug)]
pub enum ProdCommands {
    /// List production records
    List {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Append a production record
    Add {
        #[arg(long)]
        date: Option<String>,

        #[arg(long, default_value = "")]
        machine: String,

        #[arg(long, default_value = "")]
        product: String,

        #[arg(long, default_value = "")]
        shift: String,

        /// Operator (default: configured operator)
        #[arg(long)]
        operator: Option<String>,

        #[arg(long, default_value_t = 0.0)]
        scheduled: f64,

        #[arg(long, default_value_t = 0.0)]
        produced: f64,

        /// Efficiency as a ratio in [0, 1]
        #[arg(long, default_value_t = 0.0)]
        efficiency: f64,

        #[arg(long, default_value_t = 0.0)]
        cycles: f64,

        #[arg(long, default_value_t = 0.0)]
        scrap_kg: f64,

        #[arg(long, default_value = "")]
        notes: String,
    },

    /// Efficiency by operator, in percent
    Report {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Per-product scheduled/produced/loss plus period totals
    Summary {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Export filtered records as CSV
    Export {
        /// Output file (default: stdout)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        #[command(flatten)]
        filter: FilterArgs,
    },
}

pub fn run(cmd: ProdCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ProdCommands::List { filter } => run_list(global, &filter),
        ProdCommands::Add {
            date,
            machine,
            product,
            shift,
            operator,
            scheduled,
            produced,
            efficiency,
            cycles,
            scrap_kg,
            notes,
        } => run_add(
            global, date, machine, product, shift, operator, scheduled, produced, efficiency,
            cycles, scrap_kg, notes,
        ),
        ProdCommands::Report { filter } => run_report(global, &filter),
        ProdCommands::Summary { filter } => run_summary(global, &filter),
        ProdCommands::Export { output, filter } => run_export(global, output, &filter),
    }
}

fn record_row(r: &ProductionRecord) -> Vec<String> {
    vec![
        r.date.map(|d| d.to_string()).unwrap_or_default(),
        r.machine.clone(),
        r.product.clone(),
        r.shift.clone(),
        r.operator.clone(),
        format_qty(r.scheduled),
        format_qty(r.produced),
        format!("{:.2}%", r.efficiency * 100.0),
        format_qty(r.cycles),
        format_qty(r.scrap_kg),
        truncate_str(&r.notes, 40),
    ]
}

fn run_list(global: &GlobalOpts, filter: &FilterArgs) -> Result<()> {
    let session = open_session(global)?;
    let filter = filter.to_filter()?;
    let records = session
        .mirror
        .production_records()
        .map_err(|e| miette::miette!("{}", e))?;
    let selected: Vec<ProductionRecord> =
        filter.apply(&records).into_iter().cloned().collect();

    let rows: Vec<Vec<String>> = selected.iter().map(record_row).collect();
    emit(
        global.format,
        &[
            "Date",
            "Machine",
            "Product",
            "Shift",
            "Operator",
            "Scheduled",
            "Produced",
            "Efficiency",
            "Cycles",
            "Scrap Kg",
            "Notes",
        ],
        &rows,
        serde_json::to_value(&selected).unwrap_or_default(),
    )
}

#[allow(clippy::too_many_arguments)]
fn run_add(
    global: &GlobalOpts,
    date: Option<String>,
    machine: String,
    product: String,
    shift: String,
    operator: Option<String>,
    scheduled: f64,
    produced: f64,
    efficiency: f64,
    cycles: f64,
    scrap_kg: f64,
    notes: String,
) -> Result<()> {
    let session = open_session(global)?;

    let record = ProductionRecord {
        date: date.as_deref().map(parse_date).transpose()?,
        machine,
        product,
        shift,
        operator: operator.unwrap_or_else(|| session.config.operator()),
        scheduled,
        produced,
        efficiency,
        cycles,
        scrap_kg,
        notes,
    };
    record.validate().map_err(|e| miette::miette!("{}", e))?;

    session
        .mirror
        .append_production(&record)
        .map_err(|e| miette::miette!("{}", e))?;
    export_tables(&session.ctx, &session.mirror, &[TableKind::Production])
        .map_err(|e| miette::miette!("{}", e))?;

    if !global.quiet {
        println!(
            "{} Production record appended ({} × {})",
            style("✓").green(),
            format_qty(record.produced),
            record.product
        );
    }
    Ok(())
}

fn run_report(global: &GlobalOpts, filter: &FilterArgs) -> Result<()> {
    let session = open_session(global)?;
    let filter = filter.to_filter()?;
    let records = session
        .mirror
        .production_records()
        .map_err(|e| miette::miette!("{}", e))?;

    let eff = efficiency_by_operator(&records, &filter);
    let rows: Vec<Vec<String>> = eff
        .iter()
        .map(|e| vec![e.operator.clone(), format!("{:.2}%", e.efficiency_pct)])
        .collect();

    emit(
        global.format,
        &["Operator", "Efficiency"],
        &rows,
        serde_json::to_value(&eff).unwrap_or_default(),
    )
}

fn run_summary(global: &GlobalOpts, filter: &FilterArgs) -> Result<()> {
    let session = open_session(global)?;
    let filter = filter.to_filter()?;
    let records = session
        .mirror
        .production_records()
        .map_err(|e| miette::miette!("{}", e))?;

    let t = totals(&records, &filter);
    if global.format == OutputFormat::Table && !global.quiet {
        println!("{}", style("Totals").bold());
        println!("  Produced:        {}", format_qty(t.produced));
        match t.mean_efficiency_pct {
            Some(pct) => println!("  Mean efficiency: {:.2}%", pct),
            None => println!("  Mean efficiency: —"),
        }
        println!("  Cycles:          {}", format_qty(t.cycles));
        println!("  Scrap:           {} kg", format_qty(t.scrap_kg));
        println!();
    }

    let summary = product_summary(&records, &filter);
    let rows: Vec<Vec<String>> = summary
        .iter()
        .map(|s| {
            vec![
                s.product.clone(),
                format_qty(s.scheduled),
                format_qty(s.produced),
                format_qty(s.loss),
            ]
        })
        .collect();

    emit(
        global.format,
        &["Product", "Scheduled", "Produced", "Loss"],
        &rows,
        serde_json::json!({
            "totals": t,
            "products": summary,
        }),
    )
}

fn run_export(global: &GlobalOpts, output: Option<PathBuf>, filter: &FilterArgs) -> Result<()> {
    let session = open_session(global)?;
    let filter = filter.to_filter()?;
    let records = session
        .mirror
        .production_records()
        .map_err(|e| miette::miette!("{}", e))?;
    let selected = filter.apply(&records);

    let mut writer: csv::Writer<Box<dyn std::io::Write>> = match &output {
        Some(path) => csv::Writer::from_writer(Box::new(
            std::fs::File::create(path).map_err(|e| miette::miette!("{}", e))?,
        )),
        None => csv::Writer::from_writer(Box::new(std::io::stdout())),
    };

    writer
        .write_record(ProductionRecord::COLUMNS)
        .map_err(|e| miette::miette!("{}", e))?;
    for r in &selected {
        writer
            .write_record(&[
                r.date.map(|d| d.to_string()).unwrap_or_default(),
                r.machine.clone(),
                r.product.clone(),
                r.shift.clone(),
                r.operator.clone(),
                r.scheduled.to_string(),
                r.produced.to_string(),
                r.efficiency.to_string(),
                r.cycles.to_string(),
                r.scrap_kg.to_string(),
                r.notes.clone(),
            ])
            .map_err(|e| miette::miette!("{}", e))?;
    }
    writer.flush().map_err(|e| miette::miette!("{}", e))?;

    if let Some(path) = output {
        if !global.quiet {
            println!(
                "{} Exported {} record(s) to {}",
                style("✓").green(),
                selected.len(),
                path.display()
            );
        }
    }
    Ok(())
}
