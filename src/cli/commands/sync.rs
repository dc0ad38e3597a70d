//! `plantops sync` - Workbook ⇄ mirror synchronization

use clap::Subcommand;
use console::style;
use dialoguer::Confirm;
use miette::Result;

use crate::cli::args::GlobalOpts;
use crate::cli::helpers::{open_plant, open_session};
use crate::core::config::Config;
use crate::core::mirror::TableKind;
use crate::core::sync::{bootstrap_import, export_tables, SyncContext};
use crate::core::workbook;

#[derive(Subcommand, Debug)]
pub enum SyncCommands {
    /// Import workbook sheets into the mirror (overwrites mirror tables)
    Import {
        /// Skip the confirmation prompt
        #[arg(long)]
        force: bool,
    },

    /// Export mirror tables to the workbook
    Export {
        /// Table to export (default: all)
        table: Option<String>,
    },

    /// Show sync state: paths, detected sheets, table row counts
    Status,
}

pub fn run(cmd: SyncCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        SyncCommands::Import { force } => run_import(global, force),
        SyncCommands::Export { table } => run_export(global, table),
        SyncCommands::Status => run_status(global),
    }
}

fn run_import(global: &GlobalOpts, force: bool) -> Result<()> {
    let plant = open_plant(global)?;
    let config = Config::load(Some(&plant));
    let ctx = SyncContext::new(&plant, &config);

    let mirror_exists = config.mirror_path(&plant).exists();
    if mirror_exists && !force {
        let proceed = Confirm::new()
            .with_prompt("The mirror already has data; importing overwrites its tables. Continue?")
            .default(false)
            .interact()
            .map_err(|e| miette::miette!("{}", e))?;
        if !proceed {
            println!("Aborted.");
            return Ok(());
        }
    }

    let mut mirror =
        crate::core::mirror::Mirror::open(&config.mirror_path(&plant)).map_err(|e| miette::miette!("{}", e))?;
    let stats = bootstrap_import(&ctx, &mut mirror).map_err(|e| miette::miette!("{}", e))?;

    if !global.quiet {
        println!(
            "{} Imported {} sheet(s), {} row(s)",
            style("✓").green(),
            stats.sheets_imported,
            stats.rows_imported
        );
        if stats.sheets_missing > 0 {
            println!(
                "  {} sheet(s) not found in the workbook; their tables were left untouched",
                stats.sheets_missing
            );
        }
    }
    Ok(())
}

fn run_export(global: &GlobalOpts, table: Option<String>) -> Result<()> {
    let session = open_session(global)?;

    let tables: Vec<TableKind> = match table {
        Some(name) => vec![name
            .parse::<TableKind>()
            .map_err(|e| miette::miette!("{}", e))?],
        None => TableKind::ALL.to_vec(),
    };

    export_tables(&session.ctx, &session.mirror, &tables)
        .map_err(|e| miette::miette!("{}", e))?;

    if !global.quiet {
        for t in &tables {
            println!(
                "{} Exported {} → sheet `{}`",
                style("✓").green(),
                t,
                session.ctx.sheets.sheet_for(*t)
            );
        }
    }
    Ok(())
}

fn run_status(global: &GlobalOpts) -> Result<()> {
    let session = open_session(global)?;

    println!("{}", style("Sync Status").bold());
    println!("{}", style("─".repeat(40)).dim());
    println!("  Workbook: {}", session.ctx.workbook.display());
    println!(
        "  Mirror:   {}",
        session.config.mirror_path(&session.plant).display()
    );

    let detected = workbook::sheet_names(&session.ctx.workbook);
    if detected.is_empty() {
        println!("  Sheets:   (workbook missing or unreadable)");
    } else {
        println!("  Sheets:   {}", detected.join(", "));
    }

    println!();
    println!("  {}", style("Mirror tables:").bold());
    let counts = session
        .mirror
        .table_counts()
        .map_err(|e| miette::miette!("{}", e))?;
    for (kind, n) in counts {
        let sheet = session.ctx.sheets.sheet_for(kind);
        let present = detected.iter().any(|s| s == sheet);
        let marker = if present {
            style("↔").green()
        } else {
            style("∅").dim()
        };
        println!("    {:<16} {:>6} row(s)  {} sheet `{}`", kind.table(), n, marker, sheet);
    }

    Ok(())
}
