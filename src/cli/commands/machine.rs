//! `plantops machine` - Per-machine status board

use chrono::Utc;
use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::args::GlobalOpts;
use crate::cli::helpers::{emit, open_session};
use crate::entities::{MachineState, MachineStatus};

#[derive(Subcommand, Debug)]
pub enum MachineCommands {
    /// Show the status board
    List,

    /// Update one machine's status (upsert, keyed by machine name)
    Set {
        /// Machine name
        machine: String,

        /// Product code currently running
        #[arg(long, default_value = "")]
        product: String,

        /// Operator (default: configured operator)
        #[arg(long)]
        operator: Option<String>,

        /// One of: in_injection, breakdown, setup, stopped
        #[arg(long, default_value = "in_injection")]
        status: String,
    },
}

pub fn run(cmd: MachineCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        MachineCommands::List => run_list(global),
        MachineCommands::Set {
            machine,
            product,
            operator,
            status,
        } => run_set(global, machine, product, operator, &status),
    }
}

fn styled_state(state: MachineState) -> String {
    match state {
        MachineState::InInjection => style(state.label()).green().to_string(),
        MachineState::Breakdown => style(state.label()).red().to_string(),
        MachineState::Setup => style(state.label()).yellow().to_string(),
        MachineState::Stopped => style(state.label()).dim().to_string(),
    }
}

fn run_list(global: &GlobalOpts) -> Result<()> {
    let session = open_session(global)?;
    let statuses = session
        .mirror
        .machine_statuses()
        .map_err(|e| miette::miette!("{}", e))?;

    let rows: Vec<Vec<String>> = statuses
        .iter()
        .map(|s| {
            vec![
                s.machine.clone(),
                styled_state(s.status),
                s.product.clone(),
                s.operator.clone(),
                s.updated_at.format("%Y-%m-%d %H:%M").to_string(),
            ]
        })
        .collect();

    emit(
        global.format,
        &["Machine", "Status", "Product", "Operator", "Updated"],
        &rows,
        serde_json::to_value(&statuses).unwrap_or_default(),
    )
}

fn run_set(
    global: &GlobalOpts,
    machine: String,
    product: String,
    operator: Option<String>,
    status: &str,
) -> Result<()> {
    let session = open_session(global)?;
    let state = status
        .parse::<MachineState>()
        .map_err(|e| miette::miette!("{}", e))?;

    let status = MachineStatus {
        machine,
        product,
        operator: operator.unwrap_or_else(|| session.config.operator()),
        status: state,
        updated_at: Utc::now(),
    };
    session
        .mirror
        .upsert_machine(&status)
        .map_err(|e| miette::miette!("{}", e))?;

    if !global.quiet {
        println!(
            "{} {} → {}",
            style("✓").green(),
            status.machine,
            styled_state(status.status)
        );
    }
    Ok(())
}
