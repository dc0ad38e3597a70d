//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    completions::CompletionsArgs,
    init::InitArgs,
    machine::MachineCommands,
    mov::MovCommands,
    order::OrderCommands,
    prod::ProdCommands,
    stock::StockCommands,
    sync::SyncCommands,
};

#[derive(Parser)]
#[command(name = "plantops")]
#[command(author, version, about = "Plant Ops Toolkit")]
#[command(
    long_about = "A toolkit for keeping a plant's production and inventory records in sync between an Excel workbook and a local SQLite mirror."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format for list commands
    #[arg(long, short = 'f', global = true, default_value = "table")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Workspace root (default: auto-detect by finding .plantops/)
    #[arg(long, global = true)]
    pub plant: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new plantops workspace
    Init(InitArgs),

    /// Workbook ⇄ mirror synchronization
    #[command(subcommand)]
    Sync(SyncCommands),

    /// Stock table management
    #[command(subcommand)]
    Stock(StockCommands),

    /// Stock movement ledger (receipts and issues)
    #[command(subcommand)]
    Mov(MovCommands),

    /// Production orders with BOM-driven material consumption
    #[command(subcommand)]
    Order(OrderCommands),

    /// Production log and KPI reports
    #[command(subcommand)]
    Prod(ProdCommands),

    /// Per-machine status board
    #[command(subcommand)]
    Machine(MachineCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Markdown table
    #[default]
    Table,
    /// Tab-separated values (for piping)
    Tsv,
    /// CSV format (for spreadsheets)
    Csv,
    /// JSON format (for programming)
    Json,
}
