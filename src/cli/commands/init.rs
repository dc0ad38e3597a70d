//! `plantops init` - Create a new workspace

use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::core::plant::Plant;

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    pub path: Option<PathBuf>,
}

pub fn run(args: InitArgs) -> Result<()> {
    let path = args.path.unwrap_or_else(|| PathBuf::from("."));
    let plant = Plant::init(&path).map_err(|e| miette::miette!("{}", e))?;

    println!(
        "{} Initialized plantops workspace at {}",
        style("✓").green(),
        plant.root().display()
    );
    println!();
    println!("Next steps:");
    println!("  1. Drop your workbook next to .plantops/ (default name: plant.xlsx)");
    println!("  2. Adjust sheet names in .plantops/config.yaml if needed");
    println!("  3. Run 'plantops sync import' or just start working; the first");
    println!("     command imports the workbook automatically");

    Ok(())
}
