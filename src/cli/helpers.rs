//! Shared helpers for CLI commands

use chrono::NaiveDate;
use miette::Result;
use tabled::{builder::Builder, settings::Style};

use crate::cli::args::{GlobalOpts, OutputFormat};
use crate::core::config::Config;
use crate::core::mirror::Mirror;
use crate::core::plant::Plant;
use crate::core::sync::{open_mirror, SyncContext};

/// An opened workspace: plant, merged config, sync context and mirror.
pub struct Session {
    pub plant: Plant,
    pub config: Config,
    pub ctx: SyncContext,
    pub mirror: Mirror,
}

/// Resolve the workspace from `--plant` or by discovery.
pub fn open_plant(global: &GlobalOpts) -> Result<Plant> {
    match &global.plant {
        Some(path) => Plant::discover_from(path).map_err(|e| miette::miette!("{}", e)),
        None => Plant::discover().map_err(|e| miette::miette!("{}", e)),
    }
}

/// Open the workspace and its mirror, importing from the workbook on first
/// run.
pub fn open_session(global: &GlobalOpts) -> Result<Session> {
    let plant = open_plant(global)?;
    let config = Config::load(Some(&plant));
    let (mirror, imported) = open_mirror(&plant, &config).map_err(|e| miette::miette!("{}", e))?;

    if let Some(stats) = imported {
        if !global.quiet {
            println!(
                "→ First run: imported {} sheet(s), {} row(s) from the workbook",
                stats.sheets_imported, stats.rows_imported
            );
        }
    }

    let ctx = SyncContext::new(&plant, &config);
    Ok(Session {
        plant,
        config,
        ctx,
        mirror,
    })
}

/// Emit tabular rows in the requested format. `json` is the full-fidelity
/// payload for `--format json`.
pub fn emit(
    format: OutputFormat,
    columns: &[&str],
    rows: &[Vec<String>],
    json: serde_json::Value,
) -> Result<()> {
    match format {
        OutputFormat::Table => {
            let mut builder = Builder::default();
            builder.push_record(columns.iter().copied());
            for row in rows {
                builder.push_record(row.iter().map(String::as_str));
            }
            println!("{}", builder.build().with(Style::markdown()));
        }
        OutputFormat::Tsv => {
            println!("{}", columns.join("\t"));
            for row in rows {
                println!("{}", row.join("\t"));
            }
        }
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(std::io::stdout());
            writer
                .write_record(columns)
                .map_err(|e| miette::miette!("{}", e))?;
            for row in rows {
                writer
                    .write_record(row)
                    .map_err(|e| miette::miette!("{}", e))?;
            }
            writer.flush().map_err(|e| miette::miette!("{}", e))?;
        }
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json).map_err(|e| miette::miette!("{}", e))?
            );
        }
    }
    Ok(())
}

/// Quantities print without trailing zeros.
pub fn format_qty(qty: f64) -> String {
    if qty.fract() == 0.0 && qty.abs() < 1e15 {
        format!("{}", qty as i64)
    } else {
        format!("{:.3}", qty)
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}

/// Parse a `YYYY-MM-DD` or `DD/MM/YYYY` date argument.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%d/%m/%Y"))
        .map_err(|_| miette::miette!("Invalid date: {}. Use YYYY-MM-DD", s))
}

/// Truncate long free text for table cells
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_qty() {
        assert_eq!(format_qty(5.0), "5");
        assert_eq!(format_qty(2.5), "2.5");
        assert_eq!(format_qty(0.125), "0.125");
        assert_eq!(format_qty(-3.0), "-3");
    }

    #[test]
    fn test_parse_date_accepts_both_forms() {
        assert_eq!(
            parse_date("2025-03-10").unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
        );
        assert_eq!(
            parse_date("10/03/2025").unwrap(),
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
        );
        assert!(parse_date("soon").is_err());
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("short", 10), "short");
        assert_eq!(truncate_str("a longer sentence", 10), "a longe...");
    }
}
