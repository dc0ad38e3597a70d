//! Domain records
//!
//! Typed rows for the mirror tables and their sheet codecs. Column presence
//! is validated here, once, at the sheet boundary: absent columns and empty
//! cells decode to defaults (missing data is never fatal), while cells that
//! are present but unusable (non-numeric quantities) abort the decode.

pub mod bom;
pub mod machine;
pub mod production;
pub mod stock;

use chrono::{DateTime, TimeZone, Utc};
use thiserror::Error;

pub use bom::{BomLine, ProductionOrder};
pub use machine::{MachineState, MachineStatus};
pub use production::ProductionRecord;
pub use stock::{Movement, StockItem, Warehouse};

use crate::core::workbook::Sheet;

/// Errors raised while decoding a sheet into typed records
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("sheet `{sheet}`, row {row}: column `{column}` is not numeric (found `{value}`)")]
    NonNumeric {
        sheet: String,
        row: usize,
        column: String,
        value: String,
    },
}

/// Text at (row, col); absent column or cell reads as empty.
pub(crate) fn text_at(sheet: &Sheet, row: usize, col: Option<usize>) -> String {
    match col {
        Some(c) => sheet.cell(row, c).to_text(),
        None => String::new(),
    }
}

/// Number at (row, col); absent column or empty cell reads as zero,
/// non-numeric content is a decode error.
pub(crate) fn number_at(
    sheet_name: &str,
    column: &str,
    sheet: &Sheet,
    row: usize,
    col: Option<usize>,
) -> Result<f64, SchemaError> {
    let Some(c) = col else {
        return Ok(0.0);
    };
    let cell = sheet.cell(row, c);
    if cell.is_empty() {
        return Ok(0.0);
    }
    cell.as_number().ok_or_else(|| SchemaError::NonNumeric {
        sheet: sheet_name.to_string(),
        // +2: 1-indexed plus the header row
        row: row + 2,
        column: column.to_string(),
        value: cell.to_text(),
    })
}

/// Lenient RFC 3339 parse with a fixed fallback for unusable values.
pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap())
}

/// Find the first of several header aliases in a sheet.
pub(crate) fn find_column(sheet: &Sheet, aliases: &[&str]) -> Option<usize> {
    aliases.iter().find_map(|name| sheet.column(name))
}
