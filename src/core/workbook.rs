//! Workbook sheet store
//!
//! Reads and writes named tabular sheets inside a single `.xlsx` file. The
//! writer (`rust_xlsxwriter`) can only produce whole workbooks, so replacing
//! a subset of sheets is done by reading every surviving sheet and rewriting
//! the file: survivors keep their position, replaced sheets keep their slot,
//! and new sheets are appended. The rewrite runs under the workbook lock.
//!
//! Read paths follow the degrade-to-empty rule: a missing or unreadable file
//! yields no sheets, an absent sheet name is simply omitted.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use calamine::{open_workbook, Data, Reader, Xlsx};
use thiserror::Error;

use crate::core::lock::{LockError, LockFile, LockSettings};

/// A single tabular cell. Dates are carried as text (RFC 3339 / ISO) or as
/// Excel serial numbers, whichever the source sheet used.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Render the cell as display text. Whole numbers drop the fraction.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Bool(b) => b.to_string(),
            Cell::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            Cell::Text(s) => s.clone(),
        }
    }

    /// Numeric view of the cell: numbers as-is, numeric text parsed.
    /// `None` for anything else.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            Cell::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }
}

impl From<f64> for Cell {
    fn from(n: f64) -> Self {
        Cell::Number(n)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        if s.is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s)
        }
    }
}

/// One named sheet's content: a header row plus data rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sheet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    /// Locate a column by header, case-insensitively and ignoring
    /// surrounding whitespace.
    pub fn column(&self, name: &str) -> Option<usize> {
        let wanted = name.trim().to_lowercase();
        self.columns
            .iter()
            .position(|c| c.trim().to_lowercase() == wanted)
    }

    /// Cell at (row, col); out-of-bounds reads are empty.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&Cell::Empty)
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}

/// Errors that can occur while rewriting the workbook
#[derive(Debug, Error)]
pub enum WorkbookError {
    #[error("failed to read workbook: {0}")]
    Read(#[from] calamine::XlsxError),

    #[error("failed to write workbook: {0}")]
    Write(#[from] rust_xlsxwriter::XlsxError),

    #[error(transparent)]
    Lock(#[from] LockError),
}

/// The lock marker path for a workbook: a `.lock` sibling of the file.
pub fn lock_path_for(workbook: &Path) -> PathBuf {
    let mut name = workbook
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "workbook".to_string());
    name.push_str(".lock");
    workbook.with_file_name(name)
}

/// List the sheet names in the workbook. Missing or unreadable file reads
/// as no sheets.
pub fn sheet_names(path: &Path) -> Vec<String> {
    if !path.exists() {
        return Vec::new();
    }
    match open_workbook::<Xlsx<_>, _>(path) {
        Ok(wb) => wb.sheet_names().to_owned(),
        Err(_) => Vec::new(),
    }
}

/// Read the named sheets that exist in the workbook. Absent names are
/// omitted; a missing or unreadable file yields an empty map.
pub fn read_sheets(path: &Path, names: &[String]) -> BTreeMap<String, Sheet> {
    let mut out = BTreeMap::new();
    if !path.exists() {
        return out;
    }
    let mut wb: Xlsx<_> = match open_workbook(path) {
        Ok(wb) => wb,
        Err(_) => return out,
    };
    let present = wb.sheet_names().to_owned();
    for name in names {
        if !present.contains(name) {
            continue;
        }
        if let Ok(range) = wb.worksheet_range(name) {
            out.insert(name.clone(), range_to_sheet(&range));
        }
    }
    out
}

/// Replace the given sheets in the workbook, preserving every other sheet's
/// content and position. Creates the file if it does not exist. Runs under
/// the workbook lock.
pub fn write_sheets(
    path: &Path,
    replacements: &[(String, Sheet)],
    lock: LockSettings,
) -> Result<(), WorkbookError> {
    let _guard = LockFile::acquire(&lock_path_for(path), lock)?;

    let mut ordered: Vec<(String, Sheet)> = Vec::new();
    let mut used = vec![false; replacements.len()];

    if path.exists() {
        // On the write path an unreadable existing file is an error: silently
        // treating it as empty would discard the sheets we must preserve.
        let mut wb: Xlsx<_> = open_workbook(path)?;
        for name in wb.sheet_names().to_owned() {
            if let Some(idx) = replacements.iter().position(|(n, _)| *n == name) {
                used[idx] = true;
                ordered.push(replacements[idx].clone());
            } else {
                let range = wb.worksheet_range(&name)?;
                ordered.push((name, range_to_sheet(&range)));
            }
        }
    }
    for (idx, pair) in replacements.iter().enumerate() {
        if !used[idx] {
            ordered.push(pair.clone());
        }
    }

    let mut book = rust_xlsxwriter::Workbook::new();
    for (name, sheet) in &ordered {
        let ws = book.add_worksheet();
        ws.set_name(name.as_str())?;
        for (c, col) in sheet.columns.iter().enumerate() {
            ws.write_string(0, c as u16, col.as_str())?;
        }
        for (r, row) in sheet.rows.iter().enumerate() {
            for (c, cell) in row.iter().enumerate() {
                let (row_n, col_n) = ((r + 1) as u32, c as u16);
                match cell {
                    Cell::Empty => {}
                    Cell::Bool(b) => {
                        ws.write_boolean(row_n, col_n, *b)?;
                    }
                    Cell::Number(n) => {
                        ws.write_number(row_n, col_n, *n)?;
                    }
                    Cell::Text(s) => {
                        ws.write_string(row_n, col_n, s.as_str())?;
                    }
                }
            }
        }
    }
    book.save(path)?;
    Ok(())
}

fn range_to_sheet(range: &calamine::Range<Data>) -> Sheet {
    let mut rows = range.rows();
    let columns = match rows.next() {
        Some(header) => header.iter().map(data_to_text).collect(),
        None => Vec::new(),
    };
    let mut sheet = Sheet {
        columns,
        rows: Vec::new(),
    };
    for row in rows {
        sheet.push_row(row.iter().map(data_to_cell).collect());
    }
    sheet
}

fn data_to_cell(value: &Data) -> Cell {
    match value {
        Data::Empty => Cell::Empty,
        Data::Bool(v) => Cell::Bool(*v),
        Data::Int(v) => Cell::Number(*v as f64),
        Data::Float(v) => Cell::Number(*v),
        Data::String(v) => Cell::Text(v.clone()),
        // Cell errors carry no tabular value; read as missing data.
        Data::Error(_) => Cell::Empty,
        Data::DateTime(v) => Cell::Number(v.as_f64()),
        Data::DateTimeIso(v) => Cell::Text(v.clone()),
        Data::DurationIso(v) => Cell::Text(v.clone()),
    }
}

fn data_to_text(value: &Data) -> String {
    data_to_cell(value).to_text()
}
