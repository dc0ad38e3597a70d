//! Production log records

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::workbook::{Cell, Sheet};
use crate::entities::{find_column, number_at, text_at, SchemaError};

/// One production log row: what a machine ran on a shift and how it went.
///
/// `efficiency` is a ratio in `[0, 1]`; reports display it scaled by 100.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductionRecord {
    /// Missing or unparsable dates decode to `None`, mirroring the lenient
    /// coercion the workbook data has always received.
    pub date: Option<NaiveDate>,
    pub machine: String,
    pub product: String,
    pub shift: String,
    pub operator: String,
    pub scheduled: f64,
    pub produced: f64,
    pub efficiency: f64,
    pub cycles: f64,
    pub scrap_kg: f64,
    pub notes: String,
}

impl ProductionRecord {
    pub const COLUMNS: [&'static str; 11] = [
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
    ];

    /// Decode a production sheet. Aliases cover the legacy workbook headers
    /// (`Máquina`, `Programado`, `Kg Aparas`, ...).
    pub fn from_sheet(sheet_name: &str, sheet: &Sheet) -> Result<Vec<ProductionRecord>, SchemaError> {
        let date = find_column(sheet, &["date", "data"]);
        let machine = find_column(sheet, &["machine", "máquina", "maquina"]);
        let product = find_column(sheet, &["product", "produto"]);
        let shift = find_column(sheet, &["shift", "turno"]);
        let operator = find_column(sheet, &["operator", "operador"]);
        let scheduled = find_column(sheet, &["scheduled", "programado"]);
        let produced = find_column(sheet, &["produced", "realizado"]);
        let efficiency = find_column(sheet, &["efficiency", "eficiência", "eficiencia"]);
        let cycles = find_column(sheet, &["cycles", "ciclos"]);
        let scrap = find_column(sheet, &["scrap kg", "kg aparas", "scrap"]);
        let notes = find_column(sheet, &["notes", "observações", "observacoes"]);

        let mut records = Vec::with_capacity(sheet.len());
        for row in 0..sheet.len() {
            records.push(ProductionRecord {
                date: date.and_then(|c| parse_date_cell(sheet.cell(row, c))),
                machine: text_at(sheet, row, machine),
                product: text_at(sheet, row, product),
                shift: text_at(sheet, row, shift),
                operator: text_at(sheet, row, operator),
                scheduled: number_at(sheet_name, "Scheduled", sheet, row, scheduled)?,
                produced: number_at(sheet_name, "Produced", sheet, row, produced)?,
                efficiency: number_at(sheet_name, "Efficiency", sheet, row, efficiency)?,
                cycles: number_at(sheet_name, "Cycles", sheet, row, cycles)?,
                scrap_kg: number_at(sheet_name, "Scrap Kg", sheet, row, scrap)?,
                notes: text_at(sheet, row, notes),
            });
        }
        Ok(records)
    }

    pub fn to_sheet(records: &[ProductionRecord]) -> Sheet {
        let mut sheet = Sheet::new(Self::COLUMNS);
        for r in records {
            sheet.push_row(vec![
                match r.date {
                    Some(d) => Cell::Text(d.format("%Y-%m-%d").to_string()),
                    None => Cell::Empty,
                },
                Cell::from(r.machine.as_str()),
                Cell::from(r.product.as_str()),
                Cell::from(r.shift.as_str()),
                Cell::from(r.operator.as_str()),
                Cell::from(r.scheduled),
                Cell::from(r.produced),
                Cell::from(r.efficiency),
                Cell::from(r.cycles),
                Cell::from(r.scrap_kg),
                Cell::from(r.notes.as_str()),
            ]);
        }
        sheet
    }

    /// Check the row invariants: non-negative quantities, efficiency in
    /// `[0, 1]`.
    pub fn validate(&self) -> Result<(), String> {
        if self.scheduled < 0.0 || self.produced < 0.0 || self.scrap_kg < 0.0 || self.cycles < 0.0 {
            return Err("scheduled, produced, cycles and scrap must be non-negative".to_string());
        }
        if !(0.0..=1.0).contains(&self.efficiency) {
            return Err(format!(
                "efficiency must be a ratio between 0 and 1 (got {}); percentages are derived on display",
                self.efficiency
            ));
        }
        Ok(())
    }
}

/// Dates arrive as ISO text, day-first text, or Excel serial numbers.
/// Anything else coerces to `None`.
fn parse_date_cell(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Text(s) => {
            let s = s.trim();
            let date_part = s.split_whitespace().next().unwrap_or(s);
            NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
                .or_else(|_| NaiveDate::parse_from_str(date_part, "%d/%m/%Y"))
                .ok()
        }
        Cell::Number(n) => {
            // Excel serial date: days since 1899-12-30.
            let days = *n as i64;
            NaiveDate::from_ymd_opt(1899, 12, 30)
                .and_then(|base| base.checked_add_signed(chrono::Duration::days(days)))
        }
        _ => None,
    }
}
