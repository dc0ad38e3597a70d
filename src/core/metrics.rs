//! Production KPI aggregation
//!
//! The aggregations behind the dashboard numbers: efficiency by operator,
//! per-product scheduled/produced/loss, and period totals. Every function
//! applies the same filter before aggregating, so a displayed number always
//! matches the rows the filter selected and nothing else.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::entities::ProductionRecord;

/// Row filter for production aggregations. Empty fields mean "no
/// restriction"; the date range is inclusive and excludes undated rows.
#[derive(Debug, Clone, Default)]
pub struct ProductionFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub machines: Vec<String>,
    pub products: Vec<String>,
    pub shifts: Vec<String>,
    pub operators: Vec<String>,
}

impl ProductionFilter {
    pub fn matches(&self, record: &ProductionRecord) -> bool {
        if self.from.is_some() || self.to.is_some() {
            let Some(date) = record.date else {
                return false;
            };
            if let Some(from) = self.from {
                if date < from {
                    return false;
                }
            }
            if let Some(to) = self.to {
                if date > to {
                    return false;
                }
            }
        }
        if !self.machines.is_empty() && !self.machines.contains(&record.machine) {
            return false;
        }
        if !self.products.is_empty() && !self.products.contains(&record.product) {
            return false;
        }
        if !self.shifts.is_empty() && !self.shifts.contains(&record.shift) {
            return false;
        }
        if !self.operators.is_empty() && !self.operators.contains(&record.operator) {
            return false;
        }
        true
    }

    pub fn apply<'a>(&self, records: &'a [ProductionRecord]) -> Vec<&'a ProductionRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

/// Mean efficiency per operator, as a percentage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperatorEfficiency {
    pub operator: String,
    pub efficiency_pct: f64,
}

/// Average efficiency per operator ×100, highest first (ties break on
/// operator name for stable output).
pub fn efficiency_by_operator(
    records: &[ProductionRecord],
    filter: &ProductionFilter,
) -> Vec<OperatorEfficiency> {
    let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for record in filter.apply(records) {
        let entry = sums.entry(record.operator.as_str()).or_insert((0.0, 0));
        entry.0 += record.efficiency;
        entry.1 += 1;
    }

    let mut out: Vec<OperatorEfficiency> = sums
        .into_iter()
        .map(|(operator, (sum, count))| OperatorEfficiency {
            operator: operator.to_string(),
            efficiency_pct: sum / count as f64 * 100.0,
        })
        .collect();
    out.sort_by(|a, b| {
        b.efficiency_pct
            .partial_cmp(&a.efficiency_pct)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.operator.cmp(&b.operator))
    });
    out
}

/// Scheduled/produced/loss totals for one product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSummary {
    pub product: String,
    pub scheduled: f64,
    pub produced: f64,
    pub loss: f64,
}

/// Per-product totals, largest scheduled first. Loss clips at zero: a
/// product that over-produced has no loss.
pub fn product_summary(
    records: &[ProductionRecord],
    filter: &ProductionFilter,
) -> Vec<ProductSummary> {
    let mut sums: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    for record in filter.apply(records) {
        let entry = sums.entry(record.product.as_str()).or_insert((0.0, 0.0));
        entry.0 += record.scheduled;
        entry.1 += record.produced;
    }

    let mut out: Vec<ProductSummary> = sums
        .into_iter()
        .map(|(product, (scheduled, produced))| ProductSummary {
            product: product.to_string(),
            scheduled,
            produced,
            loss: (scheduled - produced).max(0.0),
        })
        .collect();
    out.sort_by(|a, b| {
        b.scheduled
            .partial_cmp(&a.scheduled)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.product.cmp(&b.product))
    });
    out
}

/// Period totals for the KPI header.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProductionTotals {
    pub produced: f64,
    /// Mean efficiency as a percentage; `None` with no rows.
    pub mean_efficiency_pct: Option<f64>,
    pub cycles: f64,
    pub scrap_kg: f64,
}

pub fn totals(records: &[ProductionRecord], filter: &ProductionFilter) -> ProductionTotals {
    let rows = filter.apply(records);
    if rows.is_empty() {
        return ProductionTotals::default();
    }
    let mut out = ProductionTotals {
        mean_efficiency_pct: None,
        ..Default::default()
    };
    let mut efficiency_sum = 0.0;
    for record in &rows {
        out.produced += record.produced;
        out.cycles += record.cycles;
        out.scrap_kg += record.scrap_kg;
        efficiency_sum += record.efficiency;
    }
    out.mean_efficiency_pct = Some(efficiency_sum / rows.len() as f64 * 100.0);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(
        date: (i32, u32, u32),
        machine: &str,
        product: &str,
        operator: &str,
        scheduled: f64,
        produced: f64,
        efficiency: f64,
    ) -> ProductionRecord {
        ProductionRecord {
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2),
            machine: machine.to_string(),
            product: product.to_string(),
            shift: "1".to_string(),
            operator: operator.to_string(),
            scheduled,
            produced,
            efficiency,
            cycles: 100.0,
            scrap_kg: 0.5,
            notes: String::new(),
        }
    }

    fn sample() -> Vec<ProductionRecord> {
        vec![
            record((2025, 3, 1), "M-A", "P1", "Ana", 100.0, 90.0, 0.9),
            record((2025, 3, 2), "M-A", "P1", "Ana", 100.0, 70.0, 0.7),
            record((2025, 3, 2), "M-B", "P2", "Bruno", 50.0, 60.0, 0.95),
        ]
    }

    #[test]
    fn test_efficiency_by_operator_scales_by_100() {
        let records = sample();
        let eff = efficiency_by_operator(&records, &ProductionFilter::default());

        assert_eq!(eff.len(), 2);
        assert_eq!(eff[0].operator, "Bruno");
        assert!((eff[0].efficiency_pct - 95.0).abs() < 1e-9);
        assert_eq!(eff[1].operator, "Ana");
        assert!((eff[1].efficiency_pct - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_filters_restrict_aggregation_exactly() {
        let records = sample();
        let filter = ProductionFilter {
            operators: vec!["Ana".to_string()],
            ..Default::default()
        };
        let eff = efficiency_by_operator(&records, &filter);
        assert_eq!(eff.len(), 1);
        assert!((eff[0].efficiency_pct - 80.0).abs() < 1e-9);

        let filter = ProductionFilter {
            from: NaiveDate::from_ymd_opt(2025, 3, 2),
            ..Default::default()
        };
        let t = totals(&records, &filter);
        assert_eq!(t.produced, 130.0);
    }

    #[test]
    fn test_undated_rows_fall_out_of_date_filters() {
        let mut records = sample();
        records[0].date = None;
        let filter = ProductionFilter {
            from: NaiveDate::from_ymd_opt(2025, 1, 1),
            ..Default::default()
        };
        assert_eq!(filter.apply(&records).len(), 2);
    }

    #[test]
    fn test_product_summary_clips_loss_at_zero() {
        let records = sample();
        let summary = product_summary(&records, &ProductionFilter::default());

        assert_eq!(summary[0].product, "P1");
        assert_eq!(summary[0].scheduled, 200.0);
        assert_eq!(summary[0].produced, 160.0);
        assert_eq!(summary[0].loss, 40.0);
        // P2 over-produced; loss clips to zero.
        assert_eq!(summary[1].loss, 0.0);
    }

    #[test]
    fn test_totals_empty_has_no_mean() {
        let t = totals(&[], &ProductionFilter::default());
        assert_eq!(t.mean_efficiency_pct, None);
        assert_eq!(t.produced, 0.0);
    }
}
