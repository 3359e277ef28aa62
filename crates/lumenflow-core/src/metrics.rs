use crate::model::LinkRow;
use indexmap::IndexMap;

/// Per-node incoming totals, aggregated over every row's `to` endpoint.
///
/// The comparison total only exists for nodes with at least one inbound row
/// carrying prior-period data; an absent comparison never contributes, so a
/// node fed exclusively by comparison-less rows has no YoY metric at all,
/// while an explicit 0 yields a defined (guarded) ratio.
#[derive(Debug, Clone, Default)]
pub struct NodeTotals {
    in_current: IndexMap<String, f64>,
    in_comparison: IndexMap<String, f64>,
}

impl NodeTotals {
    pub fn from_rows(rows: &[LinkRow]) -> Self {
        let mut totals = Self::default();
        for row in rows {
            let v = if row.current.is_finite() {
                row.current
            } else {
                0.0
            };
            *totals.in_current.entry(row.to.clone()).or_insert(0.0) += v;
            if let Some(comparison) = row.comparison.filter(|c| c.is_finite()) {
                *totals.in_comparison.entry(row.to.clone()).or_insert(0.0) += comparison;
            }
        }
        totals
    }

    pub fn current(&self, id: &str) -> f64 {
        self.in_current.get(id).copied().unwrap_or(0.0)
    }

    pub fn comparison(&self, id: &str) -> Option<f64> {
        self.in_comparison.get(id).copied()
    }

    /// Year-over-year growth in percent, defined only when the comparison
    /// total exists and is positive.
    pub fn yoy_percent(&self, id: &str) -> Option<f64> {
        let comparison = self.comparison(id)?;
        if comparison > 0.0 {
            Some((self.current(id) - comparison) / comparison * 100.0)
        } else {
            None
        }
    }
}

// Rounds like JS `Math.round` (ties toward +inf), which the label formats
// were calibrated against.
fn js_round(v: f64) -> i64 {
    (v + 0.5).floor() as i64
}

pub fn fmt_money(v: f64) -> String {
    format!("${}M", js_round(v))
}

pub fn fmt_yoy(percent: f64) -> String {
    format!("{}% Y/Y", js_round(percent))
}
