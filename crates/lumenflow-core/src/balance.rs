use crate::model::LinkRow;
use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

/// Flow-conservation tolerance for intermediate nodes.
pub const DEFAULT_TOLERANCE: f64 = 1e-2;

/// Result of a conservation check. `ok` iff `not_balanced` is empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalanceReport {
    pub ok: bool,
    pub not_balanced: Vec<String>,
}

/// Checks flow conservation over intermediate nodes (positive inflow AND
/// positive outflow). Pure sources and pure sinks are exempt. Non-finite
/// amounts count as 0 at the point of aggregation; this never fails.
///
/// `not_balanced` follows first-seen order over the accumulated node ids:
/// every `to` endpoint in row order, then every `from` endpoint not already
/// seen.
pub fn compute_balance(rows: &[LinkRow]) -> BalanceReport {
    compute_balance_with_tolerance(rows, DEFAULT_TOLERANCE)
}

pub fn compute_balance_with_tolerance(rows: &[LinkRow], tolerance: f64) -> BalanceReport {
    let mut in_sum: IndexMap<&str, f64> = IndexMap::new();
    let mut out_sum: IndexMap<&str, f64> = IndexMap::new();

    for row in rows {
        let v = if row.current.is_finite() {
            row.current
        } else {
            0.0
        };
        *out_sum.entry(row.from.as_str()).or_insert(0.0) += v;
        *in_sum.entry(row.to.as_str()).or_insert(0.0) += v;
    }

    let mut seen: IndexSet<&str> = IndexSet::new();
    for id in in_sum.keys().chain(out_sum.keys()) {
        seen.insert(id);
    }

    let mut not_balanced = Vec::new();
    for id in &seen {
        let ins = in_sum.get(id).copied().unwrap_or(0.0);
        let outs = out_sum.get(id).copied().unwrap_or(0.0);

        let is_intermediate = ins > 0.0 && outs > 0.0;
        if !is_intermediate {
            continue;
        }

        if (ins - outs).abs() > tolerance {
            not_balanced.push((*id).to_string());
        }
    }

    BalanceReport {
        ok: not_balanced.is_empty(),
        not_balanced,
    }
}

/// Exact inflow for one node: the sum of `current` over rows with a matching
/// `to` endpoint.
pub fn inflow(rows: &[LinkRow], id: &str) -> f64 {
    rows.iter()
        .filter(|r| r.to == id)
        .map(|r| if r.current.is_finite() { r.current } else { 0.0 })
        .sum()
}

/// Exact outflow for one node: the sum of `current` over rows with a matching
/// `from` endpoint.
pub fn outflow(rows: &[LinkRow], id: &str) -> f64 {
    rows.iter()
        .filter(|r| r.from == id)
        .map(|r| if r.current.is_finite() { r.current } else { 0.0 })
        .sum()
}
