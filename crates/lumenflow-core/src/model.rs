use crate::{Error, Result};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// One editable row of the flow table.
///
/// `comparison: None` means "no prior-period data" and suppresses the
/// year-over-year metric for flows into the target; `Some(0.0)` participates
/// in the YoY aggregation like any other amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRow {
    pub from: String,
    pub to: String,
    pub current: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison: Option<f64>,
}

impl LinkRow {
    pub fn new(from: impl Into<String>, to: impl Into<String>, current: f64) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            current,
            comparison: None,
        }
    }

    pub fn with_comparison(mut self, comparison: f64) -> Self {
        self.comparison = Some(comparison);
        self
    }

    /// A row enters the diagram only with non-blank endpoints and a positive
    /// current amount. Invalid rows stay editable but are not drawn.
    pub fn is_diagrammable(&self) -> bool {
        !self.from.trim().is_empty() && !self.to.trim().is_empty() && self.current > 0.0
    }
}

/// A directed weighted link derived from a valid row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowLink {
    pub source: String,
    pub target: String,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison: Option<f64>,
}

/// Node ids plus filtered links, derived wholesale from the row list.
///
/// Nodes are never stored independently: the node set is exactly the union of
/// endpoint ids over diagrammable rows, in first-appearance order (`from`
/// before `to`, row order preserved). Duplicate `(from, to)` pairs are kept
/// as parallel links; merging them is the layout consumer's call.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FlowGraph {
    pub nodes: Vec<String>,
    pub links: Vec<FlowLink>,
}

impl FlowGraph {
    pub fn from_rows(rows: &[LinkRow]) -> Self {
        let mut nodes: IndexSet<String> = IndexSet::new();
        let mut links = Vec::new();

        for row in rows {
            if !row.is_diagrammable() {
                continue;
            }
            nodes.insert(row.from.clone());
            nodes.insert(row.to.clone());
            links.push(FlowLink {
                source: row.from.clone(),
                target: row.to.clone(),
                value: row.current,
                comparison: row.comparison,
            });
        }

        Self {
            nodes: nodes.into_iter().collect(),
            links,
        }
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n == id)
    }

    pub fn contains_link(&self, source: &str, target: &str) -> bool {
        self.links
            .iter()
            .any(|l| l.source == source && l.target == target)
    }
}

/// Clamps user-entered amounts: non-finite or negative values become 0.
pub fn clamp_amount(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Parses a current-amount input. Unparseable text clamps to 0, never errors.
pub fn parse_amount(raw: &str) -> f64 {
    clamp_amount(raw.trim().parse::<f64>().unwrap_or(0.0))
}

/// Parses a comparison-amount input. Blank means absent, not zero.
pub fn parse_comparison(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(clamp_amount(trimmed.parse::<f64>().unwrap_or(0.0)))
}

/// Decodes a rows document (a JSON array of [`LinkRow`]).
pub fn rows_from_json(text: &str) -> Result<Vec<LinkRow>> {
    serde_json::from_str(text).map_err(|err| Error::InvalidRows {
        message: err.to_string(),
    })
}

pub fn rows_to_json(rows: &[LinkRow]) -> Result<String> {
    serde_json::to_string_pretty(rows).map_err(|err| Error::InvalidRows {
        message: err.to_string(),
    })
}

/// The demo income-statement scenario used by the editor on first load.
pub fn sample_rows() -> Vec<LinkRow> {
    vec![
        LinkRow::new("Product A", "Revenue", 35.0).with_comparison(30.0),
        LinkRow::new("Product B", "Revenue", 10.0).with_comparison(11.0),
        LinkRow::new("Product C", "Revenue", 5.0).with_comparison(4.0),
        LinkRow::new("Revenue", "Gross profit", 30.0).with_comparison(26.0),
        LinkRow::new("Revenue", "Cost of revenue", 20.0).with_comparison(19.0),
        LinkRow::new("Gross profit", "Operating profit", 15.0).with_comparison(12.0),
        LinkRow::new("Gross profit", "Operating expenses", 15.0).with_comparison(14.0),
        LinkRow::new("Operating profit", "Net profit", 10.0).with_comparison(8.0),
        LinkRow::new("Operating profit", "Tax", 5.0).with_comparison(4.0),
    ]
}
