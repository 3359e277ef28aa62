use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Reserved separator for link keys. An arrow is not expected inside node
/// ids; the key stays splittable back into its ordered endpoint pair.
pub const LINK_SEPARATOR: &str = "→";

pub const DEFAULT_NODE_FILL: &str = "#111827";
pub const DEFAULT_LINK_STROKE: &str = "#9ca3af";
pub const DEFAULT_LINK_OPACITY: f64 = 0.45;

/// The one canonical key-construction function for per-link style entries.
pub fn link_key(source: &str, target: &str) -> String {
    format!("{source}{LINK_SEPARATOR}{target}")
}

/// Decomposes a link key back into its `(source, target)` pair.
pub fn split_link_key(key: &str) -> Option<(&str, &str)> {
    key.split_once(LINK_SEPARATOR)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeStyle {
    pub fill: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkStyle {
    pub stroke: String,
    pub opacity: f64,
}

impl Default for LinkStyle {
    fn default() -> Self {
        Self {
            stroke: DEFAULT_LINK_STROKE.to_string(),
            opacity: DEFAULT_LINK_OPACITY,
        }
    }
}

/// Ordered style tables keyed by node id / link key. Keys are derived
/// identifiers; the key material is never duplicated inside the value.
pub type NodeStyles = IndexMap<String, NodeStyle>;
pub type LinkStyles = IndexMap<String, LinkStyle>;

/// Default link stroke when no per-link style exists, keyed off the target
/// name: profit-like targets render green, cost-like targets red.
pub fn default_link_stroke(target: &str) -> &'static str {
    let t = target.to_lowercase();
    if t.contains("profit") {
        return "#16a34a";
    }
    if t.contains("expense") || t.contains("cost") || t.contains("tax") {
        return "#e11d48";
    }
    DEFAULT_LINK_STROKE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_key_round_trips_through_split() {
        let key = link_key("Product A", "Revenue");
        assert_eq!(key, "Product A→Revenue");
        assert_eq!(split_link_key(&key), Some(("Product A", "Revenue")));
    }

    #[test]
    fn distinct_ordered_pairs_produce_distinct_keys() {
        assert_ne!(link_key("A", "B"), link_key("B", "A"));
        assert_ne!(link_key("A", "B"), link_key("A", "C"));
    }

    #[test]
    fn default_stroke_heuristic_matches_target_names() {
        assert_eq!(default_link_stroke("Gross profit"), "#16a34a");
        assert_eq!(default_link_stroke("Cost of revenue"), "#e11d48");
        assert_eq!(default_link_stroke("Operating expenses"), "#e11d48");
        assert_eq!(default_link_stroke("Tax"), "#e11d48");
        assert_eq!(default_link_stroke("Revenue"), DEFAULT_LINK_STROKE);
    }
}
