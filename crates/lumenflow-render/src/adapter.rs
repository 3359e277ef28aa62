use lumenflow_layout::{LayoutGraph, LayoutParams, SankeyLayout, layout};
use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::Result;

/// Memoizing boundary in front of the layout solver.
///
/// Presentation state changes far more often than graph structure: selecting
/// a node, recoloring a link, or panning the viewport must not re-run the
/// relaxation passes. The adapter keys one cached layout on a structural hash
/// of everything positions actually depend on (node ids in order, link
/// endpoints and values, the extent and sizing parameters) and hands out the
/// same `Arc` until that key changes.
#[derive(Debug, Default)]
pub struct LayoutAdapter {
    cache: Option<(u64, Arc<SankeyLayout>)>,
}

impl LayoutAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the layout for `graph` under `params`, recomputing only when
    /// the structural key differs from the cached one.
    pub fn layout(&mut self, graph: &LayoutGraph, params: &LayoutParams) -> Result<Arc<SankeyLayout>> {
        let key = structural_key(graph, params);
        if let Some((cached_key, cached)) = &self.cache {
            if *cached_key == key {
                tracing::trace!(key, "layout cache hit");
                return Ok(Arc::clone(cached));
            }
        }
        tracing::debug!(
            nodes = graph.nodes.len(),
            links = graph.links.len(),
            "layout recomputed"
        );
        let computed = Arc::new(layout(graph, params)?);
        self.cache = Some((key, Arc::clone(&computed)));
        Ok(computed)
    }

    pub fn invalidate(&mut self) {
        self.cache = None;
    }
}

fn structural_key(graph: &LayoutGraph, params: &LayoutParams) -> u64 {
    let mut hasher = FxHasher::default();
    graph.nodes.len().hash(&mut hasher);
    for id in &graph.nodes {
        id.hash(&mut hasher);
    }
    graph.links.len().hash(&mut hasher);
    for link in &graph.links {
        link.source.hash(&mut hasher);
        link.target.hash(&mut hasher);
        link.value.to_bits().hash(&mut hasher);
    }
    params.extent.x0.to_bits().hash(&mut hasher);
    params.extent.y0.to_bits().hash(&mut hasher);
    params.extent.x1.to_bits().hash(&mut hasher);
    params.extent.y1.to_bits().hash(&mut hasher);
    params.node_width.to_bits().hash(&mut hasher);
    params.node_padding.to_bits().hash(&mut hasher);
    (params.align as u8).hash(&mut hasher);
    params.iterations.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumenflow_layout::{Extent, WeightedLink};

    fn graph() -> LayoutGraph {
        LayoutGraph {
            nodes: vec!["A".into(), "B".into(), "C".into()],
            links: vec![
                WeightedLink {
                    source: "A".into(),
                    target: "B".into(),
                    value: 10.0,
                },
                WeightedLink {
                    source: "B".into(),
                    target: "C".into(),
                    value: 10.0,
                },
            ],
        }
    }

    fn params() -> LayoutParams {
        LayoutParams::new(Extent::new(40.0, 60.0, 860.0, 500.0))
    }

    #[test]
    fn identical_inputs_reuse_the_cached_layout() {
        let mut adapter = LayoutAdapter::new();
        let first = adapter.layout(&graph(), &params()).unwrap();
        let second = adapter.layout(&graph(), &params()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn value_change_invalidates_the_cache() {
        let mut adapter = LayoutAdapter::new();
        let first = adapter.layout(&graph(), &params()).unwrap();

        let mut changed = graph();
        changed.links[0].value = 11.0;
        let second = adapter.layout(&changed, &params()).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn extent_change_invalidates_the_cache() {
        let mut adapter = LayoutAdapter::new();
        let first = adapter.layout(&graph(), &params()).unwrap();

        let resized = LayoutParams::new(Extent::new(40.0, 60.0, 1240.0, 700.0));
        let second = adapter.layout(&graph(), &resized).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_ne!(first.extent, second.extent);
    }

    #[test]
    fn rename_produces_a_fresh_layout() {
        let mut adapter = LayoutAdapter::new();
        let first = adapter.layout(&graph(), &params()).unwrap();

        let mut renamed = graph();
        renamed.nodes[0] = "Alpha".into();
        renamed.links[0].source = "Alpha".into();
        let second = adapter.layout(&renamed, &params()).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(second.nodes[0].id, "Alpha");
        // Geometry is untouched by a pure rename.
        assert_eq!(first.nodes[0].y0, second.nodes[0].y0);
        assert_eq!(first.links[0].width, second.links[0].width);
    }
}
