//! Scene assembly: positions from the layout, everything else from the
//! snapshot.

use lumenflow_core::metrics::{NodeTotals, fmt_money, fmt_yoy};
use lumenflow_core::model::LinkRow;
use lumenflow_core::overlay::TooltipContent;
use lumenflow_core::snapshot::{Selection, Snapshot};
use lumenflow_core::style::{
    DEFAULT_LINK_OPACITY, DEFAULT_NODE_FILL, default_link_stroke, link_key,
};
use lumenflow_core::viewport::Transform;
use lumenflow_layout::{Extent, LayoutGraph, LayoutParams, Margins, WeightedLink};
use serde::Serialize;

use crate::adapter::LayoutAdapter;
use crate::Result;

pub const MARGINS: Margins = Margins {
    top: 60.0,
    right: 40.0,
    bottom: 40.0,
    left: 40.0,
};

pub const MIN_WIDTH: f64 = 480.0;
pub const FALLBACK_WIDTH: f64 = 900.0;

const LABEL_OFFSET: f64 = 8.0;
pub(crate) const SELECTION_STROKE: &str = "#fbbf24";
pub(crate) const LABEL_FILL: &str = "#111827";
pub(crate) const WATERMARK_FILL: &str = "#9ca3af";
pub(crate) const SHIMMER_STROKE: &str = "#f9fafb";
const WATERMARK: &str = "created with lumenflow";

/// Canvas size derived from the hosting container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartDimensions {
    pub width: f64,
    pub height: f64,
}

impl ChartDimensions {
    /// Width is the container width floored at [`MIN_WIDTH`] (an unmeasured
    /// container falls back to [`FALLBACK_WIDTH`]); height follows a 0.6
    /// aspect ratio with a mode-dependent minimum.
    pub fn from_container(container_width: f64, fullscreen: bool) -> Self {
        let base = if container_width > 0.0 {
            container_width
        } else {
            FALLBACK_WIDTH
        };
        let width = base.max(MIN_WIDTH);
        let floor = if fullscreen { 480.0 } else { 420.0 };
        let height = (width * 0.6).round().max(floor);
        Self { width, height }
    }

    pub fn extent(&self) -> Extent {
        Extent::from_canvas(self.width, self.height, MARGINS)
    }
}

/// One node rectangle plus its resolved fill, selection flag, and label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneNode {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub fill: String,
    pub selected: bool,
    /// Label block: node id, then incoming total, then YoY, each line only
    /// when it carries information.
    pub label_lines: Vec<String>,
    pub label_x: f64,
    pub label_y: f64,
    /// Labels sit outside the rectangle, on whichever side faces the chart
    /// center; right-half nodes anchor text at its end.
    pub label_anchor_end: bool,
}

/// One link ribbon with its resolved stroke and emphasis already applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneLink {
    pub source: String,
    pub target: String,
    pub path: String,
    pub stroke: String,
    pub stroke_width: f64,
    pub stroke_opacity: f64,
    pub selected: bool,
}

/// Everything the serializer needs, with all styling decisions already made.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    pub title: String,
    pub width: f64,
    pub height: f64,
    pub transform: Transform,
    pub nodes: Vec<SceneNode>,
    pub links: Vec<SceneLink>,
    /// When set, every link gets a light shimmer overlay path on top of its
    /// ribbon.
    pub flow_animation: bool,
    pub watermark: String,
}

/// The layout solver's view of a snapshot: ids in presentation order plus
/// weighted links, with styles and selection stripped away.
pub fn layout_graph(snapshot: &Snapshot) -> LayoutGraph {
    let graph = snapshot.graph();
    LayoutGraph {
        nodes: graph.nodes,
        links: graph
            .links
            .into_iter()
            .map(|l| WeightedLink {
                source: l.source,
                target: l.target,
                value: l.value,
            })
            .collect(),
    }
}

/// Builds the styled scene for one snapshot.
pub fn build_scene(
    snapshot: &Snapshot,
    title: &str,
    dims: ChartDimensions,
    transform: Transform,
    flow_animation: bool,
    adapter: &mut LayoutAdapter,
) -> Result<Scene> {
    let params = LayoutParams::new(dims.extent());
    let layout = adapter.layout(&layout_graph(snapshot), &params)?;
    let totals = NodeTotals::from_rows(&snapshot.rows);

    let mut nodes = Vec::with_capacity(layout.nodes.len());
    for n in &layout.nodes {
        let selected = matches!(
            &snapshot.selection,
            Some(Selection::Node(id)) if *id == n.id
        );
        let fill = snapshot
            .node_styles
            .get(&n.id)
            .map(|s| s.fill.clone())
            .unwrap_or_else(|| DEFAULT_NODE_FILL.to_string());

        let mut label_lines = vec![n.id.clone()];
        let current = totals.current(&n.id);
        if current > 0.0 {
            label_lines.push(fmt_money(current));
        }
        if let Some(percent) = totals.yoy_percent(&n.id) {
            label_lines.push(fmt_yoy(percent));
        }

        let on_left = n.x0 < dims.width / 2.0;
        nodes.push(SceneNode {
            id: n.id.clone(),
            x: n.x0,
            y: n.y0,
            width: n.x1 - n.x0,
            height: n.y1 - n.y0,
            fill,
            selected,
            label_lines,
            label_x: if on_left {
                n.x1 + LABEL_OFFSET
            } else {
                n.x0 - LABEL_OFFSET
            },
            label_y: (n.y0 + n.y1) / 2.0,
            label_anchor_end: !on_left,
        });
    }

    let mut links = Vec::with_capacity(layout.links.len());
    for l in &layout.links {
        // Endpoints resolve against the laid-out nodes; layout guarantees
        // both exist.
        let sx = layout
            .nodes
            .iter()
            .find(|n| n.id == l.source)
            .map(|n| n.x1)
            .unwrap_or(0.0);
        let tx = layout
            .nodes
            .iter()
            .find(|n| n.id == l.target)
            .map(|n| n.x0)
            .unwrap_or(0.0);
        let mx = (sx + tx) / 2.0;
        let path = format!(
            "M{sx},{y0}C{mx},{y0},{mx},{y1},{tx},{y1}",
            sx = crate::svg::fmt(sx),
            y0 = crate::svg::fmt(l.y0),
            mx = crate::svg::fmt(mx),
            y1 = crate::svg::fmt(l.y1),
            tx = crate::svg::fmt(tx),
        );

        let style = snapshot.link_styles.get(&link_key(&l.source, &l.target));
        let stroke = style
            .map(|s| s.stroke.clone())
            .unwrap_or_else(|| default_link_stroke(&l.target).to_string());
        let opacity = style.map(|s| s.opacity).unwrap_or(DEFAULT_LINK_OPACITY);

        let selected = matches!(
            &snapshot.selection,
            Some(Selection::Link { source, target })
                if *source == l.source && *target == l.target
        );

        links.push(SceneLink {
            source: l.source.clone(),
            target: l.target.clone(),
            path,
            stroke,
            stroke_width: l.width.max(1.0) + if selected { 2.0 } else { 0.0 },
            stroke_opacity: if selected {
                (opacity + 0.25).min(1.0)
            } else {
                opacity
            },
            selected,
        });
    }

    Ok(Scene {
        title: title.to_string(),
        width: dims.width,
        height: dims.height,
        transform,
        nodes,
        links,
        flow_animation,
        watermark: WATERMARK.to_string(),
    })
}

/// Hover-card content for a node: incoming total and YoY, formatted like the
/// node label.
pub fn tooltip_for_node(rows: &[LinkRow], id: &str) -> TooltipContent {
    let totals = NodeTotals::from_rows(rows);
    let current = totals.current(id);
    TooltipContent {
        title: id.to_string(),
        value: (current > 0.0).then(|| fmt_money(current)),
        yoy: totals.yoy_percent(id).map(fmt_yoy),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumenflow_core::model::sample_rows;
    use lumenflow_core::style::LinkStyle;

    fn scene_for(snapshot: &Snapshot) -> Scene {
        let mut adapter = LayoutAdapter::new();
        let dims = ChartDimensions::from_container(900.0, false);
        build_scene(snapshot, "Test", dims, Transform::IDENTITY, false, &mut adapter).unwrap()
    }

    #[test]
    fn dimensions_floor_width_and_height() {
        let small = ChartDimensions::from_container(300.0, false);
        assert_eq!(small.width, 480.0);
        assert_eq!(small.height, 420.0);

        let unmeasured = ChartDimensions::from_container(0.0, false);
        assert_eq!(unmeasured.width, 900.0);
        assert_eq!(unmeasured.height, 540.0);

        let fullscreen = ChartDimensions::from_container(700.0, true);
        assert_eq!(fullscreen.height, 480.0);
    }

    #[test]
    fn unstyled_links_take_the_target_heuristic_stroke() {
        let scene = scene_for(&Snapshot::from_rows(sample_rows()));
        let gross = scene
            .links
            .iter()
            .find(|l| l.target == "Gross profit")
            .unwrap();
        assert_eq!(gross.stroke, "#16a34a");
        let cost = scene
            .links
            .iter()
            .find(|l| l.target == "Cost of revenue")
            .unwrap();
        assert_eq!(cost.stroke, "#e11d48");
        assert_eq!(cost.stroke_opacity, 0.45);
    }

    #[test]
    fn explicit_link_style_overrides_the_heuristic() {
        let mut snapshot = Snapshot::from_rows(sample_rows());
        snapshot.link_styles.insert(
            link_key("Gross profit", "Operating expenses"),
            LinkStyle {
                stroke: "#123456".to_string(),
                opacity: 0.9,
            },
        );
        let scene = scene_for(&snapshot);
        let styled = scene
            .links
            .iter()
            .find(|l| l.source == "Gross profit" && l.target == "Operating expenses")
            .unwrap();
        assert_eq!(styled.stroke, "#123456");
        assert_eq!(styled.stroke_opacity, 0.9);
    }

    #[test]
    fn selection_emphasis_widens_and_brightens() {
        let base = scene_for(&Snapshot::from_rows(sample_rows()));
        let plain = base
            .links
            .iter()
            .find(|l| l.source == "Revenue" && l.target == "Gross profit")
            .unwrap()
            .clone();

        let mut snapshot = Snapshot::from_rows(sample_rows());
        snapshot.selection = Some(Selection::Link {
            source: "Revenue".to_string(),
            target: "Gross profit".to_string(),
        });
        let scene = scene_for(&snapshot);
        let selected = scene.links.iter().find(|l| l.selected).unwrap();
        assert_eq!(selected.source, "Revenue");
        assert_eq!(selected.stroke_width, plain.stroke_width + 2.0);
        assert!((selected.stroke_opacity - 0.70).abs() < 1e-12);
    }

    #[test]
    fn node_labels_skip_missing_metrics() {
        let scene = scene_for(&Snapshot::from_rows(sample_rows()));
        // Pure sources have no incoming flow: id only.
        let product = scene.nodes.iter().find(|n| n.id == "Product A").unwrap();
        assert_eq!(product.label_lines, vec!["Product A"]);
        // Revenue has both a total and a comparison.
        let revenue = scene.nodes.iter().find(|n| n.id == "Revenue").unwrap();
        assert_eq!(revenue.label_lines.len(), 3);
        assert_eq!(revenue.label_lines[1], "$50M");
    }

    #[test]
    fn right_half_nodes_anchor_labels_at_end() {
        let scene = scene_for(&Snapshot::from_rows(sample_rows()));
        let product = scene.nodes.iter().find(|n| n.id == "Product A").unwrap();
        assert!(!product.label_anchor_end);
        assert_eq!(product.label_x, product.x + product.width + 8.0);
        let tax = scene.nodes.iter().find(|n| n.id == "Tax").unwrap();
        assert!(tax.label_anchor_end);
        assert_eq!(tax.label_x, tax.x - 8.0);
    }

    #[test]
    fn tooltip_content_mirrors_node_labels() {
        let rows = sample_rows();
        let revenue = tooltip_for_node(&rows, "Revenue");
        assert_eq!(revenue.title, "Revenue");
        assert_eq!(revenue.value.as_deref(), Some("$50M"));
        assert!(revenue.yoy.is_some());

        let source = tooltip_for_node(&rows, "Product A");
        assert_eq!(source.value, None);
        assert_eq!(source.yoy, None);
    }
}
