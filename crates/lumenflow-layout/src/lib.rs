#![forbid(unsafe_code)]

//! Deterministic layered sankey layout.
//!
//! Positions follow d3-sankey's iterative relaxation: nodes are assigned to
//! columns by breadth-first depth/height, packed vertically, then relaxed
//! over a fixed number of alternating left-to-right / right-to-left passes
//! with collision resolution. The function is referentially transparent:
//! identical inputs yield identical outputs, byte for byte.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("link references unknown node id: {id}")]
    UnknownNode { id: String },
    #[error("circular link")]
    CircularLink,
}

pub type Result<T> = std::result::Result<T, Error>;

/// A directed edge weighted by its flow amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedLink {
    pub source: String,
    pub target: String,
    pub value: f64,
}

/// Layout input: node ids in presentation order plus weighted links. Parallel
/// links between the same pair are laid out as-is, not merged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutGraph {
    pub nodes: Vec<String>,
    pub links: Vec<WeightedLink>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

/// The rectangle nodes are laid out into, in diagram coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Extent {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn from_canvas(width: f64, height: f64, margins: Margins) -> Self {
        Self {
            x0: margins.left,
            y0: margins.top,
            x1: width - margins.right,
            y1: height - margins.bottom,
        }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }
}

/// Horizontal placement rule for nodes that are not forced by the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeAlign {
    Left,
    Right,
    #[default]
    Justify,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayoutParams {
    pub extent: Extent,
    pub node_width: f64,
    pub node_padding: f64,
    pub align: NodeAlign,
    pub iterations: usize,
}

impl LayoutParams {
    pub fn new(extent: Extent) -> Self {
        Self {
            extent,
            node_width: 18.0,
            node_padding: 16.0,
            align: NodeAlign::Justify,
            iterations: 6,
        }
    }
}

/// One laid-out node rectangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeLayout {
    pub id: String,
    pub index: usize,
    pub depth: usize,
    pub layer: usize,
    pub value: f64,
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
}

/// One laid-out link ribbon: endpoints' vertical centers plus breadth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkLayout {
    pub index: usize,
    pub source: String,
    pub target: String,
    pub value: f64,
    pub width: f64,
    pub y0: f64,
    pub y1: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SankeyLayout {
    pub extent: Extent,
    pub node_width: f64,
    pub node_padding: f64,
    pub nodes: Vec<NodeLayout>,
    pub links: Vec<LinkLayout>,
}

#[derive(Debug, Clone)]
struct NodeState {
    id: String,
    index: usize,
    source_links: Vec<usize>,
    target_links: Vec<usize>,
    value: f64,
    depth: usize,
    height: usize,
    layer: usize,
    x0: f64,
    x1: f64,
    y0: f64,
    y1: f64,
}

#[derive(Debug, Clone)]
struct LinkState {
    index: usize,
    source: usize,
    target: usize,
    value: f64,
    width: f64,
    y0: f64,
    y1: f64,
}

fn f64_cmp(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Computes the layout. Works in the extent's local space and translates to
/// diagram coordinates at the end.
pub fn layout(graph: &LayoutGraph, params: &LayoutParams) -> Result<SankeyLayout> {
    let width = params.extent.width().max(0.0);
    let height = params.extent.height().max(0.0);
    let dx = params.node_width;
    let dy = params.node_padding;
    let iterations = params.iterations.max(1);

    let mut nodes: Vec<NodeState> = graph
        .nodes
        .iter()
        .enumerate()
        .map(|(i, id)| NodeState {
            id: id.clone(),
            index: i,
            source_links: Vec::new(),
            target_links: Vec::new(),
            value: 0.0,
            depth: 0,
            height: 0,
            layer: 0,
            x0: 0.0,
            x1: 0.0,
            y0: 0.0,
            y1: 0.0,
        })
        .collect();

    let mut node_by_id: HashMap<&str, usize> = HashMap::new();
    for (i, id) in graph.nodes.iter().enumerate() {
        node_by_id.insert(id.as_str(), i);
    }

    let mut links: Vec<LinkState> = Vec::with_capacity(graph.links.len());
    for (i, l) in graph.links.iter().enumerate() {
        let source = node_by_id
            .get(l.source.as_str())
            .copied()
            .ok_or_else(|| Error::UnknownNode {
                id: l.source.clone(),
            })?;
        let target = node_by_id
            .get(l.target.as_str())
            .copied()
            .ok_or_else(|| Error::UnknownNode {
                id: l.target.clone(),
            })?;

        let value = if l.value.is_finite() && l.value > 0.0 {
            l.value
        } else {
            0.0
        };
        links.push(LinkState {
            index: i,
            source,
            target,
            value,
            width: 0.0,
            y0: 0.0,
            y1: 0.0,
        });

        nodes[source].source_links.push(i);
        nodes[target].target_links.push(i);
    }

    // Node value: larger of total outgoing vs total incoming flow.
    for n in &mut nodes {
        let out_sum: f64 = n.source_links.iter().map(|&li| links[li].value).sum();
        let in_sum: f64 = n.target_links.iter().map(|&li| links[li].value).sum();
        n.value = out_sum.max(in_sum);
    }

    compute_depths(&mut nodes, &links)?;
    compute_heights(&mut nodes, &links)?;

    let max_depth = nodes.iter().map(|n| n.depth).max().unwrap_or(0);
    let column_count = (max_depth + 1).max(1);
    let kx = if column_count <= 1 {
        0.0
    } else {
        (width - dx) / (column_count as f64 - 1.0)
    };

    let mut columns: Vec<Vec<usize>> = vec![Vec::new(); column_count];
    for i in 0..nodes.len() {
        let raw_layer = match params.align {
            NodeAlign::Left => nodes[i].depth as i64,
            NodeAlign::Right => column_count as i64 - 1 - nodes[i].height as i64,
            NodeAlign::Justify => {
                if nodes[i].source_links.is_empty() {
                    column_count as i64 - 1
                } else {
                    nodes[i].depth as i64
                }
            }
            NodeAlign::Center => {
                if !nodes[i].target_links.is_empty() {
                    nodes[i].depth as i64
                } else if !nodes[i].source_links.is_empty() {
                    let min_target_depth = nodes[i]
                        .source_links
                        .iter()
                        .map(|&li| nodes[links[li].target].depth)
                        .min()
                        .unwrap_or(0);
                    min_target_depth as i64 - 1
                } else {
                    0
                }
            }
        };
        let layer = raw_layer.clamp(0, column_count as i64 - 1) as usize;
        nodes[i].layer = layer;
        nodes[i].x0 = layer as f64 * kx;
        nodes[i].x1 = nodes[i].x0 + dx;
        columns[layer].push(i);
    }

    // Vertical scale: tightest column decides px-per-unit.
    let max_len = columns.iter().map(|c| c.len()).max().unwrap_or(0);
    let py = if max_len <= 1 {
        dy
    } else {
        dy.min(height / (max_len as f64 - 1.0))
    };

    let mut ky = f64::INFINITY;
    for col in &columns {
        if col.is_empty() {
            continue;
        }
        let sum_values: f64 = col.iter().map(|&ni| nodes[ni].value).sum();
        if sum_values <= 0.0 {
            continue;
        }
        let denom = height - (col.len() as f64 - 1.0) * py;
        ky = ky.min(denom / sum_values);
    }
    if !ky.is_finite() {
        ky = 0.0;
    }

    // Initial vertical packing, centered per column.
    for col in &columns {
        let mut y = 0.0;
        for &ni in col {
            nodes[ni].y0 = y;
            nodes[ni].y1 = y + nodes[ni].value * ky;
            y = nodes[ni].y1 + py;
            for &li in &nodes[ni].source_links {
                links[li].width = links[li].value * ky;
            }
        }
        let n = col.len();
        if n > 0 {
            let offset = (height - y + py) / (n as f64 + 1.0);
            for (i, &ni) in col.iter().enumerate() {
                let adj = offset * (i as f64 + 1.0);
                nodes[ni].y0 += adj;
                nodes[ni].y1 += adj;
            }
            reorder_links(&mut nodes, &links, col);
        }
    }

    let mut relax_columns = columns.clone();
    for i in 0..iterations {
        let alpha = 0.99_f64.powi(i as i32);
        let beta = (1.0 - alpha).max((i as f64 + 1.0) / iterations as f64);
        relax_right_to_left(&mut nodes, &links, &mut relax_columns, py, alpha, beta, height);
        relax_left_to_right(&mut nodes, &links, &mut relax_columns, py, alpha, beta, height);
    }

    // Link breadth positions along each node face.
    for node in &mut nodes {
        let mut y0 = node.y0;
        let mut y1 = node.y0;
        for &li in &node.source_links {
            links[li].y0 = y0 + links[li].width / 2.0;
            y0 += links[li].width;
        }
        for &li in &node.target_links {
            links[li].y1 = y1 + links[li].width / 2.0;
            y1 += links[li].width;
        }
    }

    let ox = params.extent.x0;
    let oy = params.extent.y0;

    let layout_nodes: Vec<NodeLayout> = nodes
        .iter()
        .map(|n| NodeLayout {
            id: n.id.clone(),
            index: n.index,
            depth: n.depth,
            layer: n.layer,
            value: n.value,
            x0: ox + n.x0,
            x1: ox + n.x1,
            y0: oy + n.y0,
            y1: oy + n.y1,
        })
        .collect();

    let layout_links: Vec<LinkLayout> = links
        .iter()
        .map(|l| LinkLayout {
            index: l.index,
            source: nodes[l.source].id.clone(),
            target: nodes[l.target].id.clone(),
            value: l.value,
            width: l.width,
            y0: oy + l.y0,
            y1: oy + l.y1,
        })
        .collect();

    Ok(SankeyLayout {
        extent: params.extent,
        node_width: params.node_width,
        node_padding: py,
        nodes: layout_nodes,
        links: layout_links,
    })
}

// Breadth-first distance from the sources; errors out instead of looping on
// a cycle.
fn compute_depths(nodes: &mut [NodeState], links: &[LinkState]) -> Result<()> {
    let n = nodes.len();
    let mut current: Vec<usize> = (0..n).collect();
    let mut next: Vec<usize> = Vec::new();
    let mut next_seen = vec![false; n];
    let mut x: usize = 0;
    while !current.is_empty() {
        for &node_idx in &current {
            nodes[node_idx].depth = x;
            for &li in &nodes[node_idx].source_links {
                let t = links[li].target;
                if !next_seen[t] {
                    next_seen[t] = true;
                    next.push(t);
                }
            }
        }
        x += 1;
        if x > n {
            return Err(Error::CircularLink);
        }
        current = std::mem::take(&mut next);
        next_seen.fill(false);
    }
    Ok(())
}

fn compute_heights(nodes: &mut [NodeState], links: &[LinkState]) -> Result<()> {
    let n = nodes.len();
    let mut current: Vec<usize> = (0..n).collect();
    let mut next: Vec<usize> = Vec::new();
    let mut next_seen = vec![false; n];
    let mut x: usize = 0;
    while !current.is_empty() {
        for &node_idx in &current {
            nodes[node_idx].height = x;
            for &li in &nodes[node_idx].target_links {
                let s = links[li].source;
                if !next_seen[s] {
                    next_seen[s] = true;
                    next.push(s);
                }
            }
        }
        x += 1;
        if x > n {
            return Err(Error::CircularLink);
        }
        current = std::mem::take(&mut next);
        next_seen.fill(false);
    }
    Ok(())
}

fn sort_source_links_by_target_y0(node_y0: &[f64], links: &[LinkState], link_indices: &mut [usize]) {
    link_indices.sort_by(|&a, &b| {
        let ta = node_y0[links[a].target];
        let tb = node_y0[links[b].target];
        f64_cmp(ta, tb).then_with(|| links[a].index.cmp(&links[b].index))
    });
}

fn sort_target_links_by_source_y0(node_y0: &[f64], links: &[LinkState], link_indices: &mut [usize]) {
    link_indices.sort_by(|&a, &b| {
        let sa = node_y0[links[a].source];
        let sb = node_y0[links[b].source];
        f64_cmp(sa, sb).then_with(|| links[a].index.cmp(&links[b].index))
    });
}

fn reorder_links(nodes: &mut [NodeState], links: &[LinkState], column: &[usize]) {
    let node_y0 = nodes.iter().map(|n| n.y0).collect::<Vec<_>>();
    for &ni in column {
        sort_source_links_by_target_y0(&node_y0, links, &mut nodes[ni].source_links);
        sort_target_links_by_source_y0(&node_y0, links, &mut nodes[ni].target_links);
    }
}

fn reorder_node_links(nodes: &mut [NodeState], links: &[LinkState], node_idx: usize) {
    let node_y0 = nodes.iter().map(|n| n.y0).collect::<Vec<_>>();

    let target_links = nodes[node_idx].target_links.clone();
    for li in target_links {
        let source = links[li].source;
        sort_source_links_by_target_y0(&node_y0, links, &mut nodes[source].source_links);
    }

    let source_links = nodes[node_idx].source_links.clone();
    for li in source_links {
        let target = links[li].target;
        sort_target_links_by_source_y0(&node_y0, links, &mut nodes[target].target_links);
    }
}

// Where this link's band starts on the target side, accounting for the
// breadth of the bands sorted before it.
fn target_top(nodes: &[NodeState], links: &[LinkState], py: f64, source: usize, target: usize) -> f64 {
    let source_link_count = nodes[source].source_links.len() as f64;
    let mut y = nodes[source].y0 - (source_link_count - 1.0) * py / 2.0;
    for &li in &nodes[source].source_links {
        let node = links[li].target;
        if node == target {
            break;
        }
        y += links[li].width + py;
    }
    for &li in &nodes[target].target_links {
        let node = links[li].source;
        if node == source {
            break;
        }
        y -= links[li].width;
    }
    y
}

fn source_top(nodes: &[NodeState], links: &[LinkState], py: f64, source: usize, target: usize) -> f64 {
    let target_link_count = nodes[target].target_links.len() as f64;
    let mut y = nodes[target].y0 - (target_link_count - 1.0) * py / 2.0;
    for &li in &nodes[target].target_links {
        let node = links[li].source;
        if node == source {
            break;
        }
        y += links[li].width + py;
    }
    for &li in &nodes[source].source_links {
        let node = links[li].target;
        if node == target {
            break;
        }
        y -= links[li].width;
    }
    y
}

fn resolve_collisions_top_to_bottom(
    nodes: &mut [NodeState],
    column: &[usize],
    py: f64,
    mut y: f64,
    mut i: isize,
    alpha: f64,
) {
    while i < column.len() as isize {
        let ni = column[i as usize];
        let dy = (y - nodes[ni].y0) * alpha;
        if dy > 1e-6 {
            nodes[ni].y0 += dy;
            nodes[ni].y1 += dy;
        }
        y = nodes[ni].y1 + py;
        i += 1;
    }
}

fn resolve_collisions_bottom_to_top(
    nodes: &mut [NodeState],
    column: &[usize],
    py: f64,
    mut y: f64,
    mut i: isize,
    alpha: f64,
) {
    while i >= 0 {
        let ni = column[i as usize];
        let dy = (nodes[ni].y1 - y) * alpha;
        if dy > 1e-6 {
            nodes[ni].y0 -= dy;
            nodes[ni].y1 -= dy;
        }
        y = nodes[ni].y0 - py;
        i -= 1;
    }
}

fn resolve_collisions(
    nodes: &mut [NodeState],
    column: &[usize],
    py: f64,
    height: f64,
    alpha: f64,
) {
    if column.is_empty() {
        return;
    }
    let i = column.len() >> 1;
    let subject = column[i];
    resolve_collisions_bottom_to_top(nodes, column, py, nodes[subject].y0 - py, i as isize - 1, alpha);
    resolve_collisions_top_to_bottom(nodes, column, py, nodes[subject].y1 + py, i as isize + 1, alpha);
    resolve_collisions_bottom_to_top(nodes, column, py, height, column.len() as isize - 1, alpha);
    resolve_collisions_top_to_bottom(nodes, column, py, 0.0, 0, alpha);
}

fn relax_left_to_right(
    nodes: &mut [NodeState],
    links: &[LinkState],
    columns: &mut [Vec<usize>],
    py: f64,
    alpha: f64,
    beta: f64,
    height: f64,
) {
    for i in 1..columns.len() {
        let column = &mut columns[i];
        for &target in column.iter() {
            let mut y = 0.0;
            let mut w = 0.0;
            for &li in &nodes[target].target_links {
                let source = links[li].source;
                let v = links[li].value
                    * (nodes[target].layer as f64 - nodes[source].layer as f64);
                y += target_top(nodes, links, py, source, target) * v;
                w += v;
            }
            if !(w > 0.0) {
                continue;
            }
            let dy = (y / w - nodes[target].y0) * alpha;
            nodes[target].y0 += dy;
            nodes[target].y1 += dy;
            reorder_node_links(nodes, links, target);
        }
        column.sort_by(|&a, &b| f64_cmp(nodes[a].y0, nodes[b].y0).then_with(|| a.cmp(&b)));
        resolve_collisions(nodes, column, py, height, beta);
    }
}

fn relax_right_to_left(
    nodes: &mut [NodeState],
    links: &[LinkState],
    columns: &mut [Vec<usize>],
    py: f64,
    alpha: f64,
    beta: f64,
    height: f64,
) {
    if columns.len() < 2 {
        return;
    }
    for i in (0..=(columns.len() - 2)).rev() {
        let column = &mut columns[i];
        for &source in column.iter() {
            let mut y = 0.0;
            let mut w = 0.0;
            for &li in &nodes[source].source_links {
                let target = links[li].target;
                let v = links[li].value
                    * (nodes[target].layer as f64 - nodes[source].layer as f64);
                y += source_top(nodes, links, py, source, target) * v;
                w += v;
            }
            if !(w > 0.0) {
                continue;
            }
            let dy = (y / w - nodes[source].y0) * alpha;
            nodes[source].y0 += dy;
            nodes[source].y1 += dy;
            reorder_node_links(nodes, links, source);
        }
        column.sort_by(|&a, &b| f64_cmp(nodes[a].y0, nodes[b].y0).then_with(|| a.cmp(&b)));
        resolve_collisions(nodes, column, py, height, beta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(source: &str, target: &str, value: f64) -> WeightedLink {
        WeightedLink {
            source: source.to_string(),
            target: target.to_string(),
            value,
        }
    }

    fn chain_graph() -> LayoutGraph {
        LayoutGraph {
            nodes: vec!["A".into(), "B".into(), "C".into(), "D".into()],
            links: vec![link("A", "B", 100.0), link("B", "C", 60.0), link("B", "D", 40.0)],
        }
    }

    fn params() -> LayoutParams {
        LayoutParams::new(Extent::from_canvas(
            900.0,
            540.0,
            Margins {
                top: 60.0,
                right: 40.0,
                bottom: 40.0,
                left: 40.0,
            },
        ))
    }

    #[test]
    fn nodes_land_in_columns_inside_the_extent() {
        let result = layout(&chain_graph(), &params()).unwrap();
        let extent = params().extent;

        let a = result.nodes.iter().find(|n| n.id == "A").unwrap();
        let b = result.nodes.iter().find(|n| n.id == "B").unwrap();
        let c = result.nodes.iter().find(|n| n.id == "C").unwrap();

        assert_eq!(a.layer, 0);
        assert_eq!(b.layer, 1);
        assert_eq!(c.layer, 2);
        assert_eq!(a.x0, extent.x0);
        assert_eq!(c.x1, extent.x1);
        assert_eq!(a.x1 - a.x0, 18.0);

        for n in &result.nodes {
            assert!(n.y0 >= extent.y0 - 1e-6);
            assert!(n.y1 <= extent.y1 + 1e-6);
            assert!(n.y1 > n.y0);
        }
    }

    #[test]
    fn link_breadth_is_proportional_to_weight() {
        let result = layout(&chain_graph(), &params()).unwrap();
        let ab = result.links.iter().find(|l| l.target == "B").unwrap();
        let bc = result.links.iter().find(|l| l.target == "C").unwrap();
        let bd = result.links.iter().find(|l| l.target == "D").unwrap();

        assert!((ab.width - (bc.width + bd.width)).abs() < 1e-6);
        assert!((bc.width / bd.width - 1.5).abs() < 1e-6);
    }

    #[test]
    fn identical_inputs_yield_identical_outputs() {
        let a = layout(&chain_graph(), &params()).unwrap();
        let b = layout(&chain_graph(), &params()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn unknown_link_endpoint_is_an_error() {
        let graph = LayoutGraph {
            nodes: vec!["A".into()],
            links: vec![link("A", "missing", 1.0)],
        };
        assert!(matches!(
            layout(&graph, &params()),
            Err(Error::UnknownNode { .. })
        ));
    }

    #[test]
    fn circular_links_are_rejected() {
        let graph = LayoutGraph {
            nodes: vec!["A".into(), "B".into()],
            links: vec![link("A", "B", 1.0), link("B", "A", 1.0)],
        };
        assert!(matches!(layout(&graph, &params()), Err(Error::CircularLink)));
    }

    #[test]
    fn parallel_links_are_kept_separate() {
        let graph = LayoutGraph {
            nodes: vec!["A".into(), "B".into()],
            links: vec![link("A", "B", 10.0), link("A", "B", 2.0)],
        };
        let result = layout(&graph, &params()).unwrap();
        assert_eq!(result.links.len(), 2);
        assert!((result.links[0].width / result.links[1].width - 5.0).abs() < 1e-6);
    }

    #[test]
    fn justify_moves_pure_sinks_to_the_last_column() {
        let graph = LayoutGraph {
            nodes: vec!["A".into(), "B".into(), "C".into(), "Short".into()],
            links: vec![
                link("A", "B", 10.0),
                link("B", "C", 10.0),
                link("A", "Short", 5.0),
            ],
        };
        let result = layout(&graph, &params()).unwrap();
        let short = result.nodes.iter().find(|n| n.id == "Short").unwrap();
        let c = result.nodes.iter().find(|n| n.id == "C").unwrap();
        assert_eq!(short.layer, c.layer);
    }
}
