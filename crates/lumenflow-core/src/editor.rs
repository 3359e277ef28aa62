use crate::balance::{BalanceReport, compute_balance};
use crate::model::{self, FlowGraph, LinkRow};
use crate::snapshot::{Selection, Snapshot};
use crate::style::{LinkStyle, NodeStyle, link_key};
use crate::{Error, Result};

pub const DEFAULT_TITLE: &str = "Example Inc FY24 Income Statement";

/// Owner-level editor state: the chart title plus the current [`Snapshot`].
///
/// Every mutation runs synchronously on the interaction thread and replaces
/// the snapshot wholesale, so concurrent readers only ever observe complete,
/// consistent states. Row edits prune style entries and selections that the
/// new row set no longer derives.
#[derive(Debug, Clone)]
pub struct EditorState {
    title: String,
    snapshot: Snapshot,
    flow_animation: bool,
}

impl Default for EditorState {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorState {
    /// Starts from the demo income-statement scenario.
    pub fn new() -> Self {
        Self::with_rows(model::sample_rows())
    }

    pub fn with_rows(rows: Vec<LinkRow>) -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            snapshot: Snapshot::from_rows(rows),
            flow_animation: false,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Whether the rendered links carry the shimmer overlay. Off by default.
    pub fn flow_animation(&self) -> bool {
        self.flow_animation
    }

    pub fn set_flow_animation(&mut self, on: bool) {
        self.flow_animation = on;
    }

    pub fn rows(&self) -> &[LinkRow] {
        &self.snapshot.rows
    }

    pub fn graph(&self) -> FlowGraph {
        self.snapshot.graph()
    }

    pub fn balance(&self) -> BalanceReport {
        compute_balance(&self.snapshot.rows)
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.snapshot.selection.as_ref()
    }

    // ---- row edits -------------------------------------------------------

    pub fn set_rows(&mut self, rows: Vec<LinkRow>) {
        self.snapshot = self.snapshot.with_rows(rows);
        tracing::debug!(
            rows = self.snapshot.rows.len(),
            links = self.snapshot.graph().links.len(),
            "rows replaced"
        );
    }

    pub fn add_row(&mut self) {
        let mut rows = self.snapshot.rows.clone();
        rows.push(LinkRow::new("New source", "New target", 0.0).with_comparison(0.0));
        self.set_rows(rows);
    }

    pub fn delete_row(&mut self, index: usize) -> Result<()> {
        let mut rows = self.snapshot.rows.clone();
        if index >= rows.len() {
            return Err(Error::RowIndex {
                index,
                len: rows.len(),
            });
        }
        rows.remove(index);
        self.set_rows(rows);
        Ok(())
    }

    pub fn set_row_from(&mut self, index: usize, value: &str) -> Result<()> {
        self.edit_row(index, |row| row.from = value.to_string())
    }

    pub fn set_row_to(&mut self, index: usize, value: &str) -> Result<()> {
        self.edit_row(index, |row| row.to = value.to_string())
    }

    /// Current-amount input; non-numeric or negative text clamps to 0.
    pub fn set_row_current(&mut self, index: usize, raw: &str) -> Result<()> {
        self.edit_row(index, |row| row.current = model::parse_amount(raw))
    }

    /// Comparison-amount input; blank records absence, not zero.
    pub fn set_row_comparison(&mut self, index: usize, raw: &str) -> Result<()> {
        self.edit_row(index, |row| row.comparison = model::parse_comparison(raw))
    }

    fn edit_row(&mut self, index: usize, edit: impl FnOnce(&mut LinkRow)) -> Result<()> {
        let mut rows = self.snapshot.rows.clone();
        let Some(row) = rows.get_mut(index) else {
            return Err(Error::RowIndex {
                index,
                len: rows.len(),
            });
        };
        edit(row);
        self.set_rows(rows);
        Ok(())
    }

    // ---- selection & rename ----------------------------------------------

    pub fn select_node(&mut self, id: impl Into<String>) {
        let mut snapshot = self.snapshot.clone();
        snapshot.selection = Some(Selection::Node(id.into()));
        self.snapshot = snapshot;
    }

    pub fn select_link(&mut self, source: impl Into<String>, target: impl Into<String>) {
        let mut snapshot = self.snapshot.clone();
        snapshot.selection = Some(Selection::Link {
            source: source.into(),
            target: target.into(),
        });
        self.snapshot = snapshot;
    }

    pub fn clear_selection(&mut self) {
        let mut snapshot = self.snapshot.clone();
        snapshot.selection = None;
        self.snapshot = snapshot;
    }

    /// Renames the currently selected node. No selected node, a blank target,
    /// or an unchanged target is a silent no-op.
    pub fn rename_selected(&mut self, new_id_raw: &str) {
        let Some(Selection::Node(old_id)) = self.snapshot.selection.clone() else {
            return;
        };
        let new_id = new_id_raw.trim();
        if new_id.is_empty() || new_id == old_id {
            return;
        }
        self.snapshot = self.snapshot.rename(&old_id, new_id_raw);
        tracing::debug!(from = %old_id, to = %new_id, "node renamed");
    }

    // ---- styling -----------------------------------------------------------

    /// Sets the fill for a node currently derivable from the rows; styling a
    /// nonexistent node would orphan the entry immediately, so it is ignored.
    pub fn set_node_fill(&mut self, id: &str, fill: impl Into<String>) {
        if !self.graph().contains_node(id) {
            return;
        }
        let mut snapshot = self.snapshot.clone();
        snapshot
            .node_styles
            .insert(id.to_string(), NodeStyle { fill: fill.into() });
        self.snapshot = snapshot;
    }

    pub fn set_link_stroke(&mut self, source: &str, target: &str, stroke: impl Into<String>) {
        self.update_link_style(source, target, |style| style.stroke = stroke.into());
    }

    pub fn set_link_opacity(&mut self, source: &str, target: &str, opacity: f64) {
        let opacity = opacity.clamp(0.0, 1.0);
        self.update_link_style(source, target, |style| style.opacity = opacity);
    }

    fn update_link_style(
        &mut self,
        source: &str,
        target: &str,
        update: impl FnOnce(&mut LinkStyle),
    ) {
        if !self.graph().contains_link(source, target) {
            return;
        }
        let mut snapshot = self.snapshot.clone();
        // A first-time edit of one property must not repaint the other: new
        // entries start from the stroke the renderer would have used anyway.
        let style = snapshot
            .link_styles
            .entry(link_key(source, target))
            .or_insert_with(|| LinkStyle {
                stroke: crate::style::default_link_stroke(target).to_string(),
                ..LinkStyle::default()
            });
        update(style);
        self.snapshot = snapshot;
    }
}
