use crate::model::{FlowGraph, LinkRow};
use crate::style::{LinkStyles, NodeStyles, link_key, split_link_key};
use serde::{Deserialize, Serialize};

/// The inspector's current subject: one node or one directed link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Selection {
    Node(String),
    Link { source: String, target: String },
}

/// The complete, consistent editor state at one instant.
///
/// Mutations never edit a snapshot in place for observers: each operation is
/// a pure `Snapshot -> Snapshot` transform and the owner publishes only the
/// complete output, so no reader ever sees a partially migrated graph.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub rows: Vec<LinkRow>,
    pub node_styles: NodeStyles,
    pub link_styles: LinkStyles,
    pub selection: Option<Selection>,
}

impl Snapshot {
    pub fn from_rows(rows: Vec<LinkRow>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    pub fn graph(&self) -> FlowGraph {
        FlowGraph::from_rows(&self.rows)
    }

    /// Renames a node across rows, both style tables, and the selection, as
    /// one atomic transform.
    ///
    /// The target id is trimmed first; an empty or unchanged target is a
    /// silent no-op. Link-style keys are decomposed, rewritten endpoint by
    /// endpoint, and reinserted under the recomputed key; when two old keys
    /// collide on the same new key, the later-processed entry wins.
    pub fn rename(&self, old_id: &str, new_id_raw: &str) -> Self {
        let new_id = new_id_raw.trim();
        if new_id.is_empty() || new_id == old_id {
            return self.clone();
        }

        let rows = self
            .rows
            .iter()
            .map(|r| {
                let mut row = r.clone();
                if row.from == old_id {
                    row.from = new_id.to_string();
                }
                if row.to == old_id {
                    row.to = new_id.to_string();
                }
                row
            })
            .collect();

        let mut node_styles = self.node_styles.clone();
        if let Some(style) = node_styles.shift_remove(old_id) {
            node_styles.insert(new_id.to_string(), style);
        }

        let mut link_styles = LinkStyles::new();
        for (key, style) in &self.link_styles {
            let Some((source, target)) = split_link_key(key) else {
                link_styles.insert(key.clone(), style.clone());
                continue;
            };
            let source = if source == old_id { new_id } else { source };
            let target = if target == old_id { new_id } else { target };
            link_styles.insert(link_key(source, target), style.clone());
        }

        let selection = match &self.selection {
            Some(Selection::Node(id)) if id == old_id => {
                Some(Selection::Node(new_id.to_string()))
            }
            Some(Selection::Link { source, target }) => Some(Selection::Link {
                source: if source == old_id {
                    new_id.to_string()
                } else {
                    source.clone()
                },
                target: if target == old_id {
                    new_id.to_string()
                } else {
                    target.clone()
                },
            }),
            other => other.clone(),
        };

        Self {
            rows,
            node_styles,
            link_styles,
            selection,
        }
    }

    /// Replaces the row list wholesale and drops auxiliary state orphaned by
    /// the edit in the same step: style entries whose node or link is no
    /// longer derivable, and a selection pointing at a vanished entity.
    pub fn with_rows(&self, rows: Vec<LinkRow>) -> Self {
        Self {
            rows,
            node_styles: self.node_styles.clone(),
            link_styles: self.link_styles.clone(),
            selection: self.selection.clone(),
        }
        .pruned()
    }

    fn pruned(mut self) -> Self {
        let graph = self.graph();

        self.node_styles.retain(|id, _| graph.contains_node(id));
        self.link_styles.retain(|key, _| {
            split_link_key(key).is_some_and(|(s, t)| graph.contains_link(s, t))
        });
        self.selection = match self.selection.take() {
            Some(Selection::Node(id)) if graph.contains_node(&id) => Some(Selection::Node(id)),
            Some(Selection::Link { source, target })
                if graph.contains_link(&source, &target) =>
            {
                Some(Selection::Link { source, target })
            }
            _ => None,
        };
        self
    }
}
