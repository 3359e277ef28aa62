#![forbid(unsafe_code)]

//! Headless state engine for an editable income-statement flow diagram.
//!
//! Design goals:
//! - rows are the single source of truth; everything else (node set, balance
//!   report, style tables, selection) is derived or migrated from them
//! - whole-snapshot replacement on every mutation; no observer ever sees a
//!   partially migrated graph
//! - deterministic, testable outputs with no rendering substrate required

pub mod balance;
pub mod debounce;
pub mod editor;
pub mod error;
pub mod geom;
pub mod metrics;
pub mod model;
pub mod overlay;
pub mod snapshot;
pub mod style;
pub mod viewport;

pub use balance::{BalanceReport, compute_balance};
pub use editor::EditorState;
pub use error::{Error, Result};
pub use model::{FlowGraph, FlowLink, LinkRow};
pub use snapshot::{Selection, Snapshot};
pub use style::{LinkStyle, NodeStyle, link_key};
pub use viewport::{Transform, ViewportController};
