#![forbid(unsafe_code)]

//! Headless presentation layer: turns an editor snapshot into a styled scene
//! and serializes the scene to SVG markup.
//!
//! The crate is split along the data flow:
//!
//! - [`adapter`] memoizes the positional layout so pure style churn (colors,
//!   selection, opacity) never re-runs the solver;
//! - [`scene`] merges positions with styles, labels, and selection emphasis
//!   into a resolution-independent [`scene::Scene`];
//! - [`svg`] serializes a scene to a standalone SVG document.

pub mod adapter;
pub mod scene;
pub mod svg;

pub use adapter::LayoutAdapter;
pub use scene::{ChartDimensions, Scene, SceneLink, SceneNode, build_scene};
pub use svg::render_svg;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Layout(#[from] lumenflow_layout::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
