#![forbid(unsafe_code)]

//! `lumenflow` is a headless financial flow-diagram engine.
//!
//! Rows of `from / to / amount` data become a sankey diagram: the engine
//! derives the graph, validates flow conservation, lays nodes out
//! deterministically, and serializes the result to SVG or PNG. There is no
//! windowing or DOM dependency anywhere in the pipeline, so the same crates
//! drive interactive front ends, servers, and batch tooling.
//!
//! # Features
//!
//! - `raster`: enable PNG output via pure-Rust SVG rasterization

pub use lumenflow_core::*;

pub mod export;
#[cfg(feature = "raster")]
pub mod raster;

/// Layout solver re-exports.
pub mod layout {
    pub use lumenflow_layout::{
        Error, Extent, LayoutGraph, LayoutParams, LinkLayout, Margins, NodeAlign, NodeLayout,
        Result, SankeyLayout, WeightedLink, layout,
    };
}

/// Scene assembly and SVG serialization re-exports.
pub mod render {
    pub use lumenflow_render::adapter::LayoutAdapter;
    pub use lumenflow_render::scene::{
        ChartDimensions, Scene, SceneLink, SceneNode, build_scene, layout_graph, tooltip_for_node,
    };
    pub use lumenflow_render::svg::render_svg;
    pub use lumenflow_render::{Error, Result};
}
