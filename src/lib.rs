//! Layout engine for generated concept maps.
//!
//! A [`ConceptMap`] is the `{ nodes, edges }` payload produced upstream. Top-down
//! layouts level it breadth-first from its roots ([`ConceptMap::layout`]), the
//! mind-map variant fans a spanning tree out to the right and colors each top
//! level branch ([`ConceptMap::mind_map`]). Both results render to SVG.

use serde::{Deserialize, Serialize};

pub mod edges;
pub mod error;
pub mod graph;
pub mod layout;
pub mod leveling;
pub mod mindmap;
pub mod payload;
pub mod render;
pub mod utils;

pub use edges::{CubicBezier, EdgeCurve};
pub use error::{LayoutError, Result};
pub use graph::GraphIndex;
pub use layout::{Layout, LayoutConfig, PositionAnchor, RootFallback};
pub use leveling::{Leveling, LevelingOptions};
pub use mindmap::{MindMap, MindMapConfig, MindMapNode};
pub use payload::{ConceptMap, Edge, Node};

pub const AREA_WIDTH: f32 = 1200.0;
pub const AREA_HEIGHT: f32 = 750.0;
pub const NODE_WIDTH: f32 = 200.0;
pub const NODE_HEIGHT: f32 = 70.0;
pub const PADDING_X: f32 = 40.0;
pub const PADDING_Y: f32 = 40.0;
pub const HORIZONTAL_GAP: f32 = 60.0;
pub const CURVE_OFFSET: f32 = 30.0;
pub const DEFAULT_MAX_EXPANSIONS: usize = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: f32,
    pub height: f32,
}

/// Visible region of a rendered map. Starts at the canvas and grows when a
/// level is wider than it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewBox {
    pub min_x: f32,
    pub min_y: f32,
    pub width: f32,
    pub height: f32,
}

impl From<CanvasSize> for ViewBox {
    fn from(canvas: CanvasSize) -> Self {
        Self {
            min_x: 0.0,
            min_y: 0.0,
            width: canvas.width,
            height: canvas.height,
        }
    }
}
