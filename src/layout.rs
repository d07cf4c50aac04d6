use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::edges::{EdgeCurve, route_vertical};
use crate::graph::GraphIndex;
use crate::leveling::{self, LevelingOptions};
use crate::*;

/// Where a level's horizontal slots are anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PositionAnchor {
    /// `x` is the node center; every level is symmetric about the canvas center.
    #[default]
    Center,
    /// Adds `nodeWidth / 2` on top of the centered slot, shifting every level
    /// right by half a node.
    LegacyOffset,
}

/// What to lay out when no node has in-degree zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RootFallback {
    /// Produce an empty layout.
    #[default]
    None,
    /// Treat the first node of the payload as the only root.
    FirstNode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub area_width: f32,
    pub area_height: f32,
    pub node_width: f32,
    pub node_height: f32,
    pub padding_x: f32,
    pub padding_y: f32,
    pub horizontal_gap: f32,
    pub curve_offset: f32,
    pub anchor: PositionAnchor,
    pub root_fallback: RootFallback,
    #[serde(flatten)]
    pub leveling: LevelingOptions,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            area_width: AREA_WIDTH,
            area_height: AREA_HEIGHT,
            node_width: NODE_WIDTH,
            node_height: NODE_HEIGHT,
            padding_x: PADDING_X,
            padding_y: PADDING_Y,
            horizontal_gap: HORIZONTAL_GAP,
            curve_offset: CURVE_OFFSET,
            anchor: PositionAnchor::default(),
            root_fallback: RootFallback::default(),
            leveling: LevelingOptions::default(),
        }
    }
}

impl LayoutConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("areaWidth", self.area_width),
            ("areaHeight", self.area_height),
            ("nodeWidth", self.node_width),
            ("nodeHeight", self.node_height),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(LayoutError::InvalidConfig(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }

        for (name, value) in [
            ("paddingX", self.padding_x),
            ("paddingY", self.padding_y),
            ("horizontalGap", self.horizontal_gap),
            ("curveOffset", self.curve_offset),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(LayoutError::InvalidConfig(format!(
                    "{name} must be zero or positive, got {value}"
                )));
            }
        }

        if self.leveling.max_expansions == 0 {
            return Err(LayoutError::InvalidConfig(
                "maxExpansions must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    fn slot_stride(&self) -> f32 {
        self.node_width + self.horizontal_gap
    }

    /// Centers of the `count` slots of level `level` out of `level_count`.
    pub fn level_slots(&self, level: usize, count: usize, level_count: usize) -> Vec<Point> {
        let stride = self.slot_stride();
        let total_width = count.saturating_sub(1) as f32 * stride;
        let start_x = (self.area_width - total_width) / 2.0;
        let anchor_shift = match self.anchor {
            PositionAnchor::Center => 0.0,
            PositionAnchor::LegacyOffset => self.node_width / 2.0,
        };

        let gaps = level_count.saturating_sub(1).max(1) as f32;
        let spacing = (self.area_height - 2.0 * self.padding_y) / gaps;
        let y = self.padding_y + level as f32 * spacing;

        (0..count)
            .map(|idx| Point {
                x: start_x + idx as f32 * stride + anchor_shift,
                y,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Layout {
    pub canvas: CanvasSize,
    pub view_box: ViewBox,
    pub node_width: f32,
    pub node_height: f32,
    pub roots: Vec<String>,
    pub levels: Vec<Vec<String>>,
    pub level_of: BTreeMap<String, usize>,
    pub positions: BTreeMap<String, Point>,
    pub curves: Vec<EdgeCurve>,
    pub broken_edges: Vec<usize>,
    pub steps: usize,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Layout {
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn position(&self, id: &str) -> Option<Point> {
        self.positions.get(id).copied()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl ConceptMap {
    pub fn layout(&self, config: &LayoutConfig) -> Result<Layout> {
        config.validate()?;

        let graph = GraphIndex::build(self);
        let mut roots = graph.roots();
        if roots.is_empty() && !graph.is_empty() {
            match config.root_fallback {
                RootFallback::None => {
                    warn!(nodes = graph.len(), "concept map has no root node; nothing to lay out");
                }
                RootFallback::FirstNode => {
                    warn!(root = graph.id(0), "concept map has no root node; using the first node");
                    roots.push(0);
                }
            }
        }

        let leveling = leveling::level(&graph, &roots, &config.leveling)?;
        let level_count = leveling.level_count();

        let mut levels: Vec<Vec<String>> = Vec::with_capacity(level_count);
        let mut positions = BTreeMap::new();
        for (level, bucket) in leveling.levels.iter().enumerate() {
            let slots = config.level_slots(level, bucket.len(), level_count);
            for (&slot, point) in bucket.iter().zip(slots) {
                positions.insert(graph.id(slot).to_string(), point);
            }
            levels.push(bucket.iter().map(|&slot| graph.id(slot).to_string()).collect());
        }

        let level_of: BTreeMap<String, usize> = leveling
            .level_of
            .iter()
            .enumerate()
            .filter_map(|(slot, level)| level.map(|level| (graph.id(slot).to_string(), level)))
            .collect();

        let curves = route_vertical(
            &self.edges,
            &positions,
            config.node_height,
            config.curve_offset,
        );
        debug!(
            levels = level_count,
            positioned = positions.len(),
            curves = curves.len(),
            steps = leveling.steps,
            "computed concept map layout"
        );

        let canvas = CanvasSize {
            width: config.area_width,
            height: config.area_height,
        };

        Ok(Layout {
            canvas,
            view_box: view_box(canvas, &positions, config),
            node_width: config.node_width,
            node_height: config.node_height,
            roots: roots.iter().map(|&slot| graph.id(slot).to_string()).collect(),
            levels,
            level_of,
            positions,
            curves,
            broken_edges: leveling.broken_edges,
            steps: leveling.steps,
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        })
    }
}

/// Canvas bounds, widened so no node is clipped and every node keeps
/// `padding_x` of horizontal margin.
fn view_box(
    canvas: CanvasSize,
    positions: &BTreeMap<String, Point>,
    config: &LayoutConfig,
) -> ViewBox {
    let mut min_x = 0.0_f32;
    let mut min_y = 0.0_f32;
    let mut max_x = canvas.width;
    let mut max_y = canvas.height;

    for point in positions.values() {
        min_x = min_x.min(point.x - config.node_width / 2.0 - config.padding_x);
        max_x = max_x.max(point.x + config.node_width / 2.0 + config.padding_x);
        min_y = min_y.min(point.y - config.node_height / 2.0);
        max_y = max_y.max(point.y + config.node_height / 2.0);
    }

    ViewBox {
        min_x,
        min_y,
        width: max_x - min_x,
        height: max_y - min_y,
    }
}
