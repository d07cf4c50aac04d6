use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{Edge, Point};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CubicBezier {
    pub start: Point,
    pub c1: Point,
    pub c2: Point,
    pub end: Point,
}

impl CubicBezier {
    /// Leaves the bottom of `from` and enters the top of `to`, both handles
    /// pointing vertically.
    pub fn vertical(from: Point, to: Point, node_height: f32, offset: f32) -> Self {
        let start = Point::new(from.x, from.y + node_height / 2.0);
        let end = Point::new(to.x, to.y - node_height / 2.0);
        Self {
            start,
            c1: Point::new(start.x, start.y + offset),
            c2: Point::new(end.x, end.y - offset),
            end,
        }
    }

    /// Leaves the right side of `from` and enters the left side of `to`.
    pub fn horizontal(from: Point, to: Point, node_width: f32, offset: f32) -> Self {
        let start = Point::new(from.x + node_width / 2.0, from.y);
        let end = Point::new(to.x - node_width / 2.0, to.y);
        Self {
            start,
            c1: Point::new(start.x + offset, start.y),
            c2: Point::new(end.x - offset, end.y),
            end,
        }
    }

    pub fn point_at(&self, t: f32) -> Point {
        let u = 1.0 - t;
        let w0 = u * u * u;
        let w1 = 3.0 * u * u * t;
        let w2 = 3.0 * u * t * t;
        let w3 = t * t * t;
        Point {
            x: w0 * self.start.x + w1 * self.c1.x + w2 * self.c2.x + w3 * self.end.x,
            y: w0 * self.start.y + w1 * self.c1.y + w2 * self.c2.y + w3 * self.end.y,
        }
    }

    pub fn midpoint(&self) -> Point {
        self.point_at(0.5)
    }

    /// SVG path data, `M x1 y1 C c1x c1y, c2x c2y, x2 y2`.
    pub fn to_path_data(&self) -> String {
        format!(
            "M {:.1} {:.1} C {:.1} {:.1}, {:.1} {:.1}, {:.1} {:.1}",
            self.start.x,
            self.start.y,
            self.c1.x,
            self.c1.y,
            self.c2.x,
            self.c2.y,
            self.end.x,
            self.end.y
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeCurve {
    /// Index of the edge in the payload.
    pub edge: usize,
    pub from: String,
    pub to: String,
    pub label: String,
    pub path: CubicBezier,
}

pub fn route_vertical(
    edges: &[Edge],
    positions: &BTreeMap<String, Point>,
    node_height: f32,
    offset: f32,
) -> Vec<EdgeCurve> {
    route_with(edges, positions, |from, to| {
        CubicBezier::vertical(from, to, node_height, offset)
    })
}

pub fn route_horizontal(
    edges: &[Edge],
    positions: &BTreeMap<String, Point>,
    node_width: f32,
    offset: f32,
) -> Vec<EdgeCurve> {
    route_with(edges, positions, |from, to| {
        CubicBezier::horizontal(from, to, node_width, offset)
    })
}

/// One curve per edge whose endpoints both have a position; the rest are dropped.
fn route_with<F>(edges: &[Edge], positions: &BTreeMap<String, Point>, shape: F) -> Vec<EdgeCurve>
where
    F: Fn(Point, Point) -> CubicBezier,
{
    let mut curves = Vec::with_capacity(edges.len());
    for (idx, edge) in edges.iter().enumerate() {
        let (Some(&from), Some(&to)) = (positions.get(&edge.from), positions.get(&edge.to)) else {
            debug!(from = %edge.from, to = %edge.to, "edge endpoint has no position; not drawn");
            continue;
        };
        curves.push(EdgeCurve {
            edge: idx,
            from: edge.from.clone(),
            to: edge.to.clone(),
            label: edge.label.clone(),
            path: shape(from, to),
        });
    }
    curves
}
