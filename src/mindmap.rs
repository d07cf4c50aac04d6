//! Mind-map variant: a spanning tree grown from a single center node, laid out
//! left to right, with one palette color per top-level branch.
//!
//! The tree follows first discovery in breadth-first order, so a node with
//! several parents hangs under the one reached first. Branch `i` is the `i`-th
//! child of the center and every descendant inherits its color.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::edges::{EdgeCurve, route_horizontal};
use crate::graph::GraphIndex;
use crate::layout::RootFallback;
use crate::*;

pub const DEFAULT_PALETTE: [&str; 8] = [
    "#6366f1", "#ec4899", "#f59e0b", "#10b981", "#3b82f6", "#8b5cf6", "#ef4444", "#14b8a6",
];
pub const DEFAULT_ROOT_COLOR: &str = "#1e293b";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MindMapConfig {
    pub node_width: f32,
    pub node_height: f32,
    pub level_gap: f32,
    pub sibling_gap: f32,
    pub padding_x: f32,
    pub padding_y: f32,
    pub curve_offset: f32,
    pub palette: Vec<String>,
    pub root_color: String,
    pub root_fallback: RootFallback,
}

impl Default for MindMapConfig {
    fn default() -> Self {
        Self {
            node_width: 180.0,
            node_height: 56.0,
            level_gap: 80.0,
            sibling_gap: 24.0,
            padding_x: PADDING_X,
            padding_y: PADDING_Y,
            curve_offset: 40.0,
            palette: DEFAULT_PALETTE.iter().map(|color| color.to_string()).collect(),
            root_color: DEFAULT_ROOT_COLOR.to_string(),
            root_fallback: RootFallback::None,
        }
    }
}

impl MindMapConfig {
    pub fn validate(&self) -> Result<()> {
        if self.palette.is_empty() {
            return Err(LayoutError::InvalidConfig(
                "mind-map palette must contain at least one color".to_string(),
            ));
        }
        if !(self.node_width > 0.0 && self.node_height > 0.0) {
            return Err(LayoutError::InvalidConfig(
                "mind-map node size must be positive".to_string(),
            ));
        }
        for value in [
            self.level_gap,
            self.sibling_gap,
            self.padding_x,
            self.padding_y,
            self.curve_offset,
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(LayoutError::InvalidConfig(format!(
                    "mind-map spacing must be zero or positive, got {value}"
                )));
            }
        }
        Ok(())
    }

    pub fn branch_color(&self, branch: usize) -> &str {
        &self.palette[branch % self.palette.len()]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MindMapNode {
    pub id: String,
    pub depth: usize,
    pub parent: Option<String>,
    /// Index of the top-level branch this node belongs to; `None` for the center.
    pub branch: Option<usize>,
    pub color: String,
    pub position: Point,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MindMap {
    pub root: Option<String>,
    pub canvas: CanvasSize,
    pub node_width: f32,
    pub node_height: f32,
    /// Tree nodes in breadth-first order.
    pub tree: Vec<MindMapNode>,
    pub curves: Vec<EdgeCurve>,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    /// Index into `tree` by node id.
    #[serde(skip)]
    index: BTreeMap<String, usize>,
}

impl MindMap {
    pub fn get(&self, id: &str) -> Option<&MindMapNode> {
        self.index.get(id).map(|&idx| &self.tree[idx])
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Color of the branch a curve belongs to, taken from its target node.
    pub fn curve_color(&self, curve: &EdgeCurve) -> &str {
        self.get(&curve.to)
            .map(|node| node.color.as_str())
            .unwrap_or(DEFAULT_ROOT_COLOR)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

struct TreeSlot {
    slot: usize,
    depth: usize,
    parent: Option<usize>,
    branch: Option<usize>,
    children: Vec<usize>,
}

impl ConceptMap {
    pub fn mind_map(&self, config: &MindMapConfig) -> Result<MindMap> {
        config.validate()?;

        let graph = GraphIndex::build(self);
        let root = match graph.roots().first() {
            Some(&root) => Some(root),
            None if graph.is_empty() => None,
            None => match config.root_fallback {
                RootFallback::None => {
                    warn!("concept map has no root node; mind map is empty");
                    None
                }
                RootFallback::FirstNode => {
                    warn!(root = graph.id(0), "concept map has no root node; using the first node");
                    Some(0)
                }
            },
        };

        let tree = root.map(|root| spanning_tree(&graph, root)).unwrap_or_default();
        let (placed, canvas) = place(&tree, config);

        let mut positions = BTreeMap::new();
        let mut index = BTreeMap::new();
        let mut nodes = Vec::with_capacity(tree.len());
        for (entry, position) in tree.iter().zip(&placed) {
            let id = graph.id(entry.slot).to_string();
            positions.insert(id.clone(), *position);
            index.insert(id.clone(), nodes.len());
            let color = match entry.branch {
                Some(branch) => config.branch_color(branch).to_string(),
                None => config.root_color.clone(),
            };
            nodes.push(MindMapNode {
                id,
                depth: entry.depth,
                parent: entry.parent.map(|idx| graph.id(tree[idx].slot).to_string()),
                branch: entry.branch,
                color,
                position: *position,
            });
        }

        let curves = route_horizontal(
            &self.edges,
            &positions,
            config.node_width,
            config.curve_offset,
        );
        debug!(nodes = nodes.len(), curves = curves.len(), "computed mind map layout");

        Ok(MindMap {
            root: root.map(|slot| graph.id(slot).to_string()),
            canvas,
            node_width: config.node_width,
            node_height: config.node_height,
            tree: nodes,
            curves,
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
            index,
        })
    }
}

/// Breadth-first spanning tree from `root`; entries are in discovery order and
/// `parent`/`children` index into the returned vector.
fn spanning_tree(graph: &GraphIndex<'_>, root: usize) -> Vec<TreeSlot> {
    let mut entry_of: Vec<Option<usize>> = vec![None; graph.len()];
    let mut tree = vec![TreeSlot {
        slot: root,
        depth: 0,
        parent: None,
        branch: None,
        children: Vec::new(),
    }];
    entry_of[root] = Some(0);

    let mut queue = VecDeque::from([0_usize]);
    while let Some(current) = queue.pop_front() {
        let slot = tree[current].slot;
        for link in graph.children(slot) {
            if entry_of[link.target].is_some() {
                continue;
            }
            let idx = tree.len();
            let branch = match tree[current].branch {
                Some(branch) => Some(branch),
                None => Some(tree[current].children.len()),
            };
            tree.push(TreeSlot {
                slot: link.target,
                depth: tree[current].depth + 1,
                parent: Some(current),
                branch,
                children: Vec::new(),
            });
            tree[current].children.push(idx);
            entry_of[link.target] = Some(idx);
            queue.push_back(idx);
        }
    }

    tree
}

/// Leaves take consecutive rows in depth-first order; a parent is centered on
/// its first and last child.
fn place(tree: &[TreeSlot], config: &MindMapConfig) -> (Vec<Point>, CanvasSize) {
    if tree.is_empty() {
        return (
            Vec::new(),
            CanvasSize {
                width: config.padding_x * 2.0 + config.node_width,
                height: config.padding_y * 2.0 + config.node_height,
            },
        );
    }

    let column = config.node_width + config.level_gap;
    let row = config.node_height + config.sibling_gap;

    let mut preorder = Vec::with_capacity(tree.len());
    let mut stack = vec![0_usize];
    while let Some(idx) = stack.pop() {
        preorder.push(idx);
        stack.extend(tree[idx].children.iter().rev());
    }

    let mut ys = vec![0.0_f32; tree.len()];
    let mut leaves = 0_usize;
    for &idx in &preorder {
        if tree[idx].children.is_empty() {
            ys[idx] = config.padding_y + config.node_height / 2.0 + leaves as f32 * row;
            leaves += 1;
        }
    }
    for &idx in preorder.iter().rev() {
        let children = &tree[idx].children;
        if let (Some(&first), Some(&last)) = (children.first(), children.last()) {
            ys[idx] = (ys[first] + ys[last]) / 2.0;
        }
    }

    let points = tree
        .iter()
        .zip(&ys)
        .map(|(entry, &y)| Point {
            x: config.padding_x + config.node_width / 2.0 + entry.depth as f32 * column,
            y,
        })
        .collect();

    let max_depth = tree.iter().map(|entry| entry.depth).max().unwrap_or(0);
    let canvas = CanvasSize {
        width: config.padding_x * 2.0 + config.node_width + max_depth as f32 * column,
        height: config.padding_y * 2.0 + config.node_height + leaves.saturating_sub(1) as f32 * row,
    };

    (points, canvas)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn biology() -> ConceptMap {
        ConceptMap::new()
            .node("cell", "Cell")
            .node("organelles", "Organelles")
            .node("membrane", "Membrane")
            .node("nucleus", "Nucleus")
            .node("dna", "DNA")
            .node("lipids", "Lipids")
            .edge("cell", "organelles")
            .edge("cell", "membrane")
            .edge("organelles", "nucleus")
            .edge("nucleus", "dna")
            .edge("membrane", "lipids")
    }

    #[test]
    fn descendants_inherit_their_branch_color() {
        let config = MindMapConfig::default();
        let mind_map = biology().mind_map(&config).unwrap();

        let color = |id: &str| mind_map.get(id).unwrap().color.clone();
        assert_eq!(color("cell"), DEFAULT_ROOT_COLOR);
        assert_eq!(color("organelles"), DEFAULT_PALETTE[0]);
        assert_eq!(color("nucleus"), DEFAULT_PALETTE[0]);
        assert_eq!(color("dna"), DEFAULT_PALETTE[0]);
        assert_eq!(color("membrane"), DEFAULT_PALETTE[1]);
        assert_eq!(color("lipids"), DEFAULT_PALETTE[1]);
        assert_eq!(mind_map.get("dna").unwrap().branch, Some(0));
    }

    #[test]
    fn branch_colors_wrap_around_the_palette() {
        let mut map = ConceptMap::new().node("hub", "Hub");
        for idx in 0..3 {
            let id = format!("b{idx}");
            map = map.node(id.clone(), id.clone()).edge("hub", id);
        }
        let config = MindMapConfig {
            palette: vec!["red".to_string(), "blue".to_string()],
            ..MindMapConfig::default()
        };
        let mind_map = map.mind_map(&config).unwrap();

        assert_eq!(mind_map.get("b0").unwrap().color, "red");
        assert_eq!(mind_map.get("b1").unwrap().color, "blue");
        assert_eq!(mind_map.get("b2").unwrap().color, "red");
        assert_eq!(mind_map.get("b2").unwrap().branch, Some(2));
    }

    #[test]
    fn parents_are_centered_on_their_children() {
        let config = MindMapConfig::default();
        let mind_map = biology().mind_map(&config).unwrap();
        let y = |id: &str| mind_map.get(id).unwrap().position.y;

        // Two leaves (dna, lipids) occupy rows 0 and 1.
        let row = config.node_height + config.sibling_gap;
        assert_eq!(y("dna"), config.padding_y + config.node_height / 2.0);
        assert_eq!(y("lipids"), y("dna") + row);
        assert_eq!(y("nucleus"), y("dna"));
        assert_eq!(y("cell"), (y("organelles") + y("membrane")) / 2.0);
    }

    #[test]
    fn columns_follow_depth() {
        let config = MindMapConfig::default();
        let mind_map = biology().mind_map(&config).unwrap();
        let x = |id: &str| mind_map.get(id).unwrap().position.x;

        let column = config.node_width + config.level_gap;
        assert_eq!(x("cell"), config.padding_x + config.node_width / 2.0);
        assert_eq!(x("dna") - x("cell"), 3.0 * column);
        assert_eq!(
            mind_map.canvas.width,
            config.padding_x * 2.0 + config.node_width + 3.0 * column
        );
    }

    #[test]
    fn shared_child_hangs_under_first_parent() {
        let map = ConceptMap::new()
            .node("A", "A")
            .node("B", "B")
            .node("C", "C")
            .node("D", "D")
            .edge("A", "B")
            .edge("A", "C")
            .edge("C", "D")
            .edge("B", "D");
        let mind_map = map.mind_map(&MindMapConfig::default()).unwrap();

        let d = mind_map.get("D").unwrap();
        assert_eq!(d.parent.as_deref(), Some("B"));
        assert_eq!(d.branch, Some(0));
        assert_eq!(mind_map.tree.len(), 4);
        // Both edges into D are still drawn.
        assert_eq!(mind_map.curves.iter().filter(|c| c.to == "D").count(), 2);
    }

    #[test]
    fn curves_take_the_color_of_their_target() {
        let config = MindMapConfig::default();
        let mind_map = biology().mind_map(&config).unwrap();

        for curve in &mind_map.curves {
            let target = mind_map.get(&curve.to).unwrap();
            assert_eq!(target.id, curve.to);
            assert_eq!(mind_map.curve_color(curve), target.color);
        }
        let into_lipids = mind_map.curves.iter().find(|c| c.to == "lipids").unwrap();
        assert_eq!(mind_map.curve_color(into_lipids), DEFAULT_PALETTE[1]);
        assert!(mind_map.get("ribosome").is_none());
    }

    #[test]
    fn rootless_map_is_empty_unless_fallback_requested() {
        let map = ConceptMap::new()
            .node("A", "A")
            .node("B", "B")
            .edge("A", "B")
            .edge("B", "A");

        let empty = map.mind_map(&MindMapConfig::default()).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.root, None);

        let config = MindMapConfig {
            root_fallback: RootFallback::FirstNode,
            ..MindMapConfig::default()
        };
        let fallback = map.mind_map(&config).unwrap();
        assert_eq!(fallback.root.as_deref(), Some("A"));
        assert_eq!(fallback.tree.len(), 2);
    }

    #[test]
    fn empty_palette_is_rejected() {
        let config = MindMapConfig {
            palette: Vec::new(),
            ..MindMapConfig::default()
        };
        assert!(matches!(
            biology().mind_map(&config),
            Err(LayoutError::InvalidConfig(_))
        ));
    }
}
