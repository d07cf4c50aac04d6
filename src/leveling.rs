//! Multi-source breadth-first leveling.
//!
//! Every root is seeded at level 0 and children are enqueued one level below
//! the entry that reached them. With `allow_multi_parent_duplication` a node
//! reached over several paths is enqueued once per path, so it shows up in its
//! bucket several times and its level is the one of the last occurrence
//! processed. Without it, the first visit wins.
//!
//! Edges that close a cycle are found up front with a depth-first pass from
//! the same roots and are never followed, which keeps the traversal finite on
//! any input.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::graph::GraphIndex;
use crate::{DEFAULT_MAX_EXPANSIONS, LayoutError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LevelingOptions {
    pub allow_multi_parent_duplication: bool,
    /// Upper bound on dequeued entries. Duplicated leveling of a dense DAG can
    /// enqueue one entry per path.
    pub max_expansions: usize,
}

impl Default for LevelingOptions {
    fn default() -> Self {
        Self {
            allow_multi_parent_duplication: true,
            max_expansions: DEFAULT_MAX_EXPANSIONS,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Leveling {
    /// Slots per level, in discovery order. May repeat a slot.
    pub levels: Vec<Vec<usize>>,
    /// Level per slot; `None` for orphans.
    pub level_of: Vec<Option<usize>>,
    /// Payload indices of edges skipped because they close a cycle.
    pub broken_edges: Vec<usize>,
    /// Number of queue entries processed.
    pub steps: usize,
}

impl Leveling {
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

pub fn level(
    graph: &GraphIndex<'_>,
    roots: &[usize],
    options: &LevelingOptions,
) -> Result<Leveling> {
    let broken = cycle_closing_edges(graph, roots);
    let broken_edges: Vec<usize> = broken
        .iter()
        .enumerate()
        .filter_map(|(idx, &is_broken)| is_broken.then_some(idx))
        .collect();

    for &edge in &broken_edges {
        let edge = &graph.map().edges[edge];
        debug!(from = %edge.from, to = %edge.to, "ignoring cycle-closing edge during leveling");
    }

    let mut levels: Vec<Vec<usize>> = Vec::new();
    let mut level_of = vec![None; graph.len()];
    let mut seen = vec![false; graph.len()];
    let mut queue: VecDeque<(usize, usize)> = VecDeque::new();

    for &root in roots {
        seen[root] = true;
        queue.push_back((root, 0));
    }

    let mut steps = 0_usize;
    while let Some((slot, depth)) = queue.pop_front() {
        if steps == options.max_expansions {
            return Err(LayoutError::ExpansionLimit {
                limit: options.max_expansions,
            });
        }
        steps += 1;

        if levels.len() <= depth {
            levels.resize_with(depth + 1, Vec::new);
        }
        levels[depth].push(slot);
        level_of[slot] = Some(depth);

        for link in graph.children(slot) {
            if broken[link.edge] {
                continue;
            }
            if !options.allow_multi_parent_duplication {
                if seen[link.target] {
                    continue;
                }
                seen[link.target] = true;
            }
            queue.push_back((link.target, depth + 1));
        }
    }

    Ok(Leveling {
        levels,
        level_of,
        broken_edges,
        steps,
    })
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

/// Flags, per payload edge, the back edges of a depth-first walk from `roots`.
/// Removing them leaves the reachable subgraph acyclic.
fn cycle_closing_edges(graph: &GraphIndex<'_>, roots: &[usize]) -> Vec<bool> {
    let mut broken = vec![false; graph.map().edges.len()];
    let mut marks = vec![Mark::Unvisited; graph.len()];
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for &root in roots {
        if marks[root] != Mark::Unvisited {
            continue;
        }
        marks[root] = Mark::OnStack;
        stack.push((root, 0));

        while let Some(frame) = stack.last_mut() {
            let (slot, cursor) = *frame;
            let Some(&link) = graph.children(slot).get(cursor) else {
                marks[slot] = Mark::Done;
                stack.pop();
                continue;
            };
            frame.1 += 1;

            match marks[link.target] {
                Mark::Unvisited => {
                    marks[link.target] = Mark::OnStack;
                    stack.push((link.target, 0));
                }
                Mark::OnStack => broken[link.edge] = true,
                Mark::Done => {}
            }
        }
    }

    broken
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConceptMap;

    fn levels_by_id(graph: &GraphIndex<'_>, leveling: &Leveling) -> Vec<Vec<String>> {
        leveling
            .levels
            .iter()
            .map(|bucket| {
                bucket
                    .iter()
                    .map(|&slot| graph.id(slot).to_string())
                    .collect()
            })
            .collect()
    }

    fn run(map: &ConceptMap, options: LevelingOptions) -> (GraphIndex<'_>, Leveling) {
        let graph = GraphIndex::build(map);
        let roots = graph.roots();
        let leveling = level(&graph, &roots, &options).unwrap();
        (graph, leveling)
    }

    #[test]
    fn tree_levels_match_bfs_distance() {
        let map = ConceptMap::new()
            .node("A", "A")
            .node("B", "B")
            .node("C", "C")
            .node("D", "D")
            .edge("A", "B")
            .edge("B", "D")
            .edge("A", "C");
        let (graph, leveling) = run(&map, LevelingOptions::default());

        let level_of = |id: &str| leveling.level_of[graph.slot_of(id).unwrap()];
        assert_eq!(level_of("A"), Some(0));
        assert_eq!(level_of("B"), Some(1));
        assert_eq!(level_of("C"), Some(1));
        assert_eq!(level_of("D"), Some(2));
        assert_eq!(
            levels_by_id(&graph, &leveling),
            vec![vec!["A"], vec!["B", "C"], vec!["D"]]
        );
    }

    fn diamond() -> ConceptMap {
        ConceptMap::new()
            .node("A", "A")
            .node("B", "B")
            .node("C", "C")
            .node("D", "D")
            .edge("A", "B")
            .edge("A", "C")
            .edge("B", "D")
            .edge("C", "D")
    }

    #[test]
    fn diamond_repeats_shared_child_once_per_path() {
        let map = diamond();
        let (graph, leveling) = run(&map, LevelingOptions::default());

        assert_eq!(levels_by_id(&graph, &leveling)[2], vec!["D", "D"]);
        assert_eq!(leveling.level_of[graph.slot_of("D").unwrap()], Some(2));
        assert_eq!(leveling.steps, 5);
    }

    #[test]
    fn deduplicated_leveling_keeps_first_visit() {
        let map = diamond();
        let options = LevelingOptions {
            allow_multi_parent_duplication: false,
            ..LevelingOptions::default()
        };
        let (graph, leveling) = run(&map, options);

        assert_eq!(levels_by_id(&graph, &leveling)[2], vec!["D"]);
        assert_eq!(leveling.steps, 4);
    }

    #[test]
    fn last_processed_occurrence_sets_the_level() {
        // D is reached at level 1 from A and at level 2 through B; the deeper
        // entry is dequeued last.
        let map = ConceptMap::new()
            .node("A", "A")
            .node("B", "B")
            .node("D", "D")
            .edge("A", "D")
            .edge("A", "B")
            .edge("B", "D");
        let (graph, leveling) = run(&map, LevelingOptions::default());

        assert_eq!(levels_by_id(&graph, &leveling), vec![vec!["A"], vec!["D", "B"], vec!["D"]]);
        assert_eq!(leveling.level_of[graph.slot_of("D").unwrap()], Some(2));
    }

    #[test]
    fn orphans_in_a_detached_cycle_stay_unleveled() {
        let map = ConceptMap::new()
            .node("R", "R")
            .node("X", "X")
            .node("Y", "Y")
            .edge("X", "Y")
            .edge("Y", "X");
        let (graph, leveling) = run(&map, LevelingOptions::default());

        assert_eq!(levels_by_id(&graph, &leveling), vec![vec!["R"]]);
        assert_eq!(leveling.level_of[graph.slot_of("X").unwrap()], None);
        assert!(leveling.broken_edges.is_empty());
    }

    #[test]
    fn two_node_cycle_terminates_without_levels() {
        let map = ConceptMap::new()
            .node("A", "A")
            .node("B", "B")
            .edge("A", "B")
            .edge("B", "A");
        let (_, leveling) = run(&map, LevelingOptions::default());

        assert!(leveling.is_empty());
        assert_eq!(leveling.steps, 0);
    }

    #[test]
    fn reachable_cycle_is_broken_and_traversal_is_bounded() {
        let map = ConceptMap::new()
            .node("R", "R")
            .node("A", "A")
            .node("B", "B")
            .edge("R", "A")
            .edge("A", "B")
            .edge("B", "A");
        let (graph, leveling) = run(&map, LevelingOptions::default());

        assert_eq!(leveling.broken_edges, vec![2]);
        assert_eq!(levels_by_id(&graph, &leveling), vec![vec!["R"], vec!["A"], vec!["B"]]);
        assert!(leveling.steps <= graph.len());
    }

    #[test]
    fn self_loop_on_a_fallback_root_is_broken() {
        let map = ConceptMap::new().node("A", "A").edge("A", "A");
        let graph = GraphIndex::build(&map);
        assert!(graph.roots().is_empty());

        let leveling = level(&graph, &[0], &LevelingOptions::default()).unwrap();
        assert_eq!(leveling.broken_edges, vec![0]);
        assert_eq!(leveling.levels, vec![vec![0]]);
    }

    #[test]
    fn expansion_budget_is_enforced() {
        // A ladder of diamonds doubles the path count at every rung.
        let mut map = ConceptMap::new().node("n0", "n0");
        for rung in 0..12 {
            let top = format!("n{rung}");
            let left = format!("l{rung}");
            let right = format!("r{rung}");
            let bottom = format!("n{}", rung + 1);
            map = map
                .node(left.clone(), left.clone())
                .node(right.clone(), right.clone())
                .node(bottom.clone(), bottom.clone())
                .edge(top.clone(), left.clone())
                .edge(top, right.clone())
                .edge(left, bottom.clone())
                .edge(right, bottom);
        }
        let graph = GraphIndex::build(&map);
        let options = LevelingOptions {
            allow_multi_parent_duplication: true,
            max_expansions: 1_000,
        };

        let err = level(&graph, &graph.roots(), &options).unwrap_err();
        assert!(matches!(err, LayoutError::ExpansionLimit { limit: 1_000 }));

        let deduped = LevelingOptions {
            allow_multi_parent_duplication: false,
            max_expansions: 1_000,
        };
        let leveling = level(&graph, &graph.roots(), &deduped).unwrap();
        assert_eq!(leveling.steps, graph.len());
    }
}
