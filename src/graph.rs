//! Arena view over a [`ConceptMap`]: node slots, in-degrees and ordered
//! adjacency. Everything downstream works on slot indices.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::{ConceptMap, Node};

/// One outgoing edge: the child slot and the index of the edge in the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    pub target: usize,
    pub edge: usize,
}

#[derive(Debug, Clone)]
pub struct GraphIndex<'a> {
    map: &'a ConceptMap,
    /// slot -> index into `map.nodes` of the entry that owns the slot.
    owners: Vec<usize>,
    slots: HashMap<&'a str, usize>,
    in_degree: Vec<usize>,
    children: Vec<Vec<Link>>,
    dangling: Vec<usize>,
}

impl<'a> GraphIndex<'a> {
    pub fn build(map: &'a ConceptMap) -> Self {
        let mut owners = Vec::with_capacity(map.nodes.len());
        let mut slots: HashMap<&'a str, usize> = HashMap::with_capacity(map.nodes.len());

        for (idx, node) in map.nodes.iter().enumerate() {
            match slots.get(node.id.as_str()) {
                // Duplicate id: the later entry wins, the slot keeps its place.
                Some(&slot) => owners[slot] = idx,
                None => {
                    slots.insert(node.id.as_str(), owners.len());
                    owners.push(idx);
                }
            }
        }

        let mut in_degree = vec![0_usize; owners.len()];
        let mut children = vec![Vec::new(); owners.len()];
        let mut dangling = Vec::new();

        for (idx, edge) in map.edges.iter().enumerate() {
            let (Some(&from), Some(&to)) =
                (slots.get(edge.from.as_str()), slots.get(edge.to.as_str()))
            else {
                debug!(from = %edge.from, to = %edge.to, "skipping edge with unknown endpoint");
                dangling.push(idx);
                continue;
            };
            children[from].push(Link {
                target: to,
                edge: idx,
            });
            in_degree[to] += 1;
        }

        Self {
            map,
            owners,
            slots,
            in_degree,
            children,
            dangling,
        }
    }

    pub fn map(&self) -> &'a ConceptMap {
        self.map
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    pub fn node(&self, slot: usize) -> &'a Node {
        &self.map.nodes[self.owners[slot]]
    }

    pub fn id(&self, slot: usize) -> &'a str {
        self.node(slot).id.as_str()
    }

    pub fn slot_of(&self, id: &str) -> Option<usize> {
        self.slots.get(id).copied()
    }

    pub fn children(&self, slot: usize) -> &[Link] {
        &self.children[slot]
    }

    /// Slots with no incoming edge, in payload order.
    pub fn roots(&self) -> Vec<usize> {
        (0..self.len())
            .filter(|&slot| self.in_degree[slot] == 0)
            .collect()
    }

    pub fn root_ids(&self) -> Vec<&'a str> {
        self.roots().into_iter().map(|slot| self.id(slot)).collect()
    }

    /// Payload indices of edges that reference a node id missing from the map.
    pub fn dangling_edges(&self) -> &[usize] {
        &self.dangling
    }

    pub fn in_degree_map(&self) -> BTreeMap<String, usize> {
        (0..self.len())
            .map(|slot| (self.id(slot).to_string(), self.in_degree[slot]))
            .collect()
    }

    pub fn adjacency(&self) -> BTreeMap<String, Vec<String>> {
        (0..self.len())
            .map(|slot| {
                let targets = self.children[slot]
                    .iter()
                    .map(|link| self.id(link.target).to_string())
                    .collect();
                (self.id(slot).to_string(), targets)
            })
            .collect()
    }
}
