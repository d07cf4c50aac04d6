use serde::{Deserialize, Serialize};

use crate::Result;

/// Key under which the generation endpoint nests the map in its response.
const ENVELOPE_KEY: &str = "conceptMap";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub description: String,
}

impl Node {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Falls back to the id when the generator left the label blank.
    pub fn display_label(&self) -> &str {
        if self.label.trim().is_empty() {
            &self.id
        } else {
            &self.label
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub label: String,
}

impl Edge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            label: String::new(),
        }
    }

    pub fn labeled(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptMap {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl ConceptMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a generation response. Both the bare `{ nodes, edges }` shape and
    /// the `{ "conceptMap": { nodes, edges } }` envelope are accepted.
    pub fn parse(payload: &str) -> Result<Self> {
        let mut value: serde_json::Value = serde_json::from_str(payload)?;
        if let Some(inner) = value.get_mut(ENVELOPE_KEY) {
            let inner = inner.take();
            return Ok(serde_json::from_value(inner)?);
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn node(mut self, id: impl Into<String>, label: impl Into<String>) -> Self {
        self.nodes.push(Node::new(id, label));
        self
    }

    pub fn edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.edges.push(Edge::new(from, to));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
