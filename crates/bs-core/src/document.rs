use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ScriptError;
use crate::node::{Choice, Node};

pub const ENTRY_NODE_ID: &str = "start";

/// One chapter's playable content: node id to node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScriptDocument {
    nodes: BTreeMap<String, Node>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Next,
    Choice { index: usize },
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
}

impl Edge {
    pub fn label(&self) -> String {
        match self.kind {
            EdgeKind::Next => "next".to_string(),
            EdgeKind::Choice { index } => format!("choice #{}", index + 1),
            EdgeKind::Fallback => "fallback".to_string(),
        }
    }
}

impl ScriptDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ScriptError> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|error| ScriptError::new("DOC_INVALID_JSON", error.to_string()))?;
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, ScriptError> {
        let Value::Object(entries) = value else {
            return Err(ScriptError::new(
                "DOC_NOT_OBJECT",
                "Script document must be a JSON object keyed by node id.",
            ));
        };

        let mut nodes = BTreeMap::new();
        for (node_id, raw_node) in entries {
            let node: Node = serde_json::from_value(raw_node).map_err(|error| {
                ScriptError::at_node(
                    "DOC_NODE_INVALID",
                    format!("Node \"{}\" is invalid: {}", node_id, error),
                    node_id.clone(),
                )
            })?;
            nodes.insert(node_id, node);
        }
        Ok(Self { nodes })
    }

    pub fn to_value(&self) -> Value {
        let mut object = serde_json::Map::new();
        for (node_id, node) in &self.nodes {
            object.insert(node_id.clone(), node_value(node));
        }
        Value::Object(object)
    }

    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(&self.to_value()).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn get(&self, node_id: &str) -> Option<&Node> {
        self.nodes.get(node_id)
    }

    pub fn get_mut(&mut self, node_id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(node_id)
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.nodes.contains_key(node_id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.nodes.iter().map(|(id, node)| (id.as_str(), node))
    }

    pub fn has_entry(&self) -> bool {
        self.contains(ENTRY_NODE_ID)
    }

    /// Adds or replaces a node.
    pub fn upsert_node(&mut self, node_id: impl Into<String>, node: Node) -> Option<Node> {
        self.nodes.insert(node_id.into(), node)
    }

    pub fn insert_node(&mut self, node_id: impl Into<String>, node: Node) -> Result<(), ScriptError> {
        let node_id = node_id.into();
        if node_id.is_empty() {
            return Err(ScriptError::new("DOC_NODE_ID_EMPTY", "Node id cannot be empty."));
        }
        if self.nodes.contains_key(&node_id) {
            return Err(ScriptError::at_node(
                "DOC_NODE_EXISTS",
                format!("Node \"{}\" already exists.", node_id),
                node_id,
            ));
        }
        self.nodes.insert(node_id, node);
        Ok(())
    }

    /// Template used by the editor when an author creates a node.
    pub fn new_dialogue_node() -> Node {
        Node::dialogue("Narrator", "New node...").with_next("")
    }

    /// Removes a node. References pointing at it are left dangling for the
    /// validator to report.
    pub fn remove_node(&mut self, node_id: &str) -> Result<Node, ScriptError> {
        self.nodes.remove(node_id).ok_or_else(|| missing_node(node_id))
    }

    pub fn add_choice(&mut self, node_id: &str, choice: Choice) -> Result<usize, ScriptError> {
        let node = self.nodes.get_mut(node_id).ok_or_else(|| missing_node(node_id))?;
        node.choices.push(choice);
        Ok(node.choices.len() - 1)
    }

    pub fn remove_choice(&mut self, node_id: &str, index: usize) -> Result<Choice, ScriptError> {
        let node = self.nodes.get_mut(node_id).ok_or_else(|| missing_node(node_id))?;
        if index >= node.choices.len() {
            return Err(ScriptError::at_node(
                "DOC_CHOICE_INDEX",
                format!("Node \"{}\" has no choice #{}.", node_id, index + 1),
                node_id,
            ));
        }
        Ok(node.choices.remove(index))
    }

    /// Structural edges for the graph view. Choices shadow `next`.
    pub fn edges(&self) -> Vec<Edge> {
        let mut edges = Vec::new();
        for (node_id, node) in &self.nodes {
            if node.choices.is_empty() {
                if let Some(next) = node.next_target() {
                    edges.push(Edge {
                        from: node_id.clone(),
                        to: next.to_string(),
                        kind: EdgeKind::Next,
                    });
                }
            } else {
                for (index, choice) in node.choices.iter().enumerate() {
                    if let Some(next) = choice.target() {
                        edges.push(Edge {
                            from: node_id.clone(),
                            to: next.to_string(),
                            kind: EdgeKind::Choice { index },
                        });
                    }
                }
            }
            if let Some(fallback) = node.fallback_target() {
                edges.push(Edge {
                    from: node_id.clone(),
                    to: fallback.to_string(),
                    kind: EdgeKind::Fallback,
                });
            }
        }
        edges
    }
}

/// Canonical JSON form of one node. Object keys come out sorted, so two nodes
/// with the same content always serialize identically.
pub fn node_value(node: &Node) -> Value {
    serde_json::to_value(node).unwrap_or(Value::Null)
}

fn missing_node(node_id: &str) -> ScriptError {
    ScriptError::at_node(
        "DOC_NODE_NOT_FOUND",
        format!("Node \"{}\" does not exist.", node_id),
        node_id,
    )
}
