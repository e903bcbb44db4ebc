use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::Role;

/// Canvas coordinates of a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeShape {
    #[default]
    Rectangle,
    Circle,
    Diamond,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub shape: NodeShape,
    pub position: Position,
}

impl Node {
    pub fn new(label: impl Into<String>, position: Position) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            label: label.into(),
            shape: NodeShape::default(),
            position,
        }
    }
}

/// Directed connection between two nodes, by node id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
}

impl Edge {
    pub fn between(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            source: source.into(),
            target: target.into(),
        }
    }
}

/// A change emitted by the rendering surface, applied to the local working
/// copy after it passes the capability gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum GraphChange {
    NodeAdded { node: Node },
    NodeMoved { id: String, position: Position },
    NodeRenamed { id: String, label: String },
    NodeRemoved { id: String },
    EdgeConnected { edge: Edge },
    EdgeRemoved { id: String },
}

/// A persisted diagram document: the unit of ownership, sharing and
/// persistence.
///
/// `shared_with` maps a collaborator uid to the role granted to it. A
/// missing key means no access at all; the owner is tracked by `owner_id`
/// and never needs an entry here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagram {
    pub id: String,
    pub owner_id: String,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub shared_with: HashMap<String, Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Diagram {
    /// New empty diagram owned by `owner_id`.
    pub fn new(owner_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: format!("dg_{}", Uuid::new_v4()),
            owner_id: owner_id.into(),
            nodes: Vec::new(),
            edges: Vec::new(),
            shared_with: HashMap::new(),
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    /// Structural guard for records coming out of a store. Rejects records
    /// missing identity fields or holding duplicate node ids.
    pub fn is_valid(&self) -> bool {
        if self.id.is_empty() || self.owner_id.is_empty() {
            return false;
        }
        let mut seen = std::collections::HashSet::new();
        self.nodes.iter().all(|n| seen.insert(n.id.as_str()))
    }

    pub fn find_node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Apply one change to the in-memory graph. Returns whether anything
    /// actually changed, so callers only arm a save for real edits.
    pub fn apply(&mut self, change: GraphChange) -> bool {
        match change {
            GraphChange::NodeAdded { node } => {
                // Node ids stay unique: re-adding an existing id replaces it.
                if let Some(existing) = self.nodes.iter_mut().find(|n| n.id == node.id) {
                    *existing = node;
                } else {
                    self.nodes.push(node);
                }
                true
            }
            GraphChange::NodeMoved { id, position } => {
                match self.nodes.iter_mut().find(|n| n.id == id) {
                    Some(node) => {
                        node.position = position;
                        true
                    }
                    None => false,
                }
            }
            GraphChange::NodeRenamed { id, label } => {
                match self.nodes.iter_mut().find(|n| n.id == id) {
                    Some(node) => {
                        node.label = label;
                        true
                    }
                    None => false,
                }
            }
            GraphChange::NodeRemoved { id } => {
                let before = self.nodes.len();
                self.nodes.retain(|n| n.id != id);
                if self.nodes.len() == before {
                    return false;
                }
                // Dangling edges go with the node.
                self.edges.retain(|e| e.source != id && e.target != id);
                true
            }
            GraphChange::EdgeConnected { mut edge } => {
                let duplicate = self
                    .edges
                    .iter()
                    .any(|e| e.source == edge.source && e.target == edge.target);
                if duplicate {
                    return false;
                }
                if edge.id.is_empty() {
                    edge.id = Uuid::new_v4().to_string();
                }
                self.edges.push(edge);
                true
            }
            GraphChange::EdgeRemoved { id } => {
                let before = self.edges.len();
                self.edges.retain(|e| e.id != id);
                self.edges.len() != before
            }
        }
    }
}
