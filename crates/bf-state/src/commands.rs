//! Editor Commands
//!
//! The discrete edits the interaction layer issues against a [`Session`].
//! Commands are plain data so they can be scripted from JSON:
//!
//! ```json
//! [
//!   { "type": "addNode", "kind": "match", "config": { "capacity": 4 } },
//!   { "type": "connect", "source": "m1", "target": "p1" },
//!   { "type": "editEdgeCondition", "edge": "e2", "condition": { "field": "default" } },
//!   { "type": "undo" }
//! ]
//! ```
//!
//! [`Session`]: crate::Session

use serde::{Deserialize, Serialize};

use bf_core::{Condition, EdgeId, NodeId, NodeKind, NodePatch, Point};

/// Initial settings for a new node. Fields that do not apply to the node's
/// kind are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeConfig {
    /// Match capacity; the preference default when absent
    pub capacity: Option<u32>,
    /// Podium position; the lowest free position when absent
    pub podium_position: Option<u32>,
    /// Layout position
    pub position: Option<Point>,
}

/// A single edit request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Command {
    AddNode {
        kind: NodeKind,
        #[serde(default)]
        config: NodeConfig,
    },
    Connect {
        source: NodeId,
        target: NodeId,
    },
    MoveNode {
        id: NodeId,
        position: Point,
    },
    EditNodeConfig {
        id: NodeId,
        patch: NodePatch,
    },
    EditEdgeCondition {
        edge: EdgeId,
        condition: Condition,
    },
    DeleteSelection {
        #[serde(default)]
        nodes: Vec<NodeId>,
        #[serde(default)]
        edges: Vec<EdgeId>,
    },
    Copy {
        nodes: Vec<NodeId>,
    },
    Paste {
        #[serde(default)]
        anchor: Option<Point>,
    },
    Undo,
    Redo,
}

impl Command {
    /// Short name for logs
    pub fn name(&self) -> &'static str {
        match self {
            Command::AddNode { .. } => "AddNode",
            Command::Connect { .. } => "Connect",
            Command::MoveNode { .. } => "MoveNode",
            Command::EditNodeConfig { .. } => "EditNodeConfig",
            Command::EditEdgeCondition { .. } => "EditEdgeCondition",
            Command::DeleteSelection { .. } => "DeleteSelection",
            Command::Copy { .. } => "Copy",
            Command::Paste { .. } => "Paste",
            Command::Undo => "Undo",
            Command::Redo => "Redo",
        }
    }
}

/// Parse a JSON array of commands
pub fn parse_script(text: &str) -> bf_core::BfResult<Vec<Command>> {
    serde_json::from_str(text).map_err(|e| bf_core::BfError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bf_core::Comparison;

    #[test]
    fn test_parse_script() {
        let script = r#"[
            { "type": "addNode", "kind": "podium" },
            { "type": "addNode", "kind": "match", "config": { "capacity": 4, "position": { "x": 1, "y": 2 } } },
            { "type": "connect", "source": "m1", "target": "p1" },
            { "type": "editEdgeCondition", "edge": "e1", "condition": { "field": "score", "operator": ">", "value": 10 } },
            { "type": "deleteSelection", "edges": ["e1"] },
            { "type": "paste" },
            { "type": "undo" }
        ]"#;
        let commands = parse_script(script).unwrap();
        assert_eq!(commands.len(), 7);
        assert_eq!(
            commands[0],
            Command::AddNode {
                kind: NodeKind::PodiumSink,
                config: NodeConfig::default()
            }
        );
        assert_eq!(
            commands[1],
            Command::AddNode {
                kind: NodeKind::Match,
                config: NodeConfig {
                    capacity: Some(4),
                    podium_position: None,
                    position: Some(Point::new(1.0, 2.0)),
                }
            }
        );
        assert_eq!(
            commands[3],
            Command::EditEdgeCondition {
                edge: "e1".into(),
                condition: Condition::Score {
                    operator: Comparison::Gt,
                    value: 10.0
                }
            }
        );
        assert_eq!(
            commands[4],
            Command::DeleteSelection {
                nodes: Vec::new(),
                edges: vec!["e1".into()]
            }
        );
        assert_eq!(commands[5], Command::Paste { anchor: None });
        assert_eq!(commands[6], Command::Undo);
    }

    #[test]
    fn test_unknown_command_rejected() {
        let err = parse_script(r#"[{ "type": "explode" }]"#).unwrap_err();
        assert!(matches!(err, bf_core::BfError::Serialization(_)));
    }
}
