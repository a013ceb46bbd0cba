//! Bracket graph data model
//!
//! Nodes and edges are plain data keyed by string ids. Relationships are
//! resolved by id lookup in the [`GraphStore`](crate::GraphStore), never by
//! references between records.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{FieldError, MAX_MATCH_CAPACITY, MIN_MATCH_CAPACITY};

// ═══════════════════════════════════════════════════════════════════════════════
// IDENTIFIERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Unique identifier for bracket nodes
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Unique identifier for bracket edges
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(String);

impl EdgeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EdgeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for EdgeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// NODES
// ═══════════════════════════════════════════════════════════════════════════════

/// Opaque layout coordinate, owned by the rendering layer
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

/// Node kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeKind {
    #[serde(rename = "match")]
    Match,
    #[serde(rename = "podium")]
    PodiumSink,
    #[serde(rename = "disqualification")]
    DisqualificationSink,
}

impl NodeKind {
    /// Every kind the structural minimum requires, in check order
    pub const REQUIRED: [NodeKind; 3] = [
        NodeKind::Match,
        NodeKind::PodiumSink,
        NodeKind::DisqualificationSink,
    ];

    /// Sinks are graph terminals and never have outgoing edges
    pub fn is_sink(self) -> bool {
        !matches!(self, NodeKind::Match)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Match => "match",
            NodeKind::PodiumSink => "podium",
            NodeKind::DisqualificationSink => "disqualification",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a slot's participant comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotSource {
    pub source_node_id: NodeId,
    pub source_outcome: String,
}

/// Participant slot of a match
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant_id: Option<String>,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub source: Option<SlotSource>,
}

impl Slot {
    pub fn empty(index: u32) -> Self {
        Self {
            index,
            participant_id: None,
            source: None,
        }
    }

    /// Drop participant and provenance, keeping the index
    pub fn clear(&mut self) {
        self.participant_id = None;
        self.source = None;
    }

    pub fn is_empty(&self) -> bool {
        self.participant_id.is_none() && self.source.is_none()
    }
}

/// Kind-specific node payload
#[derive(Debug, Clone, PartialEq)]
pub enum NodeBody {
    Match { capacity: u32, slots: Vec<Slot> },
    PodiumSink { position: u32 },
    DisqualificationSink,
}

/// Bracket node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NodeRecord", into = "NodeRecord")]
pub struct Node {
    pub id: NodeId,
    pub body: NodeBody,
    pub position: Option<Point>,
}

impl Node {
    /// Match node with `capacity` empty slots
    pub fn match_node(id: impl Into<NodeId>, capacity: u32) -> Self {
        Self {
            id: id.into(),
            body: NodeBody::Match {
                capacity,
                slots: (0..capacity).map(Slot::empty).collect(),
            },
            position: None,
        }
    }

    pub fn podium(id: impl Into<NodeId>, position: u32) -> Self {
        Self {
            id: id.into(),
            body: NodeBody::PodiumSink { position },
            position: None,
        }
    }

    pub fn disqualification(id: impl Into<NodeId>) -> Self {
        Self {
            id: id.into(),
            body: NodeBody::DisqualificationSink,
            position: None,
        }
    }

    pub fn with_position(mut self, position: Point) -> Self {
        self.position = Some(position);
        self
    }

    pub fn kind(&self) -> NodeKind {
        match self.body {
            NodeBody::Match { .. } => NodeKind::Match,
            NodeBody::PodiumSink { .. } => NodeKind::PodiumSink,
            NodeBody::DisqualificationSink => NodeKind::DisqualificationSink,
        }
    }

    pub fn is_sink(&self) -> bool {
        self.kind().is_sink()
    }

    /// Ranking position, for podium sinks only
    pub fn podium_position(&self) -> Option<u32> {
        match self.body {
            NodeBody::PodiumSink { position } => Some(position),
            _ => None,
        }
    }

    /// Participant capacity, for matches only
    pub fn capacity(&self) -> Option<u32> {
        match self.body {
            NodeBody::Match { capacity, .. } => Some(capacity),
            _ => None,
        }
    }

    pub fn slots(&self) -> &[Slot] {
        match &self.body {
            NodeBody::Match { slots, .. } => slots,
            _ => &[],
        }
    }

    pub fn slots_mut(&mut self) -> Option<&mut Vec<Slot>> {
        match &mut self.body {
            NodeBody::Match { slots, .. } => Some(slots),
            _ => None,
        }
    }

    /// Apply the fields of `patch` that make sense for this node's kind.
    ///
    /// Capacity changes resize the slot list, keeping existing slots.
    pub fn apply_patch(&mut self, patch: &NodePatch) {
        match &mut self.body {
            NodeBody::Match { capacity, slots } => {
                if let Some(new_slots) = &patch.slots {
                    *slots = new_slots.clone();
                }
                if let Some(new_capacity) = patch.capacity {
                    *capacity = new_capacity;
                }
                resize_slots(slots, *capacity);
            }
            NodeBody::PodiumSink { position } => {
                if let Some(new_position) = patch.podium_position {
                    *position = new_position;
                }
            }
            NodeBody::DisqualificationSink => {}
        }
        if let Some(point) = patch.position {
            self.position = Some(point);
        }
    }
}

/// Reject a match capacity outside `MIN_MATCH_CAPACITY..=MAX_MATCH_CAPACITY`
pub fn check_capacity(capacity: u32) -> Result<(), FieldError> {
    if capacity < MIN_MATCH_CAPACITY {
        return Err(FieldError::new("capacity", "Capacity must be at least 1"));
    }
    if capacity > MAX_MATCH_CAPACITY {
        return Err(FieldError::new(
            "capacity",
            format!("Capacity must be at most {MAX_MATCH_CAPACITY}"),
        ));
    }
    Ok(())
}

/// One slot per index below `capacity`, in index order. Given slots keep
/// their place; the first wins on a repeated index.
fn resize_slots(slots: &mut Vec<Slot>, capacity: u32) {
    let mut given = std::mem::take(slots);
    given.sort_by_key(|s| s.index);
    let mut given = given.into_iter().peekable();

    for index in 0..capacity {
        let slot = given
            .next_if(|s| s.index == index)
            .unwrap_or_else(|| Slot::empty(index));
        while given.next_if(|s| s.index == index).is_some() {}
        slots.push(slot);
    }
}

/// Partial node update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NodePatch {
    pub capacity: Option<u32>,
    pub slots: Option<Vec<Slot>>,
    pub podium_position: Option<u32>,
    pub position: Option<Point>,
}

impl NodePatch {
    pub fn is_empty(&self) -> bool {
        self.capacity.is_none()
            && self.slots.is_none()
            && self.podium_position.is_none()
            && self.position.is_none()
    }
}

/// Flat wire shape of a node
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeRecord {
    id: NodeId,
    kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    capacity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    slots: Option<Vec<Slot>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    podium_position: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    position: Option<Point>,
}

impl TryFrom<NodeRecord> for Node {
    type Error = String;

    fn try_from(record: NodeRecord) -> Result<Self, Self::Error> {
        let body = match record.kind {
            NodeKind::Match => {
                let capacity = record
                    .capacity
                    .ok_or_else(|| format!("match node {} has no capacity", record.id))?;
                check_capacity(capacity).map_err(|e| format!("match node {}: {}", record.id, e.message))?;
                let mut slots = record.slots.unwrap_or_default();
                resize_slots(&mut slots, capacity);
                NodeBody::Match { capacity, slots }
            }
            NodeKind::PodiumSink => NodeBody::PodiumSink {
                position: record
                    .podium_position
                    .ok_or_else(|| format!("podium node {} has no podiumPosition", record.id))?,
            },
            NodeKind::DisqualificationSink => NodeBody::DisqualificationSink,
        };
        Ok(Node {
            id: record.id,
            body,
            position: record.position,
        })
    }
}

impl From<Node> for NodeRecord {
    fn from(node: Node) -> Self {
        let kind = node.kind();
        let (capacity, slots, podium_position) = match node.body {
            NodeBody::Match { capacity, slots } => (Some(capacity), Some(slots), None),
            NodeBody::PodiumSink { position } => (None, None, Some(position)),
            NodeBody::DisqualificationSink => (None, None, None),
        };
        NodeRecord {
            id: node.id,
            kind,
            capacity,
            slots,
            podium_position,
            position: node.position,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CONDITIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Comparison operator of a routing condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Comparison {
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "<")]
    Lt,
}

impl Comparison {
    pub const ALL: [Comparison; 6] = [
        Comparison::Ge,
        Comparison::Le,
        Comparison::Eq,
        Comparison::Ne,
        Comparison::Gt,
        Comparison::Lt,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            Comparison::Ge => ">=",
            Comparison::Le => "<=",
            Comparison::Eq => "==",
            Comparison::Ne => "!=",
            Comparison::Gt => ">",
            Comparison::Lt => "<",
        }
    }

    pub fn test(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Comparison::Ge => lhs >= rhs,
            Comparison::Le => lhs <= rhs,
            Comparison::Eq => lhs == rhs,
            Comparison::Ne => lhs != rhs,
            Comparison::Gt => lhs > rhs,
            Comparison::Lt => lhs < rhs,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Comparison {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Comparison::ALL
            .into_iter()
            .find(|op| op.symbol() == s.trim())
            .ok_or_else(|| format!("unknown operator `{s}`"))
    }
}

/// Routing condition of an edge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", rename_all = "lowercase")]
pub enum Condition {
    /// Catch-all route
    Default,
    Score { operator: Comparison, value: f64 },
    Position { operator: Comparison, value: f64 },
}

impl Condition {
    /// Concrete condition given to demoted and freshly connected edges
    pub const FALLBACK: Condition = Condition::Score {
        operator: Comparison::Ge,
        value: 0.0,
    };

    pub fn is_default(&self) -> bool {
        matches!(self, Condition::Default)
    }

    /// Whether an entrant with this result satisfies the condition.
    /// `Default` accepts everyone.
    pub fn accepts(&self, outcome: &Outcome) -> bool {
        match *self {
            Condition::Default => true,
            Condition::Score { operator, value } => operator.test(outcome.score, value),
            Condition::Position { operator, value } => {
                operator.test(f64::from(outcome.position), value)
            }
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Default => f.write_str("default"),
            Condition::Score { operator, value } => write!(f, "score {operator} {value}"),
            Condition::Position { operator, value } => write!(f, "position {operator} {value}"),
        }
    }
}

/// An entrant's result in a match, used for routing
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Outcome {
    pub score: f64,
    pub position: u32,
}

// ═══════════════════════════════════════════════════════════════════════════════
// EDGES
// ═══════════════════════════════════════════════════════════════════════════════

/// Directed route between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: EdgeId,
    #[serde(rename = "sourceNodeId")]
    pub source: NodeId,
    /// `None` while the edge is still being drawn
    #[serde(rename = "targetNodeId", default, skip_serializing_if = "Option::is_none")]
    pub target: Option<NodeId>,
    pub condition: Condition,
    pub is_default: bool,
    /// Monotonic creation order, assigned by the store
    #[serde(default)]
    pub created_seq: u64,
}

impl Edge {
    pub fn new(
        id: impl Into<EdgeId>,
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
        condition: Condition,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: Some(target.into()),
            condition,
            is_default: false,
            created_seq: 0,
        }
    }

    pub fn with_seq(mut self, seq: u64) -> Self {
        self.created_seq = seq;
        self
    }

    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self.condition = Condition::Default;
        self
    }

    pub fn apply_patch(&mut self, patch: &EdgePatch) {
        if let Some(condition) = patch.condition {
            self.condition = condition;
        }
        if let Some(is_default) = patch.is_default {
            self.is_default = is_default;
        }
    }
}

/// Partial edge update
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EdgePatch {
    pub condition: Option<Condition>,
    pub is_default: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_wire_shape() {
        let node = Node::podium("p1", 2).with_position(Point::new(10.0, 20.0));
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["kind"], "podium");
        assert_eq!(json["podiumPosition"], 2);
        assert!(json.get("capacity").is_none());

        let back: Node = serde_json::from_value(json).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn test_match_slots_follow_capacity() {
        let json = r#"{"id":"m1","kind":"match","capacity":3,
            "slots":[{"index":0,"participantId":"team-a","sourceNodeId":"m0","sourceOutcome":"winner"}]}"#;
        let node: Node = serde_json::from_str(json).unwrap();
        assert_eq!(node.capacity(), Some(3));
        assert_eq!(node.slots().len(), 3);
        assert_eq!(node.slots()[0].participant_id.as_deref(), Some("team-a"));
        assert_eq!(
            node.slots()[0].source.as_ref().map(|s| s.source_node_id.as_str()),
            Some("m0")
        );
        assert!(node.slots()[2].is_empty());
    }

    #[test]
    fn test_slots_normalized_by_index() {
        let json = r#"{"id":"m1","kind":"match","capacity":3,
            "slots":[{"index":2,"participantId":"c"},{"index":2,"participantId":"dup"},
                     {"index":7,"participantId":"out"},{"index":0,"participantId":"a"}]}"#;
        let node: Node = serde_json::from_str(json).unwrap();
        let indices: Vec<u32> = node.slots().iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        let participants: Vec<Option<&str>> =
            node.slots().iter().map(|s| s.participant_id.as_deref()).collect();
        assert_eq!(participants, vec![Some("a"), None, Some("c")]);
    }

    #[test]
    fn test_capacity_bounds() {
        assert!(check_capacity(MIN_MATCH_CAPACITY).is_ok());
        assert!(check_capacity(MAX_MATCH_CAPACITY).is_ok());
        assert_eq!(check_capacity(0).unwrap_err().field, "capacity");
        assert_eq!(check_capacity(MAX_MATCH_CAPACITY + 1).unwrap_err().field, "capacity");

        let json = r#"{"id":"m1","kind":"match","capacity":4294967295}"#;
        assert!(serde_json::from_str::<Node>(json).is_err());
        let json = r#"{"id":"m1","kind":"match","capacity":0}"#;
        assert!(serde_json::from_str::<Node>(json).is_err());
    }

    #[test]
    fn test_podium_requires_position() {
        let json = r#"{"id":"p1","kind":"podium"}"#;
        assert!(serde_json::from_str::<Node>(json).is_err());
    }

    #[test]
    fn test_capacity_patch_resizes_slots() {
        let mut node = Node::match_node("m1", 4);
        node.apply_patch(&NodePatch {
            capacity: Some(2),
            ..Default::default()
        });
        assert_eq!(node.slots().len(), 2);

        node.apply_patch(&NodePatch {
            capacity: Some(5),
            ..Default::default()
        });
        let indices: Vec<u32> = node.slots().iter().map(|s| s.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_condition_wire_shape() {
        let default = serde_json::to_value(Condition::Default).unwrap();
        assert_eq!(default, serde_json::json!({"field": "default"}));

        let score = serde_json::to_value(Condition::FALLBACK).unwrap();
        assert_eq!(
            score,
            serde_json::json!({"field": "score", "operator": ">=", "value": 0.0})
        );

        let parsed: Condition =
            serde_json::from_str(r#"{"field":"position","operator":"<","value":3}"#).unwrap();
        assert_eq!(
            parsed,
            Condition::Position {
                operator: Comparison::Lt,
                value: 3.0
            }
        );
    }

    #[test]
    fn test_condition_accepts() {
        let top_two = Condition::Position {
            operator: Comparison::Le,
            value: 2.0,
        };
        assert!(top_two.accepts(&Outcome { score: 0.0, position: 1 }));
        assert!(!top_two.accepts(&Outcome { score: 9.0, position: 3 }));
        assert!(Condition::Default.accepts(&Outcome::default()));
        assert_eq!(top_two.to_string(), "position <= 2");
    }

    #[test]
    fn test_comparison_parse() {
        assert_eq!(" != ".parse::<Comparison>(), Ok(Comparison::Ne));
        assert!("=>".parse::<Comparison>().is_err());
    }
}
