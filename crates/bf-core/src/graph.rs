//! Canonical node/edge storage for one bracket
//!
//! Mutations here are pure data operations. Nothing in this module checks
//! invariants; the command layer stages changes on a copy of the store and
//! validates that copy before it replaces the live one.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Edge, EdgeId, EdgePatch, Node, NodeId, NodeKind, NodePatch, Outcome};

/// Descriptive bracket metadata
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GraphMetadata {
    /// RFC 3339 creation time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// RFC 3339 time of the last export
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Serializable, immutable view of a bracket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphSnapshot {
    pub tournament_id: String,
    pub phase_id: String,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    #[serde(default)]
    pub metadata: GraphMetadata,
}

impl GraphSnapshot {
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn edge(&self, id: &EdgeId) -> Option<&Edge> {
        self.edges.iter().find(|e| &e.id == id)
    }
}

/// Owner of node and edge identity for one bracket
#[derive(Debug, Clone, PartialEq)]
pub struct GraphStore {
    tournament_id: String,
    phase_id: String,
    metadata: GraphMetadata,
    nodes: BTreeMap<NodeId, Node>,
    edges: BTreeMap<EdgeId, Edge>,
    next_seq: u64,
}

impl GraphStore {
    pub fn new(tournament_id: impl Into<String>, phase_id: impl Into<String>) -> Self {
        Self {
            tournament_id: tournament_id.into(),
            phase_id: phase_id.into(),
            metadata: GraphMetadata::default(),
            nodes: BTreeMap::new(),
            edges: BTreeMap::new(),
            next_seq: 1,
        }
    }

    pub fn with_metadata(mut self, metadata: GraphMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Rebuild a store from a snapshot. No validation is performed.
    pub fn from_snapshot(snapshot: GraphSnapshot) -> Self {
        let mut store = Self::new(snapshot.tournament_id, snapshot.phase_id)
            .with_metadata(snapshot.metadata);
        for node in snapshot.nodes {
            store.add_node(node);
        }
        for edge in snapshot.edges {
            store.add_edge(edge);
        }
        store
    }

    pub fn tournament_id(&self) -> &str {
        &self.tournament_id
    }

    pub fn phase_id(&self) -> &str {
        &self.phase_id
    }

    pub fn metadata(&self) -> &GraphMetadata {
        &self.metadata
    }

    // ─── Mutation ────────────────────────────────────────────────────────────

    /// Insert a node, returning the node it replaced
    pub fn add_node(&mut self, node: Node) -> Option<Node> {
        self.nodes.insert(node.id.clone(), node)
    }

    pub fn remove_node(&mut self, id: &NodeId) -> Option<Node> {
        self.nodes.remove(id)
    }

    /// Patch a node in place, returning its previous value
    pub fn update_node(&mut self, id: &NodeId, patch: &NodePatch) -> Option<Node> {
        let node = self.nodes.get_mut(id)?;
        let previous = node.clone();
        node.apply_patch(patch);
        Some(previous)
    }

    /// Insert an edge, returning the edge it replaced.
    ///
    /// Keeps the sequence counter ahead of every stored edge.
    pub fn add_edge(&mut self, edge: Edge) -> Option<Edge> {
        self.next_seq = self.next_seq.max(edge.created_seq + 1);
        self.edges.insert(edge.id.clone(), edge)
    }

    pub fn remove_edge(&mut self, id: &EdgeId) -> Option<Edge> {
        self.edges.remove(id)
    }

    /// Patch an edge in place, returning its previous value
    pub fn update_edge(&mut self, id: &EdgeId, patch: &EdgePatch) -> Option<Edge> {
        let edge = self.edges.get_mut(id)?;
        let previous = edge.clone();
        edge.apply_patch(patch);
        Some(previous)
    }

    /// Allocate the next edge creation sequence number
    pub fn next_edge_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    // ─── Queries ─────────────────────────────────────────────────────────────

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn edge(&self, id: &EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.edges.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn kind_of(&self, id: &NodeId) -> Option<NodeKind> {
        self.nodes.get(id).map(Node::kind)
    }

    /// Outgoing edges of a node, in creation order
    pub fn edges_from(&self, node: &NodeId) -> Vec<&Edge> {
        let mut edges: Vec<&Edge> = self.edges.values().filter(|e| &e.source == node).collect();
        edges.sort_by(|a, b| a.created_seq.cmp(&b.created_seq).then_with(|| a.id.cmp(&b.id)));
        edges
    }

    /// Outgoing edges of every source node, each list in creation order.
    ///
    /// One pass over the edges; use this instead of calling
    /// [`edges_from`](Self::edges_from) once per node.
    pub fn outgoing_index(&self) -> BTreeMap<&NodeId, Vec<&Edge>> {
        let mut index: BTreeMap<&NodeId, Vec<&Edge>> = BTreeMap::new();
        for edge in self.edges.values() {
            index.entry(&edge.source).or_default().push(edge);
        }
        for edges in index.values_mut() {
            edges.sort_by(|a, b| a.created_seq.cmp(&b.created_seq).then_with(|| a.id.cmp(&b.id)));
        }
        index
    }

    /// Incoming edges of a node
    pub fn edges_into<'a>(&'a self, node: &'a NodeId) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges
            .values()
            .filter(move |e| e.target.as_ref() == Some(node))
    }

    pub fn edge_between(&self, source: &NodeId, target: &NodeId) -> Option<&Edge> {
        self.edges
            .values()
            .find(|e| &e.source == source && e.target.as_ref() == Some(target))
    }

    /// Positions held by podium sinks, ascending
    pub fn podium_positions(&self) -> Vec<u32> {
        let mut positions: Vec<u32> = self.nodes.values().filter_map(Node::podium_position).collect();
        positions.sort_unstable();
        positions
    }

    /// Edge an entrant with `outcome` leaves `node` through: the first
    /// concrete condition it satisfies in creation order, else the default.
    pub fn route(&self, node: &NodeId, outcome: &Outcome) -> Option<&Edge> {
        let outgoing = self.edges_from(node);
        outgoing
            .iter()
            .find(|e| !e.is_default && e.condition.accepts(outcome))
            .or_else(|| outgoing.iter().find(|e| e.is_default))
            .copied()
    }

    /// Immutable view for consumers and export.
    ///
    /// Nodes are ordered by id, edges by creation order.
    pub fn snapshot(&self) -> GraphSnapshot {
        let mut edges: Vec<Edge> = self.edges.values().cloned().collect();
        edges.sort_by(|a, b| a.created_seq.cmp(&b.created_seq).then_with(|| a.id.cmp(&b.id)));
        GraphSnapshot {
            tournament_id: self.tournament_id.clone(),
            phase_id: self.phase_id.clone(),
            nodes: self.nodes.values().cloned().collect(),
            edges,
            metadata: self.metadata.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Comparison, Condition};

    fn store() -> GraphStore {
        let mut store = GraphStore::new("t1", "phase-1");
        store.add_node(Node::match_node("m1", 2));
        store.add_node(Node::podium("p1", 1));
        store.add_node(Node::podium("p2", 2));
        store.add_node(Node::disqualification("d1"));
        store
    }

    #[test]
    fn test_missing_ids_are_noops() {
        let mut store = store();
        let before = store.snapshot();

        assert!(store.remove_node(&NodeId::from("ghost")).is_none());
        assert!(store.remove_edge(&EdgeId::from("ghost")).is_none());
        assert!(store
            .update_node(&NodeId::from("ghost"), &NodePatch::default())
            .is_none());
        assert!(store
            .update_edge(&EdgeId::from("ghost"), &EdgePatch::default())
            .is_none());

        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_update_returns_previous() {
        let mut store = store();
        let previous = store
            .update_node(
                &NodeId::from("p2"),
                &NodePatch {
                    podium_position: Some(5),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(previous.podium_position(), Some(2));
        assert_eq!(store.podium_positions(), vec![1, 5]);
    }

    #[test]
    fn test_sequence_stays_ahead_of_imported_edges() {
        let mut store = store();
        store.add_edge(Edge::new("e9", "m1", "p1", Condition::Default).with_seq(9));
        assert_eq!(store.next_edge_seq(), 10);
        assert_eq!(store.next_edge_seq(), 11);
    }

    #[test]
    fn test_edges_from_in_creation_order() {
        let mut store = store();
        store.add_edge(Edge::new("b", "m1", "p1", Condition::FALLBACK).with_seq(2));
        store.add_edge(Edge::new("a", "m1", "d1", Condition::Default).with_seq(3));
        store.add_edge(Edge::new("c", "m1", "p2", Condition::FALLBACK).with_seq(1));

        let ids: Vec<&str> = store
            .edges_from(&NodeId::from("m1"))
            .iter()
            .map(|e| e.id.as_str())
            .collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
        assert_eq!(store.edges_into(&NodeId::from("p1")).count(), 1);
    }

    #[test]
    fn test_outgoing_index_matches_edges_from() {
        let mut store = store();
        store.add_node(Node::match_node("m2", 2));
        store.add_edge(Edge::new("b", "m1", "p1", Condition::FALLBACK).with_seq(2));
        store.add_edge(Edge::new("a", "m1", "d1", Condition::Default).with_seq(3));
        store.add_edge(Edge::new("x", "m2", "m1", Condition::Default).with_seq(4));
        store.add_edge(Edge::new("c", "m1", "p2", Condition::FALLBACK).with_seq(1));

        let index = store.outgoing_index();
        assert_eq!(index.len(), 2);
        for (source, outgoing) in &index {
            assert_eq!(outgoing, &store.edges_from(source));
        }
        assert!(!index.contains_key(&NodeId::from("p1")));
    }

    #[test]
    fn test_route_prefers_concrete_conditions() {
        let mut store = store();
        store.add_edge(Edge::new("to-dq", "m1", "d1", Condition::Default).with_seq(1).as_default());
        store.add_edge(
            Edge::new(
                "winner",
                "m1",
                "p1",
                Condition::Position {
                    operator: Comparison::Eq,
                    value: 1.0,
                },
            )
            .with_seq(2),
        );

        let m1 = NodeId::from("m1");
        let first = Outcome { score: 3.0, position: 1 };
        let second = Outcome { score: 1.0, position: 2 };
        assert_eq!(store.route(&m1, &first).unwrap().id.as_str(), "winner");
        assert_eq!(store.route(&m1, &second).unwrap().id.as_str(), "to-dq");
    }

    #[test]
    fn test_snapshot_round_trip() {
        let mut store = store();
        store.add_edge(Edge::new("e1", "m1", "p1", Condition::Default).with_seq(1).as_default());

        let snapshot = store.snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();
        let parsed: GraphSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(GraphStore::from_snapshot(parsed).snapshot(), snapshot);
    }
}
