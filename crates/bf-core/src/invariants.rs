//! Whole-graph invariant check, for graphs that did not come through the
//! command layer (imports, hand-built fixtures)

use crate::{BfError, BfResult, GraphStore, check_capacity, cycle, default_edge, podium, structure};

/// Verify every bracket invariant on `store`
pub fn check_invariants(store: &GraphStore) -> BfResult<()> {
    for edge in store.edges() {
        let source = store
            .node(&edge.source)
            .ok_or_else(|| BfError::NodeNotFound(edge.source.clone()))?;
        if source.is_sink() {
            return Err(BfError::SinkHasOutgoingEdges(edge.source.clone()));
        }
        if let Some(target) = &edge.target {
            if !store.contains_node(target) {
                return Err(BfError::NodeNotFound(target.clone()));
            }
        }
    }

    if let Some(path) = cycle::find_any_cycle(store) {
        return Err(BfError::CycleDetected { path });
    }

    if let Some(source) = default_edge::violations(store).into_iter().next() {
        return Err(BfError::invalid(
            "isDefault",
            format!("node {source} must have exactly one default outgoing edge"),
        ));
    }

    if store.nodes().any(|n| n.podium_position() == Some(0)) {
        return Err(BfError::invalid("position", "Position must be at least 1"));
    }
    if let Some(position) = podium::find_duplicate(store.nodes()) {
        return Err(BfError::DuplicatePodiumPosition(position));
    }
    for node in store.nodes() {
        if let Some(capacity) = node.capacity() {
            check_capacity(capacity).map_err(|e| BfError::InvalidInput(vec![e]))?;
        }
    }

    structure::validate(store.nodes(), &[])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Condition, Edge, Node, NodeKind};

    fn valid() -> GraphStore {
        let mut store = GraphStore::new("t", "p");
        store.add_node(Node::match_node("m", 2));
        store.add_node(Node::podium("p1", 1));
        store.add_node(Node::disqualification("d"));
        store.add_edge(Edge::new("e1", "m", "p1", Condition::Default).with_seq(1).as_default());
        store.add_edge(Edge::new("e2", "m", "d", Condition::FALLBACK).with_seq(2));
        store
    }

    #[test]
    fn test_valid_bracket_passes() {
        assert!(check_invariants(&valid()).is_ok());
    }

    #[test]
    fn test_sink_with_outgoing_edge_rejected() {
        let mut store = valid();
        store.add_edge(Edge::new("bad", "p1", "d", Condition::Default).as_default());
        assert_eq!(
            check_invariants(&store),
            Err(BfError::SinkHasOutgoingEdges("p1".into()))
        );
    }

    #[test]
    fn test_duplicate_podium_rejected() {
        let mut store = valid();
        store.add_node(Node::podium("p2", 1));
        assert_eq!(
            check_invariants(&store),
            Err(BfError::DuplicatePodiumPosition(1))
        );
    }

    #[test]
    fn test_missing_kind_rejected() {
        let mut store = valid();
        store.remove_edge(&"e2".into());
        store.remove_node(&"d".into());
        assert_eq!(
            check_invariants(&store),
            Err(BfError::StructuralMinimumViolation(NodeKind::DisqualificationSink))
        );
    }

    #[test]
    fn test_capacity_out_of_range_rejected() {
        let mut store = valid();
        store.add_node(Node::match_node("big", crate::MAX_MATCH_CAPACITY + 1));
        let err = check_invariants(&store).unwrap_err();
        assert!(err.is_input_error());
    }

    #[test]
    fn test_dangling_edge_rejected() {
        let mut store = valid();
        store.add_edge(Edge::new("e3", "m", "ghost", Condition::FALLBACK).with_seq(3));
        assert_eq!(
            check_invariants(&store),
            Err(BfError::NodeNotFound("ghost".into()))
        );
    }
}
