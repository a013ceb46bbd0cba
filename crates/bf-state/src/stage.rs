//! Proposed store state for a command in flight
//!
//! A [`Stage`] works on a copy of the live store and remembers every node
//! and edge id it touched, so the before/after fragments of the resulting
//! action fall out of a diff against the live store.

use std::collections::BTreeSet;

use bf_core::{Edge, EdgeId, EdgePatch, GraphStore, Node, NodeId, NodePatch, default_edge};

use crate::{ActionKind, Fragment};

pub(crate) struct Stage<'a> {
    live: &'a GraphStore,
    store: GraphStore,
    nodes: BTreeSet<NodeId>,
    edges: BTreeSet<EdgeId>,
}

/// Outcome of a staged command, detached from the live store
pub(crate) struct Change {
    pub kind: ActionKind,
    pub store: GraphStore,
    pub before: Option<Fragment>,
    pub after: Option<Fragment>,
}

impl Change {
    pub fn is_noop(&self) -> bool {
        self.before.is_none() && self.after.is_none()
    }
}

impl<'a> Stage<'a> {
    pub fn new(live: &'a GraphStore) -> Self {
        Self {
            live,
            store: live.clone(),
            nodes: BTreeSet::new(),
            edges: BTreeSet::new(),
        }
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn add_node(&mut self, node: Node) {
        self.nodes.insert(node.id.clone());
        self.store.add_node(node);
    }

    pub fn remove_node(&mut self, id: &NodeId) {
        self.nodes.insert(id.clone());
        self.store.remove_node(id);
    }

    pub fn update_node(&mut self, id: &NodeId, patch: &NodePatch) {
        self.nodes.insert(id.clone());
        self.store.update_node(id, patch);
    }

    pub fn add_edge(&mut self, edge: Edge) {
        self.edges.insert(edge.id.clone());
        self.store.add_edge(edge);
    }

    pub fn remove_edge(&mut self, id: &EdgeId) {
        self.edges.insert(id.clone());
        self.store.remove_edge(id);
    }

    pub fn update_edge(&mut self, id: &EdgeId, patch: &EdgePatch) {
        self.edges.insert(id.clone());
        self.store.update_edge(id, patch);
    }

    pub fn next_edge_seq(&mut self) -> u64 {
        self.store.next_edge_seq()
    }

    /// Restore the default-edge invariant on `source`, recording the edges
    /// the repair touched
    pub fn repair(&mut self, source: &NodeId, preferred: Option<&EdgeId>) {
        let changed = default_edge::repair_source(&mut self.store, source, preferred);
        self.edges.extend(changed);
    }

    /// [`repair`](Self::repair) for many sources with one pass over the edges
    pub fn repair_many<'s>(&mut self, sources: impl IntoIterator<Item = &'s NodeId>) {
        let changed = default_edge::repair_sources(&mut self.store, sources);
        self.edges.extend(changed);
    }

    /// Diff the touched ids against the live store
    pub fn finish(self, kind: ActionKind) -> Change {
        let mut before = Fragment::default();
        let mut after = Fragment::default();

        for id in &self.nodes {
            let old = self.live.node(id);
            let new = self.store.node(id);
            if old == new {
                continue;
            }
            before.nodes.extend(old.cloned());
            after.nodes.extend(new.cloned());
        }
        for id in &self.edges {
            let old = self.live.edge(id);
            let new = self.store.edge(id);
            if old == new {
                continue;
            }
            before.edges.extend(old.cloned());
            after.edges.extend(new.cloned());
        }

        Change {
            kind,
            store: self.store,
            before: before.non_empty(),
            after: after.non_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bf_core::{Condition, Point};

    fn live() -> GraphStore {
        let mut store = GraphStore::new("t", "p");
        store.add_node(Node::match_node("m", 2));
        store.add_node(Node::podium("p1", 1));
        store.add_edge(Edge::new("e", "m", "p1", Condition::Default).with_seq(1).as_default());
        store
    }

    #[test]
    fn test_untouched_store_is_noop() {
        let live = live();
        let mut stage = Stage::new(&live);
        stage.update_node(
            &"m".into(),
            &NodePatch {
                capacity: Some(2),
                ..Default::default()
            },
        );
        stage.repair(&"m".into(), None);
        assert!(stage.finish(ActionKind::EditNode).is_noop());
    }

    #[test]
    fn test_fragments_hold_only_changes() {
        let live = live();
        let mut stage = Stage::new(&live);
        stage.update_node(
            &"m".into(),
            &NodePatch {
                position: Some(Point::new(1.0, 1.0)),
                ..Default::default()
            },
        );
        stage.remove_edge(&"e".into());
        stage.remove_node(&"missing".into());

        let change = stage.finish(ActionKind::DeleteMultiple);
        let before = change.before.unwrap();
        let after = change.after.unwrap();
        assert_eq!(before.nodes.len(), 1);
        assert_eq!(before.edges.len(), 1);
        assert_eq!(after.nodes[0].position, Some(Point::new(1.0, 1.0)));
        assert!(after.edges.is_empty());
        assert_eq!(live.edge_count(), 1);
    }
}
