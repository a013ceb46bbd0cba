//! Undo/Redo history using recorded actions
//!
//! Every committed edit is logged as an [`Action`]: plain data holding the
//! affected nodes and edges as they were before and after. Replaying an
//! action removes the `before` entities and inserts the `after` ones; the
//! inverse does the opposite.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use bf_core::{Edge, GraphStore, Node};

// ============ Action ============

/// What kind of edit an action records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    AddNode,
    DeleteNode,
    EditNode,
    AddEdge,
    DeleteEdge,
    EditEdge,
    MoveNode,
    PasteNode,
    PasteMultiple,
    DeleteMultiple,
}

impl ActionKind {
    /// Display label, e.g. for an "Undo Add Node" menu entry
    pub fn label(self) -> &'static str {
        match self {
            ActionKind::AddNode => "Add Node",
            ActionKind::DeleteNode => "Delete Node",
            ActionKind::EditNode => "Edit Node",
            ActionKind::AddEdge => "Add Edge",
            ActionKind::DeleteEdge => "Delete Edge",
            ActionKind::EditEdge => "Edit Edge",
            ActionKind::MoveNode => "Move Node",
            ActionKind::PasteNode => "Paste Node",
            ActionKind::PasteMultiple => "Paste Multiple",
            ActionKind::DeleteMultiple => "Delete Multiple",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Nodes and edges touched by an action, at one point in time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Fragment {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    /// `None` for an empty fragment
    pub fn non_empty(self) -> Option<Self> {
        if self.is_empty() { None } else { Some(self) }
    }

    fn remove_from(&self, store: &mut GraphStore) {
        for edge in &self.edges {
            store.remove_edge(&edge.id);
        }
        for node in &self.nodes {
            store.remove_node(&node.id);
        }
    }

    fn insert_into(&self, store: &mut GraphStore) {
        for node in &self.nodes {
            store.add_node(node.clone());
        }
        for edge in &self.edges {
            store.add_edge(edge.clone());
        }
    }
}

/// One reversible, logged unit of graph mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub id: String,
    pub kind: ActionKind,
    pub before: Option<Fragment>,
    pub after: Option<Fragment>,
}

impl Action {
    pub fn new(kind: ActionKind, before: Option<Fragment>, after: Option<Fragment>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            before,
            after,
        }
    }

    /// Replay the action forward
    pub fn apply(&self, store: &mut GraphStore) {
        if let Some(before) = &self.before {
            before.remove_from(store);
        }
        if let Some(after) = &self.after {
            after.insert_into(store);
        }
    }

    /// Replay the inverse of the action
    pub fn revert(&self, store: &mut GraphStore) {
        if let Some(after) = &self.after {
            after.remove_from(store);
        }
        if let Some(before) = &self.before {
            before.insert_into(store);
        }
    }
}

// ============ History Manager ============

/// Default bound on the action log
pub const DEFAULT_MAX_ENTRIES: usize = 50;

/// Bounded undo/redo log.
///
/// Actions `[0, applied)` are live in the store; the rest form the redo
/// branch, which the next commit discards.
#[derive(Debug, Clone)]
pub struct HistoryManager {
    log: VecDeque<Action>,
    applied: usize,
    max_entries: usize,
}

impl Default for HistoryManager {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

impl HistoryManager {
    pub fn new(max_entries: usize) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            log: VecDeque::with_capacity(max_entries),
            applied: 0,
            max_entries,
        }
    }

    /// Record an action whose effect is already in the store
    pub fn commit(&mut self, kind: ActionKind, before: Option<Fragment>, after: Option<Fragment>) -> &Action {
        self.push(Action::new(kind, before, after))
    }

    /// Record a prepared action whose effect is already in the store
    pub fn push(&mut self, action: Action) -> &Action {
        // Truncate the redo branch
        self.log.truncate(self.applied);

        self.log.push_back(action);
        while self.log.len() > self.max_entries {
            if let Some(dropped) = self.log.pop_front() {
                log::trace!("history full, dropping {} ({})", dropped.kind, dropped.id);
            }
        }
        self.applied = self.log.len();
        &self.log[self.applied - 1]
    }

    /// Undo the last applied action. Returns its kind, or `None` when there
    /// is nothing to undo.
    pub fn undo(&mut self, store: &mut GraphStore) -> Option<ActionKind> {
        if self.applied == 0 {
            return None;
        }
        self.applied -= 1;
        let action = &self.log[self.applied];
        action.revert(store);
        Some(action.kind)
    }

    /// Redo the next undone action. Returns its kind, or `None` at the end of
    /// the log.
    pub fn redo(&mut self, store: &mut GraphStore) -> Option<ActionKind> {
        let action = self.log.get(self.applied)?;
        action.apply(store);
        self.applied += 1;
        Some(action.kind)
    }

    /// Index of the last applied action, `None` when nothing is applied
    pub fn cursor(&self) -> Option<usize> {
        self.applied.checked_sub(1)
    }

    pub fn can_undo(&self) -> bool {
        self.applied > 0
    }

    pub fn can_redo(&self) -> bool {
        self.applied < self.log.len()
    }

    /// Label of the action the next undo reverts
    pub fn undo_label(&self) -> Option<&'static str> {
        self.cursor().map(|i| self.log[i].kind.label())
    }

    /// Label of the action the next redo reapplies
    pub fn redo_label(&self) -> Option<&'static str> {
        self.log.get(self.applied).map(|a| a.kind.label())
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Get number of undo steps
    pub fn undo_count(&self) -> usize {
        self.applied
    }

    /// Get number of redo steps
    pub fn redo_count(&self) -> usize {
        self.log.len() - self.applied
    }

    pub fn actions(&self) -> impl Iterator<Item = &Action> + '_ {
        self.log.iter()
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.log.clear();
        self.applied = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bf_core::{Condition, NodePatch, Point};

    fn base() -> GraphStore {
        let mut store = GraphStore::new("t", "p");
        store.add_node(Node::match_node("m", 2));
        store.add_node(Node::podium("p1", 1));
        store.add_node(Node::disqualification("d"));
        store
    }

    /// Apply an add-node edit to `store` and log it
    fn add_node(history: &mut HistoryManager, store: &mut GraphStore, id: &str) {
        let node = Node::match_node(id, 2);
        store.add_node(node.clone());
        history.commit(
            ActionKind::AddNode,
            None,
            Some(Fragment {
                nodes: vec![node],
                edges: Vec::new(),
            }),
        );
    }

    #[test]
    fn test_undo_redo() {
        let mut store = base();
        let mut history = HistoryManager::default();
        let initial = store.snapshot();

        add_node(&mut history, &mut store, "x");
        let after = store.snapshot();

        assert_eq!(history.undo(&mut store), Some(ActionKind::AddNode));
        assert_eq!(store.snapshot(), initial);
        assert_eq!(history.cursor(), None);

        assert_eq!(history.redo(&mut store), Some(ActionKind::AddNode));
        assert_eq!(store.snapshot(), after);
        assert_eq!(history.cursor(), Some(0));
    }

    #[test]
    fn test_undo_redo_at_ends_are_noops() {
        let mut store = base();
        let mut history = HistoryManager::default();
        assert_eq!(history.undo(&mut store), None);
        assert_eq!(history.redo(&mut store), None);

        add_node(&mut history, &mut store, "x");
        assert_eq!(history.redo(&mut store), None);
        assert!(history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_edit_replays_both_directions() {
        let mut store = base();
        let mut history = HistoryManager::default();
        let id = "m".into();

        let before = store.node(&id).cloned().unwrap();
        store.update_node(
            &id,
            &NodePatch {
                position: Some(Point::new(3.0, 4.0)),
                ..Default::default()
            },
        );
        let after = store.node(&id).cloned().unwrap();
        history.commit(
            ActionKind::MoveNode,
            Some(Fragment {
                nodes: vec![before.clone()],
                edges: Vec::new(),
            }),
            Some(Fragment {
                nodes: vec![after.clone()],
                edges: Vec::new(),
            }),
        );

        history.undo(&mut store);
        assert_eq!(store.node(&id), Some(&before));
        history.redo(&mut store);
        assert_eq!(store.node(&id), Some(&after));
    }

    #[test]
    fn test_delete_restores_edges() {
        let mut store = base();
        let edge = Edge::new("e", "m", "p1", Condition::Default).as_default();
        store.add_edge(edge.clone());
        let node = store.node(&"p1".into()).cloned().unwrap();
        let initial = store.snapshot();

        store.remove_edge(&edge.id);
        store.remove_node(&node.id);
        let mut history = HistoryManager::default();
        history.commit(
            ActionKind::DeleteMultiple,
            Some(Fragment {
                nodes: vec![node],
                edges: vec![edge],
            }),
            None,
        );

        history.undo(&mut store);
        assert_eq!(store.snapshot(), initial);
    }

    #[test]
    fn test_commit_discards_redo_branch() {
        let mut store = base();
        let mut history = HistoryManager::default();
        add_node(&mut history, &mut store, "a");
        add_node(&mut history, &mut store, "b");
        history.undo(&mut store);
        assert_eq!(history.redo_label(), Some("Add Node"));

        add_node(&mut history, &mut store, "c");
        assert_eq!(history.len(), 2);
        assert!(!history.can_redo());
        assert!(store.node(&"b".into()).is_none());
    }

    #[test]
    fn test_history_is_bounded() {
        let mut store = base();
        let mut history = HistoryManager::new(50);
        for i in 0..60 {
            add_node(&mut history, &mut store, &format!("n{i}"));
        }
        assert_eq!(history.len(), 50);
        assert_eq!(history.cursor(), Some(49));

        let mut undone = 0;
        while history.undo(&mut store).is_some() {
            undone += 1;
        }
        assert_eq!(undone, 50);
        // The ten oldest additions fell off the log and stay applied
        assert_eq!(store.node_count(), 3 + 10);
        assert!(store.node(&"n9".into()).is_some());
        assert!(store.node(&"n10".into()).is_none());
    }

    #[test]
    fn test_clear() {
        let mut store = base();
        let mut history = HistoryManager::new(0);
        assert_eq!(history.max_entries(), 1);
        add_node(&mut history, &mut store, "a");
        history.clear();
        assert!(history.is_empty());
        assert_eq!(history.undo_label(), None);
    }
}
