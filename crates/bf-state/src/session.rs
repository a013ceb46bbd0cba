//! Edit session: the single entry point for mutating a bracket
//!
//! Each command is staged on a copy of the store, validated, and then either
//! rejected (nothing changes) or committed together with its history action.

use std::collections::{BTreeMap, BTreeSet};

use uuid::Uuid;

use bf_core::{
    BfError, BfResult, Condition, Edge, EdgeId, EdgePatch, FieldError, GraphSnapshot, GraphStore,
    Node, NodeId, NodeKind, NodePatch, Point, Slot, check_capacity, check_invariants, podium,
    structure,
};

use crate::stage::{Change, Stage};
use crate::{ActionKind, Command, EditorPreferences, HistoryManager, NodeConfig};

/// Nodes and the edges between them, captured by [`Command::Copy`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Clipboard {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Clipboard {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Graph store, undo history and clipboard for one open bracket
#[derive(Debug)]
pub struct Session {
    store: GraphStore,
    history: HistoryManager,
    clipboard: Clipboard,
    preferences: EditorPreferences,
}

impl Session {
    /// Open a session on `store`, which must already satisfy every bracket
    /// invariant
    pub fn open(store: GraphStore, preferences: EditorPreferences) -> BfResult<Self> {
        check_invariants(&store)?;
        log::info!(
            "Opened bracket {}/{} ({} nodes, {} edges)",
            store.tournament_id(),
            store.phase_id(),
            store.node_count(),
            store.edge_count()
        );
        Ok(Self {
            history: HistoryManager::new(preferences.history.max_entries),
            store,
            clipboard: Clipboard::default(),
            preferences,
        })
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    pub fn preferences(&self) -> &EditorPreferences {
        &self.preferences
    }

    pub fn snapshot(&self) -> GraphSnapshot {
        self.store.snapshot()
    }

    pub fn into_store(self) -> GraphStore {
        self.store
    }

    /// Run one command. On success returns the new snapshot; on failure the
    /// store and history are exactly as they were.
    pub fn execute(&mut self, command: Command) -> BfResult<GraphSnapshot> {
        let name = command.name();
        match self.dispatch(command) {
            Ok(()) => Ok(self.store.snapshot()),
            Err(e) => {
                log::warn!("{} rejected: {}", name, e);
                Err(e)
            }
        }
    }

    fn dispatch(&mut self, command: Command) -> BfResult<()> {
        let change = match command {
            Command::Undo => {
                match self.history.undo(&mut self.store) {
                    Some(kind) => log::debug!("Undo {}", kind),
                    None => log::debug!("Nothing to undo"),
                }
                return Ok(());
            }
            Command::Redo => {
                match self.history.redo(&mut self.store) {
                    Some(kind) => log::debug!("Redo {}", kind),
                    None => log::debug!("Nothing to redo"),
                }
                return Ok(());
            }
            Command::Copy { nodes } => return self.copy(&nodes),
            Command::AddNode { kind, config } => self.add_node(kind, &config)?,
            Command::Connect { source, target } => self.connect(&source, &target)?,
            Command::MoveNode { id, position } => self.move_node(&id, position)?,
            Command::EditNodeConfig { id, patch } => self.edit_node(&id, &patch)?,
            Command::EditEdgeCondition { edge, condition } => {
                self.edit_edge_condition(&edge, condition)?
            }
            Command::DeleteSelection { nodes, edges } => self.delete_selection(&nodes, &edges)?,
            Command::Paste { anchor } => self.paste(anchor)?,
        };
        self.commit(change)
    }

    fn commit(&mut self, change: Change) -> BfResult<()> {
        if change.is_noop() {
            log::debug!("{}: nothing changed, no action recorded", change.kind);
            return Ok(());
        }
        check_invariants(&change.store)?;

        self.store = change.store;
        let action_id = self
            .history
            .commit(change.kind, change.before, change.after)
            .id
            .clone();
        log::debug!(
            "Committed {} ({}), history {}/{}",
            change.kind,
            action_id,
            self.history.undo_count(),
            self.history.len()
        );
        Ok(())
    }

    // ─── Nodes ───────────────────────────────────────────────────────────────

    fn add_node(&self, kind: NodeKind, config: &NodeConfig) -> BfResult<Change> {
        let mut errors = inapplicable_fields(
            kind,
            config.capacity.is_some(),
            false,
            config.podium_position.is_some(),
        );
        let id = NodeId::new(Uuid::new_v4().to_string());

        let capacity = config
            .capacity
            .unwrap_or(self.preferences.nodes.default_match_capacity);
        if kind == NodeKind::Match {
            if let Err(e) = check_capacity(capacity) {
                errors.push(e);
            }
        }
        if !errors.is_empty() {
            return Err(BfError::InvalidInput(errors));
        }

        let node = match kind {
            NodeKind::Match => Node::match_node(id, capacity),
            NodeKind::PodiumSink => {
                let position = config
                    .podium_position
                    .unwrap_or_else(|| podium::next_available_position(self.store.podium_positions()));
                Node::podium(id, position)
            }
            NodeKind::DisqualificationSink => Node::disqualification(id),
        };
        if let Some(position) = node.podium_position() {
            podium::validate_position(self.store.nodes(), position, None)?;
        }

        let node = match config.position {
            Some(point) => node.with_position(point),
            None => node,
        };
        let mut stage = Stage::new(&self.store);
        stage.add_node(node);
        Ok(stage.finish(ActionKind::AddNode))
    }

    fn move_node(&self, id: &NodeId, position: Point) -> BfResult<Change> {
        self.require_node(id)?;
        let mut stage = Stage::new(&self.store);
        stage.update_node(
            id,
            &NodePatch {
                position: Some(position),
                ..Default::default()
            },
        );
        Ok(stage.finish(ActionKind::MoveNode))
    }

    fn edit_node(&self, id: &NodeId, patch: &NodePatch) -> BfResult<Change> {
        let node = self.require_node(id)?;
        let mut errors = inapplicable_fields(
            node.kind(),
            patch.capacity.is_some(),
            patch.slots.is_some(),
            patch.podium_position.is_some(),
        );

        if node.kind() == NodeKind::Match {
            if let Some(Err(e)) = patch.capacity.map(check_capacity) {
                errors.push(e);
            }
            if let Some(slots) = &patch.slots {
                let capacity = patch.capacity.or(node.capacity()).unwrap_or(0);
                errors.extend(self.slot_errors(slots, capacity));
            }
        }
        if !errors.is_empty() {
            return Err(BfError::InvalidInput(errors));
        }
        if let Some(position) = patch.podium_position {
            podium::validate_position(self.store.nodes(), position, Some(id))?;
        }

        let mut stage = Stage::new(&self.store);
        stage.update_node(id, patch);
        Ok(stage.finish(ActionKind::EditNode))
    }

    // ─── Edges ───────────────────────────────────────────────────────────────

    fn connect(&self, source: &NodeId, target: &NodeId) -> BfResult<Change> {
        let source_node = self.require_node(source)?;
        self.require_node(target)?;

        if source_node.is_sink() {
            return Err(BfError::SinkHasOutgoingEdges(source.clone()));
        }
        if self.store.edge_between(source, target).is_some() {
            return Err(BfError::DuplicateEdge {
                from: source.clone(),
                to: target.clone(),
            });
        }
        if let Some(path) = self.store.find_cycle_path(source, target) {
            return Err(BfError::CycleDetected { path });
        }

        let mut stage = Stage::new(&self.store);
        let seq = stage.next_edge_seq();
        let edge = Edge::new(
            EdgeId::new(Uuid::new_v4().to_string()),
            source.clone(),
            target.clone(),
            Condition::FALLBACK,
        )
        .with_seq(seq);
        stage.add_edge(edge);
        stage.repair(source, None);
        Ok(stage.finish(ActionKind::AddEdge))
    }

    fn edit_edge_condition(&self, id: &EdgeId, condition: Condition) -> BfResult<Change> {
        let edge = self
            .store
            .edge(id)
            .ok_or_else(|| BfError::EdgeNotFound(id.clone()))?;
        validate_condition(&condition)?;

        let mut stage = Stage::new(&self.store);
        if condition.is_default() {
            stage.update_edge(
                id,
                &EdgePatch {
                    condition: Some(Condition::Default),
                    is_default: Some(true),
                },
            );
            stage.repair(&edge.source, Some(id));
        } else {
            if edge.is_default {
                return Err(BfError::invalid(
                    "condition",
                    "The default route cannot carry a condition; make another edge the default first",
                ));
            }
            stage.update_edge(
                id,
                &EdgePatch {
                    condition: Some(condition),
                    is_default: None,
                },
            );
        }
        Ok(stage.finish(ActionKind::EditEdge))
    }

    // ─── Selection ───────────────────────────────────────────────────────────

    fn delete_selection(&self, nodes: &[NodeId], edges: &[EdgeId]) -> BfResult<Change> {
        let nodes: BTreeSet<NodeId> = nodes.iter().cloned().collect();
        let explicit_edges: BTreeSet<EdgeId> = edges.iter().cloned().collect();
        for id in &nodes {
            self.require_node(id)?;
        }
        for id in &explicit_edges {
            if self.store.edge(id).is_none() {
                return Err(BfError::EdgeNotFound(id.clone()));
            }
        }

        let kind = match (nodes.len(), explicit_edges.len()) {
            (1, 0) => ActionKind::DeleteNode,
            (0, 1) => ActionKind::DeleteEdge,
            _ => ActionKind::DeleteMultiple,
        };
        let mut stage = Stage::new(&self.store);
        if nodes.is_empty() && explicit_edges.is_empty() {
            return Ok(stage.finish(kind));
        }

        if !nodes.is_empty() {
            let removing: Vec<NodeId> = nodes.iter().cloned().collect();
            structure::validate(self.store.nodes(), &removing)?;

            let removed_positions: Vec<u32> = nodes
                .iter()
                .filter_map(|id| self.store.node(id))
                .filter_map(Node::podium_position)
                .collect();
            podium::check_removal(&self.store.podium_positions(), &removed_positions)?;
        }

        let mut doomed = explicit_edges;
        doomed.extend(
            self.store
                .edges()
                .filter(|e| {
                    nodes.contains(&e.source) || e.target.as_ref().is_some_and(|t| nodes.contains(t))
                })
                .map(|e| e.id.clone()),
        );
        let surviving_sources: BTreeSet<NodeId> = doomed
            .iter()
            .filter_map(|id| self.store.edge(id))
            .map(|e| e.source.clone())
            .filter(|source| !nodes.contains(source))
            .collect();

        for id in &doomed {
            stage.remove_edge(id);
        }
        for id in &nodes {
            stage.remove_node(id);
        }
        stage.repair_many(&surviving_sources);

        // Slots fed by a removed node lose their provenance
        let orphaned: Vec<(NodeId, NodePatch)> = stage
            .store()
            .nodes()
            .filter_map(|node| {
                let fed_by_removed = |slot: &Slot| {
                    slot.source
                        .as_ref()
                        .is_some_and(|s| nodes.contains(&s.source_node_id))
                };
                if !node.slots().iter().any(fed_by_removed) {
                    return None;
                }
                let slots = node
                    .slots()
                    .iter()
                    .map(|slot| {
                        let mut slot = slot.clone();
                        if fed_by_removed(&slot) {
                            slot.source = None;
                        }
                        slot
                    })
                    .collect();
                let patch = NodePatch {
                    slots: Some(slots),
                    ..Default::default()
                };
                Some((node.id.clone(), patch))
            })
            .collect();
        for (id, patch) in &orphaned {
            stage.update_node(id, patch);
        }

        Ok(stage.finish(kind))
    }

    fn copy(&mut self, ids: &[NodeId]) -> BfResult<()> {
        let mut selected = BTreeSet::new();
        let mut nodes = Vec::new();
        for id in ids {
            let node = self.require_node(id)?;
            if selected.insert(id) {
                nodes.push(node.clone());
            }
        }

        let mut edges: Vec<Edge> = self
            .store
            .edges()
            .filter(|e| {
                selected.contains(&e.source) && e.target.as_ref().is_some_and(|t| selected.contains(t))
            })
            .cloned()
            .collect();
        edges.sort_by(|a, b| a.created_seq.cmp(&b.created_seq).then_with(|| a.id.cmp(&b.id)));

        log::debug!("Copied {} nodes and {} edges", nodes.len(), edges.len());
        self.clipboard = Clipboard { nodes, edges };
        Ok(())
    }

    fn paste(&self, anchor: Option<Point>) -> BfResult<Change> {
        if self.clipboard.is_empty() {
            return Err(BfError::invalid("clipboard", "Nothing to paste"));
        }

        // Anchor the top-left of the copied layout, or shift by the preference offset
        let origin = self
            .clipboard
            .nodes
            .iter()
            .filter_map(|n| n.position)
            .reduce(|a, b| Point::new(a.x.min(b.x), a.y.min(b.y)));
        let (dx, dy) = match (anchor, origin) {
            (Some(anchor), Some(origin)) => (anchor.x - origin.x, anchor.y - origin.y),
            (Some(_), None) => (0.0, 0.0),
            (None, _) => {
                let offset = self.preferences.clipboard.paste_offset;
                (offset.x, offset.y)
            }
        };

        let mut stage = Stage::new(&self.store);
        let mut new_ids: BTreeMap<&NodeId, NodeId> = BTreeMap::new();
        let mut occupied: BTreeSet<u32> = self.store.podium_positions().into_iter().collect();

        for original in &self.clipboard.nodes {
            let mut node = original.clone();
            node.id = NodeId::new(Uuid::new_v4().to_string());
            if let Some(slots) = node.slots_mut() {
                slots.iter_mut().for_each(Slot::clear);
            }
            if node.kind() == NodeKind::PodiumSink {
                let position = podium::next_available_position(occupied.iter().copied());
                occupied.insert(position);
                node.apply_patch(&NodePatch {
                    podium_position: Some(position),
                    ..Default::default()
                });
            }
            node.position = match node.position {
                Some(point) => Some(point.offset(dx, dy)),
                None => anchor,
            };

            new_ids.insert(&original.id, node.id.clone());
            stage.add_node(node);
        }

        let mut sources = BTreeSet::new();
        for original in &self.clipboard.edges {
            let source = new_ids.get(&original.source);
            let target = original.target.as_ref().and_then(|t| new_ids.get(t));
            let (Some(source), Some(target)) = (source, target) else {
                continue;
            };
            let seq = stage.next_edge_seq();
            let mut edge = Edge::new(
                EdgeId::new(Uuid::new_v4().to_string()),
                source.clone(),
                target.clone(),
                original.condition,
            )
            .with_seq(seq);
            edge.is_default = original.is_default;
            sources.insert(source.clone());
            stage.add_edge(edge);
        }
        stage.repair_many(&sources);

        let kind = if self.clipboard.nodes.len() == 1 {
            ActionKind::PasteNode
        } else {
            ActionKind::PasteMultiple
        };
        Ok(stage.finish(kind))
    }

    /// Field errors for a replacement slot list on a match of `capacity`
    fn slot_errors(&self, slots: &[Slot], capacity: u32) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if slots.len() > capacity as usize {
            errors.push(FieldError::new(
                "slots",
                format!("A match with capacity {capacity} has at most {capacity} slots"),
            ));
        }

        let mut seen = BTreeSet::new();
        for slot in slots {
            if slot.index >= capacity {
                errors.push(FieldError::new(
                    "slots",
                    format!("Slot index {} is outside capacity {capacity}", slot.index),
                ));
            } else if !seen.insert(slot.index) {
                errors.push(FieldError::new(
                    "slots",
                    format!("Slot index {} appears more than once", slot.index),
                ));
            }
            if let Some(source) = &slot.source {
                if !self.store.contains_node(&source.source_node_id) {
                    errors.push(FieldError::new(
                        "slots",
                        format!("Slot {} is fed by unknown node {}", slot.index, source.source_node_id),
                    ));
                }
            }
        }
        errors
    }

    fn require_node(&self, id: &NodeId) -> BfResult<&Node> {
        self.store
            .node(id)
            .ok_or_else(|| BfError::NodeNotFound(id.clone()))
    }
}

/// Field errors for settings that do not exist on `kind`
fn inapplicable_fields(kind: NodeKind, capacity: bool, slots: bool, podium_position: bool) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if kind != NodeKind::Match {
        if capacity {
            errors.push(FieldError::new("capacity", format!("A {kind} node has no capacity")));
        }
        if slots {
            errors.push(FieldError::new("slots", format!("A {kind} node has no slots")));
        }
    }
    if kind != NodeKind::PodiumSink && podium_position {
        errors.push(FieldError::new(
            "podiumPosition",
            format!("A {kind} node has no podium position"),
        ));
    }
    errors
}

fn validate_condition(condition: &Condition) -> BfResult<()> {
    match condition {
        Condition::Default => Ok(()),
        Condition::Score { value, .. } | Condition::Position { value, .. } => {
            if value.is_finite() {
                Ok(())
            } else {
                Err(BfError::invalid("value", "Value must be a finite number"))
            }
        }
    }
}
