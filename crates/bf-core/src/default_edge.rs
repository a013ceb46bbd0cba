//! Default edge resolution
//!
//! Every node with outgoing edges routes entrants that match no condition
//! through exactly one default edge. The resolver picks that edge and
//! reports the edits needed to get there; applying them is left to the
//! caller so the edits land in the same history action as the command that
//! caused them.

use crate::{Condition, Edge, EdgeId, EdgePatch, GraphStore, NodeId};

/// Pick the edge that should be default among `candidates`.
///
/// `preferred` is the edge the current command explicitly made default; it
/// wins when it is a candidate. Otherwise the earliest-created edge wins.
pub fn select_default<'a>(candidates: &[&'a Edge], preferred: Option<&EdgeId>) -> Option<&'a Edge> {
    if let Some(preferred) = preferred {
        if let Some(edge) = candidates.iter().find(|e| &e.id == preferred) {
            return Some(*edge);
        }
    }
    candidates
        .iter()
        .min_by(|a, b| a.created_seq.cmp(&b.created_seq).then_with(|| a.id.cmp(&b.id)))
        .copied()
}

/// Edits that restore the default-edge invariant for one source node.
///
/// `outgoing` must be every outgoing edge of that node. Returns the changed
/// edges in their repaired form; an empty list means nothing to do.
pub fn plan_repair(outgoing: &[&Edge], preferred: Option<&EdgeId>) -> Vec<Edge> {
    let marked: Vec<&Edge> = outgoing.iter().filter(|e| e.is_default).copied().collect();
    let keep = match marked.len() {
        0 => select_default(outgoing, preferred),
        1 => Some(marked[0]),
        _ => select_default(&marked, preferred),
    };
    let Some(keep) = keep else {
        return Vec::new();
    };

    let mut changes = Vec::new();
    for edge in outgoing {
        if edge.id == keep.id {
            if !edge.is_default || !edge.condition.is_default() {
                let mut promoted = (*edge).clone();
                promoted.is_default = true;
                promoted.condition = Condition::Default;
                changes.push(promoted);
            }
        } else if edge.is_default || edge.condition.is_default() {
            let mut demoted = (*edge).clone();
            demoted.is_default = false;
            demoted.condition = Condition::FALLBACK;
            changes.push(demoted);
        }
    }
    changes
}

/// Repair the outgoing edges of `source` in place, returning the ids of the
/// edges that changed
pub fn repair_source(store: &mut GraphStore, source: &NodeId, preferred: Option<&EdgeId>) -> Vec<EdgeId> {
    let changes = plan_repair(&store.edges_from(source), preferred);
    apply_repairs(store, changes)
}

/// Repair several source nodes with a single pass over the edges
pub fn repair_sources<'a>(store: &mut GraphStore, sources: impl IntoIterator<Item = &'a NodeId>) -> Vec<EdgeId> {
    let changes: Vec<Edge> = {
        let index = store.outgoing_index();
        sources
            .into_iter()
            .filter_map(|source| index.get(source))
            .flat_map(|outgoing| plan_repair(outgoing, None))
            .collect()
    };
    apply_repairs(store, changes)
}

/// Repair every source node in the store
pub fn repair_all(store: &mut GraphStore) -> Vec<EdgeId> {
    let changes: Vec<Edge> = store
        .outgoing_index()
        .values()
        .flat_map(|outgoing| plan_repair(outgoing, None))
        .collect();
    apply_repairs(store, changes)
}

fn apply_repairs(store: &mut GraphStore, changes: Vec<Edge>) -> Vec<EdgeId> {
    let mut changed = Vec::with_capacity(changes.len());
    for edge in changes {
        log::trace!(
            "default edge repair on {}: {} -> default={} ({})",
            edge.source,
            edge.id,
            edge.is_default,
            edge.condition
        );
        let patch = EdgePatch {
            condition: Some(edge.condition),
            is_default: Some(edge.is_default),
        };
        store.update_edge(&edge.id, &patch);
        changed.push(edge.id);
    }
    changed
}

/// Source nodes whose outgoing edges break the invariant
pub fn violations(store: &GraphStore) -> Vec<NodeId> {
    store
        .outgoing_index()
        .into_iter()
        .filter(|(_, outgoing)| !plan_repair(outgoing, None).is_empty())
        .map(|(source, _)| source.clone())
        .collect()
}
