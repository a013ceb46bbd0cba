//! Snapshot import/export
//!
//! Brackets travel as camelCase JSON snapshots. Export stamps the
//! `lastModified` metadata; import normalizes default edges and refuses
//! graphs that break a bracket invariant.

use bf_core::{
    BfError, BfResult, GraphMetadata, GraphSnapshot, GraphStore, Node, Point, check_invariants,
    default_edge,
};

use crate::EditorPreferences;

/// Current time as RFC 3339
fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Smallest valid bracket: one match, first place and a disqualification
/// sink, unconnected
pub fn starter_bracket(tournament_id: &str, phase_id: &str, preferences: &EditorPreferences) -> GraphStore {
    let metadata = GraphMetadata {
        created_at: Some(now()),
        ..Default::default()
    };
    let mut store = GraphStore::new(tournament_id, phase_id).with_metadata(metadata);
    store.add_node(
        Node::match_node("match-1", preferences.nodes.default_match_capacity)
            .with_position(Point::new(0.0, 0.0)),
    );
    store.add_node(Node::podium("podium-1", 1).with_position(Point::new(300.0, 0.0)));
    store.add_node(Node::disqualification("disqualified").with_position(Point::new(300.0, 150.0)));
    store
}

/// Serialize a snapshot for export, stamping `lastModified`
pub fn export_json(snapshot: &GraphSnapshot) -> BfResult<String> {
    let mut snapshot = snapshot.clone();
    snapshot.metadata.last_modified = Some(now());
    let json = serde_json::to_string_pretty(&snapshot).map_err(|e| BfError::Serialization(e.to_string()))?;
    log::info!(
        "Exported bracket {}/{} ({} nodes, {} edges)",
        snapshot.tournament_id,
        snapshot.phase_id,
        snapshot.nodes.len(),
        snapshot.edges.len()
    );
    Ok(json)
}

/// Parse a snapshot and rebuild a store that satisfies every invariant.
///
/// Edges without a creation sequence are numbered in file order, then each
/// source's default edge is normalized.
pub fn import_json(text: &str) -> BfResult<GraphStore> {
    let mut snapshot: GraphSnapshot =
        serde_json::from_str(text).map_err(|e| BfError::Serialization(e.to_string()))?;

    let mut next_seq = snapshot.edges.iter().map(|e| e.created_seq).max().unwrap_or(0) + 1;
    for edge in snapshot.edges.iter_mut().filter(|e| e.created_seq == 0) {
        edge.created_seq = next_seq;
        next_seq += 1;
    }

    let mut store = GraphStore::from_snapshot(snapshot);
    let repaired = default_edge::repair_all(&mut store);
    if !repaired.is_empty() {
        log::warn!("Normalized default routing on {} imported edges", repaired.len());
    }
    check_invariants(&store)?;

    log::info!(
        "Imported bracket {}/{} ({} nodes, {} edges)",
        store.tournament_id(),
        store.phase_id(),
        store.node_count(),
        store.edge_count()
    );
    Ok(store)
}
