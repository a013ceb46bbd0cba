//! Cycle detection for prospective edges
//!
//! DFS from the prospective edge's target over the existing edges plus the
//! hypothetical one. A cycle exists iff the search reaches a node that is
//! still on the search path.

use std::collections::{HashMap, HashSet};

use crate::{Edge, GraphStore, NodeId, NodeKind};

type Adjacency<'a> = HashMap<&'a NodeId, Vec<&'a NodeId>>;

/// Check if connecting `source -> target` would create a cycle
pub fn would_create_cycle<'a, I, F>(
    source: &NodeId,
    target: &NodeId,
    existing_edges: I,
    kind_of: F,
) -> bool
where
    I: IntoIterator<Item = &'a Edge>,
    F: Fn(&NodeId) -> Option<NodeKind>,
{
    find_cycle_path(source, target, existing_edges, kind_of).is_some()
}

/// Same search as [`would_create_cycle`], returning the cyclic path.
///
/// The path starts at `target` and ends where it closes, so the first and
/// last ids are equal.
pub fn find_cycle_path<'a, I, F>(
    source: &NodeId,
    target: &NodeId,
    existing_edges: I,
    kind_of: F,
) -> Option<Vec<NodeId>>
where
    I: IntoIterator<Item = &'a Edge>,
    F: Fn(&NodeId) -> Option<NodeKind>,
{
    if source == target {
        return Some(vec![source.clone(), target.clone()]);
    }
    // Sinks have no outgoing edges, so nothing can lead back from them
    if kind_of(target).is_some_and(NodeKind::is_sink) {
        return None;
    }

    let mut adjacency = adjacency(existing_edges);
    adjacency.entry(source).or_default().push(target);

    DepthFirst::new(&adjacency).visit(target)
}

/// Find any cycle in a whole graph, e.g. one loaded from disk
pub fn find_any_cycle(store: &GraphStore) -> Option<Vec<NodeId>> {
    let adjacency = adjacency(store.edges());
    let mut search = DepthFirst::new(&adjacency);
    for node in store.nodes() {
        if search.visited.contains(&node.id) {
            continue;
        }
        if let Some(path) = search.visit(&node.id) {
            return Some(path);
        }
    }
    None
}

impl GraphStore {
    /// [`would_create_cycle`] against this store's edges
    pub fn would_create_cycle(&self, source: &NodeId, target: &NodeId) -> bool {
        would_create_cycle(source, target, self.edges(), |id| self.kind_of(id))
    }

    /// [`find_cycle_path`] against this store's edges
    pub fn find_cycle_path(&self, source: &NodeId, target: &NodeId) -> Option<Vec<NodeId>> {
        find_cycle_path(source, target, self.edges(), |id| self.kind_of(id))
    }
}

fn adjacency<'a>(edges: impl IntoIterator<Item = &'a Edge>) -> Adjacency<'a> {
    let mut adjacency: Adjacency<'a> = HashMap::new();
    for edge in edges {
        if let Some(target) = edge.target.as_ref() {
            adjacency.entry(&edge.source).or_default().push(target);
        }
    }
    adjacency
}

struct DepthFirst<'g> {
    adjacency: &'g Adjacency<'g>,
    visited: HashSet<&'g NodeId>,
    on_stack: HashSet<&'g NodeId>,
    path: Vec<&'g NodeId>,
}

impl<'g> DepthFirst<'g> {
    fn new(adjacency: &'g Adjacency<'g>) -> Self {
        Self {
            adjacency,
            visited: HashSet::new(),
            on_stack: HashSet::new(),
            path: Vec::new(),
        }
    }

    /// Iterative DFS from `root`. Each frame is a node plus the index of the
    /// next child to explore; `path` mirrors the frames.
    fn visit(&mut self, root: &'g NodeId) -> Option<Vec<NodeId>> {
        let adjacency = self.adjacency;
        let mut frames: Vec<(&'g NodeId, usize)> = vec![(root, 0)];
        self.enter(root);

        while let Some(frame) = frames.last_mut() {
            let (node, child) = *frame;
            let next = adjacency.get(node).and_then(|next_nodes| next_nodes.get(child));
            let Some(&next) = next else {
                self.on_stack.remove(node);
                self.path.pop();
                frames.pop();
                continue;
            };
            frame.1 += 1;

            if self.on_stack.contains(next) {
                return Some(self.close_path(next));
            }
            if !self.visited.contains(next) {
                self.enter(next);
                frames.push((next, 0));
            }
        }
        None
    }

    fn enter(&mut self, node: &'g NodeId) {
        self.visited.insert(node);
        self.on_stack.insert(node);
        self.path.push(node);
    }

    fn close_path(&self, repeated: &NodeId) -> Vec<NodeId> {
        let start = self
            .path
            .iter()
            .position(|n| *n == repeated)
            .unwrap_or(0);
        let mut cycle: Vec<NodeId> = self.path[start..].iter().map(|n| (*n).clone()).collect();
        cycle.push(repeated.clone());
        cycle
    }
}
