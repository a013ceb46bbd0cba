//! Structural minimum: a bracket always keeps at least one match, one podium
//! sink and one disqualification sink.

use std::collections::BTreeSet;

use crate::{BfError, BfResult, Node, NodeId, NodeKind};

/// Node counts per required kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindCounts {
    pub matches: usize,
    pub podiums: usize,
    pub disqualifications: usize,
}

impl KindCounts {
    pub fn tally<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> Self {
        let mut counts = Self::default();
        for node in nodes {
            match node.kind() {
                NodeKind::Match => counts.matches += 1,
                NodeKind::PodiumSink => counts.podiums += 1,
                NodeKind::DisqualificationSink => counts.disqualifications += 1,
            }
        }
        counts
    }

    pub fn get(&self, kind: NodeKind) -> usize {
        match kind {
            NodeKind::Match => self.matches,
            NodeKind::PodiumSink => self.podiums,
            NodeKind::DisqualificationSink => self.disqualifications,
        }
    }
}

/// Validate the structural minimum.
///
/// With an empty `removing` list the current counts are checked; otherwise
/// the counts left after removing those nodes.
pub fn validate<'a>(nodes: impl IntoIterator<Item = &'a Node>, removing: &[NodeId]) -> BfResult<()> {
    let removing_set: BTreeSet<&NodeId> = removing.iter().collect();
    let remaining = KindCounts::tally(nodes.into_iter().filter(|n| !removing_set.contains(&n.id)));

    for kind in NodeKind::REQUIRED {
        if remaining.get(kind) > 0 {
            continue;
        }
        if !removing.is_empty() && kind == NodeKind::DisqualificationSink {
            return Err(BfError::DisqualificationSinkIsSole);
        }
        return Err(BfError::StructuralMinimumViolation(kind));
    }
    Ok(())
}
