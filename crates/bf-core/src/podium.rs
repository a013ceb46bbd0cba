//! Podium position rules
//!
//! Podium sinks hold distinct positive ranking positions. New podiums fill
//! the lowest free position, and podiums can only be trimmed from the top.

use std::collections::BTreeSet;

use crate::{BfError, BfResult, Node, NodeId};

/// Reject `position` if another podium already holds it
pub fn validate_position<'a>(
    nodes: impl IntoIterator<Item = &'a Node>,
    position: u32,
    excluding: Option<&NodeId>,
) -> BfResult<()> {
    if position == 0 {
        return Err(BfError::invalid("position", "Position must be at least 1"));
    }
    let taken = nodes
        .into_iter()
        .filter(|n| Some(&n.id) != excluding)
        .any(|n| n.podium_position() == Some(position));
    if taken {
        return Err(BfError::DuplicatePodiumPosition(position));
    }
    Ok(())
}

/// Smallest positive position not currently occupied
pub fn next_available_position(occupied: impl IntoIterator<Item = u32>) -> u32 {
    let occupied: BTreeSet<u32> = occupied.into_iter().filter(|p| *p > 0).collect();
    let mut candidate = 1;
    for position in occupied {
        if position != candidate {
            break;
        }
        candidate += 1;
    }
    candidate
}

/// Check that removing `removing` leaves the podium ladder intact.
///
/// First place is never removable, and the removed positions must be the
/// topmost occupied ones.
pub fn check_removal(occupied: &[u32], removing: &[u32]) -> BfResult<()> {
    if removing.is_empty() {
        return Ok(());
    }
    let removing: BTreeSet<u32> = removing.iter().copied().collect();
    if removing.contains(&1) {
        return Err(BfError::NonContiguousPodiumDeletion);
    }

    let occupied: BTreeSet<u32> = occupied.iter().copied().collect();
    let top: BTreeSet<u32> = occupied.iter().rev().take(removing.len()).copied().collect();
    if top != removing {
        return Err(BfError::NonContiguousPodiumDeletion);
    }
    Ok(())
}

/// First position held by more than one podium, if any
pub fn find_duplicate<'a>(nodes: impl IntoIterator<Item = &'a Node>) -> Option<u32> {
    let mut seen = BTreeSet::new();
    nodes
        .into_iter()
        .filter_map(Node::podium_position)
        .find(|position| !seen.insert(*position))
}
