//! Error types for BracketForge

use std::fmt;

use thiserror::Error;

use crate::{EdgeId, NodeId, NodeKind};

/// A single field-scoped input problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Core error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BfError {
    #[error("Invalid input: {}", join_fields(.0))]
    InvalidInput(Vec<FieldError>),

    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("Edge not found: {0}")]
    EdgeNotFound(EdgeId),

    #[error("Edge would create a cycle: {}", join_path(.path))]
    CycleDetected { path: Vec<NodeId> },

    #[error("Bracket must keep at least one {0} node")]
    StructuralMinimumViolation(NodeKind),

    #[error("Podium position {0} is already taken")]
    DuplicatePodiumPosition(u32),

    #[error("Podium nodes can only be removed from the top down, and first place never")]
    NonContiguousPodiumDeletion,

    #[error("The only disqualification sink cannot be removed")]
    DisqualificationSinkIsSole,

    #[error("Sink node {0} cannot have outgoing edges")]
    SinkHasOutgoingEdges(NodeId),

    #[error("Edge from {from} to {to} already exists")]
    DuplicateEdge { from: NodeId, to: NodeId },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl BfError {
    /// Shorthand for a single field-scoped input error
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput(vec![FieldError::new(field, message)])
    }

    /// Whether the error is a recoverable form-level problem rather than a
    /// topological or structural rejection
    pub fn is_input_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

fn join_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn join_path(path: &[NodeId]) -> String {
    path.iter()
        .map(NodeId::as_str)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Result type alias
pub type BfResult<T> = Result<T, BfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_message() {
        let err = BfError::InvalidInput(vec![
            FieldError::new("operator", "Operator is required"),
            FieldError::new("value", "Value is required"),
        ]);
        assert_eq!(
            err.to_string(),
            "Invalid input: operator: Operator is required; value: Value is required"
        );
        assert!(err.is_input_error());
    }

    #[test]
    fn test_cycle_message_lists_path() {
        let err = BfError::CycleDetected {
            path: vec![NodeId::from("a"), NodeId::from("b"), NodeId::from("a")],
        };
        assert_eq!(err.to_string(), "Edge would create a cycle: a -> b -> a");
        assert!(!err.is_input_error());
    }
}
