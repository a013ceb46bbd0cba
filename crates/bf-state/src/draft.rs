//! Edit drafts
//!
//! Caller-owned scratch copies of an edit in progress, holding raw form
//! text. Nothing in the store changes until [`ConditionDraft::confirm`] or
//! [`NodeDraft::confirm`] produces a [`Command`] and that command is
//! executed; dropping a draft discards it.

use bf_core::{
    BfError, BfResult, Comparison, Condition, Edge, EdgeId, FieldError, GraphStore, Node, NodeId,
    NodeKind, NodePatch, check_capacity, podium,
};

use crate::{Command, NodeConfig};

// ═══════════════════════════════════════════════════════════════════════════════
// CONDITION DRAFT
// ═══════════════════════════════════════════════════════════════════════════════

/// Draft of an edge's routing condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionDraft {
    pub edge: EdgeId,
    /// `default`, `score` or `position`
    pub field: String,
    pub operator: String,
    pub value: String,
}

impl ConditionDraft {
    /// Blank draft for `edge`
    pub fn new(edge: EdgeId) -> Self {
        Self {
            edge,
            field: String::new(),
            operator: String::new(),
            value: String::new(),
        }
    }

    /// Draft prefilled from the edge's current condition
    pub fn from_edge(edge: &Edge) -> Self {
        let mut draft = Self::new(edge.id.clone());
        match edge.condition {
            Condition::Default => draft.field = "default".into(),
            Condition::Score { operator, value } => {
                draft.field = "score".into();
                draft.operator = operator.symbol().into();
                draft.value = value.to_string();
            }
            Condition::Position { operator, value } => {
                draft.field = "position".into();
                draft.operator = operator.symbol().into();
                draft.value = value.to_string();
            }
        }
        draft
    }

    /// Parse the draft, collecting every field problem
    pub fn validate(&self) -> BfResult<Condition> {
        let field = self.field.trim();
        if field == "default" {
            // Operator and value are irrelevant for the catch-all route
            return Ok(Condition::Default);
        }

        let mut errors = Vec::new();
        match field {
            "" => errors.push(FieldError::new("field", "Field is required")),
            "score" | "position" => {}
            other => errors.push(FieldError::new("field", format!("Unknown field `{other}`"))),
        }

        let operator = match self.operator.trim() {
            "" => {
                errors.push(FieldError::new("operator", "Operator is required"));
                None
            }
            raw => match raw.parse::<Comparison>() {
                Ok(op) => Some(op),
                Err(message) => {
                    errors.push(FieldError::new("operator", message));
                    None
                }
            },
        };

        let value = match self.value.trim() {
            "" => {
                errors.push(FieldError::new("value", "Value is required"));
                None
            }
            raw => match raw.parse::<f64>() {
                Ok(v) if v.is_finite() => Some(v),
                _ => {
                    errors.push(FieldError::new("value", "Value must be a number"));
                    None
                }
            },
        };

        match (field, operator, value) {
            ("score", Some(operator), Some(value)) if errors.is_empty() => {
                Ok(Condition::Score { operator, value })
            }
            ("position", Some(operator), Some(value)) if errors.is_empty() => {
                Ok(Condition::Position { operator, value })
            }
            _ => Err(BfError::InvalidInput(errors)),
        }
    }

    /// Turn the draft into the command that applies it
    pub fn confirm(self) -> BfResult<Command> {
        let condition = self.validate()?;
        Ok(Command::EditEdgeCondition {
            edge: self.edge,
            condition,
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// NODE DRAFT
// ═══════════════════════════════════════════════════════════════════════════════

/// Draft of a node's configuration, for a new node or an existing one
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeDraft {
    /// Node being edited; `None` for a node yet to be added
    pub target: Option<NodeId>,
    pub kind: NodeKind,
    pub capacity: String,
    pub podium_position: String,
}

impl NodeDraft {
    /// Draft for a new node. Blank fields take the session defaults.
    pub fn new(kind: NodeKind) -> Self {
        Self {
            target: None,
            kind,
            capacity: String::new(),
            podium_position: String::new(),
        }
    }

    /// Draft prefilled from an existing node
    pub fn from_node(node: &Node) -> Self {
        Self {
            target: Some(node.id.clone()),
            kind: node.kind(),
            capacity: node.capacity().map(|c| c.to_string()).unwrap_or_default(),
            podium_position: node
                .podium_position()
                .map(|p| p.to_string())
                .unwrap_or_default(),
        }
    }

    /// Parse the draft against the current store. Returns the parsed
    /// capacity and podium position.
    pub fn validate(&self, store: &GraphStore) -> BfResult<(Option<u32>, Option<u32>)> {
        let mut errors = Vec::new();
        let editing = self.target.is_some();

        let capacity = match self.kind {
            NodeKind::Match => match parse_positive(&self.capacity, editing) {
                Ok(Some(capacity)) => match check_capacity(capacity) {
                    Ok(()) => Some(capacity),
                    Err(e) => {
                        errors.push(e);
                        None
                    }
                },
                Ok(None) => None,
                Err(()) => {
                    errors.push(FieldError::new("capacity", "Capacity must be at least 1"));
                    None
                }
            },
            _ => None,
        };

        let position = match self.kind {
            NodeKind::PodiumSink => match parse_positive(&self.podium_position, editing) {
                Ok(position) => position,
                Err(()) => {
                    errors.push(FieldError::new("position", "Position must be at least 1"));
                    None
                }
            },
            _ => None,
        };
        if let Some(position) = position {
            if let Err(BfError::DuplicatePodiumPosition(taken)) =
                podium::validate_position(store.nodes(), position, self.target.as_ref())
            {
                errors.push(FieldError::new(
                    "position",
                    format!("A podium already holds position {taken}; each position must be unique"),
                ));
            }
        }

        if !errors.is_empty() {
            return Err(BfError::InvalidInput(errors));
        }
        Ok((capacity, position))
    }

    /// Turn the draft into the command that applies it
    pub fn confirm(self, store: &GraphStore) -> BfResult<Command> {
        let (capacity, podium_position) = self.validate(store)?;
        Ok(match self.target {
            None => Command::AddNode {
                kind: self.kind,
                config: NodeConfig {
                    capacity,
                    podium_position,
                    position: None,
                },
            },
            Some(id) => Command::EditNodeConfig {
                id,
                patch: NodePatch {
                    capacity,
                    podium_position,
                    ..Default::default()
                },
            },
        })
    }
}

/// Parse a positive integer field. Blank is accepted (as `None`) unless
/// `required`.
fn parse_positive(raw: &str, required: bool) -> Result<Option<u32>, ()> {
    let raw = raw.trim();
    if raw.is_empty() {
        return if required { Err(()) } else { Ok(None) };
    }
    match raw.parse::<u32>() {
        Ok(n) if n >= 1 => Ok(Some(n)),
        _ => Err(()),
    }
}
