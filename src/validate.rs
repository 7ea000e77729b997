//! Node validation.
//!
//! Validators are a pluggable collaborator invoked exactly once per node on
//! both the write path (before committing bytes) and the read path (before
//! routing into a chunk). Swapping in [`NoopValidator`] makes validation
//! ignorable; any `Error` severity violation is otherwise fatal.

use crate::node::{Node, NodeKind};
use thiserror::Error;
use tracing::warn;

/// How serious a validation finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// A single validation finding for a node record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub severity: Severity,
    pub message: String,
}

impl Violation {
    pub fn error(message: impl Into<String>) -> Self {
        Violation {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Violation {
            severity: Severity::Warning,
            message: message.into(),
        }
    }
}

/// Raised when a node fails validation.
#[derive(Debug, Error)]
#[error("Node validation failed: {}", .violations.iter().map(|v| v.message.as_str()).collect::<Vec<_>>().join("; "))]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

/// The validation seam for node records.
pub trait Validator {
    /// Returns zero or more violations for the given node.
    fn validate(&self, node: &Node) -> Vec<Violation>;
}

/// Accepts every node; used to make validation ignorable.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopValidator;

impl Validator for NoopValidator {
    fn validate(&self, _node: &Node) -> Vec<Violation> {
        Vec::new()
    }
}

/// Checks the required fields every well-formed node must carry.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredFieldsValidator;

impl Validator for RequiredFieldsValidator {
    fn validate(&self, node: &Node) -> Vec<Violation> {
        let mut violations = Vec::new();

        if node.id.is_empty() {
            violations.push(Violation::error("node is missing its identifier"));
        }

        match node.kind {
            NodeKind::File | NodeKind::BdbaFile => {
                if !node.properties.contains_key("path") {
                    violations.push(Violation::error(format!(
                        "{} node {:?} is missing required property: path",
                        node.kind.type_name(),
                        node.id
                    )));
                }
            }
            NodeKind::Component => {
                if !node.properties.contains_key("identifier") {
                    violations.push(Violation::warning(format!(
                        "Component node {:?} has no identifier property",
                        node.id
                    )));
                }
            }
            _ => {}
        }

        violations
    }
}

/// Runs a validator against a node, turning `Error` severity findings into a
/// fatal [`ValidationError`] and logging warnings.
pub(crate) fn enforce<V: Validator>(validator: &V, node: &Node) -> Result<(), ValidationError> {
    let violations = validator.validate(node);
    if violations.is_empty() {
        return Ok(());
    }
    for violation in &violations {
        if violation.severity == Severity::Warning {
            warn!(node = %node.id, message = %violation.message, "validation warning");
        }
    }
    if violations.iter().any(|v| v.severity == Severity::Error) {
        Err(ValidationError { violations })
    } else {
        Ok(())
    }
}
