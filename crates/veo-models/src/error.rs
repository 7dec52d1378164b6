//! Model error types.

use thiserror::Error;

use crate::task::TaskStatus;

/// A request field failed intake validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    /// Name of the offending field, as it appears on the wire.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Collapse a `validator` report into the first failing field.
    ///
    /// Fields are visited in name order so the reported field is stable.
    pub fn from_report(report: &validator::ValidationErrors) -> Self {
        let first = report
            .field_errors()
            .into_iter()
            .min_by(|a, b| a.0.cmp(&b.0));

        match first {
            Some((field, errors)) => {
                let message = errors
                    .first()
                    .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| format!("Invalid value for {}", field));
                Self::new(field.to_string(), message)
            }
            None => Self::new("request", "Request failed validation"),
        }
    }
}

/// A status change that the task lifecycle does not allow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Task is already {0}")]
    Terminal(TaskStatus),

    #[error("Cannot move task from {from} to {to}")]
    Backward { from: TaskStatus, to: TaskStatus },

    #[error("A completed task requires a video URL")]
    MissingVideoUrl,
}
