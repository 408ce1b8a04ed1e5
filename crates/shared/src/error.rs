use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    MalformedEvent,
    AmbiguousHit,
    DegenerateKinematics,
    Hierarchy,
    UnknownEntity,
    InvalidConfig,
}

/// Failure taxonomy of the gesture core. Input-path errors are never fatal:
/// components log them and degrade to "no event / no rotation".
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GestureError {
    #[error("malformed {event} event: missing {field}")]
    MalformedEvent {
        event: &'static str,
        field: &'static str,
    },
    #[error("hit {hit} is outside the subtree of root {root}")]
    OutsideRoot { hit: EntityId, root: EntityId },
    #[error("degenerate kinematics: {0}")]
    DegenerateKinematics(&'static str),
    #[error("parent links revisit entity {0}")]
    HierarchyCycle(EntityId),
    #[error("walk from entity {start} exceeded {limit} steps")]
    HierarchyTooDeep { start: EntityId, limit: usize },
    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),
    #[error("invalid config field `{field}`: {reason}")]
    InvalidConfig { field: &'static str, reason: String },
}

impl GestureError {
    pub fn malformed(event: &'static str, field: &'static str) -> Self {
        Self::MalformedEvent { event, field }
    }

    pub fn invalid_config(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::MalformedEvent { .. } => ErrorCode::MalformedEvent,
            Self::OutsideRoot { .. } => ErrorCode::AmbiguousHit,
            Self::DegenerateKinematics(_) => ErrorCode::DegenerateKinematics,
            Self::HierarchyCycle(_) | Self::HierarchyTooDeep { .. } => ErrorCode::Hierarchy,
            Self::UnknownEntity(_) => ErrorCode::UnknownEntity,
            Self::InvalidConfig { .. } => ErrorCode::InvalidConfig,
        }
    }
}

/// Serializable record of a dropped input, kept by the runtime for inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub source: String,
    pub message: String,
}

impl ErrorReport {
    pub fn new(source: impl Into<String>, error: &GestureError) -> Self {
        Self {
            code: error.code(),
            source: source.into(),
            message: error.to_string(),
        }
    }
}
