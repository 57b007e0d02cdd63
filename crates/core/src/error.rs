//! Typed error model.

use thiserror::Error;

/// Result type used across the engine and its collaborators.
pub type DomainResult<T> = Result<T, DomainError>;

/// Which kind of resource a lookup failed on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    User,
    Role,
    Permission,
}

impl core::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ResourceKind::User => f.write_str("user"),
            ResourceKind::Role => f.write_str("role"),
            ResourceKind::Permission => f.write_str("permission"),
        }
    }
}

/// Engine-level error.
///
/// Callers must be able to tell "no such user" from "no such permission" from
/// "malformed batch", so every failure lands in one of three typed families.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A referenced user, role or permission does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: ResourceKind, id: String },

    /// The write collides with existing state (duplicate name, protected
    /// system role, storage contention).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The request itself is malformed (e.g. contradictory batch entries,
    /// unparsable identifier).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl DomainError {
    pub fn not_found(kind: ResourceKind, id: impl core::fmt::Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Returns the resource kind if this is a `NotFound` error.
    pub fn not_found_kind(&self) -> Option<ResourceKind> {
        match self {
            Self::NotFound { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}
