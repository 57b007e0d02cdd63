//! `rolegate-core`: shared building blocks for the permission engine.
//!
//! This crate contains **pure** primitives (no storage, no transport).

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult, ResourceKind};
pub use id::{PermissionId, RoleId, UserId};
