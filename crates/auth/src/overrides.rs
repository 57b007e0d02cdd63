//! Per-user GRANT/DENY overrides and the two mutation modes.
//!
//! - `set_overrides` replaces the user's whole override set.
//! - `add_overrides` upserts entry by entry and reports what changed.
//!
//! Both validate the full batch before the store sees any of it: an unknown
//! permission id or a contradictory pair of entries rejects everything.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use rolegate_core::{DomainError, DomainResult, PermissionId, ResourceKind, UserId};

use crate::context::RbacContext;

/// Direction of an override.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OverrideKind {
    /// Hold the permission even if no role carries it.
    Grant,
    /// Drop the permission even if a role carries it.
    Deny,
}

impl core::fmt::Display for OverrideKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            OverrideKind::Grant => f.write_str("GRANT"),
            OverrideKind::Deny => f.write_str("DENY"),
        }
    }
}

/// One override entry: either a stored row or an entry of a mutation batch.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserOverride {
    pub permission_id: PermissionId,
    pub kind: OverrideKind,
}

impl UserOverride {
    pub fn grant(permission_id: PermissionId) -> Self {
        Self {
            permission_id,
            kind: OverrideKind::Grant,
        }
    }

    pub fn deny(permission_id: PermissionId) -> Self {
        Self {
            permission_id,
            kind: OverrideKind::Deny,
        }
    }
}

/// What an upsert did, entry by entry.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpsertCounts {
    pub new: usize,
    pub updated: usize,
    pub duplicate: usize,
}

impl UpsertCounts {
    pub fn total(&self) -> usize {
        self.new + self.updated + self.duplicate
    }
}

/// Result of `add_overrides`: counts plus an administrator-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverrideSummary {
    pub new_overrides: usize,
    pub updated_overrides: usize,
    pub duplicate_overrides: usize,
    pub message: String,
}

impl From<UpsertCounts> for OverrideSummary {
    fn from(counts: UpsertCounts) -> Self {
        Self {
            new_overrides: counts.new,
            updated_overrides: counts.updated,
            duplicate_overrides: counts.duplicate,
            message: summary_message(counts),
        }
    }
}

fn summary_message(counts: UpsertCounts) -> String {
    let UpsertCounts {
        new,
        updated,
        duplicate,
    } = counts;

    if duplicate > 0 && new == 0 && updated == 0 {
        "All permission overrides already exist with the same type".to_string()
    } else if duplicate > 0 {
        format!("Added {new} new, updated {updated} existing, {duplicate} duplicate overrides found")
    } else {
        format!("Added {new} new and updated {updated} existing permission overrides")
    }
}

/// Reject contradictory entries (same permission, different kind).
///
/// Identical repeats are allowed; they are not ambiguous.
pub fn check_batch_consistency(batch: &[UserOverride]) -> DomainResult<()> {
    let mut seen: BTreeMap<PermissionId, OverrideKind> = BTreeMap::new();
    for (idx, entry) in batch.iter().enumerate() {
        match seen.insert(entry.permission_id, entry.kind) {
            Some(previous) if previous != entry.kind => {
                return Err(DomainError::invalid_argument(format!(
                    "permission {} appears as both {previous} and {} (index {idx})",
                    entry.permission_id, entry.kind
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

fn validate_batch(ctx: &RbacContext, user_id: UserId, batch: &[UserOverride]) -> DomainResult<()> {
    if !ctx.identity().user_exists(user_id)? {
        return Err(DomainError::not_found(ResourceKind::User, user_id));
    }

    check_batch_consistency(batch)?;

    for entry in batch {
        if ctx.catalog().permission(entry.permission_id)?.is_none() {
            return Err(DomainError::not_found(
                ResourceKind::Permission,
                entry.permission_id,
            ));
        }
    }

    Ok(())
}

/// The user check in `validate_batch` runs outside the store's lock, so a
/// concurrent user deletion can slip between it and the write. Re-check after
/// writing and reclaim any rows left behind for a user that no longer exists.
fn reclaim_if_user_gone(ctx: &RbacContext, user_id: UserId) -> DomainResult<()> {
    if ctx.identity().user_exists(user_id)? {
        return Ok(());
    }
    let removed = ctx.overrides().clear_overrides(user_id)?;
    warn!(%user_id, removed, "user deleted during override write; rows reclaimed");
    Err(DomainError::not_found(ResourceKind::User, user_id))
}

/// Replace all overrides of `user_id` with `batch`.
///
/// Repeated identical entries collapse into one stored row. An empty batch
/// clears the user's overrides.
pub fn set_overrides(ctx: &RbacContext, user_id: UserId, batch: &[UserOverride]) -> DomainResult<()> {
    validate_batch(ctx, user_id, batch)?;

    let mut unique: Vec<UserOverride> = Vec::with_capacity(batch.len());
    for entry in batch {
        if !unique.contains(entry) {
            unique.push(*entry);
        }
    }

    ctx.overrides().replace_overrides(user_id, &unique)?;
    reclaim_if_user_gone(ctx, user_id)?;
    info!(%user_id, count = unique.len(), "user permission overrides replaced");
    Ok(())
}

/// Upsert `batch` into the overrides of `user_id`.
///
/// Entries are applied in order, so a repeated identical entry tallies as a
/// duplicate the second time. For any accepted batch
/// `new + updated + duplicate == batch.len()`.
pub fn add_overrides(
    ctx: &RbacContext,
    user_id: UserId,
    batch: &[UserOverride],
) -> DomainResult<OverrideSummary> {
    validate_batch(ctx, user_id, batch)?;

    let counts = ctx.overrides().upsert_overrides(user_id, batch)?;
    reclaim_if_user_gone(ctx, user_id)?;
    info!(
        %user_id,
        new = counts.new,
        updated = counts.updated,
        duplicate = counts.duplicate,
        "user permission overrides added"
    );
    Ok(counts.into())
}

/// Stored overrides of a user.
pub fn list_overrides(ctx: &RbacContext, user_id: UserId) -> DomainResult<Vec<UserOverride>> {
    if !ctx.identity().user_exists(user_id)? {
        return Err(DomainError::not_found(ResourceKind::User, user_id));
    }
    ctx.overrides().list_overrides(user_id)
}

/// Remove a single override. Fails with `NotFound(User)` for an unknown user
/// and `NotFound(Permission)` if the user has no override for that permission.
pub fn remove_override(
    ctx: &RbacContext,
    user_id: UserId,
    permission_id: PermissionId,
) -> DomainResult<()> {
    if !ctx.identity().user_exists(user_id)? {
        return Err(DomainError::not_found(ResourceKind::User, user_id));
    }
    if !ctx.overrides().remove_override(user_id, permission_id)? {
        return Err(DomainError::not_found(ResourceKind::Permission, permission_id));
    }
    info!(%user_id, %permission_id, "user permission override removed");
    Ok(())
}
