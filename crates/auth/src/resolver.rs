//! Effective permission resolution.
//!
//! `effective = (⋃ role permissions) ∪ grants \ denies`
//!
//! Resolution is read-only and holds no state between calls. Overrides whose
//! permission has since been deleted from the catalog contribute nothing.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use rolegate_core::{DomainResult, RoleId, UserId};

use crate::context::RbacContext;
use crate::overrides::OverrideKind;
use crate::PermissionKey;

/// The permission keys a user effectively holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectivePermissions {
    pub user_id: UserId,
    pub roles: BTreeSet<RoleId>,
    pub permissions: BTreeSet<PermissionKey>,
}

impl EffectivePermissions {
    pub fn contains(&self, key: &str) -> bool {
        self.permissions.contains(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PermissionKey> {
        self.permissions.iter()
    }

    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }
}

/// Inputs of one resolution, read from the collaborators.
#[derive(Debug, Clone, Default)]
pub(crate) struct ResolutionInputs {
    pub role_permissions: BTreeMap<RoleId, BTreeSet<PermissionKey>>,
    /// Overrides translated to keys; drifted rows already dropped.
    pub overrides: Vec<(PermissionKey, OverrideKind)>,
}

impl ResolutionInputs {
    pub fn role_union(&self) -> BTreeSet<PermissionKey> {
        self.role_permissions.values().flatten().cloned().collect()
    }

    pub fn override_for(&self, key: &str) -> Option<OverrideKind> {
        self.overrides
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, kind)| *kind)
    }
}

pub(crate) fn gather(ctx: &RbacContext, user_id: UserId) -> DomainResult<ResolutionInputs> {
    let role_ids = ctx.identity().role_ids_for_user(user_id)?;

    let mut role_permissions = BTreeMap::new();
    for role_id in role_ids {
        let keys = ctx.catalog().permission_keys_for_role(role_id)?;
        role_permissions.insert(role_id, keys);
    }

    let stored = ctx.overrides().list_overrides(user_id)?;
    let mut overrides = Vec::with_capacity(stored.len());
    for entry in stored {
        match ctx.catalog().permission(entry.permission_id)? {
            Some(permission) => overrides.push((permission.key, entry.kind)),
            None => {
                debug!(
                    %user_id,
                    permission_id = %entry.permission_id,
                    kind = %entry.kind,
                    "ignoring override for permission missing from catalog"
                );
            }
        }
    }

    Ok(ResolutionInputs {
        role_permissions,
        overrides,
    })
}

/// Apply overrides to a base set.
///
/// Grants are added and denies removed as two separate set operations, so the
/// result does not depend on the order of `overrides`.
pub fn merge_overrides<I>(mut base: BTreeSet<PermissionKey>, overrides: I) -> BTreeSet<PermissionKey>
where
    I: IntoIterator<Item = (PermissionKey, OverrideKind)>,
{
    let mut denies = Vec::new();
    for (key, kind) in overrides {
        match kind {
            OverrideKind::Grant => {
                base.insert(key);
            }
            OverrideKind::Deny => denies.push(key),
        }
    }
    for key in &denies {
        base.remove(key);
    }
    base
}

/// Compute the effective permission set of `user_id`.
///
/// Fails with `NotFound(User)` if the identity store does not know the user;
/// no partial result is returned.
pub fn resolve(ctx: &RbacContext, user_id: UserId) -> DomainResult<EffectivePermissions> {
    let inputs = gather(ctx, user_id)?;
    Ok(effective_from(user_id, inputs))
}

pub(crate) fn effective_from(user_id: UserId, inputs: ResolutionInputs) -> EffectivePermissions {
    let base = inputs.role_union();
    let roles = inputs.role_permissions.keys().copied().collect();
    EffectivePermissions {
        user_id,
        roles,
        permissions: merge_overrides(base, inputs.overrides),
    }
}
