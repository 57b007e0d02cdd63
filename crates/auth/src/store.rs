//! Narrow collaborator contracts consumed by the engine.
//!
//! The engine never sees an entity graph: users, roles and permissions are
//! reached only through these id-keyed lookups. Implementations live in the
//! infrastructure layer.

use std::collections::BTreeSet;
use std::sync::Arc;

use rolegate_core::{DomainResult, PermissionId, ResourceKind, RoleId, UserId};

use crate::overrides::{UpsertCounts, UserOverride};
use crate::{Permission, PermissionKey};

/// Resolves users to their assigned roles.
pub trait IdentityStore: Send + Sync {
    /// Role ids assigned to `user_id`.
    ///
    /// Fails with `NotFound(User)` when the user does not exist.
    fn role_ids_for_user(&self, user_id: UserId) -> DomainResult<BTreeSet<RoleId>>;

    fn user_exists(&self, user_id: UserId) -> DomainResult<bool> {
        match self.role_ids_for_user(user_id) {
            Ok(_) => Ok(true),
            Err(e) if e.not_found_kind() == Some(ResourceKind::User) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Role → permission and permission → module mapping.
///
/// Each call reads a consistent view of one role or one permission; nothing is
/// assumed to be stable across calls.
pub trait PermissionCatalog: Send + Sync {
    /// Permission keys of one role. Unknown roles yield an empty set.
    fn permission_keys_for_role(&self, role_id: RoleId) -> DomainResult<BTreeSet<PermissionKey>>;

    /// Raw module tag of a permission key, `None` for unknown keys.
    fn module_for_permission_key(&self, key: &PermissionKey) -> DomainResult<Option<String>>;

    fn all_permission_keys(&self) -> DomainResult<BTreeSet<PermissionKey>>;

    /// Look up one permission row by id.
    fn permission(&self, permission_id: PermissionId) -> DomainResult<Option<Permission>>;

    /// All permission rows.
    fn permissions(&self) -> DomainResult<Vec<Permission>>;
}

/// Per-user override persistence.
///
/// Implementations must keep at most one row per (user, permission) and must
/// apply `replace_overrides` / `upsert_overrides` atomically with respect to
/// `list_overrides`.
pub trait OverrideStore: Send + Sync {
    /// Rows reference permissions by id. Mapping ids to keys is the
    /// resolver's job, through the catalog.
    fn list_overrides(&self, user_id: UserId) -> DomainResult<Vec<UserOverride>>;

    /// Discard every override of the user and store `overrides` instead.
    fn replace_overrides(&self, user_id: UserId, overrides: &[UserOverride]) -> DomainResult<()>;

    /// Insert or retype each entry in order, tallying what happened.
    fn upsert_overrides(
        &self,
        user_id: UserId,
        overrides: &[UserOverride],
    ) -> DomainResult<UpsertCounts>;

    /// Remove one override. Returns whether a row existed.
    fn remove_override(&self, user_id: UserId, permission_id: PermissionId) -> DomainResult<bool>;

    /// Remove every override of the user. Returns the number removed.
    fn clear_overrides(&self, user_id: UserId) -> DomainResult<usize>;
}

impl<S> IdentityStore for Arc<S>
where
    S: IdentityStore + ?Sized,
{
    fn role_ids_for_user(&self, user_id: UserId) -> DomainResult<BTreeSet<RoleId>> {
        (**self).role_ids_for_user(user_id)
    }
}

impl<S> PermissionCatalog for Arc<S>
where
    S: PermissionCatalog + ?Sized,
{
    fn permission_keys_for_role(&self, role_id: RoleId) -> DomainResult<BTreeSet<PermissionKey>> {
        (**self).permission_keys_for_role(role_id)
    }

    fn module_for_permission_key(&self, key: &PermissionKey) -> DomainResult<Option<String>> {
        (**self).module_for_permission_key(key)
    }

    fn all_permission_keys(&self) -> DomainResult<BTreeSet<PermissionKey>> {
        (**self).all_permission_keys()
    }

    fn permission(&self, permission_id: PermissionId) -> DomainResult<Option<Permission>> {
        (**self).permission(permission_id)
    }

    fn permissions(&self) -> DomainResult<Vec<Permission>> {
        (**self).permissions()
    }
}

impl<S> OverrideStore for Arc<S>
where
    S: OverrideStore + ?Sized,
{
    fn list_overrides(&self, user_id: UserId) -> DomainResult<Vec<UserOverride>> {
        (**self).list_overrides(user_id)
    }

    fn replace_overrides(&self, user_id: UserId, overrides: &[UserOverride]) -> DomainResult<()> {
        (**self).replace_overrides(user_id, overrides)
    }

    fn upsert_overrides(
        &self,
        user_id: UserId,
        overrides: &[UserOverride],
    ) -> DomainResult<UpsertCounts> {
        (**self).upsert_overrides(user_id, overrides)
    }

    fn remove_override(&self, user_id: UserId, permission_id: PermissionId) -> DomainResult<bool> {
        (**self).remove_override(user_id, permission_id)
    }

    fn clear_overrides(&self, user_id: UserId) -> DomainResult<usize> {
        (**self).clear_overrides(user_id)
    }
}
