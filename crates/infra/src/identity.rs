use std::collections::{BTreeSet, HashMap};
use std::sync::RwLock;

use rolegate_auth::IdentityStore;
use rolegate_core::{DomainError, DomainResult, ResourceKind, RoleId, UserId};

/// User → assigned roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub user_id: UserId,
    pub username: String,
    pub roles: BTreeSet<RoleId>,
}

/// In-memory identity store for tests/dev.
///
/// Role ids are stored as given; checking them against the catalog is the
/// caller's job (see `RbacStores`).
#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    users: RwLock<HashMap<UserId, UserRecord>>,
}

fn poisoned() -> DomainError {
    DomainError::conflict("identity store lock poisoned")
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_user(&self, record: UserRecord) -> DomainResult<()> {
        let mut users = self.users.write().map_err(|_| poisoned())?;
        if users.values().any(|u| u.username == record.username) {
            return Err(DomainError::conflict(format!(
                "username '{}' already exists",
                record.username
            )));
        }
        users.insert(record.user_id, record);
        Ok(())
    }

    pub fn user(&self, user_id: UserId) -> DomainResult<Option<UserRecord>> {
        Ok(self.users.read().map_err(|_| poisoned())?.get(&user_id).cloned())
    }

    /// Replace the role assignments of a user.
    pub fn set_roles(&self, user_id: UserId, roles: BTreeSet<RoleId>) -> DomainResult<()> {
        let mut users = self.users.write().map_err(|_| poisoned())?;
        let user = users
            .get_mut(&user_id)
            .ok_or_else(|| DomainError::not_found(ResourceKind::User, user_id))?;
        user.roles = roles;
        Ok(())
    }

    /// Drop a role from every user that has it. Returns how many users changed.
    pub fn unassign_role(&self, role_id: RoleId) -> DomainResult<usize> {
        let mut users = self.users.write().map_err(|_| poisoned())?;
        Ok(users
            .values_mut()
            .map(|u| u.roles.remove(&role_id))
            .filter(|removed| *removed)
            .count())
    }

    pub fn remove_user(&self, user_id: UserId) -> DomainResult<UserRecord> {
        self.users
            .write()
            .map_err(|_| poisoned())?
            .remove(&user_id)
            .ok_or_else(|| DomainError::not_found(ResourceKind::User, user_id))
    }
}

impl IdentityStore for InMemoryIdentityStore {
    fn role_ids_for_user(&self, user_id: UserId) -> DomainResult<BTreeSet<RoleId>> {
        let users = self.users.read().map_err(|_| poisoned())?;
        users
            .get(&user_id)
            .map(|u| u.roles.clone())
            .ok_or_else(|| DomainError::not_found(ResourceKind::User, user_id))
    }
}
