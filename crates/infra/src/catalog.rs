//! In-memory role/permission catalog with administrative mutations.
//!
//! All state sits behind one `RwLock`, so every edit (including a role's
//! whole permission set) becomes visible to readers in a single step.

use std::collections::{BTreeSet, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::info;

use rolegate_auth::{Permission, PermissionCatalog, PermissionKey, Role};
use rolegate_core::{DomainError, DomainResult, PermissionId, ResourceKind, RoleId};

#[derive(Debug, Default)]
struct CatalogState {
    permissions: HashMap<PermissionId, Permission>,
    by_key: HashMap<PermissionKey, PermissionId>,
    roles: HashMap<RoleId, Role>,
}

impl CatalogState {
    fn check_permissions_exist(&self, ids: &BTreeSet<PermissionId>) -> DomainResult<()> {
        for id in ids {
            if !self.permissions.contains_key(id) {
                return Err(DomainError::not_found(ResourceKind::Permission, id));
            }
        }
        Ok(())
    }

    fn role_name_taken(&self, name: &str, except: Option<RoleId>) -> bool {
        self.roles
            .values()
            .any(|r| r.name == name && Some(r.id) != except)
    }
}

/// Fields of a permission to create.
#[derive(Debug, Clone)]
pub struct NewPermission {
    pub key: PermissionKey,
    pub name: String,
    pub description: Option<String>,
    pub module: Option<String>,
}

/// Fields of a role to create.
#[derive(Debug, Clone, Default)]
pub struct NewRole {
    pub name: String,
    pub description: Option<String>,
    pub is_system_role: bool,
    pub permissions: BTreeSet<PermissionId>,
}

/// Partial role update; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct RoleUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub permissions: Option<BTreeSet<PermissionId>>,
}

/// In-memory catalog for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    inner: RwLock<CatalogState>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> DomainResult<RwLockReadGuard<'_, CatalogState>> {
        self.inner
            .read()
            .map_err(|_| DomainError::conflict("catalog lock poisoned"))
    }

    fn write(&self) -> DomainResult<RwLockWriteGuard<'_, CatalogState>> {
        self.inner
            .write()
            .map_err(|_| DomainError::conflict("catalog lock poisoned"))
    }

    pub fn create_permission(&self, new: NewPermission) -> DomainResult<Permission> {
        let key = PermissionKey::new(new.key.as_str().trim().to_string());
        if key.as_str().is_empty() {
            return Err(DomainError::invalid_argument("permission key must not be blank"));
        }

        let mut state = self.write()?;
        if state.by_key.contains_key(&key) {
            return Err(DomainError::conflict(format!(
                "permission key '{key}' already exists"
            )));
        }

        let permission = Permission {
            id: PermissionId::new(),
            key: key.clone(),
            name: new.name,
            description: new.description,
            module: new.module,
        };
        state.by_key.insert(key, permission.id);
        state.permissions.insert(permission.id, permission.clone());

        info!(permission_id = %permission.id, key = %permission.key, "permission created");
        Ok(permission)
    }

    /// Delete a permission and detach it from every role.
    ///
    /// Stored overrides that still reference the id are left alone; the
    /// resolver treats them as inert.
    pub fn delete_permission(&self, permission_id: PermissionId) -> DomainResult<Permission> {
        let mut state = self.write()?;
        let permission = state
            .permissions
            .remove(&permission_id)
            .ok_or_else(|| DomainError::not_found(ResourceKind::Permission, permission_id))?;
        state.by_key.remove(&permission.key);
        for role in state.roles.values_mut() {
            role.permissions.remove(&permission_id);
        }

        info!(%permission_id, key = %permission.key, "permission deleted");
        Ok(permission)
    }

    pub fn permission_by_key(&self, key: &str) -> DomainResult<Option<Permission>> {
        let state = self.read()?;
        Ok(state
            .by_key
            .get(key)
            .and_then(|id| state.permissions.get(id))
            .cloned())
    }

    pub fn create_role(&self, new: NewRole) -> DomainResult<Role> {
        let name = new.name.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::invalid_argument("role name must not be blank"));
        }

        let mut state = self.write()?;
        if state.role_name_taken(&name, None) {
            return Err(DomainError::conflict(format!("role name '{name}' already exists")));
        }
        state.check_permissions_exist(&new.permissions)?;

        let role = Role {
            id: RoleId::new(),
            name,
            description: new.description,
            is_system_role: new.is_system_role,
            permissions: new.permissions,
        };
        state.roles.insert(role.id, role.clone());

        info!(role_id = %role.id, name = %role.name, permissions = role.permissions.len(), "role created");
        Ok(role)
    }

    /// Apply a partial update to a role.
    ///
    /// System roles keep their name; their permission set may still change.
    pub fn update_role(&self, role_id: RoleId, update: RoleUpdate) -> DomainResult<Role> {
        let mut state = self.write()?;
        let current = state
            .roles
            .get(&role_id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(ResourceKind::Role, role_id))?;

        let mut role = current;
        if let Some(name) = update.name {
            let name = name.trim().to_string();
            if name != role.name {
                if role.is_system_role {
                    return Err(DomainError::conflict(format!(
                        "system role '{}' cannot be renamed",
                        role.name
                    )));
                }
                if name.is_empty() {
                    return Err(DomainError::invalid_argument("role name must not be blank"));
                }
                if state.role_name_taken(&name, Some(role_id)) {
                    return Err(DomainError::conflict(format!(
                        "role name '{name}' already exists"
                    )));
                }
                role.name = name;
            }
        }
        if let Some(description) = update.description {
            role.description = Some(description);
        }
        if let Some(permissions) = update.permissions {
            state.check_permissions_exist(&permissions)?;
            role.permissions = permissions;
        }

        state.roles.insert(role_id, role.clone());
        info!(%role_id, name = %role.name, permissions = role.permissions.len(), "role updated");
        Ok(role)
    }

    /// Delete a non-system role.
    pub fn delete_role(&self, role_id: RoleId) -> DomainResult<Role> {
        let mut state = self.write()?;
        match state.roles.get(&role_id) {
            None => return Err(DomainError::not_found(ResourceKind::Role, role_id)),
            Some(role) if role.is_system_role => {
                return Err(DomainError::conflict(format!(
                    "system role '{}' cannot be deleted",
                    role.name
                )));
            }
            Some(_) => {}
        }
        let role = state
            .roles
            .remove(&role_id)
            .ok_or_else(|| DomainError::not_found(ResourceKind::Role, role_id))?;

        info!(%role_id, name = %role.name, "role deleted");
        Ok(role)
    }

    pub fn role(&self, role_id: RoleId) -> DomainResult<Option<Role>> {
        Ok(self.read()?.roles.get(&role_id).cloned())
    }

    pub fn role_by_name(&self, name: &str) -> DomainResult<Option<Role>> {
        Ok(self.read()?.roles.values().find(|r| r.name == name).cloned())
    }

    pub fn roles(&self) -> DomainResult<Vec<Role>> {
        let mut roles: Vec<Role> = self.read()?.roles.values().cloned().collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }
}

impl PermissionCatalog for InMemoryCatalog {
    fn permission_keys_for_role(&self, role_id: RoleId) -> DomainResult<BTreeSet<PermissionKey>> {
        let state = self.read()?;
        let Some(role) = state.roles.get(&role_id) else {
            return Ok(BTreeSet::new());
        };
        Ok(role
            .permissions
            .iter()
            .filter_map(|id| state.permissions.get(id))
            .map(|p| p.key.clone())
            .collect())
    }

    fn module_for_permission_key(&self, key: &PermissionKey) -> DomainResult<Option<String>> {
        let state = self.read()?;
        Ok(state
            .by_key
            .get(key)
            .and_then(|id| state.permissions.get(id))
            .and_then(|p| p.module.clone()))
    }

    fn all_permission_keys(&self) -> DomainResult<BTreeSet<PermissionKey>> {
        Ok(self.read()?.by_key.keys().cloned().collect())
    }

    fn permission(&self, permission_id: PermissionId) -> DomainResult<Option<Permission>> {
        Ok(self.read()?.permissions.get(&permission_id).cloned())
    }

    fn permissions(&self) -> DomainResult<Vec<Permission>> {
        let mut permissions: Vec<Permission> =
            self.read()?.permissions.values().cloned().collect();
        permissions.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(permissions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_permission(key: &'static str, module: Option<&str>) -> NewPermission {
        NewPermission {
            key: PermissionKey::from(key),
            name: key.to_string(),
            description: None,
            module: module.map(str::to_string),
        }
    }

    #[test]
    fn duplicate_permission_key_conflicts() {
        let catalog = InMemoryCatalog::new();
        catalog.create_permission(new_permission("user.read", Some("Users"))).unwrap();
        let err = catalog
            .create_permission(new_permission("user.read", None))
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn role_with_unknown_permission_is_rejected() {
        let catalog = InMemoryCatalog::new();
        let err = catalog
            .create_role(NewRole {
                name: "EDITOR".into(),
                permissions: [PermissionId::new()].into_iter().collect(),
                ..NewRole::default()
            })
            .unwrap_err();
        assert_eq!(err.not_found_kind(), Some(ResourceKind::Permission));
        assert!(catalog.roles().unwrap().is_empty());
    }

    #[test]
    fn role_permission_keys_follow_edits() {
        let catalog = InMemoryCatalog::new();
        let read = catalog.create_permission(new_permission("user.read", Some("Users"))).unwrap();
        let create = catalog.create_permission(new_permission("user.create", Some("Users"))).unwrap();
        let role = catalog
            .create_role(NewRole {
                name: "EDITOR".into(),
                permissions: [read.id].into_iter().collect(),
                ..NewRole::default()
            })
            .unwrap();

        catalog
            .update_role(
                role.id,
                RoleUpdate {
                    permissions: Some([read.id, create.id].into_iter().collect()),
                    ..RoleUpdate::default()
                },
            )
            .unwrap();
        let keys = catalog.permission_keys_for_role(role.id).unwrap();
        assert!(keys.contains("user.read") && keys.contains("user.create"));

        catalog.delete_permission(create.id).unwrap();
        let keys = catalog.permission_keys_for_role(role.id).unwrap();
        assert_eq!(keys.len(), 1);
        assert!(catalog.permission(create.id).unwrap().is_none());
        assert!(catalog.permission_by_key("user.create").unwrap().is_none());
    }

    #[test]
    fn system_roles_cannot_be_renamed_or_deleted() {
        let catalog = InMemoryCatalog::new();
        let role = catalog
            .create_role(NewRole {
                name: "SUPER_ADMIN".into(),
                is_system_role: true,
                ..NewRole::default()
            })
            .unwrap();

        let err = catalog
            .update_role(
                role.id,
                RoleUpdate {
                    name: Some("ROOT".into()),
                    ..RoleUpdate::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));

        let err = catalog.delete_role(role.id).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
        assert!(catalog.role(role.id).unwrap().is_some());
    }

    #[test]
    fn unknown_role_has_no_permissions() {
        let catalog = InMemoryCatalog::new();
        assert!(catalog.permission_keys_for_role(RoleId::new()).unwrap().is_empty());
    }

    #[test]
    fn duplicate_role_name_conflicts() {
        let catalog = InMemoryCatalog::new();
        catalog
            .create_role(NewRole {
                name: "EDITOR".into(),
                ..NewRole::default()
            })
            .unwrap();
        let err = catalog
            .create_role(NewRole {
                name: " EDITOR ".into(),
                ..NewRole::default()
            })
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }
}
