//! Wiring of the in-memory collaborators, startup seeding and the
//! cross-store cascades (user and role deletion).

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use tracing::info;

use rolegate_auth::{OverrideStore, PermissionCatalog, PermissionKey, RbacContext, Role};
use rolegate_core::{DomainError, DomainResult, PermissionId, ResourceKind, RoleId, UserId};

use crate::catalog::{InMemoryCatalog, NewPermission, NewRole};
use crate::config::CatalogSeed;
use crate::identity::{InMemoryIdentityStore, UserRecord};
use crate::override_store::InMemoryOverrideStore;

/// What `seed` created.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub permissions_created: usize,
    pub roles_created: usize,
}

/// The three in-memory stores, shared with every `RbacContext` built from them.
#[derive(Debug, Clone, Default)]
pub struct RbacStores {
    pub catalog: Arc<InMemoryCatalog>,
    pub identity: Arc<InMemoryIdentityStore>,
    pub overrides: Arc<InMemoryOverrideStore>,
}

impl RbacStores {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build stores and apply the built-in seed.
    pub fn with_builtin_seed() -> anyhow::Result<Self> {
        let stores = Self::new();
        stores.seed(&CatalogSeed::builtin()?)?;
        Ok(stores)
    }

    pub fn context(&self) -> RbacContext {
        RbacContext::new(
            self.identity.clone(),
            self.catalog.clone(),
            self.overrides.clone(),
        )
    }

    /// Create seeded permissions and roles that do not exist yet.
    ///
    /// Existing keys and role names are left untouched, so seeding twice is a
    /// no-op.
    pub fn seed(&self, seed: &CatalogSeed) -> anyhow::Result<SeedReport> {
        let mut report = SeedReport::default();

        for p in &seed.permissions {
            if self.catalog.permission_by_key(&p.key)?.is_some() {
                continue;
            }
            self.catalog
                .create_permission(NewPermission {
                    key: PermissionKey::new(p.key.clone()),
                    name: p.name.clone(),
                    description: p.description.clone(),
                    module: p.module.clone(),
                })
                .with_context(|| format!("seeding permission '{}'", p.key))?;
            report.permissions_created += 1;
        }

        let all: BTreeSet<PermissionId> = self.catalog_permission_ids()?;

        for r in &seed.roles {
            if self.catalog.role_by_name(&r.name)?.is_some() {
                continue;
            }
            let permissions = if r.all_permissions {
                all.clone()
            } else {
                let mut ids = BTreeSet::new();
                for key in &r.permissions {
                    let permission = self.catalog.permission_by_key(key)?.ok_or_else(|| {
                        anyhow!("role '{}' references unknown permission '{key}'", r.name)
                    })?;
                    ids.insert(permission.id);
                }
                ids
            };
            self.catalog
                .create_role(NewRole {
                    name: r.name.clone(),
                    description: r.description.clone(),
                    is_system_role: r.system,
                    permissions,
                })
                .with_context(|| format!("seeding role '{}'", r.name))?;
            report.roles_created += 1;
        }

        info!(
            permissions = report.permissions_created,
            roles = report.roles_created,
            "catalog seeded"
        );
        Ok(report)
    }

    fn catalog_permission_ids(&self) -> DomainResult<BTreeSet<PermissionId>> {
        Ok(self.catalog.permissions()?.into_iter().map(|p| p.id).collect())
    }

    fn check_roles_exist(&self, roles: &BTreeSet<RoleId>) -> DomainResult<()> {
        for role_id in roles {
            if self.catalog.role(*role_id)?.is_none() {
                return Err(DomainError::not_found(ResourceKind::Role, role_id));
            }
        }
        Ok(())
    }

    pub fn create_user(
        &self,
        username: impl Into<String>,
        roles: impl IntoIterator<Item = RoleId>,
    ) -> DomainResult<UserId> {
        let roles: BTreeSet<RoleId> = roles.into_iter().collect();
        self.check_roles_exist(&roles)?;

        let user_id = UserId::new();
        self.identity.insert_user(UserRecord {
            user_id,
            username: username.into(),
            roles,
        })?;
        info!(%user_id, "user created");
        Ok(user_id)
    }

    pub fn assign_roles(
        &self,
        user_id: UserId,
        roles: impl IntoIterator<Item = RoleId>,
    ) -> DomainResult<()> {
        let roles: BTreeSet<RoleId> = roles.into_iter().collect();
        self.check_roles_exist(&roles)?;
        self.identity.set_roles(user_id, roles)
    }

    /// Delete a user and every override they own. Returns the number of
    /// overrides removed.
    ///
    /// An override write that validated the user before this call and lands
    /// after it reclaims its own rows (see `add_overrides`/`set_overrides`).
    pub fn delete_user(&self, user_id: UserId) -> DomainResult<usize> {
        self.identity.remove_user(user_id)?;
        let removed = self.overrides.clear_overrides(user_id)?;
        info!(%user_id, overrides_removed = removed, "user deleted");
        Ok(removed)
    }

    /// Delete a non-system role and unassign it from every user.
    pub fn delete_role(&self, role_id: RoleId) -> DomainResult<Role> {
        let role = self.catalog.delete_role(role_id)?;
        let users = self.identity.unassign_role(role_id)?;
        info!(%role_id, users_updated = users, "role unassigned");
        Ok(role)
    }
}
