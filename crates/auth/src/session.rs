use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use rolegate_core::{DomainResult, RoleId, UserId};

use crate::context::RbacContext;
use crate::modules::{derive_modules, derive_modules_with_permissions, ModuleIndex};
use crate::resolver::resolve;
use crate::PermissionKey;

/// Permission snapshot embedded into a session artifact at login.
///
/// Built from a single resolution so the permission list and the module
/// lists always agree with each other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionPermissions {
    pub user_id: UserId,
    pub roles: BTreeSet<RoleId>,
    pub permissions: BTreeSet<PermissionKey>,
    pub dashboard_modules: BTreeSet<String>,
    pub dashboard_modules_with_permissions: BTreeMap<String, Vec<PermissionKey>>,
    pub issued_at: DateTime<Utc>,
}

pub fn session_permissions(
    ctx: &RbacContext,
    user_id: UserId,
    issued_at: DateTime<Utc>,
) -> DomainResult<SessionPermissions> {
    let effective = resolve(ctx, user_id)?;
    let index = ModuleIndex::from_catalog(ctx.catalog())?;

    Ok(SessionPermissions {
        user_id,
        dashboard_modules: derive_modules(effective.iter(), &index),
        dashboard_modules_with_permissions: derive_modules_with_permissions(effective.iter(), &index),
        roles: effective.roles,
        permissions: effective.permissions,
        issued_at,
    })
}
