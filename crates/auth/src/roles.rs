use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use rolegate_core::{PermissionId, RoleId};

/// A catalog role: a named bundle of permissions.
///
/// Role → permission edges are held as ids; the catalog resolves them to keys.
/// `is_system_role` protects the role from deletion and rename; the catalog
/// administration layer enforces it, the resolver ignores it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub description: Option<String>,
    pub is_system_role: bool,
    pub permissions: BTreeSet<PermissionId>,
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.name)
    }
}
