//! Startup catalog configuration.
//!
//! The seed is JSON:
//!
//! ```json
//! {
//!   "permissions": [{ "key": "user.read", "name": "View Users", "module": "Users" }],
//!   "roles": [{ "name": "SUPER_ADMIN", "system": true, "all_permissions": true }]
//! }
//! ```

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

const DEFAULT_SEED: &str = include_str!("../seed/default_catalog.json");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionSeed {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub module: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSeed {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub system: bool,
    /// Give the role every seeded permission; `permissions` is then ignored.
    #[serde(default)]
    pub all_permissions: bool,
    /// Permission keys.
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSeed {
    #[serde(default)]
    pub permissions: Vec<PermissionSeed>,
    #[serde(default)]
    pub roles: Vec<RoleSeed>,
}

impl CatalogSeed {
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("invalid catalog seed JSON")
    }

    pub fn from_path(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading catalog seed {}", path.display()))?;
        Self::from_json_str(&raw).with_context(|| format!("parsing catalog seed {}", path.display()))
    }

    /// Built-in seed: the standard permission set, a `SUPER_ADMIN` system
    /// role holding everything and a restricted `CUSTOMER` system role.
    pub fn builtin() -> anyhow::Result<Self> {
        Self::from_json_str(DEFAULT_SEED).context("built-in catalog seed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_seed_parses() {
        let seed = CatalogSeed::builtin().unwrap();
        assert!(seed.permissions.iter().any(|p| p.key == "user.read"));
        let admin = seed.roles.iter().find(|r| r.name == "SUPER_ADMIN").unwrap();
        assert!(admin.system && admin.all_permissions);
    }

    #[test]
    fn optional_fields_default() {
        let seed = CatalogSeed::from_json_str(
            r#"{ "permissions": [{ "key": "a", "name": "A" }], "roles": [{ "name": "R" }] }"#,
        )
        .unwrap();
        assert_eq!(seed.permissions[0].module, None);
        assert!(!seed.roles[0].system);
        assert!(seed.roles[0].permissions.is_empty());
    }

    #[test]
    fn malformed_seed_reports_context() {
        let err = CatalogSeed::from_json_str("{ nope").unwrap_err();
        assert!(err.to_string().contains("invalid catalog seed JSON"));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = CatalogSeed::from_path("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
