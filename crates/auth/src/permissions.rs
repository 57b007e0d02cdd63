use std::borrow::{Borrow, Cow};

use serde::{Deserialize, Serialize};

use rolegate_core::PermissionId;

/// Permission key.
///
/// Keys are opaque strings (e.g. "user.read"). Effective permission sets are
/// sets of keys; overrides and role edges reference the catalog row by
/// [`PermissionId`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionKey(Cow<'static, str>);

impl PermissionKey {
    pub fn new(key: impl Into<Cow<'static, str>>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for PermissionKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&'static str> for PermissionKey {
    fn from(value: &'static str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PermissionKey {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl core::fmt::Display for PermissionKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A catalog permission row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub id: PermissionId,
    pub key: PermissionKey,
    pub name: String,
    pub description: Option<String>,
    /// Raw module tag as stored. Use [`Permission::module`] for derivation.
    pub module: Option<String>,
}

impl Permission {
    pub fn new(
        id: PermissionId,
        key: impl Into<PermissionKey>,
        name: impl Into<String>,
        module: Option<String>,
    ) -> Self {
        Self {
            id,
            key: key.into(),
            name: name.into(),
            description: None,
            module,
        }
    }

    /// Module name used for dashboard derivation.
    ///
    /// Absent, empty and whitespace-only tags all yield `None`. Any other tag
    /// is returned as stored, surrounding whitespace included.
    pub fn module(&self) -> Option<&str> {
        non_blank_module(self.module.as_deref())
    }
}

/// Map blank module tags to `None`. Non-blank tags are kept verbatim and act
/// as the grouping key.
pub fn non_blank_module(module: Option<&str>) -> Option<&str> {
    module.filter(|m| !m.trim().is_empty())
}
