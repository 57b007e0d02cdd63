//! Dashboard module derivation.
//!
//! A module is visible when **any** effective permission maps to it.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use rolegate_core::{DomainResult, UserId};

use crate::context::RbacContext;
use crate::permissions::non_blank_module;
use crate::resolver::{resolve, EffectivePermissions};
use crate::store::PermissionCatalog;
use crate::PermissionKey;

/// Permission key → module name, built from the catalog.
///
/// Permissions without a module (or with a blank one) are not indexed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleIndex {
    by_key: HashMap<PermissionKey, String>,
}

impl ModuleIndex {
    pub fn from_catalog(catalog: &dyn PermissionCatalog) -> DomainResult<Self> {
        let mut by_key = HashMap::new();
        for key in catalog.all_permission_keys()? {
            let module = catalog.module_for_permission_key(&key)?;
            if let Some(module) = non_blank_module(module.as_deref()) {
                by_key.insert(key, module.to_string());
            }
        }
        Ok(Self { by_key })
    }

    /// Build an index from raw (key, module) pairs.
    pub fn from_pairs<I, K, M>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<M>)>,
        K: Into<PermissionKey>,
        M: AsRef<str>,
    {
        let by_key = pairs
            .into_iter()
            .filter_map(|(key, module)| {
                let module = non_blank_module(module.as_ref().map(|m| AsRef::<str>::as_ref(m)))?.to_string();
                Some((key.into(), module))
            })
            .collect();
        Self { by_key }
    }

    pub fn module_of(&self, key: &PermissionKey) -> Option<&str> {
        self.by_key.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }
}

/// Distinct modules reachable from `permissions`.
pub fn derive_modules<'a, I>(permissions: I, index: &ModuleIndex) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a PermissionKey>,
{
    permissions
        .into_iter()
        .filter_map(|key| index.module_of(key))
        .map(str::to_string)
        .collect()
}

/// Modules reachable from `permissions`, each with the (sorted) keys that
/// make it visible.
pub fn derive_modules_with_permissions<'a, I>(
    permissions: I,
    index: &ModuleIndex,
) -> BTreeMap<String, Vec<PermissionKey>>
where
    I: IntoIterator<Item = &'a PermissionKey>,
{
    let mut out: BTreeMap<String, Vec<PermissionKey>> = BTreeMap::new();
    for key in permissions {
        if let Some(module) = index.module_of(key) {
            out.entry(module.to_string()).or_default().push(key.clone());
        }
    }
    for keys in out.values_mut() {
        keys.sort();
        keys.dedup();
    }
    out
}

/// Dashboard modules visible to `user_id`.
pub fn dashboard_modules(ctx: &RbacContext, user_id: UserId) -> DomainResult<BTreeSet<String>> {
    let effective = resolve(ctx, user_id)?;
    let index = ModuleIndex::from_catalog(ctx.catalog())?;
    Ok(derive_modules(effective.iter(), &index))
}

/// Dashboard modules visible to `user_id` with their justifying permissions.
pub fn dashboard_modules_with_permissions(
    ctx: &RbacContext,
    user_id: UserId,
) -> DomainResult<BTreeMap<String, Vec<PermissionKey>>> {
    let effective: EffectivePermissions = resolve(ctx, user_id)?;
    let index = ModuleIndex::from_catalog(ctx.catalog())?;
    Ok(derive_modules_with_permissions(effective.iter(), &index))
}

/// Every distinct non-blank module tag in the catalog.
pub fn catalog_modules(catalog: &dyn PermissionCatalog) -> DomainResult<BTreeSet<String>> {
    Ok(catalog
        .permissions()?
        .iter()
        .filter_map(|p| p.module())
        .map(str::to_string)
        .collect())
}

/// Catalog permission keys grouped by module (blank modules excluded).
pub fn permissions_by_module(
    catalog: &dyn PermissionCatalog,
) -> DomainResult<BTreeMap<String, Vec<PermissionKey>>> {
    let mut out: BTreeMap<String, Vec<PermissionKey>> = BTreeMap::new();
    for permission in catalog.permissions()? {
        if let Some(module) = permission.module() {
            out.entry(module.to_string())
                .or_default()
                .push(permission.key.clone());
        }
    }
    for keys in out.values_mut() {
        keys.sort();
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> ModuleIndex {
        ModuleIndex::from_pairs([
            ("user.read", Some("Users")),
            ("user.create", Some("Users")),
            ("role.read", Some("Roles")),
            ("audit.view", Some("  ")),
            ("misc.ping", None),
        ])
    }

    fn keys(list: &[&'static str]) -> BTreeSet<PermissionKey> {
        list.iter().map(|k| PermissionKey::from(*k)).collect()
    }

    #[test]
    fn any_matching_permission_makes_module_visible() {
        let effective = keys(&["user.read", "role.read"]);
        let modules = derive_modules(&effective, &index());
        let expected: BTreeSet<String> = ["Roles", "Users"].iter().map(|s| s.to_string()).collect();
        assert_eq!(modules, expected);
    }

    #[test]
    fn blank_and_missing_modules_are_not_indexed() {
        let idx = index();
        assert_eq!(idx.len(), 3);
        assert!(derive_modules(&keys(&["audit.view", "misc.ping"]), &idx).is_empty());
    }

    #[test]
    fn unknown_keys_are_ignored() {
        assert!(derive_modules(&keys(&["nope"]), &index()).is_empty());
    }

    #[test]
    fn extended_form_lists_justifying_keys() {
        let effective = keys(&["user.create", "user.read", "role.read", "misc.ping"]);
        let grouped = derive_modules_with_permissions(&effective, &index());

        assert_eq!(grouped.len(), 2);
        assert_eq!(
            grouped["Users"],
            vec![PermissionKey::from("user.create"), PermissionKey::from("user.read")]
        );
        assert_eq!(grouped["Roles"], vec![PermissionKey::from("role.read")]);
    }

    #[test]
    fn module_names_are_kept_verbatim() {
        let idx = ModuleIndex::from_pairs([("a", Some(" Reports "))]);
        assert_eq!(idx.module_of(&PermissionKey::from("a")), Some(" Reports "));
    }

    #[test]
    fn names_differing_in_whitespace_are_distinct_modules() {
        let idx = ModuleIndex::from_pairs([("a", Some("Users ")), ("b", Some("Users"))]);
        let modules = derive_modules(&keys(&["a", "b"]), &idx);
        assert_eq!(modules, BTreeSet::from(["Users ".to_string(), "Users".to_string()]));
    }
}
