use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use rolegate_auth::{OverrideKind, OverrideStore, UpsertCounts, UserOverride};
use rolegate_core::{DomainError, DomainResult, PermissionId, UserId};

type UserRows = BTreeMap<PermissionId, OverrideKind>;

/// In-memory override store for tests/dev.
///
/// Rows are keyed by (user, permission), so a second row for the same pair
/// cannot exist. Every mutation runs under the write lock and `list_overrides`
/// under the read lock: readers see a user's rows either before or after a
/// whole batch.
#[derive(Debug, Default)]
pub struct InMemoryOverrideStore {
    rows: RwLock<HashMap<UserId, UserRows>>,
}

fn poisoned() -> DomainError {
    DomainError::conflict("override store lock poisoned")
}

impl InMemoryOverrideStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of users with at least one override.
    pub fn user_count(&self) -> DomainResult<usize> {
        Ok(self.rows.read().map_err(|_| poisoned())?.len())
    }
}

impl OverrideStore for InMemoryOverrideStore {
    fn list_overrides(&self, user_id: UserId) -> DomainResult<Vec<UserOverride>> {
        let rows = self.rows.read().map_err(|_| poisoned())?;
        Ok(rows
            .get(&user_id)
            .map(|user_rows| {
                user_rows
                    .iter()
                    .map(|(permission_id, kind)| UserOverride {
                        permission_id: *permission_id,
                        kind: *kind,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    fn replace_overrides(&self, user_id: UserId, overrides: &[UserOverride]) -> DomainResult<()> {
        let mut next = UserRows::new();
        for entry in overrides {
            if let Some(previous) = next.insert(entry.permission_id, entry.kind) {
                if previous != entry.kind {
                    return Err(DomainError::invalid_argument(format!(
                        "conflicting overrides for permission {}",
                        entry.permission_id
                    )));
                }
            }
        }

        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        if next.is_empty() {
            rows.remove(&user_id);
        } else {
            rows.insert(user_id, next);
        }
        Ok(())
    }

    fn upsert_overrides(
        &self,
        user_id: UserId,
        overrides: &[UserOverride],
    ) -> DomainResult<UpsertCounts> {
        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        let user_rows = rows.entry(user_id).or_default();

        let mut counts = UpsertCounts::default();
        for entry in overrides {
            match user_rows.get_mut(&entry.permission_id) {
                None => {
                    user_rows.insert(entry.permission_id, entry.kind);
                    counts.new += 1;
                }
                Some(kind) if *kind == entry.kind => counts.duplicate += 1,
                Some(kind) => {
                    *kind = entry.kind;
                    counts.updated += 1;
                }
            }
        }

        if user_rows.is_empty() {
            rows.remove(&user_id);
        }
        Ok(counts)
    }

    fn remove_override(&self, user_id: UserId, permission_id: PermissionId) -> DomainResult<bool> {
        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        let Some(user_rows) = rows.get_mut(&user_id) else {
            return Ok(false);
        };
        let removed = user_rows.remove(&permission_id).is_some();
        if user_rows.is_empty() {
            rows.remove(&user_id);
        }
        Ok(removed)
    }

    fn clear_overrides(&self, user_id: UserId) -> DomainResult<usize> {
        let mut rows = self.rows.write().map_err(|_| poisoned())?;
        Ok(rows.remove(&user_id).map(|r| r.len()).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn upsert_twice_counts_new_then_duplicate() {
        let store = InMemoryOverrideStore::new();
        let user = UserId::new();
        let p = PermissionId::new();

        let first = store.upsert_overrides(user, &[UserOverride::grant(p)]).unwrap();
        assert_eq!(
            first,
            UpsertCounts {
                new: 1,
                updated: 0,
                duplicate: 0
            }
        );

        let second = store.upsert_overrides(user, &[UserOverride::grant(p)]).unwrap();
        assert_eq!(
            second,
            UpsertCounts {
                new: 0,
                updated: 0,
                duplicate: 1
            }
        );
    }

    #[test]
    fn upsert_with_other_kind_updates_in_place() {
        let store = InMemoryOverrideStore::new();
        let user = UserId::new();
        let p = PermissionId::new();

        store.upsert_overrides(user, &[UserOverride::grant(p)]).unwrap();
        let counts = store.upsert_overrides(user, &[UserOverride::deny(p)]).unwrap();
        assert_eq!(counts.updated, 1);
        assert_eq!(store.list_overrides(user).unwrap(), vec![UserOverride::deny(p)]);
    }

    #[test]
    fn replace_discards_previous_rows() {
        let store = InMemoryOverrideStore::new();
        let user = UserId::new();
        let (a, b) = (PermissionId::new(), PermissionId::new());

        store.replace_overrides(user, &[UserOverride::grant(a)]).unwrap();
        store.replace_overrides(user, &[UserOverride::deny(b)]).unwrap();
        assert_eq!(store.list_overrides(user).unwrap(), vec![UserOverride::deny(b)]);

        store.replace_overrides(user, &[]).unwrap();
        assert!(store.list_overrides(user).unwrap().is_empty());
        assert_eq!(store.user_count().unwrap(), 0);
    }

    #[test]
    fn conflicting_replace_leaves_rows_untouched() {
        let store = InMemoryOverrideStore::new();
        let user = UserId::new();
        let (a, b) = (PermissionId::new(), PermissionId::new());

        store.replace_overrides(user, &[UserOverride::grant(a)]).unwrap();
        let err = store
            .replace_overrides(user, &[UserOverride::grant(b), UserOverride::deny(b)])
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidArgument(_)));
        assert_eq!(store.list_overrides(user).unwrap(), vec![UserOverride::grant(a)]);
    }

    #[test]
    fn remove_and_clear() {
        let store = InMemoryOverrideStore::new();
        let user = UserId::new();
        let (a, b) = (PermissionId::new(), PermissionId::new());
        store
            .replace_overrides(user, &[UserOverride::grant(a), UserOverride::deny(b)])
            .unwrap();

        assert!(store.remove_override(user, a).unwrap());
        assert!(!store.remove_override(user, a).unwrap());
        assert_eq!(store.clear_overrides(user).unwrap(), 1);
        assert_eq!(store.clear_overrides(user).unwrap(), 0);
    }

    #[test]
    fn users_are_isolated() {
        let store = InMemoryOverrideStore::new();
        let (alice, bob) = (UserId::new(), UserId::new());
        let p = PermissionId::new();
        store.upsert_overrides(alice, &[UserOverride::deny(p)]).unwrap();
        assert!(store.list_overrides(bob).unwrap().is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 128,
            ..ProptestConfig::default()
        })]

        /// Property: every entry of an upsert batch is tallied exactly once.
        #[test]
        fn upsert_tallies_every_entry(
            existing in prop::collection::vec((0usize..6, any::<bool>()), 0..6),
            batch in prop::collection::vec((0usize..6, any::<bool>()), 0..12),
        ) {
            let ids: Vec<PermissionId> = (0..6).map(|_| PermissionId::new()).collect();
            let to_override = |(idx, grant): (usize, bool)| UserOverride {
                permission_id: ids[idx],
                kind: if grant { OverrideKind::Grant } else { OverrideKind::Deny },
            };

            let store = InMemoryOverrideStore::new();
            let user = UserId::new();
            let existing: Vec<UserOverride> = existing.into_iter().map(to_override).collect();
            store.upsert_overrides(user, &existing).unwrap();

            let batch: Vec<UserOverride> = batch.into_iter().map(to_override).collect();
            let counts = store.upsert_overrides(user, &batch).unwrap();
            prop_assert_eq!(counts.total(), batch.len());

            // At most one row per permission survives.
            let listed = store.list_overrides(user).unwrap();
            let mut seen = std::collections::HashSet::new();
            for row in &listed {
                prop_assert!(seen.insert(row.permission_id));
            }
        }
    }
}
