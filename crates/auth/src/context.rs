use std::sync::Arc;

use crate::store::{IdentityStore, OverrideStore, PermissionCatalog};

/// The three collaborators the engine reads from, bundled once at startup
/// and passed into every resolver/gate call.
///
/// Cloning is cheap (reference counted).
#[derive(Clone)]
pub struct RbacContext {
    identity: Arc<dyn IdentityStore>,
    catalog: Arc<dyn PermissionCatalog>,
    overrides: Arc<dyn OverrideStore>,
}

impl RbacContext {
    pub fn new(
        identity: impl IdentityStore + 'static,
        catalog: impl PermissionCatalog + 'static,
        overrides: impl OverrideStore + 'static,
    ) -> Self {
        Self {
            identity: Arc::new(identity),
            catalog: Arc::new(catalog),
            overrides: Arc::new(overrides),
        }
    }

    pub fn identity(&self) -> &dyn IdentityStore {
        self.identity.as_ref()
    }

    pub fn catalog(&self) -> &dyn PermissionCatalog {
        self.catalog.as_ref()
    }

    pub fn overrides(&self) -> &dyn OverrideStore {
        self.overrides.as_ref()
    }
}

impl core::fmt::Debug for RbacContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RbacContext").finish_non_exhaustive()
    }
}
