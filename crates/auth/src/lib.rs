//! `rolegate-auth`: permission resolution engine.
//!
//! Combines role-derived permissions with per-user GRANT/DENY overrides,
//! derives visible dashboard modules and answers permission checks. Storage is
//! reached only through the collaborator traits in [`store`].

pub mod authorize;
pub mod context;
pub mod modules;
pub mod overrides;
pub mod permissions;
pub mod resolver;
pub mod roles;
pub mod session;
pub mod store;

pub use authorize::{
    authorize, authorize_operation, explain_authorization, has_permission, AuthorizationExplanation,
    AuthzError, DecisionSource, RequiresPermissions,
};
pub use context::RbacContext;
pub use modules::{
    catalog_modules, dashboard_modules, dashboard_modules_with_permissions, derive_modules,
    derive_modules_with_permissions, permissions_by_module, ModuleIndex,
};
pub use overrides::{
    add_overrides, list_overrides, remove_override, set_overrides, OverrideKind, OverrideSummary,
    UpsertCounts, UserOverride,
};
pub use permissions::{Permission, PermissionKey};
pub use resolver::{merge_overrides, resolve, EffectivePermissions};
pub use roles::Role;
pub use session::{session_permissions, SessionPermissions};
pub use store::{IdentityStore, OverrideStore, PermissionCatalog};
