//! Infrastructure layer: in-memory collaborators, seeding, config.

pub mod bootstrap;
pub mod catalog;
pub mod config;
pub mod identity;
pub mod override_store;


pub use bootstrap::{RbacStores, SeedReport};
pub use catalog::{InMemoryCatalog, NewPermission, NewRole, RoleUpdate};
pub use config::{CatalogSeed, PermissionSeed, RoleSeed};
pub use identity::{InMemoryIdentityStore, UserRecord};
pub use override_store::InMemoryOverrideStore;
