//! Tenant Realm Module Implementation
//!
//! Provisions one isolated Keycloak realm per tenant and keeps it in step
//! with the tenant's lifecycle:
//!
//! - Realm creation with roles, four OAuth clients and their authorization
//!   settings, rolled back as a whole when any step fails
//! - Realm update and deletion on tenant update and deletion
//! - Mirroring of tenants into the legacy tenant registry
//! - Reconciliation of a tenant's free-form attributes
//!
//! ## Architecture
//!
//! ```text
//!   TenantListeners ──▶ RealmListener ──▶ RealmOrchestrator
//!                   │                        │ RoleProvisioner
//!                   │                        │ ClientProvisioner (x4)
//!                   │                        ▼
//!                   │                  ResourceStepExecutor
//!                   │                        ▼
//!                   │                  AdminGateway ◀── AdminTokenCache
//!                   │                        ▼
//!                   │                  dyn AdminApi (KeycloakAdminClient)
//!                   ├─▶ RegistryListener ──▶ dyn TenantRegistry
//!                   └─▶ TopicCleanupListener ──▶ dyn TopicCleaner
//! ```

pub mod config;
pub mod domain;
pub mod infra;
pub mod module;

pub use config::TenantRealmConfig;
pub use domain::attributes::TenantAttributeService;
pub use domain::error::{AdminApiError, RealmError};
pub use domain::listeners::TenantListeners;
pub use domain::realm::RealmOrchestrator;
pub use module::{ModuleDeps, TenantRealmModule};
