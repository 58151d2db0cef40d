//! Tenant Realm SDK
//!
//! This crate provides the public API for the `tenant-realm` module:
//!
//! - [`TenantListener`] - Lifecycle hooks invoked after tenant persistence
//! - [`TenantAttributesApi`] - Attribute reconciliation entry point
//! - [`Tenant`], [`TenantAttribute`], [`OperationContext`] - Domain models
//! - [`TenantRealmError`] - Error types
//!
//! ## Usage
//!
//! ```ignore
//! use tenant_realm_sdk::{OperationContext, Tenant, TenantListener};
//!
//! let ctx = OperationContext::new().with_caller_token(token);
//! let tenant = Tenant::new(tenant_id, "acme");
//!
//! for listener in &listeners {
//!     listener.on_tenant_create(&ctx, &tenant).await?;
//! }
//! ```

pub mod api;
pub mod error;
pub mod models;

pub use api::{TenantAttributesApi, TenantListener};
pub use error::TenantRealmError;
pub use models::{OperationContext, Tenant, TenantAttribute};
