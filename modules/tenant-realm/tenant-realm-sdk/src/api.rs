//! Public API traits for the tenant realm module.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::TenantRealmError;
use crate::models::{OperationContext, Tenant, TenantAttribute};

/// Hook points invoked by the tenant CRUD service after its own persistence
/// step has succeeded.
///
/// Listeners run in registration order; an error from one listener aborts the
/// remaining listeners for that event and propagates to the caller.
#[async_trait]
pub trait TenantListener: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Called after a tenant has been created.
    async fn on_tenant_create(
        &self,
        _ctx: &OperationContext,
        _tenant: &Tenant,
    ) -> Result<(), TenantRealmError> {
        Ok(())
    }

    /// Called after a tenant's metadata has been updated.
    async fn on_tenant_update(
        &self,
        _ctx: &OperationContext,
        _tenant: &Tenant,
    ) -> Result<(), TenantRealmError> {
        Ok(())
    }

    /// Called after a tenant has been deleted.
    async fn on_tenant_delete(
        &self,
        _ctx: &OperationContext,
        _tenant_name: &str,
    ) -> Result<(), TenantRealmError> {
        Ok(())
    }
}

/// Attribute synchronization entry point used by the tenant-attribute CRUD
/// service.
#[async_trait]
pub trait TenantAttributesApi: Send + Sync {
    /// Replace the tenant's attribute set with `incoming`, inserting, updating
    /// and deleting stored attributes as needed, and return the final set.
    async fn upsert_all(
        &self,
        ctx: &OperationContext,
        tenant_id: Option<Uuid>,
        incoming: Vec<TenantAttribute>,
    ) -> Result<Vec<TenantAttribute>, TenantRealmError>;
}
