//! Output ports (interfaces) for domain services.

use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tenant_realm_sdk::{OperationContext, TenantAttribute};
use uuid::Uuid;

use super::error::{AdminApiError, RealmError};
use super::model::{
    AdminResponse, ClientRepresentation, ManagementPermissionReference, PolicyRepresentation,
    RealmRepresentation, RoleRepresentation, ServerInfoRepresentation, UserRepresentation,
};

/// Identity-provider admin API.
///
/// Every call takes the bearer token explicitly; attaching, renewing and
/// error translation are the gateway's job. Lookups return `Ok(None)` when the
/// resource does not exist. `create_*` calls return the raw response so the
/// step executor can inspect status and `Location`; every other call maps a
/// non-success status to [`AdminApiError::Status`]. HTTP 401 is always
/// [`AdminApiError::Unauthorized`].
#[async_trait]
pub trait AdminApi: Send + Sync {
    async fn find_realm(
        &self,
        token: SecretString,
        realm: &str,
    ) -> Result<Option<RealmRepresentation>, AdminApiError>;

    async fn create_realm(
        &self,
        token: SecretString,
        realm: &RealmRepresentation,
    ) -> Result<AdminResponse, AdminApiError>;

    async fn update_realm(
        &self,
        token: SecretString,
        realm: &RealmRepresentation,
    ) -> Result<(), AdminApiError>;

    /// Returns `false` when the realm was already absent.
    async fn delete_realm(&self, token: SecretString, realm: &str) -> Result<bool, AdminApiError>;

    async fn create_role(
        &self,
        token: SecretString,
        realm: &str,
        role: &RoleRepresentation,
    ) -> Result<AdminResponse, AdminApiError>;

    async fn find_role(
        &self,
        token: SecretString,
        realm: &str,
        name: &str,
    ) -> Result<Option<RoleRepresentation>, AdminApiError>;

    async fn create_client(
        &self,
        token: SecretString,
        realm: &str,
        client: &ClientRepresentation,
    ) -> Result<AdminResponse, AdminApiError>;

    /// Clients whose `clientId` equals `client_id`.
    async fn find_clients(
        &self,
        token: SecretString,
        realm: &str,
        client_id: &str,
    ) -> Result<Vec<ClientRepresentation>, AdminApiError>;

    async fn get_service_account_user(
        &self,
        token: SecretString,
        realm: &str,
        client_uuid: &str,
    ) -> Result<UserRepresentation, AdminApiError>;

    async fn add_realm_role_mappings(
        &self,
        token: SecretString,
        realm: &str,
        user_id: &str,
        roles: &[RoleRepresentation],
    ) -> Result<(), AdminApiError>;

    async fn enable_users_management_permissions(
        &self,
        token: SecretString,
        realm: &str,
    ) -> Result<ManagementPermissionReference, AdminApiError>;

    async fn create_client_policy(
        &self,
        token: SecretString,
        realm: &str,
        resource_server_id: &str,
        policy: &PolicyRepresentation,
    ) -> Result<AdminResponse, AdminApiError>;

    async fn get_scope_permission(
        &self,
        token: SecretString,
        realm: &str,
        resource_server_id: &str,
        permission_id: &str,
    ) -> Result<PolicyRepresentation, AdminApiError>;

    async fn get_associated_policies(
        &self,
        token: SecretString,
        realm: &str,
        resource_server_id: &str,
        permission_id: &str,
    ) -> Result<Vec<PolicyRepresentation>, AdminApiError>;

    async fn update_scope_permission(
        &self,
        token: SecretString,
        realm: &str,
        resource_server_id: &str,
        permission: &PolicyRepresentation,
    ) -> Result<(), AdminApiError>;

    async fn get_server_info(
        &self,
        token: SecretString,
    ) -> Result<ServerInfoRepresentation, AdminApiError>;
}

/// Issues admin-API bearer tokens.
#[async_trait]
pub trait AdminTokenSource: Send + Sync {
    async fn request_token(&self) -> Result<SecretString, AdminApiError>;
}

/// Key/value secret store.
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<SecretString>, RealmError>;

    async fn set(&self, key: &str, value: SecretString) -> Result<(), RealmError>;
}

/// Batch of attribute changes produced by one reconciliation pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AttributeChanges {
    pub removed: Vec<TenantAttribute>,
    /// Added and updated attributes, in that order.
    pub saved: Vec<TenantAttribute>,
}

/// Tenant attribute storage.
///
/// A sync reads with `find_by_tenant` and writes with `apply`. The service
/// serializes both per tenant within one process; hosts sharing storage
/// across processes must run the pair under one transaction or row lock.
#[async_trait]
pub trait AttributeRepository: Send + Sync {
    async fn find_by_tenant(&self, tenant_id: Uuid) -> anyhow::Result<Vec<TenantAttribute>>;

    /// Apply `changes` in one transaction (flush, delete removed, save the
    /// rest) and return the saved attributes.
    async fn apply(
        &self,
        tenant_id: Uuid,
        changes: AttributeChanges,
    ) -> anyhow::Result<Vec<TenantAttribute>>;
}

/// Tenant descriptor understood by the legacy registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryTenant {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Legacy tenant registry.
#[async_trait]
pub trait TenantRegistry: Send + Sync {
    async fn exists(&self, ctx: &OperationContext, tenant_name: &str) -> Result<bool, RealmError>;

    async fn create(&self, ctx: &OperationContext, tenant: &RegistryTenant)
    -> Result<(), RealmError>;

    async fn update(&self, ctx: &OperationContext, tenant: &RegistryTenant)
    -> Result<(), RealmError>;

    /// Deleting an absent tenant is not an error.
    async fn delete(&self, ctx: &OperationContext, tenant_name: &str) -> Result<(), RealmError>;
}

/// Removes a tenant's message-broker topics.
#[async_trait]
pub trait TopicCleaner: Send + Sync {
    async fn delete_tenant_topics(&self, tenant_name: &str) -> anyhow::Result<()>;
}
