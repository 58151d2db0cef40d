#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

//! Common test utilities for tenant-realm integration tests

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use http::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use tenant_realm::config::TenantRealmConfig;
use tenant_realm::domain::error::AdminApiError;
use tenant_realm::domain::model::{
    AdminResponse, ClientRepresentation, ManagementPermissionReference, OPENID_CONNECT,
    PolicyRepresentation, ProtocolMapperRepresentation, RealmRepresentation, RoleRepresentation,
    ServerInfoRepresentation, UserRepresentation,
};
use tenant_realm::domain::ports::{AdminApi, AdminTokenSource};
use tenant_realm::{ModuleDeps, TenantRealmModule};
use tenant_realm_sdk::Tenant;
use uuid::Uuid;

pub const IMPERSONATE_PERMISSION_ID: &str = "perm-impersonate";
pub const EXISTING_POLICY_ID: &str = "pol-existing";

/// Issues `tok-1`, `tok-2`, ... and counts requests.
#[derive(Default)]
pub struct CountingTokenSource {
    issued: AtomicUsize,
}

impl CountingTokenSource {
    pub fn issued(&self) -> usize {
        self.issued.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AdminTokenSource for CountingTokenSource {
    async fn request_token(&self) -> Result<SecretString, AdminApiError> {
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(SecretString::from(format!("tok-{n}")))
    }
}

/// In-memory admin API that journals every call as `operation:subject`.
///
/// Failures are injected per journal entry; a call whose token is listed in
/// `rejected_tokens` (or any call while `reject_all` is set) answers 401.
pub struct FakeAdminApi {
    journal: Mutex<Vec<String>>,
    tokens_seen: Mutex<Vec<String>>,
    realms: Mutex<BTreeMap<String, RealmRepresentation>>,
    failing: Mutex<HashSet<String>>,
    rejected_tokens: Mutex<HashSet<String>>,
    reject_all: AtomicBool,
    management_clients: AtomicUsize,
    mapper_names: Mutex<Vec<String>>,
    updated_permission: Mutex<Option<PolicyRepresentation>>,
    role_mappings: Mutex<Vec<(String, String)>>,
    created_clients: Mutex<Vec<ClientRepresentation>>,
}

impl Default for FakeAdminApi {
    fn default() -> Self {
        Self {
            journal: Mutex::default(),
            tokens_seen: Mutex::default(),
            realms: Mutex::default(),
            failing: Mutex::default(),
            rejected_tokens: Mutex::default(),
            reject_all: AtomicBool::new(false),
            management_clients: AtomicUsize::new(1),
            mapper_names: Mutex::new(vec!["Client ID".to_owned(), "email".to_owned()]),
            updated_permission: Mutex::default(),
            role_mappings: Mutex::default(),
            created_clients: Mutex::default(),
        }
    }
}

impl FakeAdminApi {
    pub fn fail_on(&self, entry: impl Into<String>) {
        self.failing.lock().unwrap().insert(entry.into());
    }

    pub fn reject_token(&self, token: &str) {
        self.rejected_tokens.lock().unwrap().insert(token.to_owned());
    }

    pub fn reject_all(&self) {
        self.reject_all.store(true, Ordering::SeqCst);
    }

    pub fn set_management_clients(&self, count: usize) {
        self.management_clients.store(count, Ordering::SeqCst);
    }

    pub fn set_mapper_names(&self, names: &[&str]) {
        *self.mapper_names.lock().unwrap() = names.iter().map(|n| (*n).to_owned()).collect();
    }

    pub fn insert_realm(&self, name: &str) {
        self.realms.lock().unwrap().insert(
            name.to_owned(),
            RealmRepresentation {
                id: Some(Uuid::new_v4().to_string()),
                realm: name.to_owned(),
                enabled: Some(true),
                ..Default::default()
            },
        );
    }

    pub fn has_realm(&self, name: &str) -> bool {
        self.realms.lock().unwrap().contains_key(name)
    }

    pub fn journal(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.journal()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }

    pub fn tokens_seen(&self) -> Vec<String> {
        self.tokens_seen.lock().unwrap().clone()
    }

    pub fn updated_permission(&self) -> Option<PolicyRepresentation> {
        self.updated_permission.lock().unwrap().clone()
    }

    pub fn role_mappings(&self) -> Vec<(String, String)> {
        self.role_mappings.lock().unwrap().clone()
    }

    pub fn created_clients(&self) -> Vec<ClientRepresentation> {
        self.created_clients.lock().unwrap().clone()
    }

    /// Journal the call and decide its fate: `Err` for a rejected token,
    /// `Ok(true)` when a failure was injected for this entry.
    fn enter(&self, entry: String, token: &SecretString) -> Result<bool, AdminApiError> {
        let token = token.expose_secret().to_owned();
        let rejected = self.reject_all.load(Ordering::SeqCst)
            || self.rejected_tokens.lock().unwrap().contains(&token);
        self.tokens_seen.lock().unwrap().push(token);
        let fail = self.failing.lock().unwrap().contains(&entry);
        self.journal.lock().unwrap().push(entry);

        if rejected {
            return Err(AdminApiError::Unauthorized);
        }
        Ok(fail)
    }
}

fn server_error() -> AdminApiError {
    AdminApiError::Status {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: r#"{"error":"unknown_error"}"#.to_owned(),
    }
}

fn failed_create() -> AdminResponse {
    AdminResponse {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        location: None,
        body: Some(serde_json::json!({"error": "unknown_error"})),
    }
}

#[async_trait]
impl AdminApi for FakeAdminApi {
    async fn find_realm(
        &self,
        token: SecretString,
        realm: &str,
    ) -> Result<Option<RealmRepresentation>, AdminApiError> {
        if self.enter(format!("find_realm:{realm}"), &token)? {
            return Err(server_error());
        }
        Ok(self.realms.lock().unwrap().get(realm).cloned())
    }

    async fn create_realm(
        &self,
        token: SecretString,
        realm: &RealmRepresentation,
    ) -> Result<AdminResponse, AdminApiError> {
        if self.enter(format!("create_realm:{}", realm.realm), &token)? {
            return Ok(failed_create());
        }
        self.realms
            .lock()
            .unwrap()
            .insert(realm.realm.clone(), realm.clone());
        Ok(AdminResponse::created(format!(
            "http://kc/admin/realms/{}",
            realm.realm
        )))
    }

    async fn update_realm(
        &self,
        token: SecretString,
        realm: &RealmRepresentation,
    ) -> Result<(), AdminApiError> {
        if self.enter(format!("update_realm:{}", realm.realm), &token)? {
            return Err(AdminApiError::Status {
                status: StatusCode::BAD_REQUEST,
                body: String::new(),
            });
        }
        if let Some(stored) = self.realms.lock().unwrap().get_mut(&realm.realm) {
            stored.display_name.clone_from(&realm.display_name);
        }
        Ok(())
    }

    async fn delete_realm(&self, token: SecretString, realm: &str) -> Result<bool, AdminApiError> {
        if self.enter(format!("delete_realm:{realm}"), &token)? {
            return Err(server_error());
        }
        Ok(self.realms.lock().unwrap().remove(realm).is_some())
    }

    async fn create_role(
        &self,
        token: SecretString,
        realm: &str,
        role: &RoleRepresentation,
    ) -> Result<AdminResponse, AdminApiError> {
        if self.enter(format!("create_role:{}", role.name), &token)? {
            return Ok(failed_create());
        }
        Ok(AdminResponse::created(format!(
            "http://kc/admin/realms/{realm}/roles/{}",
            role.name
        )))
    }

    async fn find_role(
        &self,
        token: SecretString,
        _realm: &str,
        name: &str,
    ) -> Result<Option<RoleRepresentation>, AdminApiError> {
        if self.enter(format!("find_role:{name}"), &token)? {
            return Ok(None);
        }
        Ok(Some(RoleRepresentation {
            id: Some(format!("role-{name}")),
            name: name.to_owned(),
            description: None,
        }))
    }

    async fn create_client(
        &self,
        token: SecretString,
        realm: &str,
        client: &ClientRepresentation,
    ) -> Result<AdminResponse, AdminApiError> {
        if self.enter(format!("create_client:{}", client.client_id), &token)? {
            return Ok(failed_create());
        }
        self.created_clients.lock().unwrap().push(client.clone());
        Ok(AdminResponse::created(format!(
            "http://kc/admin/realms/{realm}/clients/uuid-{}",
            client.client_id
        )))
    }

    async fn find_clients(
        &self,
        token: SecretString,
        _realm: &str,
        client_id: &str,
    ) -> Result<Vec<ClientRepresentation>, AdminApiError> {
        if self.enter(format!("find_clients:{client_id}"), &token)? {
            return Err(server_error());
        }
        let count = self.management_clients.load(Ordering::SeqCst);
        Ok((0..count)
            .map(|i| ClientRepresentation {
                id: Some(format!("rm-{i}")),
                client_id: client_id.to_owned(),
                ..Default::default()
            })
            .collect())
    }

    async fn get_service_account_user(
        &self,
        token: SecretString,
        _realm: &str,
        client_uuid: &str,
    ) -> Result<UserRepresentation, AdminApiError> {
        if self.enter(format!("get_service_account_user:{client_uuid}"), &token)? {
            return Err(server_error());
        }
        Ok(UserRepresentation {
            id: format!("sa-{client_uuid}"),
            username: Some(format!("service-account-{client_uuid}")),
        })
    }

    async fn add_realm_role_mappings(
        &self,
        token: SecretString,
        _realm: &str,
        user_id: &str,
        roles: &[RoleRepresentation],
    ) -> Result<(), AdminApiError> {
        if self.enter(format!("add_realm_role_mappings:{user_id}"), &token)? {
            return Err(server_error());
        }
        let mut mappings = self.role_mappings.lock().unwrap();
        for role in roles {
            mappings.push((user_id.to_owned(), role.name.clone()));
        }
        Ok(())
    }

    async fn enable_users_management_permissions(
        &self,
        token: SecretString,
        realm: &str,
    ) -> Result<ManagementPermissionReference, AdminApiError> {
        if self.enter(format!("enable_users_management_permissions:{realm}"), &token)? {
            return Err(server_error());
        }
        Ok(ManagementPermissionReference {
            enabled: true,
            resource: Some("users-resource".to_owned()),
            scope_permissions: BTreeMap::from([
                ("view".to_owned(), "perm-view".to_owned()),
                (
                    "impersonate".to_owned(),
                    IMPERSONATE_PERMISSION_ID.to_owned(),
                ),
            ]),
        })
    }

    async fn create_client_policy(
        &self,
        token: SecretString,
        _realm: &str,
        _resource_server_id: &str,
        policy: &PolicyRepresentation,
    ) -> Result<AdminResponse, AdminApiError> {
        if self.enter(format!("create_client_policy:{}", policy.name), &token)? {
            return Ok(failed_create());
        }
        Ok(AdminResponse {
            status: StatusCode::CREATED,
            location: None,
            body: Some(serde_json::json!({"id": "pol-new", "name": policy.name})),
        })
    }

    async fn get_scope_permission(
        &self,
        token: SecretString,
        _realm: &str,
        _resource_server_id: &str,
        permission_id: &str,
    ) -> Result<PolicyRepresentation, AdminApiError> {
        if self.enter(format!("get_scope_permission:{permission_id}"), &token)? {
            return Err(server_error());
        }
        Ok(PolicyRepresentation {
            id: Some(permission_id.to_owned()),
            name: "impersonate.permission.users".to_owned(),
            kind: "scope".to_owned(),
            ..Default::default()
        })
    }

    async fn get_associated_policies(
        &self,
        token: SecretString,
        _realm: &str,
        _resource_server_id: &str,
        permission_id: &str,
    ) -> Result<Vec<PolicyRepresentation>, AdminApiError> {
        if self.enter(format!("get_associated_policies:{permission_id}"), &token)? {
            return Err(server_error());
        }
        Ok(vec![PolicyRepresentation {
            id: Some(EXISTING_POLICY_ID.to_owned()),
            name: "admin policy".to_owned(),
            kind: "role".to_owned(),
            ..Default::default()
        }])
    }

    async fn update_scope_permission(
        &self,
        token: SecretString,
        _realm: &str,
        _resource_server_id: &str,
        permission: &PolicyRepresentation,
    ) -> Result<(), AdminApiError> {
        let id = permission.id.clone().unwrap_or_default();
        if self.enter(format!("update_scope_permission:{id}"), &token)? {
            return Err(server_error());
        }
        *self.updated_permission.lock().unwrap() = Some(permission.clone());
        Ok(())
    }

    async fn get_server_info(
        &self,
        token: SecretString,
    ) -> Result<ServerInfoRepresentation, AdminApiError> {
        if self.enter("get_server_info".to_owned(), &token)? {
            return Err(server_error());
        }
        let mappers = self
            .mapper_names
            .lock()
            .unwrap()
            .iter()
            .map(|name| ProtocolMapperRepresentation {
                id: Some(format!("builtin-{name}")),
                name: name.clone(),
                protocol: OPENID_CONNECT.to_owned(),
                protocol_mapper: "oidc-usersessionmodel-note-mapper".to_owned(),
                consent_required: false,
                config: BTreeMap::new(),
            })
            .collect();
        Ok(ServerInfoRepresentation {
            builtin_protocol_mappers: BTreeMap::from([(OPENID_CONNECT.to_owned(), mappers)]),
        })
    }
}

pub struct Harness {
    pub api: Arc<FakeAdminApi>,
    pub tokens: Arc<CountingTokenSource>,
    pub module: TenantRealmModule,
}

pub fn harness() -> Harness {
    harness_with(ModuleDeps::default())
}

pub fn harness_with(deps: ModuleDeps) -> Harness {
    let api = Arc::new(FakeAdminApi::default());
    let tokens = Arc::new(CountingTokenSource::default());
    let module = TenantRealmModule::with_admin_api(
        &TenantRealmConfig::default(),
        api.clone(),
        tokens.clone(),
        deps,
    )
    .expect("module builds");
    Harness {
        api,
        tokens,
        module,
    }
}

pub fn acme() -> Tenant {
    Tenant::new(Uuid::new_v4(), "acme").with_description("Acme Corp")
}
