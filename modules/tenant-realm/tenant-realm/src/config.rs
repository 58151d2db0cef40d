//! Module configuration.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::error::RealmError;

/// Placeholder replaced by the realm name in templated client ids.
pub const REALM_PLACEHOLDER: &str = "{realm}";

/// Configuration for tenant realm provisioning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TenantRealmConfig {
    /// Identity-provider admin API access.
    pub keycloak: KeycloakConfig,
    /// Lifetimes written into every new realm.
    pub realm: RealmConfig,
    /// Client ids, role names and client token settings.
    pub clients: ClientsConfig,
    /// Legacy tenant registry.
    pub registry: RegistryConfig,
    /// Prefix of client secret keys in the secret store.
    pub secret_key_prefix: String,
}

impl TenantRealmConfig {
    /// Check values that serde cannot.
    ///
    /// # Errors
    ///
    /// Returns [`RealmError::Validation`] naming the offending field.
    pub fn validate(&self) -> Result<(), RealmError> {
        Url::parse(&self.keycloak.base_url)
            .map_err(|e| RealmError::validation("keycloak.base_url", e.to_string()))?;
        if self.registry.enabled {
            Url::parse(&self.registry.base_url)
                .map_err(|e| RealmError::validation("registry.base_url", e.to_string()))?;
        }
        if !self.clients.login_client_id.contains(REALM_PLACEHOLDER) {
            return Err(RealmError::validation(
                "clients.login_client_id",
                format!("must contain {REALM_PLACEHOLDER}"),
            ));
        }
        if self.secret_key_prefix.is_empty() {
            return Err(RealmError::validation(
                "secret_key_prefix",
                "must not be empty",
            ));
        }
        Ok(())
    }
}

/// How the admin token is obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    ClientCredentials,
    #[default]
    Password,
}

impl GrantType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ClientCredentials => "client_credentials",
            Self::Password => "password",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeycloakConfig {
    /// Server root, e.g. `http://keycloak:8080`.
    pub base_url: String,
    /// Realm the admin client authenticates against.
    pub admin_realm: String,
    pub client_id: String,
    pub grant_type: GrantType,
    /// Admin user for the password grant.
    pub username: String,
    /// Secret store key of the admin client secret.
    pub client_secret_key: String,
    /// Secret store key of the admin user password.
    pub password_key: String,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
}

impl Default for KeycloakConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_owned(),
            admin_realm: "master".to_owned(),
            client_id: "admin-cli".to_owned(),
            grant_type: GrantType::Password,
            username: "admin".to_owned(),
            client_secret_key: "keycloak-admin-client-secret".to_owned(),
            password_key: "keycloak-admin-password".to_owned(),
            connect_timeout_ms: 5_000,
            request_timeout_ms: 30_000,
        }
    }
}

/// Realm-wide session and token lifetimes, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RealmConfig {
    pub access_token_lifespan: u32,
    pub sso_session_idle_timeout: u32,
    pub sso_session_max_lifespan: u32,
    pub client_session_idle_timeout: u32,
    pub client_session_max_lifespan: u32,
    pub offline_session_idle_timeout: u32,
}

impl Default for RealmConfig {
    fn default() -> Self {
        Self {
            access_token_lifespan: 300,
            sso_session_idle_timeout: 1_800,
            sso_session_max_lifespan: 36_000,
            client_session_idle_timeout: 0,
            client_session_max_lifespan: 0,
            offline_session_idle_timeout: 2_592_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientsConfig {
    pub module_client_id: String,
    /// Must contain `{realm}`.
    pub login_client_id: String,
    pub impersonation_client_id: String,
    pub password_reset_client_id: String,
    pub system_role: String,
    pub password_reset_role: String,
    /// Access-token lifetime of the module, login and impersonation clients.
    pub access_token_lifespan: u32,
    pub use_refresh_tokens: bool,
    /// Access-token lifetime of the password-reset client (reset links).
    pub password_reset_token_lifespan: u32,
    pub password_reset_use_refresh_tokens: bool,
    /// Name of the built-in protocol mapper attached to the password-reset
    /// client.
    pub password_reset_mapper: String,
}

impl Default for ClientsConfig {
    fn default() -> Self {
        Self {
            module_client_id: "sidecar-module-access-client".to_owned(),
            login_client_id: "{realm}-login-application".to_owned(),
            impersonation_client_id: "impersonation-client".to_owned(),
            password_reset_client_id: "password-reset-client".to_owned(),
            system_role: "System".to_owned(),
            password_reset_role: "Password Reset".to_owned(),
            access_token_lifespan: 300,
            use_refresh_tokens: true,
            password_reset_token_lifespan: 86_400,
            password_reset_use_refresh_tokens: false,
            password_reset_mapper: "Client ID".to_owned(),
        }
    }
}

impl ClientsConfig {
    #[must_use]
    pub fn login_client_id_for(&self, realm: &str) -> String {
        self.login_client_id.replace(REALM_PLACEHOLDER, realm)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
    pub enabled: bool,
    pub base_url: String,
    pub request_timeout_ms: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "http://localhost:9130".to_owned(),
            request_timeout_ms: 10_000,
        }
    }
}

impl Default for TenantRealmConfig {
    fn default() -> Self {
        Self {
            keycloak: KeycloakConfig::default(),
            realm: RealmConfig::default(),
            clients: ClientsConfig::default(),
            registry: RegistryConfig::default(),
            secret_key_prefix: "tenant-realm".to_owned(),
        }
    }
}
