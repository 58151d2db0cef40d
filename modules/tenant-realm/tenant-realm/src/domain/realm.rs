//! Realm lifecycle: create-and-provision with rollback, update, delete.

use std::collections::BTreeMap;

use tenant_realm_sdk::Tenant;
use uuid::Uuid;

use super::clients::ClientProvisioner;
use super::error::RealmError;
use super::model::{ComponentRepresentation, RealmRepresentation, RequiredActionProviderRepresentation};
use super::roles::RoleProvisioner;
use super::step::ResourceStepExecutor;
use crate::config::RealmConfig;

const REQUIRED_ACTIONS_JSON: &str = include_str!("../../resources/required-actions.json");
const USER_PROFILE_JSON: &str = include_str!("../../resources/user-profile.json");

pub const USER_PROFILE_PROVIDER: &str = "org.keycloak.userprofile.UserProfileProvider";
pub const DECLARATIVE_USER_PROFILE: &str = "declarative-user-profile";
pub const USER_PROFILE_CONFIG_KEY: &str = "kc.user.profile.config";

const MAX_REALM_NAME_LEN: usize = 63;

/// Static parts of every new realm, parsed once.
#[derive(Debug, Clone, PartialEq)]
pub struct RealmTemplate {
    required_actions: Vec<RequiredActionProviderRepresentation>,
    user_profile: String,
}

impl RealmTemplate {
    /// Load the required actions and user profile bundled with the crate.
    ///
    /// # Errors
    ///
    /// Returns [`RealmError::Validation`] when a bundled document is not valid
    /// JSON of the expected shape.
    pub fn bundled() -> Result<Self, RealmError> {
        Self::from_json(REQUIRED_ACTIONS_JSON, USER_PROFILE_JSON)
    }

    /// # Errors
    ///
    /// Returns [`RealmError::Validation`] when either document does not parse.
    pub fn from_json(required_actions: &str, user_profile: &str) -> Result<Self, RealmError> {
        let required_actions = serde_json::from_str(required_actions)
            .map_err(|e| RealmError::validation("required_actions", e.to_string()))?;
        let user_profile: serde_json::Value = serde_json::from_str(user_profile)
            .map_err(|e| RealmError::validation("user_profile", e.to_string()))?;
        Ok(Self {
            required_actions,
            user_profile: user_profile.to_string(),
        })
    }

    fn components(&self) -> BTreeMap<String, Vec<ComponentRepresentation>> {
        let profile = ComponentRepresentation {
            name: None,
            provider_id: DECLARATIVE_USER_PROFILE.to_owned(),
            config: BTreeMap::from([(
                USER_PROFILE_CONFIG_KEY.to_owned(),
                vec![self.user_profile.clone()],
            )]),
        };
        BTreeMap::from([(USER_PROFILE_PROVIDER.to_owned(), vec![profile])])
    }
}

/// Turns a tenant into a fully provisioned realm.
///
/// Creation order is fixed: realm, roles, then the module, login,
/// impersonation and password-reset clients. Any failure after the realm
/// exists deletes the realm and returns the original error.
#[derive(Clone)]
pub struct RealmOrchestrator {
    executor: ResourceStepExecutor,
    roles: RoleProvisioner,
    clients: ClientProvisioner,
    lifetimes: RealmConfig,
    template: RealmTemplate,
}

impl RealmOrchestrator {
    #[must_use]
    pub fn new(
        executor: ResourceStepExecutor,
        roles: RoleProvisioner,
        clients: ClientProvisioner,
        lifetimes: RealmConfig,
        template: RealmTemplate,
    ) -> Self {
        Self {
            executor,
            roles,
            clients,
            lifetimes,
            template,
        }
    }

    /// Return the tenant's realm, creating and provisioning it if absent.
    ///
    /// An existing realm is returned unchanged without touching roles or
    /// clients.
    ///
    /// # Errors
    ///
    /// Returns [`RealmError::Validation`] before any call when the tenant has
    /// no id or its name is not a valid realm name; otherwise the first
    /// failing step's error.
    #[tracing::instrument(skip(self, tenant), fields(realm = %tenant.name))]
    pub async fn create_realm(&self, tenant: &Tenant) -> Result<RealmRepresentation, RealmError> {
        let id = validate_tenant(tenant)?;
        let name = tenant.name.as_str();

        if let Some(existing) = self.find_realm(name).await? {
            tracing::info!(realm = name, "realm already exists");
            return Ok(existing);
        }

        let mut realm = self.descriptor(id, tenant);
        realm.required_actions = Some(self.template.required_actions.clone());
        realm.components = Some(self.template.components());

        self.executor
            .create(&realm, |api, token| api.create_realm(token, &realm))
            .await?;
        tracing::info!(realm = name, "realm created");

        if let Err(e) = self.provision(name).await {
            self.rollback(name, &e).await;
            return Err(e);
        }

        tracing::info!(realm = name, "realm provisioned");
        Ok(realm)
    }

    /// Push tenant metadata onto its realm. Roles and clients are untouched.
    ///
    /// # Errors
    ///
    /// Returns [`RealmError::Validation`] for an invalid tenant and
    /// [`RealmError::Integration`] naming the tenant when the update fails.
    #[tracing::instrument(skip(self, tenant), fields(realm = %tenant.name))]
    pub async fn update_realm(&self, tenant: &Tenant) -> Result<(), RealmError> {
        let id = validate_tenant(tenant)?;
        let realm = self.descriptor(id, tenant);

        self.executor
            .gateway()
            .execute(
                &format!("Failed to update realm for tenant: {}", tenant.name),
                |api, token| api.update_realm(token, &realm),
            )
            .await?;
        tracing::info!(realm = %tenant.name, "realm updated");
        Ok(())
    }

    /// Delete the realm named `name`; an absent realm is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`RealmError::Integration`] when lookup or deletion fails.
    #[tracing::instrument(skip(self))]
    pub async fn delete_realm(&self, name: &str) -> Result<(), RealmError> {
        if self.find_realm(name).await?.is_none() {
            tracing::info!(realm = name, "realm absent, nothing to delete");
            return Ok(());
        }

        self.executor
            .gateway()
            .execute(&format!("Failed to delete realm: {name}"), |api, token| {
                api.delete_realm(token, name)
            })
            .await?;
        tracing::info!(realm = name, "realm deleted");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`RealmError::Integration`] when the lookup fails.
    pub async fn find_realm(&self, name: &str) -> Result<Option<RealmRepresentation>, RealmError> {
        self.executor
            .gateway()
            .execute(&format!("Failed to look up realm: {name}"), |api, token| {
                api.find_realm(token, name)
            })
            .await
    }

    async fn provision(&self, realm: &str) -> Result<(), RealmError> {
        self.roles.create_roles(realm).await?;
        self.clients.create_module_client(realm).await?;
        self.clients.create_login_client(realm).await?;
        self.clients.create_impersonation_client(realm).await?;
        self.clients.create_password_reset_client(realm).await?;
        Ok(())
    }

    async fn rollback(&self, realm: &str, cause: &RealmError) {
        tracing::warn!(realm, error = %cause, "provisioning failed, deleting realm");
        let deleted = self
            .executor
            .gateway()
            .execute(&format!("Failed to delete realm: {realm}"), |api, token| {
                api.delete_realm(token, realm)
            })
            .await;
        if let Err(e) = deleted {
            tracing::warn!(realm, error = %e, "realm rollback failed");
        }
    }

    fn descriptor(&self, id: Uuid, tenant: &Tenant) -> RealmRepresentation {
        let lifetimes = &self.lifetimes;
        RealmRepresentation {
            id: Some(id.to_string()),
            realm: tenant.name.clone(),
            display_name: tenant.description.clone(),
            enabled: Some(true),
            access_token_lifespan: Some(lifetimes.access_token_lifespan),
            sso_session_idle_timeout: Some(lifetimes.sso_session_idle_timeout),
            sso_session_max_lifespan: Some(lifetimes.sso_session_max_lifespan),
            client_session_idle_timeout: Some(lifetimes.client_session_idle_timeout),
            client_session_max_lifespan: Some(lifetimes.client_session_max_lifespan),
            offline_session_idle_timeout: Some(lifetimes.offline_session_idle_timeout),
            ..Default::default()
        }
    }
}

fn validate_tenant(tenant: &Tenant) -> Result<Uuid, RealmError> {
    let id = tenant
        .id
        .ok_or_else(|| RealmError::validation("id", "tenant identifier is required"))?;
    if !is_valid_realm_name(&tenant.name) {
        return Err(RealmError::validation(
            "name",
            format!("'{}' is not a valid realm name", tenant.name),
        ));
    }
    Ok(id)
}

/// `^[a-z][a-z0-9_-]{0,62}$`
#[must_use]
pub fn is_valid_realm_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    name.len() <= MAX_REALM_NAME_LEN
        && first.is_ascii_lowercase()
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn realm_names() {
        assert!(is_valid_realm_name("acme"));
        assert!(is_valid_realm_name("a"));
        assert!(is_valid_realm_name("diku_2-test"));
        assert!(is_valid_realm_name(&"a".repeat(63)));

        assert!(!is_valid_realm_name(""));
        assert!(!is_valid_realm_name("Acme"));
        assert!(!is_valid_realm_name("1acme"));
        assert!(!is_valid_realm_name("ac me"));
        assert!(!is_valid_realm_name("acme.org"));
        assert!(!is_valid_realm_name(&"a".repeat(64)));
    }

    #[test]
    fn missing_id_is_rejected() {
        let tenant = Tenant {
            id: None,
            name: "acme".to_owned(),
            description: None,
        };
        let err = validate_tenant(&tenant).unwrap_err();
        assert!(matches!(err, RealmError::Validation { ref field, .. } if field == "id"));
    }

    #[test]
    fn bundled_template_parses() {
        let template = RealmTemplate::bundled().unwrap();
        assert!(
            template
                .required_actions
                .iter()
                .any(|a| a.alias == "UPDATE_PASSWORD")
        );

        let components = template.components();
        let profile = &components[USER_PROFILE_PROVIDER][0];
        assert_eq!(profile.provider_id, DECLARATIVE_USER_PROFILE);
        let config: serde_json::Value =
            serde_json::from_str(&profile.config[USER_PROFILE_CONFIG_KEY][0]).unwrap();
        assert!(config["attributes"].is_array());
    }

    #[test]
    fn malformed_template_is_rejected() {
        let err = RealmTemplate::from_json("{", "{}").unwrap_err();
        assert!(matches!(err, RealmError::Validation { ref field, .. } if field == "required_actions"));
    }
}
