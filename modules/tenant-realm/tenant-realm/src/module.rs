//! Tenant realm module wiring.

use std::sync::Arc;

use tracing::info;

use crate::config::TenantRealmConfig;
use crate::domain::attributes::TenantAttributeService;
use crate::domain::clients::ClientProvisioner;
use crate::domain::error::RealmError;
use crate::domain::gateway::AdminGateway;
use crate::domain::listeners::{
    RealmListener, RegistryListener, TenantListeners, TopicCleanupListener,
};
use crate::domain::ports::{
    AdminApi, AdminTokenSource, AttributeRepository, SecretStore, TenantRegistry, TopicCleaner,
};
use crate::domain::realm::{RealmOrchestrator, RealmTemplate};
use crate::domain::roles::RoleProvisioner;
use crate::domain::secrets::ClientSecrets;
use crate::domain::step::ResourceStepExecutor;
use crate::domain::token_cache::AdminTokenCache;
use crate::infra::attributes::InMemoryAttributeRepository;
use crate::infra::keycloak::{
    KeycloakAdminClient, KeycloakTokenSource, build_http_client, parse_base_url,
};
use crate::infra::registry::TenantRegistryClient;
use crate::infra::secrets::InMemorySecretStore;

/// Collaborators supplied by the host.
///
/// `registry` overrides the HTTP registry client built from configuration;
/// `topic_cleaner` is optional and, when absent, no cleanup listener runs.
pub struct ModuleDeps {
    pub secrets: Arc<dyn SecretStore>,
    pub attributes: Arc<dyn AttributeRepository>,
    pub registry: Option<Arc<dyn TenantRegistry>>,
    pub topic_cleaner: Option<Arc<dyn TopicCleaner>>,
}

impl Default for ModuleDeps {
    fn default() -> Self {
        Self {
            secrets: Arc::new(InMemorySecretStore::default()),
            attributes: Arc::new(InMemoryAttributeRepository::default()),
            registry: None,
            topic_cleaner: None,
        }
    }
}

/// Every tenant-realm service, built from one configuration.
pub struct TenantRealmModule {
    orchestrator: RealmOrchestrator,
    attributes: TenantAttributeService,
    listeners: TenantListeners,
    tokens: Arc<AdminTokenCache>,
}

impl TenantRealmModule {
    /// Build the module against a live Keycloak.
    ///
    /// # Errors
    ///
    /// Returns [`RealmError::Validation`] for invalid configuration and
    /// [`RealmError::Integration`] when HTTP clients cannot be built.
    pub fn new(config: &TenantRealmConfig, mut deps: ModuleDeps) -> Result<Self, RealmError> {
        config.validate()?;
        let base_url = parse_base_url("keycloak.base_url", &config.keycloak.base_url)?;
        let http = build_http_client(&config.keycloak)?;

        let api = Arc::new(KeycloakAdminClient::new(http.clone(), base_url.clone()));
        let token_source = Arc::new(KeycloakTokenSource::new(
            http,
            &base_url,
            &config.keycloak,
            deps.secrets.clone(),
        )?);

        if deps.registry.is_none() && config.registry.enabled {
            deps.registry = Some(Arc::new(TenantRegistryClient::from_config(&config.registry)?));
        }

        Self::with_admin_api(config, api, token_source, deps)
    }

    /// Build the module over an arbitrary admin API and token source.
    ///
    /// # Errors
    ///
    /// Returns [`RealmError::Validation`] when the bundled realm template does
    /// not parse.
    pub fn with_admin_api(
        config: &TenantRealmConfig,
        api: Arc<dyn AdminApi>,
        token_source: Arc<dyn AdminTokenSource>,
        deps: ModuleDeps,
    ) -> Result<Self, RealmError> {
        let tokens = Arc::new(AdminTokenCache::new(token_source));
        let executor = ResourceStepExecutor::new(AdminGateway::new(api, tokens.clone()));

        let roles = RoleProvisioner::new(
            executor.clone(),
            config.clients.system_role.clone(),
            config.clients.password_reset_role.clone(),
        );
        let clients = ClientProvisioner::new(
            executor.clone(),
            ClientSecrets::new(deps.secrets, config.secret_key_prefix.clone()),
            config.clients.clone(),
        );
        let orchestrator = RealmOrchestrator::new(
            executor,
            roles,
            clients,
            config.realm.clone(),
            RealmTemplate::bundled()?,
        );

        let mut listeners = TenantListeners::new();
        listeners.register(Arc::new(RealmListener::new(orchestrator.clone())));
        if let Some(registry) = deps.registry {
            listeners.register(Arc::new(RegistryListener::new(registry)));
        }
        if let Some(cleaner) = deps.topic_cleaner {
            listeners.register(Arc::new(TopicCleanupListener::new(cleaner)));
        }
        info!(
            listeners = %listeners.names().join(","),
            "tenant realm module initialized"
        );

        Ok(Self {
            orchestrator,
            attributes: TenantAttributeService::new(deps.attributes),
            listeners,
            tokens,
        })
    }

    #[must_use]
    pub fn orchestrator(&self) -> &RealmOrchestrator {
        &self.orchestrator
    }

    #[must_use]
    pub fn attributes(&self) -> &TenantAttributeService {
        &self.attributes
    }

    #[must_use]
    pub fn listeners(&self) -> &TenantListeners {
        &self.listeners
    }

    #[must_use]
    pub fn tokens(&self) -> &AdminTokenCache {
        &self.tokens
    }
}
