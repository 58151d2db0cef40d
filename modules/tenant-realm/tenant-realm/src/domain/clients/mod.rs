//! OAuth client provisioning.
//!
//! Every variant is a [`ClientSpec`] fed through one [`ClientProvisioner::create_client`].

mod impersonation;
pub mod specs;

use secrecy::ExposeSecret;

pub use impersonation::{IMPERSONATE_SCOPE, REALM_MANAGEMENT_CLIENT};
pub use specs::ClientSpec;

use super::error::{CallError, RealmError};
use super::model::{ClientRepresentation, OPENID_CONNECT, ProtocolMapperRepresentation};
use super::secrets::ClientSecrets;
use super::step::ResourceStepExecutor;
use crate::config::ClientsConfig;

const ALL_URIS: &str = "/*";

#[derive(Clone)]
pub struct ClientProvisioner {
    executor: ResourceStepExecutor,
    secrets: ClientSecrets,
    config: ClientsConfig,
}

impl ClientProvisioner {
    #[must_use]
    pub fn new(executor: ResourceStepExecutor, secrets: ClientSecrets, config: ClientsConfig) -> Self {
        Self {
            executor,
            secrets,
            config,
        }
    }

    /// # Errors
    ///
    /// See [`ClientProvisioner::create_client`].
    pub async fn create_module_client(&self, realm: &str) -> Result<ClientRepresentation, RealmError> {
        self.create_client(realm, specs::module_client(&self.config))
            .await
    }

    /// # Errors
    ///
    /// See [`ClientProvisioner::create_client`].
    pub async fn create_login_client(&self, realm: &str) -> Result<ClientRepresentation, RealmError> {
        self.create_client(realm, specs::login_client(&self.config, realm))
            .await
    }

    /// Create the impersonation client and grant it the `impersonate`
    /// permission of `realm-management`.
    ///
    /// # Errors
    ///
    /// Returns [`RealmError::NotFound`] / [`RealmError::TooMany`] when
    /// `realm-management` is missing or ambiguous, and
    /// [`RealmError::Integration`] for failed calls.
    pub async fn create_impersonation_client(
        &self,
        realm: &str,
    ) -> Result<ClientRepresentation, RealmError> {
        let client = self
            .create_client(realm, specs::impersonation_client(&self.config))
            .await?;
        impersonation::grant_impersonation(&self.executor, realm, &client).await?;
        Ok(client)
    }

    /// # Errors
    ///
    /// Returns [`RealmError::NotFound`] before creating anything when the
    /// configured built-in protocol mapper does not exist.
    pub async fn create_password_reset_client(
        &self,
        realm: &str,
    ) -> Result<ClientRepresentation, RealmError> {
        let mapper = self.builtin_mapper(&self.config.password_reset_mapper).await?;
        self.create_client(realm, specs::password_reset_client(&self.config, mapper))
            .await
    }

    /// Build the client from `spec`, create it and, if the spec names one,
    /// grant its service account a realm role.
    ///
    /// # Errors
    ///
    /// Returns [`RealmError::SecretStore`] when the secret cannot be obtained,
    /// [`RealmError::Integration`] when creation or role assignment fails,
    /// and [`RealmError::NotFound`] when the role to assign does not exist.
    #[tracing::instrument(skip(self, spec), fields(client_id = %spec.client_id))]
    pub async fn create_client(
        &self,
        realm: &str,
        spec: ClientSpec,
    ) -> Result<ClientRepresentation, RealmError> {
        let secret = self.secrets.get_or_create(realm, &spec.client_id).await?;
        let role = spec.service_account_role.clone();
        let mut client = build_client(spec, secret.expose_secret());

        let id = self
            .executor
            .create(&client, |api, token| api.create_client(token, realm, &client))
            .await?;
        client.id = Some(id);

        if let Some(role) = role {
            self.assign_service_account_role(realm, &client, &role).await?;
        }

        tracing::info!(realm, client_id = %client.client_id, "client created");
        Ok(client)
    }

    async fn assign_service_account_role(
        &self,
        realm: &str,
        client: &ClientRepresentation,
        role: &str,
    ) -> Result<(), RealmError> {
        let client_uuid = client.id.as_deref().unwrap_or_default();
        let context = format!(
            "Failed to assign role '{role}' to client '{}'",
            client.client_id
        );

        self.executor
            .gateway()
            .execute(&context, |api, token| async move {
                let user = api
                    .get_service_account_user(token.clone(), realm, client_uuid)
                    .await?;
                let found = api
                    .find_role(token.clone(), realm, role)
                    .await?
                    .ok_or_else(|| RealmError::not_found(format!("role '{role}'")))?;
                api.add_realm_role_mappings(token, realm, &user.id, &[found])
                    .await?;
                Ok::<_, CallError>(())
            })
            .await
    }

    async fn builtin_mapper(&self, name: &str) -> Result<ProtocolMapperRepresentation, RealmError> {
        let info = self
            .executor
            .gateway()
            .execute("Failed to read server info", |api, token| {
                api.get_server_info(token)
            })
            .await?;

        info.builtin_protocol_mappers
            .get(OPENID_CONNECT)
            .and_then(|mappers| mappers.iter().find(|m| m.name == name))
            .map(|m| ProtocolMapperRepresentation {
                id: None,
                ..m.clone()
            })
            .ok_or_else(|| RealmError::not_found(format!("protocol mapper '{name}'")))
    }
}

fn build_client(spec: ClientSpec, secret: &str) -> ClientRepresentation {
    ClientRepresentation {
        id: None,
        name: Some(spec.client_id.clone()),
        client_id: spec.client_id,
        description: Some(spec.description),
        secret: Some(secret.to_owned()),
        enabled: true,
        frontchannel_logout: true,
        public_client: false,
        direct_access_grants_enabled: true,
        service_accounts_enabled: spec.service_accounts_enabled,
        authorization_services_enabled: spec.authorization_services_enabled,
        protocol: Some(OPENID_CONNECT.to_owned()),
        redirect_uris: vec![ALL_URIS.to_owned()],
        web_origins: vec![ALL_URIS.to_owned()],
        attributes: spec.attributes,
        protocol_mappers: spec.protocol_mappers,
        authorization_settings: spec.authorization_settings,
    }
}
