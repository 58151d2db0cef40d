use std::sync::Arc;

use async_trait::async_trait;
use http::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use url::Url;

use super::join_segments;
use crate::config::{GrantType, KeycloakConfig};
use crate::domain::error::{AdminApiError, RealmError};
use crate::domain::ports::{AdminTokenSource, SecretStore};

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
}

/// Obtains admin tokens from the admin realm's token endpoint.
///
/// Credentials come from the secret store on every request; a failed or empty
/// lookup is logged and the grant is sent without that credential.
pub struct KeycloakTokenSource {
    http: reqwest::Client,
    token_endpoint: Url,
    client_id: String,
    grant_type: GrantType,
    username: String,
    client_secret_key: String,
    password_key: String,
    secrets: Arc<dyn SecretStore>,
}

impl KeycloakTokenSource {
    /// # Errors
    ///
    /// Returns [`RealmError::Validation`] when the token endpoint URL cannot be
    /// derived from `base_url`.
    pub fn new(
        http: reqwest::Client,
        base_url: &Url,
        config: &KeycloakConfig,
        secrets: Arc<dyn SecretStore>,
    ) -> Result<Self, RealmError> {
        let token_endpoint = join_segments(
            base_url,
            [
                "realms",
                config.admin_realm.as_str(),
                "protocol",
                "openid-connect",
                "token",
            ],
        )
        .ok_or_else(|| RealmError::validation("keycloak.base_url", "not a base URL"))?;

        Ok(Self {
            http,
            token_endpoint,
            client_id: config.client_id.clone(),
            grant_type: config.grant_type,
            username: config.username.clone(),
            client_secret_key: config.client_secret_key.clone(),
            password_key: config.password_key.clone(),
            secrets,
        })
    }

    async fn lookup(&self, key: &str) -> Option<SecretString> {
        match self.secrets.get(key).await {
            Ok(secret) => secret,
            Err(e) => {
                tracing::warn!(key, error = %e, "secret lookup failed, continuing without it");
                None
            }
        }
    }
}

#[async_trait]
impl AdminTokenSource for KeycloakTokenSource {
    async fn request_token(&self) -> Result<SecretString, AdminApiError> {
        let client_secret = self.lookup(&self.client_secret_key).await;
        let password = match self.grant_type {
            GrantType::Password => self.lookup(&self.password_key).await,
            GrantType::ClientCredentials => None,
        };

        let mut fields: Vec<(&str, &str)> = vec![
            ("grant_type", self.grant_type.as_str()),
            ("client_id", &self.client_id),
        ];
        if let Some(secret) = &client_secret {
            fields.push(("client_secret", secret.expose_secret()));
        }
        if let Some(password) = &password {
            fields.push(("username", &self.username));
            fields.push(("password", password.expose_secret()));
        }

        let response = self
            .http
            .post(self.token_endpoint.clone())
            .form(&fields)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(AdminApiError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AdminApiError::Status { status, body });
        }

        let bytes = response.bytes().await?;
        let token: TokenResponse =
            serde_json::from_slice(&bytes).map_err(|e| AdminApiError::Decode(e.to_string()))?;

        if let Some(kind) = &token.token_type
            && !kind.eq_ignore_ascii_case("bearer")
        {
            return Err(AdminApiError::Decode(format!(
                "unsupported token type: {kind}"
            )));
        }

        tracing::debug!(client_id = %self.client_id, grant = self.grant_type.as_str(), "admin token issued");
        Ok(SecretString::from(token.access_token))
    }
}
