use async_trait::async_trait;
use http::StatusCode;
use http::header::LOCATION;
use reqwest::{Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::join_segments;
use crate::domain::error::AdminApiError;
use crate::domain::model::{
    AdminResponse, ClientRepresentation, ManagementPermissionReference, PolicyRepresentation,
    RealmRepresentation, RoleRepresentation, ServerInfoRepresentation, UserRepresentation,
};
use crate::domain::ports::AdminApi;

/// [`AdminApi`] over the Keycloak admin REST API.
#[derive(Clone)]
pub struct KeycloakAdminClient {
    http: reqwest::Client,
    base_url: Url,
}

impl KeycloakAdminClient {
    /// `base_url` is the server root; `admin/...` paths are appended to it.
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    fn url(&self, segments: &[&str]) -> Result<Url, AdminApiError> {
        join_segments(&self.base_url, segments.iter().copied())
            .ok_or_else(|| AdminApiError::Decode(format!("cannot build URL from {}", self.base_url)))
    }

    fn realm_url(&self, realm: &str, rest: &[&str]) -> Result<Url, AdminApiError> {
        let mut segments = vec!["admin", "realms", realm];
        segments.extend_from_slice(rest);
        self.url(&segments)
    }

    fn authz_url(
        &self,
        realm: &str,
        resource_server_id: &str,
        rest: &[&str],
    ) -> Result<Url, AdminApiError> {
        let mut segments = vec!["clients", resource_server_id, "authz", "resource-server"];
        segments.extend_from_slice(rest);
        self.realm_url(realm, &segments)
    }

    fn request(&self, method: Method, url: Url, token: &SecretString) -> RequestBuilder {
        self.http
            .request(method, url)
            .bearer_auth(token.expose_secret())
    }

    /// Send and map 401 to [`AdminApiError::Unauthorized`].
    async fn send(builder: RequestBuilder) -> Result<Response, AdminApiError> {
        let response = builder.send().await?;
        tracing::debug!(url = %response.url(), status = %response.status(), "admin call");
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(AdminApiError::Unauthorized);
        }
        Ok(response)
    }

    async fn expect_success(response: Response) -> Result<Response, AdminApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AdminApiError::Status { status, body })
    }

    async fn json<T: DeserializeOwned>(response: Response) -> Result<T, AdminApiError> {
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| AdminApiError::Decode(e.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        token: &SecretString,
    ) -> Result<T, AdminApiError> {
        let response = Self::send(self.request(Method::GET, url, token)).await?;
        Self::json(Self::expect_success(response).await?).await
    }

    /// GET that answers `None` on 404.
    async fn find_json<T: DeserializeOwned>(
        &self,
        url: Url,
        token: &SecretString,
    ) -> Result<Option<T>, AdminApiError> {
        let response = Self::send(self.request(Method::GET, url, token)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::json(Self::expect_success(response).await?)
            .await
            .map(Some)
    }

    async fn send_body<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        token: &SecretString,
        body: &B,
    ) -> Result<Response, AdminApiError> {
        Self::send(self.request(method, url, token).json(body)).await
    }

    /// POST returning status, `Location` and body without judging the status.
    async fn create<B: Serialize + ?Sized>(
        &self,
        url: Url,
        token: &SecretString,
        body: &B,
    ) -> Result<AdminResponse, AdminApiError> {
        let response = self.send_body(Method::POST, url, token, body).await?;
        let status = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(ToOwned::to_owned);
        let bytes = response.bytes().await?;
        let body = serde_json::from_slice(&bytes).ok();
        Ok(AdminResponse {
            status,
            location,
            body,
        })
    }
}

#[async_trait]
impl AdminApi for KeycloakAdminClient {
    async fn find_realm(
        &self,
        token: SecretString,
        realm: &str,
    ) -> Result<Option<RealmRepresentation>, AdminApiError> {
        self.find_json(self.realm_url(realm, &[])?, &token).await
    }

    async fn create_realm(
        &self,
        token: SecretString,
        realm: &RealmRepresentation,
    ) -> Result<AdminResponse, AdminApiError> {
        self.create(self.url(&["admin", "realms"])?, &token, realm)
            .await
    }

    async fn update_realm(
        &self,
        token: SecretString,
        realm: &RealmRepresentation,
    ) -> Result<(), AdminApiError> {
        let url = self.realm_url(&realm.realm, &[])?;
        let response = self.send_body(Method::PUT, url, &token, realm).await?;
        Self::expect_success(response).await?;
        Ok(())
    }

    async fn delete_realm(&self, token: SecretString, realm: &str) -> Result<bool, AdminApiError> {
        let url = self.realm_url(realm, &[])?;
        let response = Self::send(self.request(Method::DELETE, url, &token)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        Self::expect_success(response).await?;
        Ok(true)
    }

    async fn create_role(
        &self,
        token: SecretString,
        realm: &str,
        role: &RoleRepresentation,
    ) -> Result<AdminResponse, AdminApiError> {
        self.create(self.realm_url(realm, &["roles"])?, &token, role)
            .await
    }

    async fn find_role(
        &self,
        token: SecretString,
        realm: &str,
        name: &str,
    ) -> Result<Option<RoleRepresentation>, AdminApiError> {
        self.find_json(self.realm_url(realm, &["roles", name])?, &token)
            .await
    }

    async fn create_client(
        &self,
        token: SecretString,
        realm: &str,
        client: &ClientRepresentation,
    ) -> Result<AdminResponse, AdminApiError> {
        self.create(self.realm_url(realm, &["clients"])?, &token, client)
            .await
    }

    async fn find_clients(
        &self,
        token: SecretString,
        realm: &str,
        client_id: &str,
    ) -> Result<Vec<ClientRepresentation>, AdminApiError> {
        let mut url = self.realm_url(realm, &["clients"])?;
        url.query_pairs_mut().append_pair("clientId", client_id);
        let clients: Vec<ClientRepresentation> = self.get_json(url, &token).await?;
        Ok(clients
            .into_iter()
            .filter(|c| c.client_id == client_id)
            .collect())
    }

    async fn get_service_account_user(
        &self,
        token: SecretString,
        realm: &str,
        client_uuid: &str,
    ) -> Result<UserRepresentation, AdminApiError> {
        let url = self.realm_url(realm, &["clients", client_uuid, "service-account-user"])?;
        self.get_json(url, &token).await
    }

    async fn add_realm_role_mappings(
        &self,
        token: SecretString,
        realm: &str,
        user_id: &str,
        roles: &[RoleRepresentation],
    ) -> Result<(), AdminApiError> {
        let url = self.realm_url(realm, &["users", user_id, "role-mappings", "realm"])?;
        let response = self.send_body(Method::POST, url, &token, roles).await?;
        Self::expect_success(response).await?;
        Ok(())
    }

    async fn enable_users_management_permissions(
        &self,
        token: SecretString,
        realm: &str,
    ) -> Result<ManagementPermissionReference, AdminApiError> {
        let url = self.realm_url(realm, &["users-management-permissions"])?;
        let body = serde_json::json!({"enabled": true});
        let response = self.send_body(Method::PUT, url, &token, &body).await?;
        Self::json(Self::expect_success(response).await?).await
    }

    async fn create_client_policy(
        &self,
        token: SecretString,
        realm: &str,
        resource_server_id: &str,
        policy: &PolicyRepresentation,
    ) -> Result<AdminResponse, AdminApiError> {
        let url = self.authz_url(realm, resource_server_id, &["policy", "client"])?;
        self.create(url, &token, policy).await
    }

    async fn get_scope_permission(
        &self,
        token: SecretString,
        realm: &str,
        resource_server_id: &str,
        permission_id: &str,
    ) -> Result<PolicyRepresentation, AdminApiError> {
        let url = self.authz_url(
            realm,
            resource_server_id,
            &["permission", "scope", permission_id],
        )?;
        self.get_json(url, &token).await
    }

    async fn get_associated_policies(
        &self,
        token: SecretString,
        realm: &str,
        resource_server_id: &str,
        permission_id: &str,
    ) -> Result<Vec<PolicyRepresentation>, AdminApiError> {
        let url = self.authz_url(
            realm,
            resource_server_id,
            &["policy", permission_id, "associatedPolicies"],
        )?;
        self.get_json(url, &token).await
    }

    async fn update_scope_permission(
        &self,
        token: SecretString,
        realm: &str,
        resource_server_id: &str,
        permission: &PolicyRepresentation,
    ) -> Result<(), AdminApiError> {
        let permission_id = permission.id.as_deref().ok_or_else(|| {
            AdminApiError::Decode(format!("permission '{}' has no id", permission.name))
        })?;
        let url = self.authz_url(
            realm,
            resource_server_id,
            &["permission", "scope", permission_id],
        )?;
        let response = self.send_body(Method::PUT, url, &token, permission).await?;
        Self::expect_success(response).await?;
        Ok(())
    }

    async fn get_server_info(
        &self,
        token: SecretString,
    ) -> Result<ServerInfoRepresentation, AdminApiError> {
        self.get_json(self.url(&["admin", "serverinfo"])?, &token)
            .await
    }
}
