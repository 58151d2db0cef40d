use std::time::Duration;

use async_trait::async_trait;
use http::StatusCode;
use reqwest::{Method, RequestBuilder, Response};
use secrecy::ExposeSecret;
use tenant_realm_sdk::OperationContext;
use url::Url;

use super::keycloak::join_segments;
use crate::config::RegistryConfig;
use crate::domain::error::RealmError;
use crate::domain::ports::{RegistryTenant, TenantRegistry};

/// Header carrying the caller's token to the registry.
pub const OKAPI_TOKEN_HEADER: &str = "x-okapi-token";
pub const OKAPI_REQUEST_ID_HEADER: &str = "x-okapi-request-id";

/// [`TenantRegistry`] over the legacy `/_/proxy/tenants` API.
#[derive(Clone)]
pub struct TenantRegistryClient {
    http: reqwest::Client,
    base_url: Url,
}

impl TenantRegistryClient {
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// # Errors
    ///
    /// Returns [`RealmError::Validation`] for a bad base URL and
    /// [`RealmError::Registry`] when the HTTP client cannot be built.
    pub fn from_config(config: &RegistryConfig) -> Result<Self, RealmError> {
        let base_url = super::keycloak::parse_base_url("registry.base_url", &config.base_url)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| RealmError::registry(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::new(http, base_url))
    }

    fn url(&self, tenant_id: Option<&str>) -> Result<Url, RealmError> {
        let mut segments = vec!["_", "proxy", "tenants"];
        segments.extend(tenant_id);
        join_segments(&self.base_url, segments)
            .ok_or_else(|| RealmError::registry(format!("cannot build URL from {}", self.base_url)))
    }

    fn request(&self, ctx: &OperationContext, method: Method, url: Url) -> RequestBuilder {
        let mut builder = self
            .http
            .request(method, url)
            .header(OKAPI_REQUEST_ID_HEADER, ctx.request_id().to_string());
        if let Some(token) = ctx.caller_token() {
            builder = builder.header(OKAPI_TOKEN_HEADER, token.expose_secret());
        }
        builder
    }

    async fn send(action: &str, builder: RequestBuilder) -> Result<Response, RealmError> {
        builder
            .send()
            .await
            .map_err(|e| RealmError::registry(format!("Failed to {action}: {e}")))
    }
}

fn unexpected(action: &str, status: StatusCode) -> RealmError {
    RealmError::registry(format!("Failed to {action}: {status}"))
}

#[async_trait]
impl TenantRegistry for TenantRegistryClient {
    async fn exists(&self, ctx: &OperationContext, tenant_name: &str) -> Result<bool, RealmError> {
        let action = format!("look up tenant '{tenant_name}'");
        let url = self.url(Some(tenant_name))?;
        let response = Self::send(&action, self.request(ctx, Method::GET, url)).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(unexpected(&action, status)),
        }
    }

    async fn create(&self, ctx: &OperationContext, tenant: &RegistryTenant) -> Result<(), RealmError> {
        let action = format!("create tenant '{}'", tenant.id);
        let url = self.url(None)?;
        let response =
            Self::send(&action, self.request(ctx, Method::POST, url).json(tenant)).await?;
        if !response.status().is_success() {
            return Err(unexpected(&action, response.status()));
        }
        tracing::info!(tenant = %tenant.id, "tenant registered");
        Ok(())
    }

    async fn update(&self, ctx: &OperationContext, tenant: &RegistryTenant) -> Result<(), RealmError> {
        let action = format!("update tenant '{}'", tenant.id);
        let url = self.url(Some(&tenant.id))?;
        let response =
            Self::send(&action, self.request(ctx, Method::PUT, url).json(tenant)).await?;
        if !response.status().is_success() {
            return Err(unexpected(&action, response.status()));
        }
        tracing::info!(tenant = %tenant.id, "tenant registration updated");
        Ok(())
    }

    async fn delete(&self, ctx: &OperationContext, tenant_name: &str) -> Result<(), RealmError> {
        let action = format!("delete tenant '{tenant_name}'");
        let url = self.url(Some(tenant_name))?;
        let response = Self::send(&action, self.request(ctx, Method::DELETE, url)).await?;
        match response.status() {
            StatusCode::NOT_FOUND => {
                tracing::info!(tenant = tenant_name, "tenant not registered, nothing to delete");
                Ok(())
            }
            status if status.is_success() => {
                tracing::info!(tenant = tenant_name, "tenant unregistered");
                Ok(())
            }
            status => Err(unexpected(&action, status)),
        }
    }
}
