use std::future::Future;

use secrecy::SecretString;

use super::error::{AdminApiError, RealmError};
use super::gateway::AdminGateway;
use super::model::{
    AdminResponse, ClientRepresentation, PolicyRepresentation, RealmRepresentation,
    RoleRepresentation,
};
use super::ports::AdminApi;

/// A descriptor that a provisioning step creates in the identity provider.
pub trait CreatedResource {
    /// Resource type used in error messages.
    const KIND: &'static str;

    /// Human-readable name of this instance.
    fn label(&self) -> &str;
}

impl CreatedResource for RealmRepresentation {
    const KIND: &'static str = "realm";

    fn label(&self) -> &str {
        &self.realm
    }
}

impl CreatedResource for RoleRepresentation {
    const KIND: &'static str = "role";

    fn label(&self) -> &str {
        &self.name
    }
}

impl CreatedResource for ClientRepresentation {
    const KIND: &'static str = "client";

    fn label(&self) -> &str {
        &self.client_id
    }
}

impl CreatedResource for PolicyRepresentation {
    const KIND: &'static str = "policy";

    fn label(&self) -> &str {
        &self.name
    }
}

/// Build request, call the gateway, pull the created id out of the answer.
#[derive(Clone)]
pub struct ResourceStepExecutor {
    gateway: AdminGateway,
}

impl ResourceStepExecutor {
    #[must_use]
    pub fn new(gateway: AdminGateway) -> Self {
        Self { gateway }
    }

    #[must_use]
    pub fn gateway(&self) -> &AdminGateway {
        &self.gateway
    }

    /// Run a create call for `resource` and return the id the provider
    /// assigned.
    ///
    /// The id is the last path segment of `Location`, or the body's `id` field
    /// when no `Location` was sent.
    ///
    /// # Errors
    ///
    /// Returns [`RealmError::Integration`] naming the resource on a transport
    /// failure, on a non-2xx status (with status code and reason) or when a
    /// 2xx answer carries no id.
    pub async fn create<'a, R, F, Fut>(&'a self, resource: &R, call: F) -> Result<String, RealmError>
    where
        R: CreatedResource,
        F: FnMut(&'a dyn AdminApi, SecretString) -> Fut,
        Fut: Future<Output = Result<AdminResponse, AdminApiError>>,
    {
        let context = format!("Failed to create {} '{}'", R::KIND, resource.label());
        let response = self.gateway.execute(&context, call).await?;

        if !response.status.is_success() {
            let reason = response.status.canonical_reason().unwrap_or("Unknown");
            let body = response
                .body
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default();
            return Err(RealmError::wrap(
                format!("{context}: {} {reason}", response.status.as_u16()),
                AdminApiError::Status {
                    status: response.status,
                    body,
                },
            ));
        }

        let id = created_id(&response)
            .ok_or_else(|| RealmError::integration(format!("{context}: response carries no id")))?;
        tracing::debug!(kind = R::KIND, name = resource.label(), id = %id, "resource created");
        Ok(id)
    }
}

fn created_id(response: &AdminResponse) -> Option<String> {
    let from_location = response.location.as_deref().and_then(|location| {
        location
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty())
            .map(ToOwned::to_owned)
    });

    from_location.or_else(|| {
        response
            .body
            .as_ref()
            .and_then(|body| body.get("id"))
            .and_then(serde_json::Value::as_str)
            .map(ToOwned::to_owned)
    })
}
