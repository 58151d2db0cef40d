//! Public models for the tenant realm module.

use std::fmt;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tenant record as seen by lifecycle listeners.
///
/// `id` is optional because callers may hand over a record before the
/// surrounding store has assigned one; operations that need it reject the
/// tenant with a validation error before any external call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Option<Uuid>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Tenant {
    #[must_use]
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            name: name.into(),
            description: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A free-form key/value attribute owned by a tenant.
///
/// Stored attributes always carry `id` and `tenant_id`; incoming payloads may
/// omit both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantAttribute {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub tenant_id: Option<Uuid>,
    pub key: String,
    pub value: String,
}

impl TenantAttribute {
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: None,
            tenant_id: None,
            key: key.into(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn stored(id: Uuid, tenant_id: Uuid, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: Some(id),
            tenant_id: Some(tenant_id),
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Explicit per-operation context passed into every listener hook.
///
/// Carries the caller's bearer token (forwarded to collaborators that act on
/// behalf of the caller) and a request id for log correlation.
#[derive(Clone)]
pub struct OperationContext {
    request_id: Uuid,
    caller_token: Option<SecretString>,
}

impl OperationContext {
    #[must_use]
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            caller_token: None,
        }
    }

    #[must_use]
    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }

    #[must_use]
    pub fn with_caller_token(mut self, token: SecretString) -> Self {
        self.caller_token = Some(token);
        self
    }

    #[must_use]
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    #[must_use]
    pub fn caller_token(&self) -> Option<&SecretString> {
        self.caller_token.as_ref()
    }
}

impl Default for OperationContext {
    fn default() -> Self {
        Self::new()
    }
}

/// `Debug` never prints the caller token.
impl fmt::Debug for OperationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationContext")
            .field("request_id", &self.request_id)
            .field(
                "caller_token",
                &self.caller_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}
