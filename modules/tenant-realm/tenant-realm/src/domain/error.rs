//! Domain errors for tenant realm provisioning.

use http::StatusCode;
use tenant_realm_sdk::TenantRealmError;
use thiserror::Error;

/// Failure of a single identity-provider admin-API call, before any context
/// has been attached.
///
/// `Status` renders only the status line; the response body is kept for
/// diagnostics but never formatted into the message.
#[derive(Debug, Error)]
pub enum AdminApiError {
    /// The bearer token was rejected (HTTP 401).
    #[error("unauthorized")]
    Unauthorized,

    /// Non-success status on a call that expects success.
    #[error("HTTP {status}")]
    Status { status: StatusCode, body: String },

    /// Connection, TLS or timeout failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response could not be decoded into the expected shape.
    #[error("invalid response: {0}")]
    Decode(String),
}

impl AdminApiError {
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            Self::Status { status, .. } => Some(*status),
            Self::Transport(e) => e.status(),
            Self::Decode(_) => None,
        }
    }
}

/// Domain error for every provisioning operation.
///
/// Once an admin-API failure has been wrapped into [`RealmError::Integration`]
/// it propagates unchanged; nothing re-wraps a `RealmError`.
#[derive(Debug, Error)]
pub enum RealmError {
    /// An identity-provider call failed; `message` names what was attempted.
    #[error("{message}")]
    Integration {
        message: String,
        #[source]
        source: Option<AdminApiError>,
    },

    /// A resource expected to exist is absent.
    #[error("{what} not found")]
    NotFound { what: String },

    /// More than one resource matched where exactly one was expected.
    #[error("expected exactly one {what}, found {count}")]
    TooMany { what: String, count: usize },

    /// Precondition failed before any external call.
    #[error("validation error: {field}: {message}")]
    Validation { field: String, message: String },

    /// Secret store lookup or write failed.
    #[error("secret store error for key '{key}': {message}")]
    SecretStore { key: String, message: String },

    /// Legacy tenant registry call failed.
    #[error("tenant registry error: {message}")]
    Registry { message: String },

    /// Attribute persistence failed.
    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl RealmError {
    #[must_use]
    pub fn integration(message: impl Into<String>) -> Self {
        Self::Integration {
            message: message.into(),
            source: None,
        }
    }

    #[must_use]
    pub fn wrap(message: impl Into<String>, cause: AdminApiError) -> Self {
        Self::Integration {
            message: message.into(),
            source: Some(cause),
        }
    }

    #[must_use]
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    #[must_use]
    pub fn too_many(what: impl Into<String>, count: usize) -> Self {
        Self::TooMany {
            what: what.into(),
            count,
        }
    }

    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn secret_store(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SecretStore {
            key: key.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn registry(message: impl Into<String>) -> Self {
        Self::Registry {
            message: message.into(),
        }
    }
}

/// What a gateway call may fail with.
///
/// `Api` is a raw admin-API failure and gets wrapped with the caller's context
/// message; `Domain` is already a [`RealmError`] and passes through as-is.
#[derive(Debug, Error)]
pub enum CallError {
    #[error(transparent)]
    Api(#[from] AdminApiError),
    #[error(transparent)]
    Domain(#[from] RealmError),
}

impl From<RealmError> for TenantRealmError {
    fn from(e: RealmError) -> Self {
        match e {
            RealmError::Integration { message, source } => match source {
                Some(cause) => Self::identity_provider(format!("{message}: {cause}")),
                None => Self::identity_provider(message),
            },
            RealmError::NotFound { what } => Self::not_found(what),
            e @ RealmError::TooMany { .. } => Self::conflict(e.to_string()),
            RealmError::Validation { field, message } => Self::validation(field, message),
            RealmError::Registry { message } => Self::registry(message),
            e @ (RealmError::SecretStore { .. } | RealmError::Storage(_)) => {
                Self::internal(e.to_string())
            }
        }
    }
}
