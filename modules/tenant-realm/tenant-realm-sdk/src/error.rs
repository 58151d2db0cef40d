//! Error types for the tenant realm module.
//!
//! Transport-agnostic error definitions exposed to consumers.

use thiserror::Error;

/// Errors surfaced by the tenant realm public API.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TenantRealmError {
    /// Input rejected before any external call was made.
    #[error("validation error: {field}: {message}")]
    Validation { field: String, message: String },

    /// An external resource expected to exist was not found.
    #[error("not found: {what}")]
    NotFound { what: String },

    /// External state is ambiguous (more matches than expected).
    #[error("conflict: {message}")]
    Conflict { message: String },

    /// The identity provider rejected or failed a call.
    #[error("identity provider error: {message}")]
    IdentityProvider { message: String },

    /// The legacy tenant registry rejected or failed a call.
    #[error("tenant registry error: {message}")]
    Registry { message: String },

    /// Internal error (storage, secrets, misconfiguration).
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl TenantRealmError {
    #[must_use]
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn identity_provider(message: impl Into<String>) -> Self {
        Self::IdentityProvider {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn registry(message: impl Into<String>) -> Self {
        Self::Registry {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::NotFound { .. } => 404,
            Self::Conflict { .. } => 409,
            Self::IdentityProvider { .. } | Self::Registry { .. } => 502,
            Self::Internal { .. } => 500,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn validation_renders() {
        let e = TenantRealmError::validation("id", "must be present");
        assert_eq!(e.to_string(), "validation error: id: must be present");
        assert_eq!(e.status_code(), 400);
    }

    #[test]
    fn upstream_errors_map_to_bad_gateway() {
        assert_eq!(TenantRealmError::identity_provider("boom").status_code(), 502);
        assert_eq!(TenantRealmError::registry("boom").status_code(), 502);
    }
}
