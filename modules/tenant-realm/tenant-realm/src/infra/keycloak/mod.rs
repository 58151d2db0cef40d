//! Keycloak REST adapters.

mod admin_client;
mod token_source;

use std::time::Duration;

use url::Url;

pub use admin_client::KeycloakAdminClient;
pub use token_source::KeycloakTokenSource;

use crate::config::KeycloakConfig;
use crate::domain::error::RealmError;

/// Shared HTTP client for admin and token calls.
///
/// # Errors
///
/// Returns [`RealmError::Integration`] when the TLS backend cannot be
/// initialized.
pub fn build_http_client(config: &KeycloakConfig) -> Result<reqwest::Client, RealmError> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
        .timeout(Duration::from_millis(config.request_timeout_ms))
        .build()
        .map_err(|e| RealmError::wrap("Failed to build Keycloak HTTP client", e.into()))
}

/// Parse `raw` as a base URL that path segments can be appended to.
///
/// # Errors
///
/// Returns [`RealmError::Validation`] naming `field`.
pub fn parse_base_url(field: &str, raw: &str) -> Result<Url, RealmError> {
    let url = Url::parse(raw).map_err(|e| RealmError::validation(field, e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(RealmError::validation(field, "not a base URL"));
    }
    Ok(url)
}

/// `base` with `segments` appended, each percent-encoded.
pub(crate) fn join_segments<'a>(
    base: &Url,
    segments: impl IntoIterator<Item = &'a str>,
) -> Option<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .ok()?
        .pop_if_empty()
        .extend(segments);
    Some(url)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn segments_are_encoded() {
        let base = parse_base_url("base_url", "http://kc:8080/auth/").unwrap();
        let url = join_segments(&base, ["admin", "realms", "acme", "roles", "Password Reset"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://kc:8080/auth/admin/realms/acme/roles/Password%20Reset"
        );
    }

    #[test]
    fn non_base_url_rejected() {
        assert!(parse_base_url("base_url", "mailto:admin@example.com").is_err());
        assert!(parse_base_url("base_url", "not a url").is_err());
    }
}
