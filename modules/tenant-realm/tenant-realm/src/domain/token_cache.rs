use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use secrecy::SecretString;

use super::error::AdminApiError;
use super::ports::AdminTokenSource;

/// Name of the cached admin token in logs.
pub const ADMIN_TOKEN_CACHE_KEY: &str = "admin-cli-token";

/// Single-slot cache for the admin-API bearer token.
///
/// No expiry is tracked: a stale token is discovered when the provider answers
/// 401, at which point the gateway calls [`AdminTokenCache::force_renew`].
/// Reads are lock-free; concurrent renewals may both fetch, and the last
/// store wins.
pub struct AdminTokenCache {
    slot: ArcSwapOption<SecretString>,
    source: Arc<dyn AdminTokenSource>,
}

impl fmt::Debug for AdminTokenCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminTokenCache")
            .field("cached", &self.slot.load().is_some())
            .finish_non_exhaustive()
    }
}

impl AdminTokenCache {
    #[must_use]
    pub fn new(source: Arc<dyn AdminTokenSource>) -> Self {
        Self {
            slot: ArcSwapOption::empty(),
            source,
        }
    }

    /// Return the cached token, fetching and storing one if the slot is empty.
    ///
    /// # Errors
    ///
    /// Returns the token source's error when a fetch is needed and fails.
    pub async fn get_token(&self) -> Result<SecretString, AdminApiError> {
        if let Some(token) = self.slot.load_full() {
            return Ok(token.as_ref().clone());
        }
        self.force_renew().await
    }

    /// Fetch a fresh token and overwrite the slot.
    ///
    /// # Errors
    ///
    /// Returns the token source's error; the slot is left untouched.
    pub async fn force_renew(&self) -> Result<SecretString, AdminApiError> {
        let token = self.source.request_token().await?;
        self.slot.store(Some(Arc::new(token.clone())));
        tracing::debug!(key = ADMIN_TOKEN_CACHE_KEY, "admin token renewed");
        Ok(token)
    }

    /// Drop the cached token without fetching a new one.
    pub fn invalidate(&self) {
        self.slot.store(None);
    }
}
