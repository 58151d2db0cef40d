use std::future::Future;
use std::sync::Arc;

use secrecy::SecretString;

use super::error::{CallError, RealmError};
use super::ports::AdminApi;
use super::token_cache::AdminTokenCache;

/// Runs admin-API calls with the cached bearer token attached.
///
/// Every failure leaves [`AdminGateway::execute`] as a [`RealmError`]: raw
/// admin-API errors are wrapped once with the caller's context message, errors
/// that are already domain errors pass through untouched. A 401 triggers one
/// forced token renewal and one retry; a second 401 is wrapped and returned.
#[derive(Clone)]
pub struct AdminGateway {
    api: Arc<dyn AdminApi>,
    tokens: Arc<AdminTokenCache>,
}

impl AdminGateway {
    #[must_use]
    pub fn new(api: Arc<dyn AdminApi>, tokens: Arc<AdminTokenCache>) -> Self {
        Self { api, tokens }
    }

    #[must_use]
    pub fn tokens(&self) -> &AdminTokenCache {
        &self.tokens
    }

    /// Invoke `call` with the admin API and a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`RealmError::Integration`] carrying `context` when the token
    /// cannot be obtained or the call fails with an admin-API error, or the
    /// call's own [`RealmError`] unchanged.
    pub async fn execute<'a, T, E, F, Fut>(
        &'a self,
        context: &str,
        mut call: F,
    ) -> Result<T, RealmError>
    where
        F: FnMut(&'a dyn AdminApi, SecretString) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<CallError>,
    {
        let token = self
            .tokens
            .get_token()
            .await
            .map_err(|e| RealmError::wrap(context, e))?;

        match call(self.api.as_ref(), token).await.map_err(Into::into) {
            Ok(value) => Ok(value),
            Err(CallError::Api(e)) if e.is_unauthorized() => {
                tracing::debug!(context, "admin token rejected, renewing once");
                let token = self
                    .tokens
                    .force_renew()
                    .await
                    .map_err(|e| RealmError::wrap(context, e))?;
                call(self.api.as_ref(), token)
                    .await
                    .map_err(|e| into_realm_error(context, e.into()))
            }
            Err(e) => Err(into_realm_error(context, e)),
        }
    }
}

fn into_realm_error(context: &str, e: CallError) -> RealmError {
    match e {
        CallError::Api(cause) => RealmError::wrap(context, cause),
        CallError::Domain(e) => e,
    }
}
