use std::sync::Arc;

use rand::Rng;
use rand::distr::Alphanumeric;
use secrecy::SecretString;

use super::error::RealmError;
use super::ports::SecretStore;

const GENERATED_SECRET_LEN: usize = 32;

/// Fetch-or-generate OAuth client secrets.
///
/// A secret is generated on first use and stored under
/// `{prefix}_{realm}_{client_id}`; later lookups for the same pair return the
/// stored value.
#[derive(Clone)]
pub struct ClientSecrets {
    store: Arc<dyn SecretStore>,
    prefix: String,
}

impl ClientSecrets {
    #[must_use]
    pub fn new(store: Arc<dyn SecretStore>, prefix: impl Into<String>) -> Self {
        Self {
            store,
            prefix: prefix.into(),
        }
    }

    #[must_use]
    pub fn key(&self, realm: &str, client_id: &str) -> String {
        format!("{}_{realm}_{client_id}", self.prefix)
    }

    /// # Errors
    ///
    /// Returns [`RealmError::SecretStore`] when the store cannot be read or
    /// written.
    pub async fn get_or_create(
        &self,
        realm: &str,
        client_id: &str,
    ) -> Result<SecretString, RealmError> {
        let key = self.key(realm, client_id);
        if let Some(secret) = self.store.get(&key).await? {
            return Ok(secret);
        }

        let secret = SecretString::from(generate_secret());
        self.store.set(&key, secret.clone()).await?;
        tracing::info!(realm, client_id, "generated client secret");
        Ok(secret)
    }
}

fn generate_secret() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_SECRET_LEN)
        .map(char::from)
        .collect()
}
