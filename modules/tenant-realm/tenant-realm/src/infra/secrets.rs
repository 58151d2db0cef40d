use async_trait::async_trait;
use dashmap::DashMap;
use secrecy::SecretString;

use crate::domain::error::RealmError;
use crate::domain::ports::SecretStore;

/// Process-local secret store.
#[derive(Default)]
pub struct InMemorySecretStore {
    entries: DashMap<String, SecretString>,
}

impl InMemorySecretStore {
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn get(&self, key: &str) -> Result<Option<SecretString>, RealmError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, value: SecretString) -> Result<(), RealmError> {
        self.entries.insert(key.to_owned(), value);
        Ok(())
    }
}
