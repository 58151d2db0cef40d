use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tenant_realm_sdk::{OperationContext, TenantAttribute, TenantAttributesApi, TenantRealmError};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::error::RealmError;
use super::merge::reconcile;
use super::ports::{AttributeChanges, AttributeRepository};

/// Synchronizes a tenant's attribute set with an incoming payload.
///
/// Syncs for the same tenant are serialized within the process, so the read
/// and the apply of one sync never interleave with another's.
#[derive(Clone)]
pub struct TenantAttributeService {
    repo: Arc<dyn AttributeRepository>,
    tenant_locks: Arc<DashMap<Uuid, Arc<Mutex<()>>>>,
}

impl TenantAttributeService {
    #[must_use]
    pub fn new(repo: Arc<dyn AttributeRepository>) -> Self {
        Self {
            repo,
            tenant_locks: Arc::default(),
        }
    }

    fn tenant_lock(&self, tenant_id: Uuid) -> Arc<Mutex<()>> {
        Arc::clone(self.tenant_locks.entry(tenant_id).or_default().value())
    }

    /// Replace the stored attributes of `tenant_id` with `incoming`.
    ///
    /// Attributes are matched by key. A match keeps the stored id and tenant
    /// and takes the incoming value; unmatched stored attributes are deleted;
    /// unmatched incoming ones are inserted with a fresh id.
    ///
    /// # Errors
    ///
    /// Returns [`RealmError::Validation`] when `tenant_id` is absent and
    /// [`RealmError::Storage`] when the repository fails.
    #[tracing::instrument(skip(self, incoming), fields(incoming = incoming.len()))]
    pub async fn sync(
        &self,
        tenant_id: Option<Uuid>,
        incoming: Vec<TenantAttribute>,
    ) -> Result<Vec<TenantAttribute>, RealmError> {
        let tenant_id = tenant_id
            .ok_or_else(|| RealmError::validation("tenant_id", "tenant identifier is required"))?;
        let lock = self.tenant_lock(tenant_id);
        let _guard = lock.lock().await;

        let stored = self.repo.find_by_tenant(tenant_id).await?;

        let changes = diff(tenant_id, incoming, stored);
        tracing::debug!(
            tenant_id = %tenant_id,
            removed = changes.removed.len(),
            saved = changes.saved.len(),
            "attribute changes computed"
        );

        Ok(self.repo.apply(tenant_id, changes).await?)
    }
}

#[async_trait]
impl TenantAttributesApi for TenantAttributeService {
    async fn upsert_all(
        &self,
        ctx: &OperationContext,
        tenant_id: Option<Uuid>,
        incoming: Vec<TenantAttribute>,
    ) -> Result<Vec<TenantAttribute>, TenantRealmError> {
        tracing::debug!(request_id = %ctx.request_id(), "upserting tenant attributes");
        self.sync(tenant_id, incoming).await.map_err(Into::into)
    }
}

fn diff(
    tenant_id: Uuid,
    incoming: Vec<TenantAttribute>,
    stored: Vec<TenantAttribute>,
) -> AttributeChanges {
    let mut added = Vec::new();
    let mut updated = Vec::new();
    let mut removed = Vec::new();

    reconcile(
        incoming,
        stored,
        |a, b| a.key.cmp(&b.key),
        |mut attr: TenantAttribute| {
            attr.id.get_or_insert_with(Uuid::new_v4);
            attr.tenant_id = Some(tenant_id);
            added.push(attr);
        },
        |attr, mut existing: TenantAttribute| {
            existing.key = attr.key;
            existing.value = attr.value;
            updated.push(existing);
        },
        |existing| removed.push(existing),
    );

    added.extend(updated);
    AttributeChanges {
        removed,
        saved: added,
    }
}
