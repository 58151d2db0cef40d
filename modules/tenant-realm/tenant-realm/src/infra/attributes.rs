use async_trait::async_trait;
use dashmap::DashMap;
use tenant_realm_sdk::TenantAttribute;
use uuid::Uuid;

use crate::domain::ports::{AttributeChanges, AttributeRepository};

/// Process-local attribute store; one map entry per tenant, so a batch is
/// applied under that entry's lock.
#[derive(Default)]
pub struct InMemoryAttributeRepository {
    tenants: DashMap<Uuid, Vec<TenantAttribute>>,
}

#[async_trait]
impl AttributeRepository for InMemoryAttributeRepository {
    async fn find_by_tenant(&self, tenant_id: Uuid) -> anyhow::Result<Vec<TenantAttribute>> {
        Ok(self
            .tenants
            .get(&tenant_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }

    async fn apply(
        &self,
        tenant_id: Uuid,
        changes: AttributeChanges,
    ) -> anyhow::Result<Vec<TenantAttribute>> {
        if let Some(missing) = changes.saved.iter().find(|a| a.id.is_none()) {
            anyhow::bail!("attribute '{}' has no id", missing.key);
        }

        let mut entry = self.tenants.entry(tenant_id).or_default();
        let attrs = entry.value_mut();

        attrs.retain(|a| !changes.removed.iter().any(|r| r.id == a.id));
        for saved in &changes.saved {
            match attrs.iter_mut().find(|a| a.id == saved.id) {
                Some(existing) => existing.clone_from(saved),
                None => attrs.push(saved.clone()),
            }
        }

        Ok(changes.saved)
    }
}
