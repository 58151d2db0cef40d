//! Tenant lifecycle listeners and their fan-out.

use std::sync::Arc;

use async_trait::async_trait;
use tenant_realm_sdk::{OperationContext, Tenant, TenantListener, TenantRealmError};

use super::ports::{RegistryTenant, TenantRegistry, TopicCleaner};
use super::realm::RealmOrchestrator;

/// Listeners in registration order. Each event stops at the first failing
/// listener and returns its error.
#[derive(Clone, Default)]
pub struct TenantListeners {
    listeners: Vec<Arc<dyn TenantListener>>,
}

impl TenantListeners {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, listener: Arc<dyn TenantListener>) {
        tracing::debug!(listener = listener.name(), "tenant listener registered");
        self.listeners.push(listener);
    }

    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.listeners.iter().map(|l| l.name()).collect()
    }

    /// # Errors
    ///
    /// Returns the first listener error; later listeners are not called.
    pub async fn on_tenant_create(
        &self,
        ctx: &OperationContext,
        tenant: &Tenant,
    ) -> Result<(), TenantRealmError> {
        for listener in &self.listeners {
            listener
                .on_tenant_create(ctx, tenant)
                .await
                .inspect_err(|e| log_failure(listener.name(), "create", ctx, e))?;
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns the first listener error; later listeners are not called.
    pub async fn on_tenant_update(
        &self,
        ctx: &OperationContext,
        tenant: &Tenant,
    ) -> Result<(), TenantRealmError> {
        for listener in &self.listeners {
            listener
                .on_tenant_update(ctx, tenant)
                .await
                .inspect_err(|e| log_failure(listener.name(), "update", ctx, e))?;
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns the first listener error; later listeners are not called.
    pub async fn on_tenant_delete(
        &self,
        ctx: &OperationContext,
        tenant_name: &str,
    ) -> Result<(), TenantRealmError> {
        for listener in &self.listeners {
            listener
                .on_tenant_delete(ctx, tenant_name)
                .await
                .inspect_err(|e| log_failure(listener.name(), "delete", ctx, e))?;
        }
        Ok(())
    }
}

fn log_failure(listener: &str, event: &str, ctx: &OperationContext, e: &TenantRealmError) {
    tracing::warn!(
        listener,
        event,
        request_id = %ctx.request_id(),
        error = %e,
        "tenant listener failed"
    );
}

/// Keeps the tenant's identity realm in step with the tenant.
pub struct RealmListener {
    orchestrator: RealmOrchestrator,
}

impl RealmListener {
    #[must_use]
    pub fn new(orchestrator: RealmOrchestrator) -> Self {
        Self { orchestrator }
    }
}

#[async_trait]
impl TenantListener for RealmListener {
    fn name(&self) -> &'static str {
        "realm"
    }

    async fn on_tenant_create(
        &self,
        _ctx: &OperationContext,
        tenant: &Tenant,
    ) -> Result<(), TenantRealmError> {
        self.orchestrator.create_realm(tenant).await?;
        Ok(())
    }

    async fn on_tenant_update(
        &self,
        _ctx: &OperationContext,
        tenant: &Tenant,
    ) -> Result<(), TenantRealmError> {
        Ok(self.orchestrator.update_realm(tenant).await?)
    }

    async fn on_tenant_delete(
        &self,
        _ctx: &OperationContext,
        tenant_name: &str,
    ) -> Result<(), TenantRealmError> {
        Ok(self.orchestrator.delete_realm(tenant_name).await?)
    }
}

/// Mirrors tenants into the legacy registry.
pub struct RegistryListener {
    registry: Arc<dyn TenantRegistry>,
}

impl RegistryListener {
    #[must_use]
    pub fn new(registry: Arc<dyn TenantRegistry>) -> Self {
        Self { registry }
    }
}

fn registry_tenant(tenant: &Tenant) -> RegistryTenant {
    RegistryTenant {
        id: tenant.name.clone(),
        name: tenant.name.clone(),
        description: tenant.description.clone(),
    }
}

#[async_trait]
impl TenantListener for RegistryListener {
    fn name(&self) -> &'static str {
        "registry"
    }

    async fn on_tenant_create(
        &self,
        ctx: &OperationContext,
        tenant: &Tenant,
    ) -> Result<(), TenantRealmError> {
        if self.registry.exists(ctx, &tenant.name).await? {
            tracing::info!(tenant = %tenant.name, "tenant already registered");
            return Ok(());
        }
        Ok(self.registry.create(ctx, &registry_tenant(tenant)).await?)
    }

    async fn on_tenant_update(
        &self,
        ctx: &OperationContext,
        tenant: &Tenant,
    ) -> Result<(), TenantRealmError> {
        let descriptor = registry_tenant(tenant);
        if self.registry.exists(ctx, &tenant.name).await? {
            self.registry.update(ctx, &descriptor).await?;
        } else {
            self.registry.create(ctx, &descriptor).await?;
        }
        Ok(())
    }

    async fn on_tenant_delete(
        &self,
        ctx: &OperationContext,
        tenant_name: &str,
    ) -> Result<(), TenantRealmError> {
        Ok(self.registry.delete(ctx, tenant_name).await?)
    }
}

/// Removes broker topics of deleted tenants.
pub struct TopicCleanupListener {
    cleaner: Arc<dyn TopicCleaner>,
}

impl TopicCleanupListener {
    #[must_use]
    pub fn new(cleaner: Arc<dyn TopicCleaner>) -> Self {
        Self { cleaner }
    }
}

#[async_trait]
impl TenantListener for TopicCleanupListener {
    fn name(&self) -> &'static str {
        "topic-cleanup"
    }

    async fn on_tenant_delete(
        &self,
        _ctx: &OperationContext,
        tenant_name: &str,
    ) -> Result<(), TenantRealmError> {
        self.cleaner
            .delete_tenant_topics(tenant_name)
            .await
            .map_err(|e| TenantRealmError::internal(format!("topic cleanup failed: {e:#}")))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::sync::Mutex;

    use uuid::Uuid;

    use super::*;
    use crate::domain::error::RealmError;

    type Journal = Arc<Mutex<Vec<String>>>;

    struct Recording {
        name: &'static str,
        journal: Journal,
        fail: bool,
    }

    #[async_trait]
    impl TenantListener for Recording {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn on_tenant_create(
            &self,
            _ctx: &OperationContext,
            tenant: &Tenant,
        ) -> Result<(), TenantRealmError> {
            self.journal
                .lock()
                .unwrap()
                .push(format!("{}:{}", self.name, tenant.name));
            if self.fail {
                return Err(TenantRealmError::internal("boom"));
            }
            Ok(())
        }
    }

    fn listener(name: &'static str, journal: &Journal, fail: bool) -> Arc<dyn TenantListener> {
        Arc::new(Recording {
            name,
            journal: journal.clone(),
            fail,
        })
    }

    #[tokio::test]
    async fn runs_in_registration_order() {
        let journal = Journal::default();
        let mut listeners = TenantListeners::new();
        listeners.register(listener("a", &journal, false));
        listeners.register(listener("b", &journal, false));

        listeners
            .on_tenant_create(&OperationContext::new(), &Tenant::new(Uuid::new_v4(), "acme"))
            .await
            .unwrap();
        assert_eq!(*journal.lock().unwrap(), ["a:acme", "b:acme"]);
        assert_eq!(listeners.names(), ["a", "b"]);
    }

    #[tokio::test]
    async fn failure_stops_remaining_listeners() {
        let journal = Journal::default();
        let mut listeners = TenantListeners::new();
        listeners.register(listener("a", &journal, true));
        listeners.register(listener("b", &journal, false));

        let err = listeners
            .on_tenant_create(&OperationContext::new(), &Tenant::new(Uuid::new_v4(), "acme"))
            .await
            .unwrap_err();
        assert_eq!(err, TenantRealmError::internal("boom"));
        assert_eq!(*journal.lock().unwrap(), ["a:acme"]);
    }

    #[derive(Default)]
    struct FakeRegistry {
        known: Mutex<Vec<String>>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TenantRegistry for FakeRegistry {
        async fn exists(&self, _ctx: &OperationContext, name: &str) -> Result<bool, RealmError> {
            Ok(self.known.lock().unwrap().iter().any(|n| n == name))
        }

        async fn create(
            &self,
            _ctx: &OperationContext,
            tenant: &RegistryTenant,
        ) -> Result<(), RealmError> {
            self.calls.lock().unwrap().push(format!("create:{}", tenant.id));
            self.known.lock().unwrap().push(tenant.id.clone());
            Ok(())
        }

        async fn update(
            &self,
            _ctx: &OperationContext,
            tenant: &RegistryTenant,
        ) -> Result<(), RealmError> {
            self.calls.lock().unwrap().push(format!("update:{}", tenant.id));
            Ok(())
        }

        async fn delete(&self, _ctx: &OperationContext, name: &str) -> Result<(), RealmError> {
            self.calls.lock().unwrap().push(format!("delete:{name}"));
            Ok(())
        }
    }

    #[tokio::test]
    async fn registry_listener_creates_once_and_upserts_on_update() {
        let registry = Arc::new(FakeRegistry::default());
        let listener = RegistryListener::new(registry.clone());
        let ctx = OperationContext::new();
        let tenant = Tenant::new(Uuid::new_v4(), "acme");

        listener.on_tenant_create(&ctx, &tenant).await.unwrap();
        listener.on_tenant_create(&ctx, &tenant).await.unwrap();
        listener.on_tenant_update(&ctx, &tenant).await.unwrap();
        listener
            .on_tenant_update(&ctx, &Tenant::new(Uuid::new_v4(), "globex"))
            .await
            .unwrap();
        listener.on_tenant_delete(&ctx, "acme").await.unwrap();

        assert_eq!(
            *registry.calls.lock().unwrap(),
            ["create:acme", "update:acme", "create:globex", "delete:acme"]
        );
    }

    struct FailingCleaner;

    #[async_trait]
    impl TopicCleaner for FailingCleaner {
        async fn delete_tenant_topics(&self, _tenant_name: &str) -> anyhow::Result<()> {
            anyhow::bail!("broker unavailable")
        }
    }

    #[tokio::test]
    async fn topic_cleanup_failure_is_internal() {
        let listener = TopicCleanupListener::new(Arc::new(FailingCleaner));
        let err = listener
            .on_tenant_delete(&OperationContext::new(), "acme")
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 500);
        assert!(err.to_string().contains("broker unavailable"));
    }
}
