#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::error::Error as _;
use std::sync::Arc;

use common::{acme, harness};
use httpmock::prelude::*;
use secrecy::{ExposeSecret, SecretString};
use tenant_realm::config::{GrantType, KeycloakConfig, TenantRealmConfig};
use tenant_realm::domain::error::RealmError;
use tenant_realm::domain::ports::SecretStore;
use tenant_realm::infra::secrets::InMemorySecretStore;
use tenant_realm::{ModuleDeps, TenantRealmModule};

const TOKEN_PATH: &str = "/realms/master/protocol/openid-connect/token";

#[tokio::test]
async fn rejected_token_is_renewed_once_and_retried() {
    let h = harness();
    h.api.reject_token("tok-1");

    h.module.orchestrator().create_realm(&acme()).await.unwrap();

    assert_eq!(h.tokens.issued(), 2);
    let seen = h.api.tokens_seen();
    assert_eq!(seen[..2], ["tok-1", "tok-2"]);
    assert!(seen[1..].iter().all(|t| t == "tok-2"));
    assert_eq!(h.api.count("find_realm:acme"), 2);
    assert_eq!(h.api.count("create_realm:acme"), 1);
}

#[tokio::test]
async fn second_rejection_propagates_without_further_renewal() {
    let h = harness();
    h.api.reject_all();

    let err = h
        .module
        .orchestrator()
        .create_realm(&acme())
        .await
        .unwrap_err();

    assert!(matches!(err, RealmError::Integration { .. }));
    assert_eq!(err.to_string(), "Failed to look up realm: acme");
    assert_eq!(
        err.source().map(ToString::to_string).as_deref(),
        Some("unauthorized")
    );
    assert_eq!(h.tokens.issued(), 2);
    assert_eq!(h.api.journal(), ["find_realm:acme", "find_realm:acme"]);
}

#[tokio::test]
async fn token_is_fetched_once_across_operations() {
    let h = harness();
    h.api.insert_realm("acme");

    let orchestrator = h.module.orchestrator();
    orchestrator.find_realm("acme").await.unwrap();
    orchestrator.update_realm(&acme()).await.unwrap();
    orchestrator.delete_realm("acme").await.unwrap();

    assert_eq!(h.tokens.issued(), 1);
}

async fn live_module(server: &MockServer) -> TenantRealmModule {
    let secrets = Arc::new(InMemorySecretStore::default());
    secrets
        .set("keycloak-admin-client-secret", SecretString::from("cli-secret"))
        .await
        .unwrap();

    let config = TenantRealmConfig {
        keycloak: KeycloakConfig {
            base_url: server.base_url(),
            grant_type: GrantType::ClientCredentials,
            ..KeycloakConfig::default()
        },
        ..TenantRealmConfig::default()
    };
    TenantRealmModule::new(
        &config,
        ModuleDeps {
            secrets,
            ..ModuleDeps::default()
        },
    )
    .unwrap()
}

fn token_mock<'a>(server: &'a MockServer, token: &str) -> httpmock::Mock<'a> {
    let body = format!(r#"{{"access_token":"{token}","token_type":"Bearer","expires_in":60}}"#);
    server.mock(|when, then| {
        when.method(POST)
            .path(TOKEN_PATH)
            .body_includes("grant_type=client_credentials")
            .body_includes("client_secret=cli-secret");
        then.status(200)
            .header("content-type", "application/json")
            .body(body);
    })
}

#[tokio::test]
async fn http_stack_renews_stale_token() {
    let server = MockServer::start();
    let mut first = token_mock(&server, "tok-1");

    let module = live_module(&server).await;
    let primed = module.tokens().get_token().await.unwrap();
    assert_eq!(primed.expose_secret(), "tok-1");
    first.delete();
    let second = token_mock(&server, "tok-2");

    let stale = server.mock(|when, then| {
        when.method(GET)
            .path("/admin/realms/acme")
            .header("authorization", "Bearer tok-1");
        then.status(401);
    });
    let fresh = server.mock(|when, then| {
        when.method(GET)
            .path("/admin/realms/acme")
            .header("authorization", "Bearer tok-2");
        then.status(200)
            .header("content-type", "application/json")
            .body(r#"{"id":"r-1","realm":"acme","enabled":true}"#);
    });

    let realm = module.orchestrator().find_realm("acme").await.unwrap();
    assert_eq!(realm.map(|r| r.realm).as_deref(), Some("acme"));
    assert_eq!(stale.calls(), 1);
    assert_eq!(fresh.calls(), 1);
    assert_eq!(second.calls(), 1);
}

#[tokio::test]
async fn http_stack_gives_up_after_one_renewal() {
    let server = MockServer::start();
    let tokens = token_mock(&server, "tok-1");
    let realm = server.mock(|when, then| {
        when.method(GET).path("/admin/realms/acme");
        then.status(401);
    });

    let module = live_module(&server).await;
    let err = module
        .orchestrator()
        .delete_realm("acme")
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Failed to look up realm: acme");
    assert_eq!(tokens.calls(), 2);
    assert_eq!(realm.calls(), 2);
}
