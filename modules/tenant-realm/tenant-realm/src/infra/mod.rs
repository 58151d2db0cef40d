//! Outbound adapters: Keycloak, the legacy tenant registry and in-memory
//! stores.

pub mod attributes;
pub mod keycloak;
pub mod registry;
pub mod secrets;
