//! Identity-provider admin-API representations.
//!
//! Field names follow the Keycloak admin REST API (camelCase on the wire).
//! Optional fields are skipped when `None` so that partial descriptors (for
//! example a realm update) only touch what they set. Unknown fields returned
//! by the provider are ignored.

use std::collections::BTreeMap;

use http::StatusCode;
use serde::{Deserialize, Serialize};

pub const OPENID_CONNECT: &str = "openid-connect";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealmRepresentation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub realm: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token_lifespan: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sso_session_idle_timeout: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sso_session_max_lifespan: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_session_idle_timeout: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_session_max_lifespan: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offline_session_idle_timeout: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_actions: Option<Vec<RequiredActionProviderRepresentation>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub components: Option<BTreeMap<String, Vec<ComponentRepresentation>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequiredActionProviderRepresentation {
    pub alias: String,
    pub name: String,
    pub provider_id: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub default_action: bool,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub config: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentRepresentation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub provider_id: String,
    #[serde(default)]
    pub config: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleRepresentation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct ClientRepresentation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub client_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub frontchannel_logout: bool,
    #[serde(default)]
    pub public_client: bool,
    #[serde(default)]
    pub direct_access_grants_enabled: bool,
    #[serde(default)]
    pub service_accounts_enabled: bool,
    #[serde(default)]
    pub authorization_services_enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
    #[serde(default)]
    pub web_origins: Vec<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub protocol_mappers: Vec<ProtocolMapperRepresentation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_settings: Option<ResourceServerRepresentation>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolMapperRepresentation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub protocol: String,
    pub protocol_mapper: String,
    #[serde(default)]
    pub consent_required: bool,
    #[serde(default)]
    pub config: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionStrategy {
    /// All policies must grant.
    #[default]
    Unanimous,
    Affirmative,
    Consensus,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Logic {
    #[default]
    Positive,
    Negative,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyEnforcementMode {
    #[default]
    Enforcing,
    Permissive,
    Disabled,
}

/// A client's authorization settings (scopes, policies, permissions).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceServerRepresentation {
    pub allow_remote_resource_management: bool,
    pub policy_enforcement_mode: PolicyEnforcementMode,
    pub decision_strategy: DecisionStrategy,
    #[serde(default)]
    pub scopes: Vec<ScopeRepresentation>,
    #[serde(default)]
    pub policies: Vec<PolicyRepresentation>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopeRepresentation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
}

/// Policy or permission. Role policies and scope permissions carry their
/// bindings in `config` (JSON-encoded values, as the provider's import format
/// expects); client policies and permission updates use the typed id lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRepresentation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub logic: Logic,
    #[serde(default)]
    pub decision_strategy: DecisionStrategy,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub config: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clients: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policies: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRepresentation {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// Answer of the users-management-permissions toggle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagementPermissionReference {
    pub enabled: bool,
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default)]
    pub scope_permissions: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerInfoRepresentation {
    #[serde(default)]
    pub builtin_protocol_mappers: BTreeMap<String, Vec<ProtocolMapperRepresentation>>,
}

/// Raw outcome of a "create" call: status, `Location` header and body.
#[derive(Debug, Clone, PartialEq)]
pub struct AdminResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: Option<serde_json::Value>,
}

impl AdminResponse {
    #[must_use]
    pub fn created(location: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CREATED,
            location: Some(location.into()),
            body: None,
        }
    }

    #[must_use]
    pub fn status(status: StatusCode) -> Self {
        Self {
            status,
            location: None,
            body: None,
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn partial_realm_serializes_only_set_fields() {
        let realm = RealmRepresentation {
            realm: "acme".to_owned(),
            enabled: Some(true),
            ..Default::default()
        };
        let json = serde_json::to_value(&realm).unwrap();
        assert_eq!(json, serde_json::json!({"realm": "acme", "enabled": true}));
    }

    #[test]
    fn policy_serializes_type_and_screaming_enums() {
        let policy = PolicyRepresentation {
            name: "System role policy".to_owned(),
            kind: "role".to_owned(),
            ..Default::default()
        };
        let json = serde_json::to_value(&policy).unwrap();
        assert_eq!(json["type"], "role");
        assert_eq!(json["logic"], "POSITIVE");
        assert_eq!(json["decisionStrategy"], "UNANIMOUS");
    }

    #[test]
    fn server_info_ignores_unknown_fields() {
        let json = r#"{
            "systemInfo": {"version": "26.0.0"},
            "builtinProtocolMappers": {
                "openid-connect": [{
                    "name": "Client ID",
                    "protocol": "openid-connect",
                    "protocolMapper": "oidc-usersessionmodel-note-mapper",
                    "config": {"user.session.note": "client_id"}
                }]
            }
        }"#;
        let info: ServerInfoRepresentation = serde_json::from_str(json).unwrap();
        let mappers = &info.builtin_protocol_mappers[OPENID_CONNECT];
        assert_eq!(mappers[0].name, "Client ID");
    }
}
