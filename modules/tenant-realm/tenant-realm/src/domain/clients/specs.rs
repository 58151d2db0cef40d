//! Per-variant client descriptors.

use std::collections::BTreeMap;

use chrono::Utc;

use crate::config::ClientsConfig;
use crate::domain::model::{
    DecisionStrategy, Logic, OPENID_CONNECT, PolicyEnforcementMode, PolicyRepresentation,
    ProtocolMapperRepresentation, ResourceServerRepresentation, ScopeRepresentation,
};

/// One scope per HTTP verb on the login client.
pub const HTTP_VERB_SCOPES: [&str; 6] = ["GET", "POST", "PUT", "DELETE", "PATCH", "OPTIONS"];

pub const SYSTEM_ROLE_POLICY: &str = "System role policy";
pub const PASSWORD_RESET_POLICY: &str = "Password Reset policy";
pub const SYSTEM_ROLE_PERMISSION: &str = "System role permission";

/// What distinguishes one client variant from another.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSpec {
    pub client_id: String,
    pub description: String,
    pub service_accounts_enabled: bool,
    pub authorization_services_enabled: bool,
    pub attributes: BTreeMap<String, String>,
    pub protocol_mappers: Vec<ProtocolMapperRepresentation>,
    pub authorization_settings: Option<ResourceServerRepresentation>,
    /// Realm role granted to the client's service account after creation.
    pub service_account_role: Option<String>,
}

#[must_use]
pub fn module_client(config: &ClientsConfig) -> ClientSpec {
    ClientSpec {
        client_id: config.module_client_id.clone(),
        description: "Service client used by modules to call each other".to_owned(),
        service_accounts_enabled: true,
        authorization_services_enabled: true,
        attributes: token_attributes(config.access_token_lifespan, config.use_refresh_tokens),
        protocol_mappers: Vec::new(),
        authorization_settings: None,
        service_account_role: Some(config.system_role.clone()),
    }
}

#[must_use]
pub fn login_client(config: &ClientsConfig, realm: &str) -> ClientSpec {
    ClientSpec {
        client_id: config.login_client_id_for(realm),
        description: "Client used for user login".to_owned(),
        service_accounts_enabled: true,
        authorization_services_enabled: true,
        attributes: token_attributes(config.access_token_lifespan, config.use_refresh_tokens),
        protocol_mappers: user_mappers(),
        authorization_settings: Some(login_authorization(config)),
        service_account_role: None,
    }
}

#[must_use]
pub fn impersonation_client(config: &ClientsConfig) -> ClientSpec {
    ClientSpec {
        client_id: config.impersonation_client_id.clone(),
        description: "Client allowed to impersonate realm users".to_owned(),
        service_accounts_enabled: true,
        authorization_services_enabled: true,
        attributes: token_attributes(config.access_token_lifespan, config.use_refresh_tokens),
        protocol_mappers: user_mappers(),
        authorization_settings: None,
        service_account_role: None,
    }
}

/// `mapper` is the built-in mapper looked up from the provider's server info.
#[must_use]
pub fn password_reset_client(
    config: &ClientsConfig,
    mapper: ProtocolMapperRepresentation,
) -> ClientSpec {
    ClientSpec {
        client_id: config.password_reset_client_id.clone(),
        description: "Client issuing password reset tokens".to_owned(),
        service_accounts_enabled: true,
        authorization_services_enabled: false,
        attributes: token_attributes(
            config.password_reset_token_lifespan,
            config.password_reset_use_refresh_tokens,
        ),
        protocol_mappers: vec![mapper],
        authorization_settings: None,
        service_account_role: None,
    }
}

fn token_attributes(access_token_lifespan: u32, use_refresh_tokens: bool) -> BTreeMap<String, String> {
    BTreeMap::from([
        (
            "access.token.lifespan".to_owned(),
            access_token_lifespan.to_string(),
        ),
        (
            "use.refresh.tokens".to_owned(),
            use_refresh_tokens.to_string(),
        ),
        (
            "client.secret.creation.time".to_owned(),
            Utc::now().timestamp().to_string(),
        ),
    ])
}

fn user_mappers() -> Vec<ProtocolMapperRepresentation> {
    vec![
        property_mapper("username", "username", "sub"),
        property_mapper("user_id", "id", "user_id"),
    ]
}

fn property_mapper(name: &str, user_attribute: &str, claim: &str) -> ProtocolMapperRepresentation {
    ProtocolMapperRepresentation {
        id: None,
        name: name.to_owned(),
        protocol: OPENID_CONNECT.to_owned(),
        protocol_mapper: "oidc-usermodel-property-mapper".to_owned(),
        consent_required: false,
        config: BTreeMap::from([
            ("user.attribute".to_owned(), user_attribute.to_owned()),
            ("claim.name".to_owned(), claim.to_owned()),
            ("jsonType.label".to_owned(), "String".to_owned()),
            ("id.token.claim".to_owned(), "true".to_owned()),
            ("access.token.claim".to_owned(), "true".to_owned()),
            ("userinfo.token.claim".to_owned(), "true".to_owned()),
        ]),
    }
}

fn login_authorization(config: &ClientsConfig) -> ResourceServerRepresentation {
    let scopes = HTTP_VERB_SCOPES
        .iter()
        .map(|verb| ScopeRepresentation {
            id: None,
            name: (*verb).to_owned(),
        })
        .collect();

    let permission = PolicyRepresentation {
        name: SYSTEM_ROLE_PERMISSION.to_owned(),
        description: Some("Grants every verb to the system role".to_owned()),
        kind: "scope".to_owned(),
        config: BTreeMap::from([
            (
                "scopes".to_owned(),
                serde_json::json!(HTTP_VERB_SCOPES).to_string(),
            ),
            (
                "applyPolicies".to_owned(),
                serde_json::json!([SYSTEM_ROLE_POLICY]).to_string(),
            ),
        ]),
        ..Default::default()
    };

    ResourceServerRepresentation {
        allow_remote_resource_management: true,
        policy_enforcement_mode: PolicyEnforcementMode::Enforcing,
        decision_strategy: DecisionStrategy::Unanimous,
        scopes,
        // Policies precede the permission that references them.
        policies: vec![
            role_policy(SYSTEM_ROLE_POLICY, &config.system_role),
            role_policy(PASSWORD_RESET_POLICY, &config.password_reset_role),
            permission,
        ],
    }
}

fn role_policy(name: &str, role: &str) -> PolicyRepresentation {
    PolicyRepresentation {
        name: name.to_owned(),
        kind: "role".to_owned(),
        logic: Logic::Positive,
        decision_strategy: DecisionStrategy::Unanimous,
        config: BTreeMap::from([(
            "roles".to_owned(),
            serde_json::json!([{"id": role, "required": false}]).to_string(),
        )]),
        ..Default::default()
    }
}
