//! Grants the impersonation client the built-in `impersonate` permission.

use crate::domain::error::{CallError, RealmError};
use crate::domain::model::{ClientRepresentation, DecisionStrategy, Logic, PolicyRepresentation};
use crate::domain::step::ResourceStepExecutor;

pub const REALM_MANAGEMENT_CLIENT: &str = "realm-management";
pub const IMPERSONATE_SCOPE: &str = "impersonate";

/// Bind `client` to the `impersonate` permission of `realm-management`:
/// enable users-management permissions, create a client policy scoped to
/// `client`, and append that policy to the permission.
pub(super) async fn grant_impersonation(
    executor: &ResourceStepExecutor,
    realm: &str,
    client: &ClientRepresentation,
) -> Result<(), RealmError> {
    let client_uuid = client.id.as_deref().ok_or_else(|| {
        RealmError::integration(format!("Client '{}' has no id", client.client_id))
    })?;
    let gateway = executor.gateway();

    let management = find_realm_management(executor, realm).await?;
    let resource_server_id = management.id.as_deref().ok_or_else(|| {
        RealmError::integration(format!("Client '{REALM_MANAGEMENT_CLIENT}' has no id"))
    })?;

    let permissions = gateway
        .execute(
            &format!("Failed to enable users management permissions for realm: {realm}"),
            |api, token| api.enable_users_management_permissions(token, realm),
        )
        .await?;
    let permission_id = permissions
        .scope_permissions
        .get(IMPERSONATE_SCOPE)
        .cloned()
        .ok_or_else(|| RealmError::not_found(format!("'{IMPERSONATE_SCOPE}' permission")))?;

    let policy = PolicyRepresentation {
        name: format!("{} policy", client.client_id),
        description: Some(format!("Allows '{}' to impersonate users", client.client_id)),
        kind: "client".to_owned(),
        logic: Logic::Positive,
        decision_strategy: DecisionStrategy::Unanimous,
        clients: Some(vec![client_uuid.to_owned()]),
        ..Default::default()
    };
    let policy_id = executor
        .create(&policy, |api, token| {
            api.create_client_policy(token, realm, resource_server_id, &policy)
        })
        .await?;

    let policy_id = policy_id.as_str();
    let permission_id = permission_id.as_str();
    gateway
        .execute(
            &format!("Failed to update '{IMPERSONATE_SCOPE}' permission for realm: {realm}"),
            |api, token| async move {
                let mut permission = api
                    .get_scope_permission(token.clone(), realm, resource_server_id, permission_id)
                    .await?;
                let associated = api
                    .get_associated_policies(token.clone(), realm, resource_server_id, permission_id)
                    .await?;

                let mut policies: Vec<String> =
                    associated.into_iter().filter_map(|p| p.id).collect();
                if !policies.iter().any(|id| id == policy_id) {
                    policies.push(policy_id.to_owned());
                }
                permission.policies = Some(policies);

                api.update_scope_permission(token, realm, resource_server_id, &permission)
                    .await?;
                Ok::<_, CallError>(())
            },
        )
        .await?;

    tracing::info!(realm, client_id = %client.client_id, "impersonation granted");
    Ok(())
}

async fn find_realm_management(
    executor: &ResourceStepExecutor,
    realm: &str,
) -> Result<ClientRepresentation, RealmError> {
    let mut found = executor
        .gateway()
        .execute(
            &format!("Failed to look up client '{REALM_MANAGEMENT_CLIENT}' in realm: {realm}"),
            |api, token| api.find_clients(token, realm, REALM_MANAGEMENT_CLIENT),
        )
        .await?;

    match found.len() {
        0 => Err(RealmError::not_found(format!(
            "client '{REALM_MANAGEMENT_CLIENT}'"
        ))),
        1 => Ok(found.remove(0)),
        count => Err(RealmError::too_many(
            format!("client '{REALM_MANAGEMENT_CLIENT}'"),
            count,
        )),
    }
}
