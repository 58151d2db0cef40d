use super::error::RealmError;
use super::model::RoleRepresentation;
use super::step::ResourceStepExecutor;

/// The realm roles every tenant realm carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionedRoles {
    pub system: RoleRepresentation,
    pub password_reset: RoleRepresentation,
}

/// Creates the system role and the password-reset role.
#[derive(Clone)]
pub struct RoleProvisioner {
    executor: ResourceStepExecutor,
    system_role: String,
    password_reset_role: String,
}

impl RoleProvisioner {
    #[must_use]
    pub fn new(
        executor: ResourceStepExecutor,
        system_role: impl Into<String>,
        password_reset_role: impl Into<String>,
    ) -> Self {
        Self {
            executor,
            system_role: system_role.into(),
            password_reset_role: password_reset_role.into(),
        }
    }

    /// # Errors
    ///
    /// Returns [`RealmError::Integration`] naming the role that failed.
    #[tracing::instrument(skip(self))]
    pub async fn create_roles(&self, realm: &str) -> Result<ProvisionedRoles, RealmError> {
        let system = self
            .create_role(realm, &self.system_role, "Role of module service accounts")
            .await?;
        let password_reset = self
            .create_role(realm, &self.password_reset_role, "Allows resetting user passwords")
            .await?;
        tracing::info!(realm, "realm roles created");
        Ok(ProvisionedRoles {
            system,
            password_reset,
        })
    }

    async fn create_role(
        &self,
        realm: &str,
        name: &str,
        description: &str,
    ) -> Result<RoleRepresentation, RealmError> {
        let mut role = RoleRepresentation {
            id: None,
            name: name.to_owned(),
            description: Some(description.to_owned()),
        };
        let id = self
            .executor
            .create(&role, |api, token| api.create_role(token, realm, &role))
            .await?;
        role.id = Some(id);
        Ok(role)
    }
}
