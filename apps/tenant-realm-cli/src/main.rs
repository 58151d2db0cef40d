mod config;
mod logging;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use secrecy::SecretString;
use tenant_realm::domain::ports::SecretStore;
use tenant_realm::infra::secrets::InMemorySecretStore;
use tenant_realm::{ModuleDeps, TenantRealmModule};
use tenant_realm_sdk::{OperationContext, Tenant};
use uuid::Uuid;

use crate::config::AppConfig;

/// Tenant Realm - provision tenant identity realms in Keycloak
#[derive(Parser)]
#[command(name = "tenant-realm")]
#[command(about = "Provision tenant identity realms in Keycloak")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print effective configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Admin user password for the password grant
    #[arg(long, env = "KEYCLOAK_ADMIN_PASSWORD", hide_env_values = true)]
    admin_password: Option<String>,

    /// Admin client secret
    #[arg(long, env = "KEYCLOAK_ADMIN_CLIENT_SECRET", hide_env_values = true)]
    admin_client_secret: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create and provision the tenant's realm, then run the other listeners
    Provision(TenantArgs),
    /// Push tenant metadata to its realm and the registry
    Update(TenantArgs),
    /// Delete the tenant's realm, registration and topics
    Delete {
        /// Tenant (realm) name
        name: String,
    },
    /// Print the tenant's realm if it exists
    Show {
        /// Tenant (realm) name
        name: String,
    },
    /// Validate configuration and exit
    Check,
}

#[derive(Args)]
struct TenantArgs {
    /// Tenant identifier, used as the realm id
    #[arg(long)]
    id: Uuid,
    /// Tenant (realm) name
    #[arg(long)]
    name: String,
    /// Human-readable description, used as the realm display name
    #[arg(long)]
    description: Option<String>,
}

impl TenantArgs {
    fn into_tenant(self) -> Tenant {
        Tenant {
            id: Some(self.id),
            name: self.name,
            description: self.description,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = cli.config.as_deref()
        && !Path::new(path).is_file()
    {
        anyhow::bail!("config file does not exist: {}", path.display());
    }

    // Layered config: defaults -> YAML (if provided) -> env (APP__*) -> CLI
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_verbosity(cli.verbose);

    if cli.print_config {
        println!("{}", config.to_pretty_json()?);
        return Ok(());
    }

    logging::init(&config.logging)?;

    if matches!(cli.command, Commands::Check) {
        config.tenant_realm.validate()?;
        println!("Configuration is valid");
        return Ok(());
    }

    let secrets = seed_admin_secrets(&config, &cli).await?;
    let module = TenantRealmModule::new(
        &config.tenant_realm,
        ModuleDeps {
            secrets,
            ..ModuleDeps::default()
        },
    )?;

    run(&module, cli.command).await
}

/// Put admin credentials from the command line into the secret store the
/// token source reads from.
async fn seed_admin_secrets(config: &AppConfig, cli: &Cli) -> Result<Arc<InMemorySecretStore>> {
    let store = Arc::new(InMemorySecretStore::default());
    let keycloak = &config.tenant_realm.keycloak;

    if let Some(password) = &cli.admin_password {
        store
            .set(&keycloak.password_key, SecretString::from(password.clone()))
            .await?;
    }
    if let Some(secret) = &cli.admin_client_secret {
        store
            .set(&keycloak.client_secret_key, SecretString::from(secret.clone()))
            .await?;
    }
    if store.is_empty() {
        tracing::warn!("no admin credentials supplied; token requests will likely be rejected");
    }
    Ok(store)
}

async fn run(module: &TenantRealmModule, command: Commands) -> Result<()> {
    let ctx = OperationContext::new();
    let listeners = module.listeners();

    match command {
        Commands::Provision(args) => {
            let tenant = args.into_tenant();
            listeners.on_tenant_create(&ctx, &tenant).await?;
            println!("Tenant '{}' provisioned", tenant.name);
        }
        Commands::Update(args) => {
            let tenant = args.into_tenant();
            listeners.on_tenant_update(&ctx, &tenant).await?;
            println!("Tenant '{}' updated", tenant.name);
        }
        Commands::Delete { name } => {
            listeners.on_tenant_delete(&ctx, &name).await?;
            println!("Tenant '{name}' deleted");
        }
        Commands::Show { name } => {
            let Some(realm) = module.orchestrator().find_realm(&name).await? else {
                anyhow::bail!("realm '{name}' not found");
            };
            println!("{}", serde_json::to_string_pretty(&realm)?);
        }
        Commands::Check => {}
    }
    Ok(())
}
