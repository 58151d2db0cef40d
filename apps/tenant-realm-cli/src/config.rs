//! Layered application configuration.

use std::path::Path;

use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::{Deserialize, Serialize};
use tenant_realm::TenantRealmConfig;

/// Environment variable prefix; `__` separates nested keys.
pub const ENV_PREFIX: &str = "APP__";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub tenant_realm: TenantRealmConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Defaults, then the YAML file (if any), then `APP__*` environment
    /// variables.
    ///
    /// # Errors
    ///
    /// Fails when a source cannot be read or a value has the wrong shape.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("invalid configuration")
    }

    /// Apply `-v` flags on top of the configured level.
    pub fn apply_verbosity(&mut self, verbose: u8) {
        let level = match verbose {
            0 => return,
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        level.clone_into(&mut self.logging.level);
    }

    /// # Errors
    ///
    /// Fails only if serialization fails.
    pub fn to_pretty_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("failed to render configuration")
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn yaml_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "logging:\n  json: true\ntenant_realm:\n  keycloak:\n    base_url: http://kc:8080\n    grant_type: client_credentials\n  clients:\n    system_role: Service\n"
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path())).unwrap();
        assert!(config.logging.json);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.tenant_realm.keycloak.base_url, "http://kc:8080");
        assert_eq!(config.tenant_realm.clients.system_role, "Service");
        assert_eq!(
            config.tenant_realm.clients.password_reset_role,
            "Password Reset"
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "tenant_realm:\n  keycloak:\n    base_uri: http://kc\n").unwrap();

        assert!(AppConfig::load(Some(file.path())).is_err());
    }

    #[test]
    fn verbosity_raises_level() {
        let mut config = AppConfig::default();
        config.apply_verbosity(0);
        assert_eq!(config.logging.level, "info");
        config.apply_verbosity(2);
        assert_eq!(config.logging.level, "debug");
        config.apply_verbosity(5);
        assert_eq!(config.logging.level, "trace");
    }
}
