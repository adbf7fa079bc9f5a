//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Identity provider configuration.
    pub identity: IdentityConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Identity provider configuration.
///
/// Faktura does not mint its own credentials; it verifies ID tokens issued
/// by an external provider for the configured project.
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    /// Provider project identifier (token audience).
    pub project_id: String,
    /// JWKS endpoint publishing the provider's signing keys.
    #[serde(default = "default_jwks_url")]
    pub jwks_url: String,
    /// Expected token issuer prefix; the project id is appended.
    #[serde(default = "default_issuer_prefix")]
    pub issuer_prefix: String,
}

fn default_jwks_url() -> String {
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com"
        .to_string()
}

fn default_issuer_prefix() -> String {
    "https://securetoken.google.com/".to_string()
}

impl IdentityConfig {
    /// Returns the full expected issuer for this project.
    #[must_use]
    pub fn issuer(&self) -> String {
        format!("{}{}", self.issuer_prefix, self.project_id)
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("FAKTURA").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_issuer() {
        let cfg = IdentityConfig {
            project_id: "faktura-dev".to_string(),
            jwks_url: default_jwks_url(),
            issuer_prefix: default_issuer_prefix(),
        };
        assert_eq!(cfg.issuer(), "https://securetoken.google.com/faktura-dev");
    }

    #[test]
    fn test_defaults() {
        assert_eq!(default_host(), "0.0.0.0");
        assert_eq!(default_port(), 8080);
        assert_eq!(default_max_connections(), 10);
        assert_eq!(default_min_connections(), 1);
    }
}
