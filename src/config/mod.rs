mod auth;
mod basic;
mod database;
mod vmapi;

pub use auth::AuthConfig;
pub use basic::{BasicConfig, Environment};
pub use database::DatabaseConfig;
pub use vmapi::VmapiConfig;

use figment::{
    Figment,
    providers::{Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Application configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// Core server configuration (see `basic` table in config.toml).
    #[serde(default)]
    pub basic: BasicConfig,

    /// Environment-keyed database URLs (see `database` table in config.toml).
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Token issuance settings (see `auth` table in config.toml).
    #[serde(default)]
    pub auth: AuthConfig,

    /// Remote compute-management API settings (see `vmapi` table in config.toml).
    #[serde(default)]
    pub vmapi: VmapiConfig,
}

const DEFAULT_CONFIG_FILE: &str = "config.toml";

impl Config {
    /// Builds a Figment that merges defaults and a config TOML file.
    pub fn figment() -> Figment {
        let figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if PathBuf::from(DEFAULT_CONFIG_FILE).is_file() {
            figment.merge(Toml::file(DEFAULT_CONFIG_FILE))
        } else {
            figment
        }
    }

    /// Loads configuration from the TOML file (with defaults) and validates required fields.
    /// Refusing an empty `auth.jwt_secret` keeps the binary from running with forgeable tokens.
    pub fn from_toml() -> Self {
        if !PathBuf::from(DEFAULT_CONFIG_FILE).is_file() {
            panic!("config file not found: {DEFAULT_CONFIG_FILE}");
        }
        let cfg: Self = Self::figment().extract().unwrap_or_else(|err| {
            panic!("failed to extract configuration from {DEFAULT_CONFIG_FILE}: {err}")
        });
        if cfg.auth.jwt_secret.trim().is_empty() {
            panic!("auth.jwt_secret must be set and non-empty");
        }
        cfg
    }

    /// Database URL for the configured environment.
    pub fn database_url(&self) -> &str {
        self.database.url_for(self.basic.env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_select_development_database() {
        let cfg = Config::default();
        assert_eq!(cfg.basic.env, Environment::Development);
        assert_eq!(cfg.database_url(), "sqlite://corral-dev.db");
    }

    #[test]
    fn production_database_url_is_selected_by_env() {
        let mut cfg = Config::default();
        cfg.basic.env = Environment::Production;
        assert_eq!(cfg.database_url(), "sqlite://corral.db");
    }
}
