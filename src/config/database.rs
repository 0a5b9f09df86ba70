use serde::{Deserialize, Serialize};

use super::Environment;

/// Environment-keyed database URLs, mirroring the deploy environments.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// TOML: `database.development`. Default: `sqlite://corral-dev.db`.
    #[serde(default = "default_development_url")]
    pub development: String,

    /// TOML: `database.production`. Default: `sqlite://corral.db`.
    #[serde(default = "default_production_url")]
    pub production: String,
}

impl DatabaseConfig {
    pub fn url_for(&self, env: Environment) -> &str {
        match env {
            Environment::Development => &self.development,
            Environment::Production => &self.production,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            development: default_development_url(),
            production: default_production_url(),
        }
    }
}

fn default_development_url() -> String {
    "sqlite://corral-dev.db".to_string()
}

fn default_production_url() -> String {
    "sqlite://corral.db".to_string()
}
