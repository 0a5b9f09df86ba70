use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Token issuance settings managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// HS256 signing secret for bearer tokens (required, non-empty).
    /// TOML: `auth.jwt_secret`. Must be provided.
    #[serde(default)]
    #[serde(deserialize_with = "deserialize_string_lax")]
    pub jwt_secret: String,

    /// Validity window for issued tokens, in seconds.
    /// TOML: `auth.jwt_valid_secs`. Default: `86400` (one day).
    #[serde(default = "default_jwt_valid_secs")]
    pub jwt_valid_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            // No insecure default. `Config::from_toml()` enforces non-empty.
            jwt_secret: String::new(),
            jwt_valid_secs: default_jwt_valid_secs(),
        }
    }
}

fn deserialize_string_lax<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;

    match v {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(serde::de::Error::custom(
            "expected a string or a number for auth.jwt_secret",
        )),
    }
}

fn default_jwt_valid_secs() -> u64 {
    86_400
}
