use serde::{Deserialize, Serialize};
use url::Url;

/// Remote compute-management API (VMAPI) settings managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VmapiConfig {
    /// Base endpoint of the VMAPI-compatible service.
    /// TOML: `vmapi.endpoint`. Default: `http://127.0.0.1:8080`.
    #[serde(default = "default_endpoint")]
    pub endpoint: Url,

    /// TCP connect timeout in seconds.
    /// TOML: `vmapi.connect_timeout_secs`. Default: `10`.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Whole-request timeout in seconds.
    /// TOML: `vmapi.request_timeout_secs`. Default: `60`.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Maximum retry attempts for transient transport failures.
    /// TOML: `vmapi.retry_max_times`. Default: `3`.
    #[serde(default = "default_retry_max_times")]
    pub retry_max_times: usize,
}

impl Default for VmapiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            retry_max_times: default_retry_max_times(),
        }
    }
}

fn default_endpoint() -> Url {
    Url::parse("http://127.0.0.1:8080").expect("default vmapi endpoint must parse")
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_retry_max_times() -> usize {
    3
}
