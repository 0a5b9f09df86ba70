use serde::{Deserialize, Serialize};

/// A virtual machine record as reported by the remote API. Only the fields
/// the portal surfaces are modeled; the rest of the upstream payload is
/// ignored on decode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VirtualMachine {
    pub uuid: String,
    #[serde(default)]
    pub alias: Option<String>,
    pub state: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub ram: Option<u64>,
    pub owner_uuid: String,
    #[serde(default)]
    pub nics: Vec<Nic>,
}

/// A network interface attached to a virtual machine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Nic {
    pub mac: String,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub network_uuid: Option<String>,
    #[serde(default)]
    pub primary: Option<bool>,
}

/// Provisioning payload forwarded to the remote API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVmRequest {
    pub owner_uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    pub brand: String,
    pub image_uuid: String,
    pub ram: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub networks: Vec<String>,
}

/// Job reference returned by mutating operations; the remote API queues
/// lifecycle actions even when asked to run synchronously.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobRef {
    #[serde(default)]
    pub job_uuid: Option<String>,
    #[serde(default)]
    pub vm_uuid: Option<String>,
}
