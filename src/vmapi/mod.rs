//! Client for the external compute-management API.
//!
//! The remote service is VMAPI-compatible: one HTTP operation per VM
//! lifecycle action, documented at
//! <https://github.com/joyent/sdc-vmapi/blob/master/docs/index.md>.

pub mod client;
pub mod models;

pub use client::VmapiClient;
pub use models::{CreateVmRequest, JobRef, Nic, VirtualMachine};
