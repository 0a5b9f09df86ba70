use backon::{ExponentialBuilder, Retryable};
use reqwest::Method;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{error, info, warn};
use url::Url;

use super::models::{CreateVmRequest, JobRef, VirtualMachine};
use crate::config::VmapiConfig;
use crate::error::{IsRetryable, VmapiError};

const USER_AGENT: &str = concat!("corral/", env!("CARGO_PKG_VERSION"));

/// Thin client over the remote VMAPI-compatible endpoint. Transient
/// transport failures are retried with bounded exponential backoff;
/// application-level errors from the remote API are surfaced as-is.
pub struct VmapiClient {
    client: reqwest::Client,
    endpoint: Url,
    retry_policy: ExponentialBuilder,
}

impl VmapiClient {
    pub fn new(cfg: &VmapiConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(cfg.connect_timeout_secs))
            .timeout(Duration::from_secs(cfg.request_timeout_secs))
            .build()
            .expect("failed to build reqwest client");

        let retry_policy = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(100))
            .with_max_delay(Duration::from_millis(300))
            .with_max_times(cfg.retry_max_times)
            .with_jitter();

        Self {
            client,
            endpoint: cfg.endpoint.clone(),
            retry_policy,
        }
    }

    pub async fn list_vms(&self) -> Result<Vec<VirtualMachine>, VmapiError> {
        info!("fetching virtual machines from VmApi");
        let url = self.endpoint.join("vms")?;
        self.dispatch(Method::GET, url, None)
            .await
            .inspect_err(|err| error!(error = %err, "failed to fetch virtual machines from VmApi"))
    }

    pub async fn list_vms_by_owner(
        &self,
        owner_uuid: &str,
    ) -> Result<Vec<VirtualMachine>, VmapiError> {
        info!(owner_uuid, "fetching virtual machines from VmApi by owner");
        let mut url = self.endpoint.join("vms")?;
        url.query_pairs_mut()
            .append_pair("query", &owner_filter(owner_uuid));
        self.dispatch(Method::GET, url, None).await.inspect_err(
            |err| error!(owner_uuid, error = %err, "failed to fetch virtual machines from VmApi by owner"),
        )
    }

    pub async fn get_vm(&self, vm_uuid: &str) -> Result<VirtualMachine, VmapiError> {
        info!(vm_uuid, "fetching virtual machine from VmApi");
        let url = self.vm_url(vm_uuid)?;
        self.dispatch(Method::GET, url, None)
            .await
            .inspect_err(|err| {
                error!(vm_uuid, error = %err, "failed to fetch virtual machine from VmApi");
            })
    }

    pub async fn create_vm(&self, request: &CreateVmRequest) -> Result<JobRef, VmapiError> {
        info!(
            owner_uuid = %request.owner_uuid,
            brand = %request.brand,
            "creating new virtual machine"
        );
        let url = self.endpoint.join("vms")?;
        let body = serde_json::to_value(request)?;
        self.dispatch(Method::POST, url, Some(body))
            .await
            .inspect_err(|err| error!(error = %err, "failed to create vm"))
    }

    pub async fn start_vm(&self, owner_uuid: &str, vm_uuid: &str) -> Result<JobRef, VmapiError> {
        self.vm_action(owner_uuid, vm_uuid, "start").await
    }

    pub async fn stop_vm(&self, owner_uuid: &str, vm_uuid: &str) -> Result<JobRef, VmapiError> {
        self.vm_action(owner_uuid, vm_uuid, "stop").await
    }

    pub async fn reboot_vm(&self, owner_uuid: &str, vm_uuid: &str) -> Result<JobRef, VmapiError> {
        self.vm_action(owner_uuid, vm_uuid, "reboot").await
    }

    pub async fn add_nics(
        &self,
        owner_uuid: &str,
        vm_uuid: &str,
        network_uuid: &str,
    ) -> Result<JobRef, VmapiError> {
        info!(vm_uuid, network_uuid, "adding virtual machine to network");
        let url = self.action_url(vm_uuid, "add_nics")?;
        let body = json!({
            "uuid": vm_uuid,
            "owner_uuid": owner_uuid,
            "action": "add_nics",
            "networks": [network_uuid],
        });
        self.dispatch(Method::POST, url, Some(body))
            .await
            .inspect_err(|err| error!(vm_uuid, error = %err, "failed to add vm to network"))
    }

    pub async fn remove_nics(
        &self,
        owner_uuid: &str,
        vm_uuid: &str,
        mac: &str,
    ) -> Result<JobRef, VmapiError> {
        info!(vm_uuid, mac, "removing NIC from virtual machine");
        let url = self.action_url(vm_uuid, "remove_nics")?;
        let body = json!({
            "uuid": vm_uuid,
            "owner_uuid": owner_uuid,
            "action": "remove_nics",
            "macs": [mac],
        });
        self.dispatch(Method::POST, url, Some(body))
            .await
            .inspect_err(|err| error!(vm_uuid, error = %err, "failed to remove NIC from vm"))
    }

    pub async fn delete_vm(&self, owner_uuid: &str, vm_uuid: &str) -> Result<JobRef, VmapiError> {
        info!(vm_uuid, "deleting virtual machine");
        let mut url = self.vm_url(vm_uuid)?;
        url.query_pairs_mut()
            .append_pair("owner_uuid", owner_uuid)
            .append_pair("sync", "true");
        let body = json!({ "uuid": vm_uuid, "owner_uuid": owner_uuid });
        self.dispatch(Method::DELETE, url, Some(body))
            .await
            .inspect_err(|err| error!(vm_uuid, error = %err, "failed to delete vm"))
    }

    async fn vm_action(
        &self,
        owner_uuid: &str,
        vm_uuid: &str,
        action: &str,
    ) -> Result<JobRef, VmapiError> {
        info!(vm_uuid, action, "submitting virtual machine action");
        let url = self.action_url(vm_uuid, action)?;
        let body = json!({
            "uuid": vm_uuid,
            "owner_uuid": owner_uuid,
            "action": action,
        });
        self.dispatch(Method::POST, url, Some(body))
            .await
            .inspect_err(|err| error!(vm_uuid, action, error = %err, "failed to {action} vm"))
    }

    fn vm_url(&self, vm_uuid: &str) -> Result<Url, VmapiError> {
        Ok(self.endpoint.join(&format!("vms/{vm_uuid}"))?)
    }

    fn action_url(&self, vm_uuid: &str, action: &str) -> Result<Url, VmapiError> {
        let mut url = self.vm_url(vm_uuid)?;
        url.query_pairs_mut()
            .append_pair("action", action)
            .append_pair("sync", "true");
        Ok(url)
    }

    async fn dispatch<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
    ) -> Result<T, VmapiError> {
        let client = self.client.clone();
        let op = move || {
            let client = client.clone();
            let method = method.clone();
            let url = url.clone();
            let body = body.clone();
            async move { send_once(client, method, url, body).await }
        };

        let bytes = op
            .retry(&self.retry_policy)
            .when(|err: &VmapiError| err.is_retryable())
            .notify(|err: &VmapiError, dur: Duration| {
                warn!(error = %err, "retrying VmApi request after {dur:?}");
            })
            .await?;

        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// LDAP-style search filter selecting one owner's machines and excluding
/// destroyed ones, as the remote API expects in its `query` parameter.
fn owner_filter(owner_uuid: &str) -> String {
    format!("(&(owner_uuid={owner_uuid})(!(state=destroyed)))")
}

async fn send_once(
    client: reqwest::Client,
    method: Method,
    url: Url,
    body: Option<Value>,
) -> Result<Vec<u8>, VmapiError> {
    let mut request = client.request(method, url);
    if let Some(body) = &body {
        request = request.json(body);
    }

    let response = request.send().await?;
    let status = response.status();
    let bytes = response.bytes().await?;

    if !status.is_success() {
        let (code, message) = match serde_json::from_slice::<UpstreamErrorBody>(&bytes) {
            Ok(parsed) => (Some(parsed.code), Some(parsed.message)),
            Err(_) => (None, None),
        };
        return Err(VmapiError::Upstream {
            status,
            code,
            message,
        });
    }

    Ok(bytes.to_vec())
}

/// Structured error body the remote API returns alongside non-2xx statuses.
#[derive(Debug, Deserialize)]
struct UpstreamErrorBody {
    code: String,
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> VmapiClient {
        VmapiClient::new(&VmapiConfig::default())
    }

    #[test]
    fn owner_filter_excludes_destroyed_machines() {
        assert_eq!(
            owner_filter("abc-123"),
            "(&(owner_uuid=abc-123)(!(state=destroyed)))"
        );
    }

    #[test]
    fn vm_urls_target_the_vms_collection() {
        let client = test_client();
        let url = client.vm_url("vm-1").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/vms/vm-1");
    }

    #[test]
    fn action_urls_carry_action_and_sync_flags() {
        let client = test_client();
        let url = client.action_url("vm-1", "reboot").unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8080/vms/vm-1?action=reboot&sync=true"
        );
    }

    #[test]
    fn nic_removal_uses_the_remove_action() {
        // The portal this replaces reused add_nics when detaching; the remote
        // API's contract wants remove_nics.
        let client = test_client();
        let url = client.action_url("vm-1", "remove_nics").unwrap();
        assert!(url.as_str().contains("action=remove_nics"));
    }

    #[test]
    fn owner_query_is_percent_encoded() {
        let client = test_client();
        let mut url = client.endpoint.join("vms").unwrap();
        url.query_pairs_mut()
            .append_pair("query", &owner_filter("abc-123"));
        let q = url.query().unwrap();
        assert!(q.contains("%26"), "ampersand should be encoded: {q}");
        assert!(q.contains("%21"), "bang should be encoded: {q}");
    }
}
