use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use serde::Deserialize;

use crate::error::ApiError;
use crate::server::guards::CurrentUser;
use crate::server::router::AppState;
use crate::vmapi::models::{CreateVmRequest, JobRef, VirtualMachine};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/vms", get(list_vms).post(provision_vm))
        .route("/vms/{uuid}", get(get_vm).delete(delete_vm))
        .route("/vms/{uuid}/start", post(start_vm))
        .route("/vms/{uuid}/stop", post(stop_vm))
        .route("/vms/{uuid}/reboot", post(reboot_vm))
        .route("/vms/{uuid}/nics", post(attach_network))
        .route("/vms/{uuid}/nics/{mac}", delete(detach_network))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub owner_uuid: Option<String>,
    /// List every machine instead of one owner's.
    #[serde(default)]
    pub all: bool,
}

async fn list_vms(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<VirtualMachine>>, ApiError> {
    if query.all {
        return Ok(Json(state.vmapi.list_vms().await?));
    }
    let owner = query.owner_uuid.unwrap_or_else(|| user.id.clone());
    Ok(Json(state.vmapi.list_vms_by_owner(&owner).await?))
}

async fn get_vm(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(uuid): Path<String>,
) -> Result<Json<VirtualMachine>, ApiError> {
    let vm = state.vmapi.get_vm(&uuid).await?;
    if vm.owner_uuid != user.id {
        return Err(ApiError::NotFound(format!(
            "virtual machine {uuid} not found"
        )));
    }
    Ok(Json(vm))
}

#[derive(Debug, Deserialize)]
pub struct ProvisionPayload {
    #[serde(default)]
    pub alias: Option<String>,
    pub brand: String,
    pub image_uuid: String,
    pub ram: u64,
    #[serde(default)]
    pub networks: Vec<String>,
}

async fn provision_vm(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<ProvisionPayload>,
) -> Result<(StatusCode, Json<JobRef>), ApiError> {
    if payload.brand.trim().is_empty() || payload.image_uuid.trim().is_empty() {
        return Err(ApiError::Validation(
            "brand and image_uuid are required".to_string(),
        ));
    }

    let request = CreateVmRequest {
        owner_uuid: user.id,
        alias: payload.alias,
        brand: payload.brand,
        image_uuid: payload.image_uuid,
        ram: payload.ram,
        networks: payload.networks,
    };

    Ok((
        StatusCode::ACCEPTED,
        Json(state.vmapi.create_vm(&request).await?),
    ))
}

async fn start_vm(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(uuid): Path<String>,
) -> Result<Json<JobRef>, ApiError> {
    Ok(Json(state.vmapi.start_vm(&user.id, &uuid).await?))
}

async fn stop_vm(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(uuid): Path<String>,
) -> Result<Json<JobRef>, ApiError> {
    Ok(Json(state.vmapi.stop_vm(&user.id, &uuid).await?))
}

async fn reboot_vm(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(uuid): Path<String>,
) -> Result<Json<JobRef>, ApiError> {
    Ok(Json(state.vmapi.reboot_vm(&user.id, &uuid).await?))
}

#[derive(Debug, Deserialize)]
pub struct AttachNetworkPayload {
    pub network_uuid: String,
}

async fn attach_network(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(uuid): Path<String>,
    Json(payload): Json<AttachNetworkPayload>,
) -> Result<Json<JobRef>, ApiError> {
    if payload.network_uuid.trim().is_empty() {
        return Err(ApiError::Validation("network_uuid is required".to_string()));
    }
    Ok(Json(
        state
            .vmapi
            .add_nics(&user.id, &uuid, &payload.network_uuid)
            .await?,
    ))
}

async fn detach_network(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((uuid, mac)): Path<(String, String)>,
) -> Result<Json<JobRef>, ApiError> {
    Ok(Json(state.vmapi.remove_nics(&user.id, &uuid, &mac).await?))
}

async fn delete_vm(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(uuid): Path<String>,
) -> Result<Json<JobRef>, ApiError> {
    Ok(Json(state.vmapi.delete_vm(&user.id, &uuid).await?))
}
