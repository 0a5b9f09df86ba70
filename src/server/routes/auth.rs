use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::{password, token};
use crate::error::ApiError;
use crate::server::router::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub status: i32,
    pub message: String,
    pub data: Option<Value>,
}

/// `POST /auth`: verify credentials and hand the bearer token back in the
/// `Authorization` response header.
///
/// A credential mismatch is a client-facing 401, not a system error, and
/// neither outcome leaves an open transaction behind: the lookup runs
/// un-transacted on a request-scoped unit of work.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<Response, ApiError> {
    if payload.username.trim().is_empty() || payload.password.is_empty() {
        return Err(ApiError::Validation(
            "username and password are required".to_string(),
        ));
    }

    let mut uow = state.provider.unit_of_work();
    let user = uow.users().get_by_username(&payload.username).await?;

    let Some(user) = user else {
        return Err(ApiError::Unauthorized);
    };

    if !password::verify_password(payload.password, user.password.clone()).await? {
        return Err(ApiError::Unauthorized);
    }

    let bearer = token::issue_token(&user.id, &state.auth)?;

    let body = LoginResponse {
        status: 0,
        message: "success".to_string(),
        data: None,
    };

    Ok((
        StatusCode::OK,
        [
            (header::AUTHORIZATION, format!("Bearer {bearer}")),
            (
                header::ACCESS_CONTROL_EXPOSE_HEADERS,
                "Authorization".to_string(),
            ),
        ],
        Json(body),
    )
        .into_response())
}
