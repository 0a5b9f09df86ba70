use axum::{Json, extract::State, http::StatusCode};
use serde::Deserialize;

use crate::auth::password;
use crate::db::{NewUser, User};
use crate::error::ApiError;
use crate::server::router::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateUserPayload {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// `POST /users`: register a new portal account.
///
/// The insert runs inside an explicit transaction on a request-scoped unit
/// of work; a failed insert is rolled back before the error surfaces.
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserPayload>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    if payload.username.trim().is_empty()
        || payload.password.is_empty()
        || payload.first_name.trim().is_empty()
        || payload.last_name.trim().is_empty()
    {
        return Err(ApiError::Validation(
            "username, password, first_name and last_name are required".to_string(),
        ));
    }

    let hashed = password::hash_password(payload.password).await?;

    let mut uow = state.provider.unit_of_work();
    uow.begin_transaction().await?;

    let created = match uow
        .users()
        .create(NewUser {
            username: payload.username,
            password: hashed,
            first_name: payload.first_name,
            last_name: payload.last_name,
        })
        .await
    {
        Ok(user) => user,
        // The unit of work has already rolled the transaction back.
        Err(err) if err.is_unique_violation() => {
            return Err(ApiError::Conflict("username is already taken".to_string()));
        }
        Err(err) => return Err(err.into()),
    };

    uow.commit_transaction().await?;

    Ok((StatusCode::CREATED, Json(created)))
}
