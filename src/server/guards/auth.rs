use crate::auth::token;
use crate::server::router::AppState;
use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use serde_json::json;

/// Authenticated caller, extracted from a `Authorization: Bearer` header
/// carrying a token issued by the login route.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// The `sub` claim: the caller's user id.
    pub id: String,
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let bearer = parts
            .headers
            .typed_get::<Authorization<Bearer>>()
            .ok_or(AuthRejection::MissingToken)?;

        let claims = token::verify_token(bearer.token(), &state.auth)
            .map_err(|_| AuthRejection::InvalidToken)?;

        Ok(CurrentUser { id: claims.sub })
    }
}

pub enum AuthRejection {
    MissingToken,
    InvalidToken,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let (status, reason) = match self {
            AuthRejection::MissingToken => (StatusCode::UNAUTHORIZED, "Missing bearer token"),
            AuthRejection::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid bearer token"),
        };
        (
            status,
            Json(json!({ "error": "unauthorized", "reason": reason })),
        )
            .into_response()
    }
}
