use crate::auth::AuthService;
use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;

/// Login payload. Deliberately a distinct type from `RegisterRequest` even
/// though the fields currently coincide; the two contracts evolve
/// independently.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Access and refresh tokens issued", body = TokenResponse),
        (status = 400, description = "Invalid credentials", body = String),
        (status = 403, description = "Email not verified", body = String),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn login(
    service: Extension<Arc<AuthService>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let request: LoginRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    match service.login(&request.email, &request.password).await {
        Ok(pair) => (
            StatusCode::OK,
            Json(TokenResponse {
                access_token: pair.access_token,
                refresh_token: pair.refresh_token,
                token_type: pair.token_type.to_string(),
            }),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}
