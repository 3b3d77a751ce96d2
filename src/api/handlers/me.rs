use crate::api::handlers::{bearer_token, UserResponse};
use crate::auth::{AuthError, AuthService};
use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::instrument;

#[utoipa::path(
    get,
    path = "/auth/me",
    responses(
        (status = 200, description = "The authenticated account", body = UserResponse),
        (status = 401, description = "Missing, invalid, expired, or wrong-scope token", body = String),
        (status = 404, description = "Token subject no longer resolves to an account", body = String),
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn me(headers: HeaderMap, service: Extension<Arc<AuthService>>) -> impl IntoResponse {
    let token = match bearer_token(&headers) {
        Some(token) => token,
        None => return AuthError::Unauthenticated.into_response(),
    };

    match service.authenticate(token).await {
        Ok(user) => (StatusCode::OK, Json(UserResponse::from(&user))).into_response(),
        Err(err) => err.into_response(),
    }
}
