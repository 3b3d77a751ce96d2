use crate::api::handlers::{bearer_token, MessageResponse};
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
    path = "/auth/admin-only",
    responses(
        (status = 200, description = "Caller holds the admin role", body = MessageResponse),
        (status = 401, description = "Missing or invalid access token", body = String),
        (status = 403, description = "Caller is not an admin", body = String),
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn admin_only(
    headers: HeaderMap,
    service: Extension<Arc<AuthService>>,
) -> impl IntoResponse {
    let token = match bearer_token(&headers) {
        Some(token) => token,
        None => return AuthError::Unauthenticated.into_response(),
    };

    let user = match service.authenticate(token).await {
        Ok(user) => user,
        Err(err) => return err.into_response(),
    };

    if let Err(err) = service.require_admin(&user) {
        return err.into_response();
    }

    (
        StatusCode::OK,
        Json(MessageResponse::new(format!("Welcome Admin {}", user.email))),
    )
        .into_response()
}
