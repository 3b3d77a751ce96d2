use crate::api::handlers::MessageResponse;
use crate::auth::AuthService;
use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct PasswordResetConfirm {
    pub token: String,
    pub new_password: String,
}

#[utoipa::path(
    post,
    path = "/auth/request-reset",
    request_body = PasswordResetRequest,
    responses(
        (status = 200, description = "Reset link dispatched", body = MessageResponse),
        (status = 404, description = "No account for this email", body = String),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn request_reset(
    service: Extension<Arc<AuthService>>,
    payload: Option<Json<PasswordResetRequest>>,
) -> impl IntoResponse {
    let request: PasswordResetRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    match service.request_reset(&request.email).await {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse::new("Password reset link sent to email")),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/auth/reset-password",
    request_body = PasswordResetConfirm,
    responses(
        (status = 200, description = "Password updated, reset token consumed", body = MessageResponse),
        (status = 400, description = "Invalid, expired, wrong-scope, or already-consumed token", body = String),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn reset_password(
    service: Extension<Arc<AuthService>>,
    payload: Option<Json<PasswordResetConfirm>>,
) -> impl IntoResponse {
    let request: PasswordResetConfirm = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    if request.new_password.is_empty() {
        return (StatusCode::BAD_REQUEST, "Invalid password".to_string()).into_response();
    }

    match service
        .confirm_reset(&request.token, &request.new_password)
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse::new("Password updated successfully")),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}
