use crate::api::handlers::MessageResponse;
use crate::auth::AuthService;
use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;
use utoipa::IntoParams;

#[derive(Deserialize, IntoParams, Debug)]
pub struct VerifyEmailParams {
    /// Signed verification token from the emailed link.
    pub token: String,
}

#[utoipa::path(
    get,
    path = "/auth/verify-email",
    params(VerifyEmailParams),
    responses(
        (status = 200, description = "Email verified, token consumed", body = MessageResponse),
        (status = 400, description = "Invalid, expired, wrong-scope, or already-consumed token", body = String),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn verify_email(
    service: Extension<Arc<AuthService>>,
    params: Option<Query<VerifyEmailParams>>,
) -> impl IntoResponse {
    let params: VerifyEmailParams = match params {
        Some(Query(params)) => params,
        None => return (StatusCode::BAD_REQUEST, "Missing token".to_string()).into_response(),
    };

    match service.verify_email(&params.token).await {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse::new("Email verified successfully")),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}
