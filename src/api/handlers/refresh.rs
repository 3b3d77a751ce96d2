use crate::api::handlers::{bearer_token, MessageResponse};
use crate::auth::{AuthError, AuthService};
use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AccessTokenResponse {
    pub access_token: String,
    pub token_type: String,
}

/// The Bearer credential here is the refresh token itself: it must decode
/// with scope `refresh` and still equal the account's stored slot.
#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "New access token issued", body = AccessTokenResponse),
        (status = 401, description = "Invalid, expired, wrong-scope, or superseded refresh token", body = String),
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn refresh(headers: HeaderMap, service: Extension<Arc<AuthService>>) -> impl IntoResponse {
    let token = match bearer_token(&headers) {
        Some(token) => token,
        None => return AuthError::Unauthenticated.into_response(),
    };

    match service.refresh(token).await {
        Ok(access_token) => (
            StatusCode::OK,
            Json(AccessTokenResponse {
                access_token,
                token_type: "bearer".to_string(),
            }),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 200, description = "Refresh token slot cleared", body = MessageResponse),
        (status = 401, description = "Missing or invalid access token", body = String),
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn logout(headers: HeaderMap, service: Extension<Arc<AuthService>>) -> impl IntoResponse {
    let token = match bearer_token(&headers) {
        Some(token) => token,
        None => return AuthError::Unauthenticated.into_response(),
    };

    let user = match service.authenticate(token).await {
        Ok(user) => user,
        Err(err) => return err.into_response(),
    };

    match service.logout(&user).await {
        Ok(()) => (
            StatusCode::OK,
            Json(MessageResponse::new("Successfully logged out")),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}
