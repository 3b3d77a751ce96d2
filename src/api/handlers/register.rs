use crate::api::handlers::UserResponse;
use crate::auth::{normalize_email, valid_email, AuthService};
use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created, verification email dispatched", body = UserResponse),
        (status = 400, description = "Email already registered or invalid payload", body = String),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn register(
    service: Extension<Arc<AuthService>>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let request: RegisterRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()).into_response(),
    };

    if !valid_email(&normalize_email(&request.email)) {
        return (StatusCode::BAD_REQUEST, "Invalid email".to_string()).into_response();
    }

    if request.password.is_empty() {
        return (StatusCode::BAD_REQUEST, "Invalid password".to_string()).into_response();
    }

    match service.register(&request.email, &request.password).await {
        Ok(user) => (StatusCode::OK, Json(UserResponse::from(&user))).into_response(),
        Err(err) => err.into_response(),
    }
}
