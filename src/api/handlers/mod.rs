pub mod admin;
pub mod health;
pub mod login;
pub mod me;
pub mod refresh;
pub mod register;
pub mod reset;
pub mod verify;

pub use self::admin::admin_only;
pub use self::health::health;
pub use self::login::login;
pub use self::me::me;
pub use self::refresh::{logout, refresh};
pub use self::register::register;
pub use self::reset::{request_reset, reset_password};
pub use self::verify::verify_email;

// common types and functions for the handlers
use axum::http::{header::AUTHORIZATION, HeaderMap};
use axum::{response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::store::User;

/// Public view of an account. Hashes and token slots never serialize.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub is_active: bool,
    pub role: String,
    pub is_verified: bool,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email.clone(),
            is_active: user.is_active,
            role: user.role.as_str().to_string(),
            is_verified: user.is_verified,
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Extract the token from an `Authorization: Bearer ...` header.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

// liveness root, kept out of the OpenAPI document
pub async fn root() -> impl IntoResponse {
    Json(json!({ "message": "varco is running" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Role;
    use axum::http::HeaderValue;
    use uuid::Uuid;

    #[test]
    fn bearer_token_extracts_value() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn bearer_token_rejects_missing_or_malformed() {
        let headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        assert_eq!(bearer_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn user_response_hides_credentials() {
        let user = User {
            id: Uuid::new_v4(),
            email: "a@x.com".to_string(),
            password_hash: "hash".to_string(),
            is_active: true,
            role: Role::User,
            is_verified: false,
            refresh_token: Some("refresh".to_string()),
            reset_token: None,
            email_verification_token: None,
        };

        let view = UserResponse::from(&user);
        let json = serde_json::to_string(&view).unwrap();
        assert!(json.contains("a@x.com"));
        assert!(!json.contains("hash"));
        assert!(!json.contains("refresh"));
    }
}
