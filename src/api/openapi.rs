use crate::api::handlers;
use axum::Json;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::register::register,
        handlers::login::login,
        handlers::me::me,
        handlers::refresh::refresh,
        handlers::refresh::logout,
        handlers::admin::admin_only,
        handlers::reset::request_reset,
        handlers::reset::reset_password,
        handlers::verify::verify_email,
    ),
    components(schemas(
        handlers::health::Health,
        handlers::register::RegisterRequest,
        handlers::login::LoginRequest,
        handlers::login::TokenResponse,
        handlers::refresh::AccessTokenResponse,
        handlers::reset::PasswordResetRequest,
        handlers::reset::PasswordResetConfirm,
        handlers::UserResponse,
        handlers::MessageResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration, login, tokens, reset, verification, RBAC"),
        (name = "health", description = "Service health"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

// serves the generated document; there is no bundled UI
pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
