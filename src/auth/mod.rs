//! Auth orchestrator: composes the credential store, token engine, user
//! store, and notification gateway into the register / login / refresh /
//! logout / reset / verify flows, and enforces role-based access.
//!
//! Every operation returns a typed [`AuthError`]; nothing in the core
//! panics or throws across the transport boundary. Token-side validity
//! (signature, expiry) and account-side validity (slot equality, active
//! flag) are both required: a signed token is only a capability claim
//! co-validated against live account state.

use axum::{http::StatusCode, response::IntoResponse};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use thiserror::Error;
use tracing::error;

use crate::api::email::{build_reset_email, build_verification_email, EmailMessage, EmailSender};
use crate::store::{CreateOutcome, Role, User, UserStore};

pub mod password;
pub mod token;

pub use token::{Claims, Scope, TokenEngine, TokenError};

/// Normalize an email for lookup and uniqueness checks.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

static EMAIL_REGEX: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok());

/// Basic email format check on already-normalized input.
#[must_use]
pub fn valid_email(email_normalized: &str) -> bool {
    EMAIL_REGEX
        .as_ref()
        .is_some_and(|regex| regex.is_match(email_normalized))
}

/// Tunable knobs for the orchestrator: token lifetimes and the base URL
/// embedded in outbound verification/reset links.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    public_url: String,
    access_ttl: chrono::Duration,
    refresh_ttl: chrono::Duration,
    verify_ttl: chrono::Duration,
    reset_ttl: chrono::Duration,
}

impl AuthConfig {
    /// Defaults: access 30 min, refresh 7 days, verify 24 h, reset 15 min.
    #[must_use]
    pub fn new(public_url: String) -> Self {
        Self {
            public_url,
            access_ttl: chrono::Duration::minutes(30),
            refresh_ttl: chrono::Duration::days(7),
            verify_ttl: chrono::Duration::hours(24),
            reset_ttl: chrono::Duration::minutes(15),
        }
    }

    #[must_use]
    pub fn with_access_ttl_seconds(mut self, seconds: i64) -> Self {
        self.access_ttl = chrono::Duration::seconds(seconds);
        self
    }

    #[must_use]
    pub fn with_refresh_ttl_seconds(mut self, seconds: i64) -> Self {
        self.refresh_ttl = chrono::Duration::seconds(seconds);
        self
    }

    #[must_use]
    pub fn with_verify_ttl_seconds(mut self, seconds: i64) -> Self {
        self.verify_ttl = chrono::Duration::seconds(seconds);
        self
    }

    #[must_use]
    pub fn with_reset_ttl_seconds(mut self, seconds: i64) -> Self {
        self.reset_ttl = chrono::Duration::seconds(seconds);
        self
    }

    #[must_use]
    pub fn public_url(&self) -> &str {
        &self.public_url
    }
}

/// Access + refresh tokens returned by a successful login.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Email already registered")]
    EmailTaken,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Email not verified")]
    EmailNotVerified,
    /// Deliberately coalesces expired/malformed/wrong-scope/stale-value and
    /// unknown-subject tokens so the response never reveals which check
    /// failed.
    #[error("Invalid or expired token")]
    Unauthenticated,
    #[error("User not found")]
    AccountNotFound,
    #[error("Admins only")]
    Forbidden,
    #[error("Invalid or expired token")]
    InvalidOrExpiredToken,
    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::EmailTaken | Self::InvalidCredentials | Self::InvalidOrExpiredToken => {
                StatusCode::BAD_REQUEST
            }
            Self::EmailNotVerified | Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::AccountNotFound => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> axum::response::Response {
        if let Self::Internal(err) = &self {
            error!("Internal error: {err:#}");
        }
        (self.status(), self.to_string()).into_response()
    }
}

/// The orchestrator. One instance is shared across all requests; it holds
/// no per-request state.
pub struct AuthService {
    store: Arc<dyn UserStore>,
    tokens: TokenEngine,
    mailer: Arc<dyn EmailSender>,
    config: AuthConfig,
}

impl AuthService {
    #[must_use]
    pub fn new(
        store: Arc<dyn UserStore>,
        tokens: TokenEngine,
        mailer: Arc<dyn EmailSender>,
        config: AuthConfig,
    ) -> Self {
        Self {
            store,
            tokens,
            mailer,
            config,
        }
    }

    /// Create an unverified account and dispatch the verification link.
    ///
    /// # Errors
    ///
    /// `EmailTaken` when the normalized email is already registered.
    pub async fn register(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = normalize_email(email);
        let password_hash = password::hash(password)?;

        let user = match self.store.create(&email, &password_hash).await? {
            CreateOutcome::Created(user) => user,
            CreateOutcome::Conflict => return Err(AuthError::EmailTaken),
        };

        let token = self.issue(&email, Scope::Verify, self.config.verify_ttl)?;
        self.store.set_verification_token(user.id, &token).await?;

        let link = self.verify_url(&token);
        self.dispatch_email(&email, "Verify your email", &build_verification_email(&link));

        Ok(user)
    }

    /// Verify credentials and issue an access/refresh token pair. The new
    /// refresh token overwrites any previous one (single live slot).
    ///
    /// # Errors
    ///
    /// `InvalidCredentials` for unknown accounts, wrong passwords, and
    /// deactivated accounts (coalesced); `EmailNotVerified` until the
    /// verification link is consumed.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AuthError> {
        let email = normalize_email(email);
        let user = self
            .store
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !password::verify(password, &user.password_hash) || !user.is_active {
            return Err(AuthError::InvalidCredentials);
        }

        if !user.is_verified {
            return Err(AuthError::EmailNotVerified);
        }

        let access_token = self.issue(&email, Scope::Access, self.config.access_ttl)?;
        let refresh_token = self.issue(&email, Scope::Refresh, self.config.refresh_ttl)?;

        self.store.set_refresh_token(user.id, &refresh_token).await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "bearer",
        })
    }

    /// Resolve a presented access token into the account it belongs to.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` for undecodable, expired, wrong-scope tokens and
    /// inactive accounts; `AccountNotFound` when the subject no longer
    /// resolves.
    pub async fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        let claims = self
            .tokens
            .decode(token)
            .map_err(|_| AuthError::Unauthenticated)?;

        if claims.scope != Scope::Access {
            return Err(AuthError::Unauthenticated);
        }

        let user = self
            .store
            .find_by_email(&claims.sub)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        if !user.is_active {
            return Err(AuthError::Unauthenticated);
        }

        Ok(user)
    }

    /// Exchange a refresh token for a new access token. The presented token
    /// must decode with scope `refresh`, resolve to an active account, AND
    /// equal the account's stored slot, which is how a logout or newer login
    /// invalidates it before expiry. Consumption does not clear the slot;
    /// refresh tokens are multi-use.
    ///
    /// # Errors
    ///
    /// `Unauthenticated` for decode failures, scope mismatches, deactivated
    /// or vanished accounts, and stale values alike.
    pub async fn refresh(&self, token: &str) -> Result<String, AuthError> {
        let claims = self
            .tokens
            .decode(token)
            .map_err(|_| AuthError::Unauthenticated)?;

        if claims.scope != Scope::Refresh {
            return Err(AuthError::Unauthenticated);
        }

        let user = self
            .store
            .find_by_email(&claims.sub)
            .await?
            .ok_or(AuthError::Unauthenticated)?;

        if !user.is_active {
            return Err(AuthError::Unauthenticated);
        }

        if !self.store.refresh_token_matches(&claims.sub, token).await? {
            return Err(AuthError::Unauthenticated);
        }

        self.issue(&claims.sub, Scope::Access, self.config.access_ttl)
    }

    /// Clear the account's refresh slot.
    ///
    /// # Errors
    ///
    /// Fails only on storage errors.
    pub async fn logout(&self, user: &User) -> Result<(), AuthError> {
        self.store.clear_refresh_token(user.id).await?;
        Ok(())
    }

    /// Issue and store a reset token, then dispatch the reset link.
    ///
    /// # Errors
    ///
    /// `AccountNotFound` for unknown emails. The 404 reveals account
    /// existence; callers wanting enumeration resistance should not expose
    /// this endpoint publicly.
    pub async fn request_reset(&self, email: &str) -> Result<(), AuthError> {
        let email = normalize_email(email);
        let user = self
            .store
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        let token = self.issue(&email, Scope::Reset, self.config.reset_ttl)?;
        self.store.set_reset_token(user.id, &token).await?;

        let link = self.reset_url(&token);
        self.dispatch_email(&email, "Reset your password", &build_reset_email(&link));

        Ok(())
    }

    /// Consume a reset token: replace the password hash and clear the slot.
    ///
    /// # Errors
    ///
    /// `InvalidOrExpiredToken` when the token fails to decode, carries the
    /// wrong scope, or no longer equals the stored slot value.
    pub async fn confirm_reset(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        let claims = self
            .tokens
            .decode(token)
            .map_err(|_| AuthError::InvalidOrExpiredToken)?;

        if claims.scope != Scope::Reset {
            return Err(AuthError::InvalidOrExpiredToken);
        }

        let new_password_hash = password::hash(new_password)?;

        if !self
            .store
            .consume_reset_token(&claims.sub, token, &new_password_hash)
            .await?
        {
            return Err(AuthError::InvalidOrExpiredToken);
        }

        Ok(())
    }

    /// Consume a verification token: mark the account verified and clear the
    /// slot. The `Unverified -> Verified` transition is one-way.
    ///
    /// # Errors
    ///
    /// `InvalidOrExpiredToken`, same coalescing as [`Self::confirm_reset`].
    pub async fn verify_email(&self, token: &str) -> Result<(), AuthError> {
        let claims = self
            .tokens
            .decode(token)
            .map_err(|_| AuthError::InvalidOrExpiredToken)?;

        if claims.scope != Scope::Verify {
            return Err(AuthError::InvalidOrExpiredToken);
        }

        if !self
            .store
            .consume_verification_token(&claims.sub, token)
            .await?
        {
            return Err(AuthError::InvalidOrExpiredToken);
        }

        Ok(())
    }

    /// Pass-through for admin-gated routes.
    ///
    /// # Errors
    ///
    /// `Forbidden` for non-admin accounts.
    pub fn require_admin(&self, user: &User) -> Result<(), AuthError> {
        if user.role == Role::Admin {
            Ok(())
        } else {
            Err(AuthError::Forbidden)
        }
    }

    /// Storage liveness, surfaced by the health endpoint.
    ///
    /// # Errors
    ///
    /// Propagates the storage error.
    pub async fn health(&self) -> anyhow::Result<()> {
        self.store.ping().await
    }

    fn issue(&self, subject: &str, scope: Scope, ttl: chrono::Duration) -> Result<String, AuthError> {
        self.tokens
            .issue(subject, scope, ttl)
            .map_err(|err| AuthError::Internal(err.into()))
    }

    fn verify_url(&self, token: &str) -> String {
        let base = self.config.public_url.trim_end_matches('/');
        format!("{base}/auth/verify-email?token={token}")
    }

    fn reset_url(&self, token: &str) -> String {
        let base = self.config.public_url.trim_end_matches('/');
        format!("{base}/reset-password?token={token}")
    }

    /// Notification failures are logged and swallowed, never failing the
    /// originating operation.
    fn dispatch_email(&self, to_email: &str, subject: &str, html_body: &str) {
        let message = EmailMessage {
            to_email: to_email.to_string(),
            subject: subject.to_string(),
            html_body: html_body.to_string(),
        };

        if let Err(err) = self.mailer.send(&message) {
            error!("Failed to send email to {}: {err:#}", message.to_email);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::email::LogEmailSender;
    use crate::store::MemoryUserStore;
    use secrecy::SecretString;

    fn service() -> AuthService {
        AuthService::new(
            Arc::new(MemoryUserStore::new()),
            TokenEngine::new(SecretString::from("unit-test-secret".to_string())),
            Arc::new(LogEmailSender),
            AuthConfig::new("https://auth.example.com/".to_string()),
        )
    }

    #[test]
    fn normalize_email_trims_and_lowercases() {
        assert_eq!(normalize_email(" Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn valid_email_accepts_basic_format() {
        assert!(valid_email("a@example.com"));
        assert!(valid_email("name.surname@example.co"));
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("a@b"));
        assert!(!valid_email("a b@example.com"));
    }

    #[test]
    fn config_defaults_match_documented_ttls() {
        let config = AuthConfig::new("https://auth.example.com".to_string());
        assert_eq!(config.access_ttl, chrono::Duration::minutes(30));
        assert_eq!(config.refresh_ttl, chrono::Duration::days(7));
        assert_eq!(config.verify_ttl, chrono::Duration::hours(24));
        assert_eq!(config.reset_ttl, chrono::Duration::minutes(15));
    }

    #[test]
    fn config_builder_overrides_ttls() {
        let config = AuthConfig::new("https://auth.example.com".to_string())
            .with_access_ttl_seconds(60)
            .with_refresh_ttl_seconds(120)
            .with_verify_ttl_seconds(180)
            .with_reset_ttl_seconds(240);
        assert_eq!(config.access_ttl.num_seconds(), 60);
        assert_eq!(config.refresh_ttl.num_seconds(), 120);
        assert_eq!(config.verify_ttl.num_seconds(), 180);
        assert_eq!(config.reset_ttl.num_seconds(), 240);
    }

    #[test]
    fn link_builders_strip_trailing_slash() {
        let service = service();
        assert_eq!(
            service.verify_url("tok"),
            "https://auth.example.com/auth/verify-email?token=tok"
        );
        assert_eq!(
            service.reset_url("tok"),
            "https://auth.example.com/reset-password?token=tok"
        );
    }

    #[test]
    fn error_status_mapping() {
        assert_eq!(AuthError::EmailTaken.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AuthError::InvalidCredentials.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AuthError::EmailNotVerified.status(), StatusCode::FORBIDDEN);
        assert_eq!(AuthError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::AccountNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AuthError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AuthError::InvalidOrExpiredToken.status(),
            StatusCode::BAD_REQUEST
        );
    }
}
