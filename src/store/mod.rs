//! Account state: the user record and the store that owns its mutable
//! security fields.
//!
//! Verification and reset slots follow an occupy / compare-and-clear
//! pattern: setting a token overwrites any prior value, consuming it
//! succeeds only when the presented value equals the stored one and clears
//! the slot in the same atomic step. The refresh slot compares without
//! clearing; it is emptied only by logout or overwritten by a new login.

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::MemoryUserStore;
pub use postgres::PgUserStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Admin,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    /// Parse a stored role value; unknown values fall back to `User` so a
    /// bad row can never grant privileges.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "admin" => Self::Admin,
            _ => Self::User,
        }
    }
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub role: Role,
    pub is_verified: bool,
    pub refresh_token: Option<String>,
    pub reset_token: Option<String>,
    pub email_verification_token: Option<String>,
}

/// Outcome when attempting to create a new account.
#[derive(Debug)]
pub enum CreateOutcome {
    Created(User),
    Conflict,
}

/// Repository interface over the storage engine.
///
/// Implementations must make every consume operation a single atomic
/// read-modify-write for the targeted account, so two concurrent consumers
/// of the same token cannot both succeed.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Create an unverified account; `Conflict` when the email is taken.
    async fn create(&self, email: &str, password_hash: &str) -> Result<CreateOutcome>;

    /// Occupy the verification slot, overwriting any prior value.
    async fn set_verification_token(&self, id: Uuid, token: &str) -> Result<()>;

    /// Compare-and-clear: iff the slot holds `presented`, mark the account
    /// verified and empty the slot. `false` leaves the account untouched.
    async fn consume_verification_token(&self, email: &str, presented: &str) -> Result<bool>;

    /// Occupy the reset slot, overwriting any prior value.
    async fn set_reset_token(&self, id: Uuid, token: &str) -> Result<()>;

    /// Compare-and-clear: iff the slot holds `presented`, replace the
    /// password hash and empty the slot.
    async fn consume_reset_token(
        &self,
        email: &str,
        presented: &str,
        new_password_hash: &str,
    ) -> Result<bool>;

    /// Occupy the refresh slot, overwriting any prior value.
    async fn set_refresh_token(&self, id: Uuid, token: &str) -> Result<()>;

    /// Comparison without clearing: refresh tokens stay valid for repeated
    /// use until logout or a new login overwrites them.
    async fn refresh_token_matches(&self, email: &str, presented: &str) -> Result<bool>;

    async fn clear_refresh_token(&self, id: Uuid) -> Result<()>;

    /// Out-of-band role assignment (there is no admin-promotion endpoint).
    async fn set_role(&self, email: &str, role: Role) -> Result<bool>;

    /// Out-of-band activation toggle. Deactivated accounts fail login,
    /// authentication, and refresh; their stored slots are left in place so
    /// reactivation restores them.
    async fn set_active(&self, email: &str, is_active: bool) -> Result<bool>;

    /// Liveness probe for the health endpoint.
    async fn ping(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips() {
        assert_eq!(Role::parse("admin"), Role::Admin);
        assert_eq!(Role::parse("user"), Role::User);
        assert_eq!(Role::Admin.as_str(), "admin");
    }

    #[test]
    fn unknown_role_never_grants_privileges() {
        assert_eq!(Role::parse("superuser"), Role::User);
        assert_eq!(Role::parse(""), Role::User);
    }
}
