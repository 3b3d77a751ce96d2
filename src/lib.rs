//! # Varco
//!
//! `varco` is an email-verified authentication service. It registers users,
//! confirms their address through a signed verification link, issues scoped
//! access/refresh tokens, and enforces role-based access control.
//!
//! ## Token Model
//!
//! Tokens are HS256-signed JWTs carrying `{sub, scope, exp, iat, jti}`. A
//! token is single-purpose: its `scope` (`access`, `refresh`, `verify`,
//! `reset`) must match the operation it is presented to. Signature and
//! expiry are checked by the token engine; scope matching and account-state
//! co-validation happen in the orchestrator.
//!
//! ## Account State
//!
//! The user store is the sole owner of the mutable security fields
//! (`is_verified`, refresh/reset/verification token slots). Verification and
//! reset tokens are single-use: consumption is an atomic compare-and-clear
//! against the stored slot, so a stale but not-yet-expired token fails once
//! its account-side counterpart is gone. Refresh tokens stay valid for
//! repeated use until a new login overwrites them or logout clears them.

pub mod api;
pub mod auth;
pub mod cli;
pub mod store;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
