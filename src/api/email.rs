//! Email delivery abstraction for verification and reset links.
//!
//! The orchestrator only depends on the [`EmailSender`] trait; the sender
//! decides how to deliver (SMTP, API, etc.) and returns `Ok`/`Err`. Delivery
//! failures are logged by the caller and never fail the originating
//! operation: a registration still succeeds when the mail bounces.
//!
//! The default sender for local dev is [`LogEmailSender`], which logs the
//! payload and returns `Ok(())`.

use anyhow::Result;
use tracing::info;

const APP_NAME: &str = "Varco";

#[derive(Clone, Debug)]
pub struct EmailMessage {
    pub to_email: String,
    pub subject: String,
    pub html_body: String,
}

/// Email delivery abstraction.
pub trait EmailSender: Send + Sync {
    /// Deliver a message or return an error.
    fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Local dev sender that logs the payload instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogEmailSender;

impl EmailSender for LogEmailSender {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        info!(
            to_email = %message.to_email,
            subject = %message.subject,
            body = %message.html_body,
            "email send stub"
        );
        Ok(())
    }
}

/// Body for the email-verification message.
#[must_use]
pub fn build_verification_email(verify_link: &str) -> String {
    format!(
        r#"<div>
  <h3>{APP_NAME} - Email Verification</h3>
  <p>Click the link below to verify your email address:</p>
  <p><a href="{verify_link}">{verify_link}</a></p>
  <p>This link is only valid for a limited time.</p>
</div>"#
    )
}

/// Body for the password-reset message.
#[must_use]
pub fn build_reset_email(reset_link: &str) -> String {
    format!(
        r#"<div>
  <h3>{APP_NAME} - Password Reset</h3>
  <p>Click the link below to reset your password:</p>
  <p><a href="{reset_link}">{reset_link}</a></p>
  <p>This link is only valid for a limited time.</p>
</div>"#
    )
}
