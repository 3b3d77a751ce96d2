//! Postgres user store.
//!
//! Slot consumption is a single conditional `UPDATE ... WHERE email = $1 AND
//! <slot> = $2`: the row lock makes the compare-and-clear atomic, so exactly
//! one of N concurrent consumers of the same token observes an affected row.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Connection, PgPool, Row};
use tracing::{info_span, Instrument};
use uuid::Uuid;

use super::{CreateOutcome, Role, User, UserStore};

const USER_COLUMNS: &str = "id, email, password_hash, is_active, role, is_verified, \
     refresh_token, reset_token, email_verification_token";

#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn row_to_user(row: &PgRow) -> User {
    let role: String = row.get("role");
    User {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        is_active: row.get("is_active"),
        role: Role::parse(&role),
        is_verified: row.get("is_verified"),
        refresh_token: row.get("refresh_token"),
        reset_token: row.get("reset_token"),
        email_verification_token: row.get("email_verification_token"),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

fn query_span(operation: &'static str, statement: &str) -> tracing::Span {
    info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let row = sqlx::query(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", &query))
            .await
            .context("failed to look up user by email")?;

        Ok(row.as_ref().map(row_to_user))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", &query))
            .await
            .context("failed to look up user by id")?;

        Ok(row.as_ref().map(row_to_user))
    }

    async fn create(&self, email: &str, password_hash: &str) -> Result<CreateOutcome> {
        let query = format!(
            "INSERT INTO users (email, password_hash) VALUES ($1, $2) RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query(&query)
            .bind(email)
            .bind(password_hash)
            .fetch_one(&self.pool)
            .instrument(query_span("INSERT", &query))
            .await;

        match row {
            Ok(row) => Ok(CreateOutcome::Created(row_to_user(&row))),
            Err(err) if is_unique_violation(&err) => Ok(CreateOutcome::Conflict),
            Err(err) => Err(err).context("failed to insert user"),
        }
    }

    async fn set_verification_token(&self, id: Uuid, token: &str) -> Result<()> {
        let query = "UPDATE users SET email_verification_token = $2 WHERE id = $1";
        sqlx::query(query)
            .bind(id)
            .bind(token)
            .execute(&self.pool)
            .instrument(query_span("UPDATE", query))
            .await
            .context("failed to set verification token")?;
        Ok(())
    }

    async fn consume_verification_token(&self, email: &str, presented: &str) -> Result<bool> {
        let query = "UPDATE users \
             SET is_verified = TRUE, email_verification_token = NULL \
             WHERE email = $1 AND email_verification_token = $2";
        let result = sqlx::query(query)
            .bind(email)
            .bind(presented)
            .execute(&self.pool)
            .instrument(query_span("UPDATE", query))
            .await
            .context("failed to consume verification token")?;

        Ok(result.rows_affected() == 1)
    }

    async fn set_reset_token(&self, id: Uuid, token: &str) -> Result<()> {
        let query = "UPDATE users SET reset_token = $2 WHERE id = $1";
        sqlx::query(query)
            .bind(id)
            .bind(token)
            .execute(&self.pool)
            .instrument(query_span("UPDATE", query))
            .await
            .context("failed to set reset token")?;
        Ok(())
    }

    async fn consume_reset_token(
        &self,
        email: &str,
        presented: &str,
        new_password_hash: &str,
    ) -> Result<bool> {
        let query = "UPDATE users \
             SET password_hash = $3, reset_token = NULL \
             WHERE email = $1 AND reset_token = $2";
        let result = sqlx::query(query)
            .bind(email)
            .bind(presented)
            .bind(new_password_hash)
            .execute(&self.pool)
            .instrument(query_span("UPDATE", query))
            .await
            .context("failed to consume reset token")?;

        Ok(result.rows_affected() == 1)
    }

    async fn set_refresh_token(&self, id: Uuid, token: &str) -> Result<()> {
        let query = "UPDATE users SET refresh_token = $2 WHERE id = $1";
        sqlx::query(query)
            .bind(id)
            .bind(token)
            .execute(&self.pool)
            .instrument(query_span("UPDATE", query))
            .await
            .context("failed to set refresh token")?;
        Ok(())
    }

    async fn refresh_token_matches(&self, email: &str, presented: &str) -> Result<bool> {
        let query = "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND refresh_token = $2) AS matches";
        let row = sqlx::query(query)
            .bind(email)
            .bind(presented)
            .fetch_one(&self.pool)
            .instrument(query_span("SELECT", query))
            .await
            .context("failed to compare refresh token")?;

        Ok(row.get("matches"))
    }

    async fn clear_refresh_token(&self, id: Uuid) -> Result<()> {
        let query = "UPDATE users SET refresh_token = NULL WHERE id = $1";
        sqlx::query(query)
            .bind(id)
            .execute(&self.pool)
            .instrument(query_span("UPDATE", query))
            .await
            .context("failed to clear refresh token")?;
        Ok(())
    }

    async fn set_role(&self, email: &str, role: Role) -> Result<bool> {
        let query = "UPDATE users SET role = $2 WHERE email = $1";
        let result = sqlx::query(query)
            .bind(email)
            .bind(role.as_str())
            .execute(&self.pool)
            .instrument(query_span("UPDATE", query))
            .await
            .context("failed to set role")?;

        Ok(result.rows_affected() == 1)
    }

    async fn set_active(&self, email: &str, is_active: bool) -> Result<bool> {
        let query = "UPDATE users SET is_active = $2 WHERE email = $1";
        let result = sqlx::query(query)
            .bind(email)
            .bind(is_active)
            .execute(&self.pool)
            .instrument(query_span("UPDATE", query))
            .await
            .context("failed to set active flag")?;

        Ok(result.rows_affected() == 1)
    }

    async fn ping(&self) -> Result<()> {
        let span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
        let mut conn = self
            .pool
            .acquire()
            .await
            .context("failed to acquire database connection")?;
        conn.ping()
            .instrument(span)
            .await
            .context("failed to ping database")?;
        Ok(())
    }
}
