//! Session management.
//!
//! HTTP auth uses opaque session tokens stored server-side and delivered in
//! an HttpOnly cookie. Expiry is stamped at creation and enforced in SQL on
//! every validation, so a stale cookie simply reads as logged out.

use std::fmt::Write;

use rand::Rng;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::services::persistence::env_parse;

const TOKEN_BYTES: usize = 32;
const DEFAULT_SESSION_TTL_DAYS: i32 = 30;

pub(crate) fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(s, "{b:02x}");
    }
    s
}

/// Opaque session token, 64 hex characters.
#[must_use]
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill(&mut bytes);
    bytes_to_hex(&bytes)
}

/// User row returned from session validation.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SessionUser {
    /// Unique user identifier.
    pub id: Uuid,
    /// Normalized account email.
    pub email: String,
    /// Display name.
    pub name: String,
}

/// Create a session for the given user, returning the token. The expiry is
/// `SESSION_TTL_DAYS` (default 30) from now.
pub async fn create_session(pool: &PgPool, user_id: Uuid) -> Result<String, sqlx::Error> {
    let token = generate_token();
    let ttl_days = env_parse("SESSION_TTL_DAYS", DEFAULT_SESSION_TTL_DAYS);
    sqlx::query(
        r"INSERT INTO sessions (token, user_id, expires_at)
          VALUES ($1, $2, now() + make_interval(days => $3))",
    )
    .bind(&token)
    .bind(user_id)
    .bind(ttl_days)
    .execute(pool)
    .await?;
    Ok(token)
}

/// Look up a live session and return its user. Expired or unknown tokens
/// yield `None`.
pub async fn validate_session(pool: &PgPool, token: &str) -> Result<Option<SessionUser>, sqlx::Error> {
    let row = sqlx::query(
        r"SELECT u.id, u.email, u.name
          FROM sessions s
          JOIN users u ON u.id = s.user_id
          WHERE s.token = $1 AND s.expires_at > now()",
    )
    .bind(token)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| SessionUser { id: r.get("id"), email: r.get("email"), name: r.get("name") }))
}

/// Delete a session by token. Returns whether a row was actually removed.
pub async fn delete_session(pool: &PgPool, token: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sessions WHERE token = $1")
        .bind(token)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
