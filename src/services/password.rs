//! Email/password account service.
//!
//! Registration creates a user with a salted SHA-256 password hash; login
//! verifies credentials and hands back the user for session creation. Both
//! failure modes of login collapse into one `InvalidCredentials` error so the
//! response does not reveal whether the email is registered.

use rand::Rng;
use sha2::{Digest, Sha256};
use sqlx::{PgPool, Row};

use crate::services::session::{SessionUser, bytes_to_hex};

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("please enter a valid email address")]
    InvalidEmail,
    #[error("password should be at least {MIN_PASSWORD_LEN} characters")]
    WeakPassword,
    #[error("this email is already registered")]
    EmailTaken,
    #[error("incorrect email or password")]
    InvalidCredentials,
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

#[must_use]
pub fn normalize_email(email: &str) -> Option<String> {
    let normalized = email.trim().to_ascii_lowercase();
    if normalized.is_empty() || !normalized.contains('@') {
        return None;
    }
    let parts = normalized.split('@').collect::<Vec<_>>();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
        return None;
    }
    Some(normalized)
}

/// Generate a random 16-byte hex salt.
#[must_use]
pub fn generate_salt() -> String {
    let bytes: [u8; 16] = rand::rng().random();
    bytes_to_hex(&bytes)
}

/// Salted SHA-256 digest, hex-encoded.
#[must_use]
pub fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    bytes_to_hex(&hasher.finalize())
}

#[must_use]
pub fn verify_password(salt: &str, password: &str, expected_hash: &str) -> bool {
    hash_password(salt, password) == expected_hash
}

fn name_from_email(email: &str) -> String {
    let local = email
        .split('@')
        .next()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or("user");
    local.to_owned()
}

/// Register a new account. Returns the created user.
///
/// # Errors
///
/// `InvalidEmail` / `WeakPassword` on validation failure, `EmailTaken` when
/// the normalized email already has an account.
pub async fn register_user(
    pool: &PgPool,
    email: &str,
    password: &str,
    display_name: Option<&str>,
) -> Result<SessionUser, AuthError> {
    let normalized = normalize_email(email).ok_or(AuthError::InvalidEmail)?;
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AuthError::WeakPassword);
    }

    let name = display_name
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map_or_else(|| name_from_email(&normalized), ToOwned::to_owned);

    let salt = generate_salt();
    let hash = hash_password(&salt, password);

    let row = sqlx::query(
        r"INSERT INTO users (email, name, password_hash, password_salt)
          VALUES ($1, $2, $3, $4)
          ON CONFLICT (email) DO NOTHING
          RETURNING id",
    )
    .bind(&normalized)
    .bind(&name)
    .bind(&hash)
    .bind(&salt)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Err(AuthError::EmailTaken);
    };

    Ok(SessionUser { id: row.get("id"), email: normalized, name })
}

/// Verify credentials and return the user.
///
/// # Errors
///
/// `InvalidCredentials` for an unknown email or wrong password.
pub async fn login_user(pool: &PgPool, email: &str, password: &str) -> Result<SessionUser, AuthError> {
    let normalized = normalize_email(email).ok_or(AuthError::InvalidCredentials)?;

    let row = sqlx::query("SELECT id, email, name, password_hash, password_salt FROM users WHERE email = $1")
        .bind(&normalized)
        .fetch_optional(pool)
        .await?;

    let Some(row) = row else {
        return Err(AuthError::InvalidCredentials);
    };

    let salt: String = row.get("password_salt");
    let expected: String = row.get("password_hash");
    if !verify_password(&salt, password, &expected) {
        return Err(AuthError::InvalidCredentials);
    }

    Ok(SessionUser { id: row.get("id"), email: row.get("email"), name: row.get("name") })
}

#[cfg(test)]
#[path = "password_test.rs"]
mod tests;
