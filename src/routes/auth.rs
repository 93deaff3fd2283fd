//! Auth routes — registration, login, logout, session introspection.

use axum::extract::{FromRef, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use time::Duration;

use crate::routes::error_json;
use crate::services::{password, session};
use crate::state::AppState;

const COOKIE_NAME: &str = "session_token";

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub(crate) fn cookie_secure() -> bool {
    env_bool("COOKIE_SECURE").unwrap_or(false)
}

fn build_cookie(value: String, max_age: Option<Duration>) -> Cookie<'static> {
    let mut builder = Cookie::build((COOKIE_NAME, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(cookie_secure());
    if let Some(age) = max_age {
        builder = builder.max_age(age);
    }
    builder.build()
}

fn session_cookie(token: String) -> Cookie<'static> {
    build_cookie(token, None)
}

fn clear_session_cookie() -> Cookie<'static> {
    build_cookie(String::new(), Some(Duration::ZERO))
}

// =============================================================================
// AUTH EXTRACTORS
// =============================================================================

fn session_token_from(parts: &axum::http::request::Parts) -> Option<String> {
    CookieJar::from_headers(&parts.headers)
        .get(COOKIE_NAME)
        .map(|cookie| cookie.value().to_owned())
        .filter(|token| !token.is_empty())
}

fn unauthorized() -> (StatusCode, Json<serde_json::Value>) {
    error_json(StatusCode::UNAUTHORIZED, "you need to be logged in to perform this action")
}

/// Authenticated user extracted from the session cookie.
/// Use as a handler parameter to require authentication.
pub struct AuthUser {
    pub user: session::SessionUser,
    pub token: String,
}

impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<serde_json::Value>);

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = session_token_from(parts).ok_or_else(unauthorized)?;

        let app_state = AppState::from_ref(state);
        let user = session::validate_session(&app_state.pool, &token)
            .await
            .map_err(|_| error_json(StatusCode::INTERNAL_SERVER_ERROR, "session lookup failed"))?
            .ok_or_else(unauthorized)?;

        Ok(Self { user, token })
    }
}

/// Like [`AuthUser`] but never rejects: read endpoints are public, and a
/// missing or expired session just means an anonymous viewer.
pub struct MaybeAuthUser(pub Option<session::SessionUser>);

impl<S> axum::extract::FromRequestParts<S> for MaybeAuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut axum::http::request::Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(token) = session_token_from(parts) else {
            return Ok(Self(None));
        };

        let app_state = AppState::from_ref(state);
        let user = session::validate_session(&app_state.pool, &token)
            .await
            .ok()
            .flatten();
        Ok(Self(user))
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

#[derive(Deserialize)]
pub struct RegisterBody {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

fn auth_error_to_response(err: &password::AuthError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match err {
        password::AuthError::InvalidEmail | password::AuthError::WeakPassword => StatusCode::BAD_REQUEST,
        password::AuthError::EmailTaken => StatusCode::CONFLICT,
        password::AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
        password::AuthError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_json(status, err.to_string())
}

/// `POST /api/auth/register` — create an account and start a session.
pub async fn register(State(state): State<AppState>, Json(body): Json<RegisterBody>) -> Response {
    let user = match password::register_user(&state.pool, &body.email, &body.password, body.name.as_deref()).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(error = %e, "registration failed");
            return auth_error_to_response(&e).into_response();
        }
    };

    let token = match session::create_session(&state.pool, user.id).await {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(error = %e, "session creation failed");
            return error_json(StatusCode::INTERNAL_SERVER_ERROR, "failed to create session").into_response();
        }
    };

    let jar = CookieJar::new().add(session_cookie(token));
    (StatusCode::CREATED, jar, Json(user)).into_response()
}

/// `POST /api/auth/login` — verify credentials and start a session.
pub async fn login(State(state): State<AppState>, Json(body): Json<LoginBody>) -> Response {
    let user = match password::login_user(&state.pool, &body.email, &body.password).await {
        Ok(user) => user,
        Err(e) => return auth_error_to_response(&e).into_response(),
    };

    let token = match session::create_session(&state.pool, user.id).await {
        Ok(t) => t,
        Err(e) => {
            tracing::error!(error = %e, "session creation failed");
            return error_json(StatusCode::INTERNAL_SERVER_ERROR, "failed to create session").into_response();
        }
    };

    let jar = CookieJar::new().add(session_cookie(token));
    (jar, Json(user)).into_response()
}

/// `POST /api/auth/logout` — delete session, clear cookie.
pub async fn logout(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    if let Err(e) = session::delete_session(&state.pool, &auth.token).await {
        tracing::warn!(error = %e, "session delete failed");
    }

    (CookieJar::new().add(clear_session_cookie()), StatusCode::NO_CONTENT)
}

/// `GET /api/auth/me` — return current user. Clients poll this instead of an
/// auth-state push subscription.
pub async fn me(auth: AuthUser) -> Json<session::SessionUser> {
    Json(auth.user)
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
