//! Session cookies and the user extractors.

use super::server::AppState;
use super::LOGIN_PATH;
use crate::error::AppError;
use crate::types::User;
use axum::extract::FromRequestParts;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{IntoResponse, Redirect, Response};
use chrono::{Duration, Utc};
use tracing::debug;

/// Value of the named cookie in the request headers, if present.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

/// `Set-Cookie` header value establishing a session.
pub fn session_cookie(name: &str, token: &str, ttl: Duration) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        name,
        token,
        ttl.num_seconds()
    )
}

/// `Set-Cookie` header value removing the session cookie.
pub fn clear_session_cookie(name: &str) -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", name)
}

/// Attach a `Set-Cookie` header to a response.
pub fn with_cookie(response: impl IntoResponse, cookie: &str) -> Response {
    let mut response = response.into_response();
    match HeaderValue::from_str(cookie) {
        Ok(value) => {
            response.headers_mut().append(SET_COOKIE, value);
        }
        Err(e) => debug!("Dropping malformed cookie header: {}", e),
    }
    response
}

/// Redirect to the login page, remembering where the user was headed.
pub fn login_redirect(next: &str) -> Redirect {
    Redirect::to(&format!(
        "{}?next={}",
        LOGIN_PATH,
        urlencoding::encode(next)
    ))
}

/// Resolve the request's session cookie to a user.
fn user_from_parts(parts: &Parts, state: &AppState) -> Result<Option<User>, AppError> {
    let Some(token) = read_cookie(&parts.headers, &state.config.session.cookie_name) else {
        return Ok(None);
    };
    let user = state.db.session_user(&token, Utc::now())?;
    Ok(user)
}

/// The authenticated user. Requests without a valid session are redirected
/// to the login page.
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match user_from_parts(parts, state) {
            Ok(Some(user)) => Ok(CurrentUser(user)),
            Ok(None) => {
                let next = parts
                    .uri
                    .path_and_query()
                    .map(|pq| pq.as_str())
                    .unwrap_or("/");
                debug!(path = next, "Unauthenticated request redirected to login");
                Err(login_redirect(next).into_response())
            }
            Err(e) => Err(e.into_response()),
        }
    }
}

/// The authenticated user, if any.
pub struct MaybeUser(pub Option<User>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        user_from_parts(parts, state)
            .map(MaybeUser)
            .map_err(IntoResponse::into_response)
    }
}
