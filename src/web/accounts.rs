//! Registration, login and logout.

use super::forms::{LoginForm, LoginQuery, RegisterForm, safe_next};
use super::server::AppState;
use super::session::{MaybeUser, clear_session_cookie, read_cookie, session_cookie, with_cookie};
use super::{DASHBOARD_PATH, WELCOME_PATH, render};
use crate::error::{AppError, ErrorKind};
use crate::types::User;
use axum::extract::{Form, Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Redirect, Response};
use tracing::{info, warn};

/// Start a session for `user` and redirect to `target` with the cookie set.
fn sign_in(state: &AppState, user: &User, target: &str) -> Result<Response, AppError> {
    let ttl = state.config.session.ttl();
    let session = state.db.create_session(user.id, ttl)?;
    let cookie = session_cookie(&state.config.session.cookie_name, &session.token, ttl);
    info!(user_id = user.id, "User signed in");
    Ok(with_cookie(Redirect::to(target), &cookie))
}

pub async fn register_form(MaybeUser(user): MaybeUser) -> Response {
    match user {
        Some(_) => Redirect::to(DASHBOARD_PATH).into_response(),
        None => render::register_page(&RegisterForm::default(), None).into_response(),
    }
}

pub async fn register(
    State(state): State<AppState>,
    MaybeUser(current): MaybeUser,
    Form(form): Form<RegisterForm>,
) -> Response {
    if current.is_some() {
        return Redirect::to(DASHBOARD_PATH).into_response();
    }

    let result = form.validate().and_then(|reg| {
        let user = state.db.create_user(
            &reg.username,
            reg.email.as_deref(),
            &reg.password,
            state.config.auth.password_iterations,
        )?;
        sign_in(&state, &user, DASHBOARD_PATH)
    });

    match result {
        Ok(response) => response,
        Err(e) if e.kind() == ErrorKind::Validation => {
            render::register_page(&form, Some(&e)).into_response()
        }
        Err(e) => e.into_response(),
    }
}

pub async fn login_form(Query(query): Query<LoginQuery>) -> Response {
    let next = query.next.unwrap_or_default();
    render::login_page("", &next, None).into_response()
}

pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    let username = form.username.trim();
    let user = match state.db.authenticate(username, &form.password) {
        Ok(user) => user,
        Err(e) => return AppError::from(e).into_response(),
    };

    match user {
        Some(user) => {
            let target = safe_next(&form.next).unwrap_or(DASHBOARD_PATH);
            sign_in(&state, &user, target).unwrap_or_else(IntoResponse::into_response)
        }
        None => {
            warn!(username, "Failed login attempt");
            let err = AppError::invalid_credentials();
            render::login_page(username, &form.next, Some(&err)).into_response()
        }
    }
}

/// End the session (if any) and return to the welcome page.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let cookie_name = &state.config.session.cookie_name;
    if let Some(token) = read_cookie(&headers, cookie_name) {
        match state.db.delete_session(&token) {
            Ok(true) => info!("User signed out"),
            Ok(false) => {}
            Err(e) => return AppError::from(e).into_response(),
        }
    }
    with_cookie(Redirect::to(WELCOME_PATH), &clear_session_cookie(cookie_name))
}
