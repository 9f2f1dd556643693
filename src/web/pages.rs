//! Public pages.

use super::session::MaybeUser;
use super::{DASHBOARD_PATH, WELCOME_PATH, render};
use axum::response::{Html, IntoResponse, Redirect, Response};

/// `/` sends visitors to the dashboard or the welcome page.
pub async fn root(MaybeUser(user): MaybeUser) -> Redirect {
    match user {
        Some(_) => Redirect::to(DASHBOARD_PATH),
        None => Redirect::to(WELCOME_PATH),
    }
}

pub async fn welcome(MaybeUser(user): MaybeUser) -> Response {
    match user {
        Some(_) => Redirect::to(DASHBOARD_PATH).into_response(),
        None => render::welcome_page().into_response(),
    }
}

pub async fn home(MaybeUser(user): MaybeUser) -> Html<String> {
    render::home_page(user.as_ref())
}

pub async fn about(MaybeUser(user): MaybeUser) -> Html<String> {
    render::about_page(user.as_ref())
}
