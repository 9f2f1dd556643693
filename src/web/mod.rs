//! Web front end.
//!
//! Server-rendered HTML pages plus a small JSON API, served by axum.

mod accounts;
pub mod forms;
mod pages;
pub mod render;
mod server;
pub mod session;
mod tasks;
pub mod templates;

pub use server::{AppState, ServerHandle, build_router, start_server};

/// Landing page for signed-in users.
pub const DASHBOARD_PATH: &str = "/tasks/dashboard/";
/// Landing page for anonymous visitors.
pub const WELCOME_PATH: &str = "/pages/welcome/";
pub const LOGIN_PATH: &str = "/tasks/login/";
