//! HTTP server for the task tracker.
//!
//! This module wires the page handlers into an axum router and runs it
//! until a shutdown signal arrives.

use axum::{
    Router,
    response::{IntoResponse, Json},
    routing::get,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::{accounts, pages, tasks};
use crate::config::Config;
use crate::db::Database;
use crate::motivation::{MessagePicker, OsRandomPicker};

/// State shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Reference to the record store.
    pub db: Arc<Database>,
    /// Effective configuration.
    pub config: Arc<Config>,
    /// Source of dashboard message choices.
    pub picker: Arc<dyn MessagePicker>,
}

impl AppState {
    /// Create state with the OS-random message picker.
    pub fn new(db: Arc<Database>, config: Arc<Config>) -> Self {
        Self::with_picker(db, config, Arc::new(OsRandomPicker))
    }

    pub fn with_picker(
        db: Arc<Database>,
        config: Arc<Config>,
        picker: Arc<dyn MessagePicker>,
    ) -> Self {
        Self { db, config, picker }
    }
}

/// Health check response.
#[derive(serde::Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint.
async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Build the router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Public pages
        .route("/", get(pages::root))
        .route("/pages/welcome/", get(pages::welcome))
        .route("/tasks/welcome/", get(pages::welcome))
        .route("/tasks/", get(pages::welcome))
        .route("/pages/home/", get(pages::home))
        .route("/pages/about/", get(pages::about))
        // Accounts
        .route(
            "/tasks/register/",
            get(accounts::register_form).post(accounts::register),
        )
        .route(
            "/tasks/login/",
            get(accounts::login_form).post(accounts::login),
        )
        .route(
            "/tasks/logout/",
            get(accounts::logout).post(accounts::logout),
        )
        // Tasks
        .route("/tasks/dashboard/", get(tasks::dashboard))
        .route("/tasks/tasks/", get(tasks::task_list))
        .route(
            "/tasks/tasks/add/",
            get(tasks::add_form).post(tasks::add_task),
        )
        .route(
            "/tasks/tasks/edit/{task_id}/",
            get(tasks::edit_form).post(tasks::edit_task),
        )
        .route(
            "/tasks/tasks/delete/{task_id}/",
            get(tasks::delete_task).post(tasks::delete_task),
        )
        .route("/tasks/tasks/complete/{task_id}/", get(tasks::complete_task))
        // JSON API
        .route("/api/health", get(health))
        .route("/api/dashboard", get(tasks::api_dashboard))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Handle for a running server.
pub struct ServerHandle {
    /// Address the server is bound to.
    pub addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    join: JoinHandle<()>,
}

impl ServerHandle {
    /// Signal shutdown and wait for in-flight requests to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        if let Err(e) = self.join.await {
            tracing::error!("Server task failed: {}", e);
        }
    }
}

/// Start the HTTP server on `addr`.
///
/// Port 0 picks a free port; the bound address is on the returned handle.
pub async fn start_server(state: AppState, addr: SocketAddr) -> anyhow::Result<ServerHandle> {
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    info!("Taskboard listening on http://{}", bound_addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let join = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                info!("Server shutting down");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }
    });

    Ok(ServerHandle {
        addr: bound_addr,
        shutdown_tx,
        join,
    })
}
