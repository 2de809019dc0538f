//! Axum-based HTTP server.

use std::future::Future;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use rollcall_types::Clock;
use rollcall_verification::VerificationEngine;
use tracing::info;

use crate::error::RpcError;
use crate::{handlers, AttendanceMetrics, LoginSessions};

/// Everything a handler needs, shared across requests.
pub struct AppState {
    pub engine: Arc<VerificationEngine>,
    pub logins: LoginSessions,
    pub metrics: AttendanceMetrics,
    pub clock: Arc<dyn Clock>,
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/sessions", post(handlers::issue_session))
        .route("/scan", post(handlers::scan))
        .route("/otp/request", post(handlers::request_otp))
        .route("/otp/verify", post(handlers::verify_otp))
        .route("/attendance", get(handlers::list_attendance))
        .route("/attendance/export", get(handlers::export_attendance))
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
}

pub struct RpcServer {
    pub listen_addr: String,
    pub state: Arc<AppState>,
}

impl RpcServer {
    pub fn new(listen_addr: impl Into<String>, state: Arc<AppState>) -> Self {
        Self {
            listen_addr: listen_addr.into(),
            state,
        }
    }

    /// Bind and serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), RpcError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(&self.listen_addr)
            .await
            .map_err(|e| RpcError::Server(format!("bind {}: {e}", self.listen_addr)))?;
        let local = listener
            .local_addr()
            .map_err(|e| RpcError::Server(e.to_string()))?;
        info!(addr = %local, "HTTP server listening");

        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| RpcError::Server(e.to_string()))?;
        info!("HTTP server stopped");
        Ok(())
    }
}
