//! HTTP/JSON server for rollcall.
//!
//! Provides endpoints for:
//! - Login and logout (bearer sessions)
//! - Issuing QR session tokens, rendered as SVG
//! - QR scan and one-time-code verification
//! - Listing and CSV export of the attendance ledger
//! - Prometheus metrics

pub mod auth;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod pagination;
pub mod qr;
pub mod server;

pub use auth::LoginSessions;
pub use error::RpcError;
pub use metrics::AttendanceMetrics;
pub use server::{router, AppState, RpcServer};
