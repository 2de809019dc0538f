//! Prometheus metrics for the attendance server.
//!
//! [`AttendanceMetrics`] owns a dedicated [`Registry`] that the `/metrics`
//! endpoint encodes into the Prometheus text exposition format.

use prometheus::{
    register_int_counter_vec_with_registry, register_int_counter_with_registry,
    register_int_gauge_with_registry, Encoder, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};
use rollcall_verification::{Channel, Outcome};

use crate::RpcError;

pub struct AttendanceMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Accepted verifications, by channel.
    pub accepted: IntCounterVec,
    /// Rejected verifications, by channel and reason.
    pub rejected: IntCounterVec,
    pub tokens_issued: IntCounter,
    pub otps_issued: IntCounter,
    pub logins: IntCounter,
    pub login_failures: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    pub live_tokens: IntGauge,
    pub pending_otps: IntGauge,
    pub active_logins: IntGauge,
}

impl AttendanceMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let accepted = register_int_counter_vec_with_registry!(
            Opts::new(
                "rollcall_verifications_accepted_total",
                "Verifications that produced an attendance record"
            ),
            &["channel"],
            registry
        )?;
        let rejected = register_int_counter_vec_with_registry!(
            Opts::new(
                "rollcall_verifications_rejected_total",
                "Verifications turned down, by reason"
            ),
            &["channel", "reason"],
            registry
        )?;
        let tokens_issued = register_int_counter_with_registry!(
            Opts::new("rollcall_tokens_issued_total", "QR session tokens issued"),
            registry
        )?;
        let otps_issued = register_int_counter_with_registry!(
            Opts::new("rollcall_otps_issued_total", "One-time codes issued"),
            registry
        )?;
        let logins = register_int_counter_with_registry!(
            Opts::new("rollcall_logins_total", "Successful logins"),
            registry
        )?;
        let login_failures = register_int_counter_with_registry!(
            Opts::new("rollcall_login_failures_total", "Rejected logins"),
            registry
        )?;
        let live_tokens = register_int_gauge_with_registry!(
            Opts::new("rollcall_live_tokens", "Live QR session tokens"),
            registry
        )?;
        let pending_otps = register_int_gauge_with_registry!(
            Opts::new("rollcall_pending_otps", "Pending one-time codes"),
            registry
        )?;
        let active_logins = register_int_gauge_with_registry!(
            Opts::new("rollcall_active_logins", "Active bearer sessions"),
            registry
        )?;

        Ok(Self {
            registry,
            accepted,
            rejected,
            tokens_issued,
            otps_issued,
            logins,
            login_failures,
            live_tokens,
            pending_otps,
            active_logins,
        })
    }

    /// Count one verification outcome.
    pub fn observe(&self, channel: Channel, outcome: &Outcome) {
        match outcome.reason() {
            None => self.accepted.with_label_values(&[channel.as_str()]).inc(),
            Some(reason) => self
                .rejected
                .with_label_values(&[channel.as_str(), reason.as_str()])
                .inc(),
        }
    }

    /// Encode every registered metric in the text exposition format.
    pub fn encode(&self) -> Result<String, RpcError> {
        let mut buf = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buf)
            .map_err(|e| RpcError::Internal(format!("metrics encoding failed: {e}")))?;
        String::from_utf8(buf).map_err(|e| RpcError::Internal(e.to_string()))
    }
}
