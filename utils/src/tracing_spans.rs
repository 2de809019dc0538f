//! Pre-built [`tracing::Span`] constructors for common rollcall operations.
//!
//! Consistent span names and field sets make request logs easy to filter
//! and correlate. Never put token payloads or one-time codes in a span.

use tracing::{info_span, Span};

/// Span covering a login attempt.
pub fn login_span(student: &str) -> Span {
    info_span!("login", student = %student)
}

/// Span covering the issue of a QR session token.
pub fn issue_span(subject: &str, period: &str) -> Span {
    info_span!("issue", subject = %subject, period = %period)
}

/// Span covering a QR scan submission.
pub fn scan_span(student: &str) -> Span {
    info_span!("scan", student = %student)
}

/// Span covering a one-time code request or verification.
pub fn otp_span(student: &str, action: &str) -> Span {
    info_span!("otp", student = %student, action = %action)
}

/// Span covering a ledger read (listing or export).
pub fn ledger_span(action: &str) -> Span {
    info_span!("ledger", action = %action)
}
