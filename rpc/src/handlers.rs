//! HTTP request handlers.

use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use rollcall_store::export_csv;
use rollcall_types::{AttendanceRecord, Coordinate};
use rollcall_utils::tracing_spans::{issue_span, ledger_span, login_span, otp_span, scan_span};
use rollcall_verification::{Channel, Outcome, RejectReason};
use serde::{Deserialize, Serialize};

use crate::auth::bearer_token;
use crate::pagination::{next_cursor, PaginationParams};
use crate::qr::render_svg;
use crate::{AppState, RpcError};

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, RpcError> {
    payload
        .map(|Json(v)| v)
        .map_err(|e| RpcError::InvalidRequest(e.body_text()))
}

// ── Login ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    pub student_id: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub student_id: String,
    pub name: String,
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, RpcError> {
    let req = body(payload)?;
    let span = login_span(&req.student_id);

    // Argon2 hashing blocks; run it off the async workers.
    let engine = state.engine.clone();
    let LoginRequest {
        student_id,
        password,
    } = req;
    let result = tokio::task::spawn_blocking(move || engine.authenticate(&student_id, &password))
        .await
        .map_err(|e| RpcError::Internal(format!("login task failed: {e}")))?;

    span.in_scope(|| -> Result<Json<LoginResponse>, RpcError> {
        let principal = match result {
            Ok(principal) => principal,
            Err(e) => {
                state.metrics.login_failures.inc();
                tracing::info!("login rejected");
                return Err(RpcError::from(e));
            }
        };
        let token = state
            .logins
            .login(principal.clone(), state.clock.now())
            .map_err(|e| RpcError::Internal(e.to_string()))?;
        state.metrics.logins.inc();
        tracing::info!("login accepted");
        Ok(Json(LoginResponse {
            token,
            student_id: principal.student_id.to_string(),
            name: principal.name,
        }))
    })
}

pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<StatusCode, RpcError> {
    let token = bearer_token(&headers).ok_or(RpcError::Unauthorized)?;
    if state.logins.logout(token) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(RpcError::Unauthorized)
    }
}

// ── Session tokens ───────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct IssueSessionRequest {
    pub subject: String,
    pub period: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IssueSessionResponse {
    pub subject: String,
    pub period: String,
    pub payload: String,
    pub issued_at: u64,
    pub expires_at: u64,
    pub svg: String,
}

/// Issue the QR token for a class session.
///
/// Any logged-in student may call this; there is no instructor role. Issuing
/// for a (subject, period) that already has a live token supersedes it, so
/// scans of the previous QR are answered with `token_mismatch`.
pub async fn issue_session(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<IssueSessionRequest>, JsonRejection>,
) -> Result<Json<IssueSessionResponse>, RpcError> {
    let now = state.clock.now();
    let principal = state.logins.authorize(&headers, now)?;
    let req = body(payload)?;

    issue_span(&req.subject, &req.period).in_scope(|| -> Result<_, RpcError> {
        let token = state.engine.issue_session_token(&req.subject, &req.period, now)?;
        let svg = render_svg(&token.payload)?;
        state.metrics.tokens_issued.inc();
        tracing::debug!(by = %principal.student_id, "QR rendered");
        Ok(Json(IssueSessionResponse {
            subject: token.key.subject,
            period: token.key.period,
            issued_at: token.issued_at.as_secs(),
            expires_at: token.issued_at.as_secs() + state.engine.params().qr_ttl_secs,
            payload: token.payload,
            svg,
        }))
    })
}

// ── Verification ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ScanRequest {
    pub payload: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Deserialize)]
pub struct OtpVerifyRequest {
    pub code: String,
    pub subject: String,
    pub period: String,
}

/// Result of `/scan` and `/otp/verify`. A rejection is a normal 200 reply.
#[derive(Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub accepted: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<AttendanceRecord>,
}

impl From<Outcome> for VerifyResponse {
    fn from(outcome: Outcome) -> Self {
        let message = outcome.message().to_string();
        match outcome {
            Outcome::Accepted { record, .. } => Self {
                accepted: true,
                message,
                reason: None,
                record: Some(record),
            },
            Outcome::Rejected(reason) => Self {
                accepted: false,
                message,
                reason: Some(reason),
                record: None,
            },
        }
    }
}

pub async fn scan(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<ScanRequest>, JsonRejection>,
) -> Result<Json<VerifyResponse>, RpcError> {
    let now = state.clock.now();
    let principal = state.logins.authorize(&headers, now)?;
    let req = body(payload)?;

    scan_span(principal.student_id.as_str()).in_scope(|| -> Result<_, RpcError> {
        let sample = Coordinate::new(req.latitude, req.longitude);
        let outcome = state
            .engine
            .verify_by_qr(&principal, &req.payload, sample, now)?;
        state.metrics.observe(Channel::Qr, &outcome);
        Ok(Json(VerifyResponse::from(outcome)))
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OtpResponse {
    pub code: String,
}

pub async fn request_otp(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<OtpResponse>, RpcError> {
    let now = state.clock.now();
    let principal = state.logins.authorize(&headers, now)?;

    otp_span(principal.student_id.as_str(), "request").in_scope(|| -> Result<_, RpcError> {
        let code = state.engine.request_otp(&principal, now)?;
        state.metrics.otps_issued.inc();
        Ok(Json(OtpResponse { code }))
    })
}

pub async fn verify_otp(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<OtpVerifyRequest>, JsonRejection>,
) -> Result<Json<VerifyResponse>, RpcError> {
    let now = state.clock.now();
    let principal = state.logins.authorize(&headers, now)?;
    let req = body(payload)?;

    otp_span(principal.student_id.as_str(), "verify").in_scope(|| -> Result<_, RpcError> {
        let outcome =
            state
                .engine
                .verify_by_otp(&principal, &req.code, &req.subject, &req.period, now)?;
        state.metrics.observe(Channel::Otp, &outcome);
        Ok(Json(VerifyResponse::from(outcome)))
    })
}

// ── Ledger ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct AttendancePage {
    pub records: Vec<AttendanceRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

pub async fn list_attendance(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    query: Result<Query<PaginationParams>, QueryRejection>,
) -> Result<Json<AttendancePage>, RpcError> {
    state.logins.authorize(&headers, state.clock.now())?;
    let Query(params) = query.map_err(|e| RpcError::InvalidRequest(e.body_text()))?;
    let after_id = params
        .after_id()
        .ok_or_else(|| RpcError::InvalidRequest("malformed cursor".into()))?;
    let count = params.effective_count();

    ledger_span("list").in_scope(|| -> Result<_, RpcError> {
        let records = state
            .engine
            .ledger()
            .iter_records_paged(after_id, count as usize)?;
        let cursor = next_cursor(records.last().map(|r| r.id), records.len(), count);
        Ok(Json(AttendancePage { records, cursor }))
    })
}

pub async fn export_attendance(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, RpcError> {
    state.logins.authorize(&headers, state.clock.now())?;

    ledger_span("export").in_scope(|| -> Result<Response, RpcError> {
        let records = state.engine.ledger().iter_records()?;
        let mut csv = Vec::new();
        let rows = export_csv(&records, &mut csv)
            .map_err(|e| RpcError::Internal(format!("CSV export failed: {e}")))?;
        tracing::info!(rows, "attendance exported");
        Ok((
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"attendance.csv\"",
                ),
            ],
            csv,
        )
            .into_response())
    })
}

// ── Metrics ──────────────────────────────────────────────────────────────

pub async fn metrics(State(state): State<Arc<AppState>>) -> Result<Response, RpcError> {
    state
        .metrics
        .live_tokens
        .set(state.engine.live_token_count() as i64);
    state
        .metrics
        .pending_otps
        .set(state.engine.pending_otp_count() as i64);
    state
        .metrics
        .active_logins
        .set(state.logins.active_count() as i64);
    let text = state.metrics.encode()?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        text,
    )
        .into_response())
}
