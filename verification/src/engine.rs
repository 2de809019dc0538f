//! Orchestration of the two verification paths.

use std::sync::Arc;

use rollcall_store::{AttendanceLedger, AuthError, CredentialStore};
use rollcall_types::{
    Coordinate, Principal, RandomSource, RollcallError, SessionKey, StudentId, Timestamp,
    VerificationParams,
};
use tracing::{debug, info};

use crate::outcome::from_record;
use crate::{
    AttendanceRecorder, Channel, EngineError, Geofence, OtpRegistry, Outcome, SessionToken,
    SessionTokenRegistry,
};

/// Entry point for the boundary layer.
///
/// Safe to share across request handlers: every registry synchronizes
/// internally and the ledger enforces uniqueness atomically.
pub struct VerificationEngine {
    params: VerificationParams,
    geofence: Geofence,
    tokens: SessionTokenRegistry,
    otps: OtpRegistry,
    recorder: AttendanceRecorder,
    credentials: Arc<dyn CredentialStore>,
}

impl VerificationEngine {
    /// Build an engine with fresh, empty registries.
    pub fn new(
        params: VerificationParams,
        ledger: Arc<dyn AttendanceLedger>,
        credentials: Arc<dyn CredentialStore>,
        rng: Arc<dyn RandomSource>,
    ) -> Result<Self, EngineError> {
        let tokens = SessionTokenRegistry::new(rng.clone());
        let otps = OtpRegistry::new(rng, params.otp_length, params.otp_max_attempts);
        let recorder = AttendanceRecorder::new(ledger, params.utc_offset_minutes);
        Self::from_parts(params, tokens, otps, recorder, credentials)
    }

    /// Build an engine around registries supplied by the caller.
    pub fn from_parts(
        params: VerificationParams,
        tokens: SessionTokenRegistry,
        otps: OtpRegistry,
        recorder: AttendanceRecorder,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, EngineError> {
        params
            .validate()
            .map_err(|e| EngineError::InvalidParams(e.to_string()))?;
        Ok(Self {
            geofence: Geofence::new(params.authorized_location, params.max_distance_km),
            params,
            tokens,
            otps,
            recorder,
            credentials,
        })
    }

    pub fn params(&self) -> &VerificationParams {
        &self.params
    }

    pub fn ledger(&self) -> &Arc<dyn AttendanceLedger> {
        self.recorder.ledger()
    }

    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    /// Resolve a principal through the credential store.
    pub fn authenticate(&self, student_id: &str, password: &str) -> Result<Principal, AuthError> {
        let student_id = StudentId::new(student_id).map_err(|_| AuthError::InvalidCredentials)?;
        self.credentials.authenticate(&student_id, password)
    }

    /// Start (or restart) a QR session for `subject`/`period`.
    pub fn issue_session_token(
        &self,
        subject: &str,
        period: &str,
        now: Timestamp,
    ) -> Result<SessionToken, EngineError> {
        let key = SessionKey::new(subject, period)
            .map_err(|e| EngineError::InvalidInput(e.to_string()))?;
        let token = self.tokens.issue(key, now).map_err(randomness)?;
        info!(
            subject = %token.key.subject,
            period = %token.key.period,
            issued_at = token.issued_at.as_secs(),
            "session token issued"
        );
        Ok(token)
    }

    /// QR path: geofence, then token freshness, then the recorder.
    pub fn verify_by_qr(
        &self,
        principal: &Principal,
        payload: &str,
        sample: Coordinate,
        now: Timestamp,
    ) -> Result<Outcome, EngineError> {
        let outcome = match self.geofence.contains(sample) {
            Err(e) => Outcome::from(e),
            Ok(false) => Outcome::Rejected(crate::RejectReason::OutOfRange),
            Ok(true) => match self.tokens.validate(payload, now, self.params.qr_ttl_secs) {
                Err(e) => Outcome::from(e),
                Ok(session) => from_record(
                    self.recorder.record(&principal.student_id, &session, now),
                    Channel::Qr,
                )
                .map_err(EngineError::Ledger)?,
            },
        };
        log_outcome(principal, Channel::Qr, &outcome);
        Ok(outcome)
    }

    /// Issue a one-time code for the principal.
    ///
    /// The code is returned to the caller; delivering it out of band is the
    /// boundary layer's concern.
    pub fn request_otp(&self, principal: &Principal, now: Timestamp) -> Result<String, EngineError> {
        let code = self
            .otps
            .request(&principal.student_id, now)
            .map_err(randomness)?;
        info!(student = %principal.student_id, "one-time code issued");
        Ok(code)
    }

    /// OTP path: consume the code, then the recorder. No geofence.
    pub fn verify_by_otp(
        &self,
        principal: &Principal,
        code: &str,
        subject: &str,
        period: &str,
        now: Timestamp,
    ) -> Result<Outcome, EngineError> {
        // Validate the session first so a malformed request leaves the code intact.
        let outcome = match SessionKey::new(subject, period) {
            Err(e) => Outcome::from(crate::VerifyError::from(e)),
            Ok(session) => match self.otps.consume(
                &principal.student_id,
                code,
                now,
                self.params.otp_ttl_secs,
            ) {
                Err(e) => Outcome::from(e),
                Ok(()) => from_record(
                    self.recorder.record(&principal.student_id, &session, now),
                    Channel::Otp,
                )
                .map_err(EngineError::Ledger)?,
            },
        };
        log_outcome(principal, Channel::Otp, &outcome);
        Ok(outcome)
    }

    /// Forget superseded token payloads older than the QR window.
    ///
    /// Live tokens and pending codes are kept even once expired; both maps
    /// are bounded by the number of sessions and students. Returns how many
    /// payloads were forgotten.
    pub fn purge(&self, now: Timestamp) -> usize {
        self.tokens.purge(now, self.params.qr_ttl_secs)
    }

    pub fn live_token_count(&self) -> usize {
        self.tokens.live_count()
    }

    pub fn pending_otp_count(&self) -> usize {
        self.otps.pending_count()
    }
}

fn randomness(e: RollcallError) -> EngineError {
    EngineError::Randomness(e.to_string())
}

fn log_outcome(principal: &Principal, channel: Channel, outcome: &Outcome) {
    match outcome {
        Outcome::Accepted { record, .. } => {
            debug!(student = %principal.student_id, ?channel, id = record.id, "verification accepted")
        }
        Outcome::Rejected(reason) => {
            debug!(student = %principal.student_id, ?channel, reason = reason.as_str(), "verification rejected")
        }
    }
}
