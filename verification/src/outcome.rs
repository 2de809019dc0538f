//! The closed set of verification results handed to the boundary layer.

use rollcall_types::AttendanceRecord;
use serde::{Deserialize, Serialize};

use crate::{RecordError, VerifyError};

/// Which path produced an outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Qr,
    Otp,
}

impl Channel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Qr => "qr",
            Self::Otp => "otp",
        }
    }
}

/// Why a verification attempt was turned down.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    InvalidInput,
    OutOfRange,
    TokenUnknown,
    TokenMismatch,
    TokenExpired,
    OtpUnknown,
    OtpMismatch,
    OtpExpired,
    AlreadyRecorded,
}

impl RejectReason {
    pub const ALL: [RejectReason; 9] = [
        Self::InvalidInput,
        Self::OutOfRange,
        Self::TokenUnknown,
        Self::TokenMismatch,
        Self::TokenExpired,
        Self::OtpUnknown,
        Self::OtpMismatch,
        Self::OtpExpired,
        Self::AlreadyRecorded,
    ];

    /// Stable machine-readable label (metrics, JSON).
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidInput => "invalid_input",
            Self::OutOfRange => "out_of_range",
            Self::TokenUnknown => "token_unknown",
            Self::TokenMismatch => "token_mismatch",
            Self::TokenExpired => "token_expired",
            Self::OtpUnknown => "otp_unknown",
            Self::OtpMismatch => "otp_mismatch",
            Self::OtpExpired => "otp_expired",
            Self::AlreadyRecorded => "already_recorded",
        }
    }

    /// Message shown to the student.
    pub fn message(&self) -> &'static str {
        match self {
            Self::InvalidInput => "Invalid request",
            Self::OutOfRange => "Outside authorized location",
            Self::TokenUnknown => "QR not recognized",
            Self::TokenMismatch => "QR has been replaced by a newer one",
            Self::TokenExpired => "QR expired",
            Self::OtpUnknown => "No OTP pending. Request a new one.",
            Self::OtpMismatch => "Invalid OTP",
            Self::OtpExpired => "OTP expired",
            Self::AlreadyRecorded => "Attendance already marked for this session",
        }
    }
}

impl From<&VerifyError> for RejectReason {
    fn from(e: &VerifyError) -> Self {
        match e {
            VerifyError::InvalidInput(_) => Self::InvalidInput,
            VerifyError::OutOfRange => Self::OutOfRange,
            VerifyError::TokenUnknown => Self::TokenUnknown,
            VerifyError::TokenMismatch => Self::TokenMismatch,
            VerifyError::TokenExpired => Self::TokenExpired,
            VerifyError::OtpUnknown => Self::OtpUnknown,
            VerifyError::OtpMismatch => Self::OtpMismatch,
            VerifyError::OtpExpired => Self::OtpExpired,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    Accepted {
        record: AttendanceRecord,
        channel: Channel,
    },
    Rejected(RejectReason),
}

impl Outcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    pub fn reason(&self) -> Option<RejectReason> {
        match self {
            Self::Accepted { .. } => None,
            Self::Rejected(reason) => Some(*reason),
        }
    }

    pub fn record(&self) -> Option<&AttendanceRecord> {
        match self {
            Self::Accepted { record, .. } => Some(record),
            Self::Rejected(_) => None,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::Accepted {
                channel: Channel::Qr,
                ..
            } => "Attendance marked successfully",
            Self::Accepted {
                channel: Channel::Otp,
                ..
            } => "OTP verified. Attendance marked.",
            Self::Rejected(reason) => reason.message(),
        }
    }
}

impl From<VerifyError> for Outcome {
    fn from(e: VerifyError) -> Self {
        Self::Rejected(RejectReason::from(&e))
    }
}

/// Split a recorder result into an outcome or a fatal ledger error.
pub(crate) fn from_record(
    result: Result<AttendanceRecord, RecordError>,
    channel: Channel,
) -> Result<Outcome, rollcall_store::StoreError> {
    match result {
        Ok(record) => Ok(Outcome::Accepted { record, channel }),
        Err(RecordError::AlreadyRecorded) => Ok(Outcome::Rejected(RejectReason::AlreadyRecorded)),
        Err(RecordError::Ledger(e)) => Err(e),
    }
}
