use rollcall_store::StoreError;
use rollcall_types::RollcallError;
use thiserror::Error;

/// A failed verification check. Always recoverable; becomes a rejection.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("scan location is outside the authorized radius")]
    OutOfRange,

    #[error("no live session token for this payload")]
    TokenUnknown,

    #[error("session token has been superseded")]
    TokenMismatch,

    #[error("session token has expired")]
    TokenExpired,

    #[error("no pending one-time code")]
    OtpUnknown,

    #[error("one-time code does not match")]
    OtpMismatch,

    #[error("one-time code has expired")]
    OtpExpired,
}

impl From<RollcallError> for VerifyError {
    fn from(e: RollcallError) -> Self {
        Self::InvalidInput(e.to_string())
    }
}

/// Why the recorder refused to append.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("attendance already recorded for this session today")]
    AlreadyRecorded,

    #[error("attendance ledger unavailable: {0}")]
    Ledger(StoreError),
}

impl From<StoreError> for RecordError {
    fn from(e: StoreError) -> Self {
        if e.is_duplicate() {
            Self::AlreadyRecorded
        } else {
            Self::Ledger(e)
        }
    }
}

/// Conditions the engine cannot turn into a rejection.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("attendance ledger unavailable: {0}")]
    Ledger(StoreError),

    #[error("random source failed: {0}")]
    Randomness(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid verification parameters: {0}")]
    InvalidParams(String),
}
