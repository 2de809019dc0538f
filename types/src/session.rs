//! Teaching-session identity.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::RollcallError;

/// Identifies one teaching session by subject and period.
///
/// Carries no date: the same key recurs every day the subject is taught.
/// Attendance records add the calendar date themselves.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub subject: String,
    pub period: String,
}

impl SessionKey {
    pub const MAX_FIELD_LEN: usize = 128;

    /// Build a key from trimmed, non-empty subject and period names.
    pub fn new(subject: &str, period: &str) -> Result<Self, RollcallError> {
        Ok(Self {
            subject: clean_field("subject", subject)?,
            period: clean_field("period", period)?,
        })
    }
}

fn clean_field(name: &str, raw: &str) -> Result<String, RollcallError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(RollcallError::InvalidSessionKey(format!("{name} is empty")));
    }
    if trimmed.len() > SessionKey::MAX_FIELD_LEN {
        return Err(RollcallError::InvalidSessionKey(format!(
            "{name} longer than {} bytes",
            SessionKey::MAX_FIELD_LEN
        )));
    }
    if trimmed.chars().any(char::is_control) {
        return Err(RollcallError::InvalidSessionKey(format!(
            "{name} contains control characters"
        )));
    }
    Ok(trimmed.to_string())
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.subject, self.period)
    }
}
