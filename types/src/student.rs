//! Student identity types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::RollcallError;

/// A student's register number.
///
/// Always non-empty, at most [`StudentId::MAX_LEN`] bytes, and free of
/// whitespace and control characters.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StudentId(String);

impl StudentId {
    pub const MAX_LEN: usize = 64;

    /// Validate and wrap a raw register number.
    pub fn new(raw: impl Into<String>) -> Result<Self, RollcallError> {
        let s = raw.into();
        if s.is_empty() {
            return Err(RollcallError::InvalidStudentId("empty".into()));
        }
        if s.len() > Self::MAX_LEN {
            return Err(RollcallError::InvalidStudentId(format!(
                "longer than {} bytes",
                Self::MAX_LEN
            )));
        }
        if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(RollcallError::InvalidStudentId(format!(
                "{s:?} contains whitespace or control characters"
            )));
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for StudentId {
    type Err = RollcallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// The authenticated student attached to a request.
///
/// Resolved by the credential store; the engine only reads the id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub student_id: StudentId,
    pub name: String,
}

impl Principal {
    pub fn new(student_id: StudentId, name: impl Into<String>) -> Self {
        Self {
            student_id,
            name: name.into(),
        }
    }
}
