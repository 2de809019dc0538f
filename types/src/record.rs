//! Attendance ledger rows.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::{SessionKey, StudentId};

/// A verified attendance event that has not yet been assigned a ledger id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAttendance {
    pub student_id: StudentId,
    pub session: SessionKey,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

/// A row in the attendance ledger.
///
/// At most one row exists per (student, subject, period, date).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Auto-assigned, strictly increasing, starting at 1.
    pub id: u64,
    pub student_id: StudentId,
    pub session: SessionKey,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl AttendanceRecord {
    pub fn from_new(id: u64, entry: NewAttendance) -> Self {
        Self {
            id,
            student_id: entry.student_id,
            session: entry.session,
            date: entry.date,
            time: entry.time,
        }
    }
}
