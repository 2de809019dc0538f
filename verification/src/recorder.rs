//! The ledger-facing gate: at most one record per student, session and date.

use std::sync::Arc;

use rollcall_store::AttendanceLedger;
use rollcall_types::{AttendanceRecord, NewAttendance, SessionKey, StudentId, Timestamp};

use crate::RecordError;

pub struct AttendanceRecorder {
    ledger: Arc<dyn AttendanceLedger>,
    utc_offset_minutes: i32,
}

impl AttendanceRecorder {
    /// `utc_offset_minutes` selects the local calendar a record is filed under.
    pub fn new(ledger: Arc<dyn AttendanceLedger>, utc_offset_minutes: i32) -> Self {
        Self {
            ledger,
            utc_offset_minutes,
        }
    }

    /// Append a record for `student` in `session` stamped with `now`.
    ///
    /// The ledger's append is the atomic check-and-insert; the `exists` check
    /// only spares the write transaction for the common repeat-scan case.
    pub fn record(
        &self,
        student: &StudentId,
        session: &SessionKey,
        now: Timestamp,
    ) -> Result<AttendanceRecord, RecordError> {
        let (date, time) = now.to_local(self.utc_offset_minutes);
        if self.ledger.exists(student, session, date)? {
            return Err(RecordError::AlreadyRecorded);
        }
        let record = self.ledger.append(NewAttendance {
            student_id: student.clone(),
            session: session.clone(),
            date,
            time,
        })?;
        tracing::info!(
            id = record.id,
            student = %student,
            subject = %session.subject,
            period = %session.period,
            date = %date,
            "attendance recorded"
        );
        Ok(record)
    }

    pub fn ledger(&self) -> &Arc<dyn AttendanceLedger> {
        &self.ledger
    }
}
