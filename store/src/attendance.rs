//! Attendance ledger trait.

use crate::StoreError;
use chrono::NaiveDate;
use rollcall_types::{AttendanceRecord, NewAttendance, SessionKey, StudentId};

/// Durable, append-only store of verified attendance events.
///
/// Implementations must make [`AttendanceLedger::append`] an atomic
/// check-and-insert over (student, subject, period, date): of any number of
/// concurrent appends for the same key exactly one succeeds and the rest get
/// [`StoreError::Duplicate`].
pub trait AttendanceLedger: Send + Sync {
    /// Whether a record already exists for this student, session and date.
    fn exists(
        &self,
        student: &StudentId,
        session: &SessionKey,
        date: NaiveDate,
    ) -> Result<bool, StoreError>;

    /// Assign the next id and persist the record.
    fn append(&self, entry: NewAttendance) -> Result<AttendanceRecord, StoreError>;

    fn get(&self, id: u64) -> Result<AttendanceRecord, StoreError>;

    fn record_count(&self) -> Result<u64, StoreError>;

    /// All records in id order.
    fn iter_records(&self) -> Result<Vec<AttendanceRecord>, StoreError>;

    /// Up to `limit` records with id greater than `after_id`, in id order.
    fn iter_records_paged(
        &self,
        after_id: u64,
        limit: usize,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        Ok(self
            .iter_records()?
            .into_iter()
            .filter(|r| r.id > after_id)
            .take(limit)
            .collect())
    }
}
