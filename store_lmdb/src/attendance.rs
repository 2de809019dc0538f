//! LMDB implementation of AttendanceLedger.
//!
//! Two databases:
//! - `attendance_db`: `id_be_u64(8)` → bincode record. Big-endian ids sort
//!   numerically, so the last key is the highest id and iteration is in id order.
//! - `attendance_unique_db`: composite key over (student, subject, period,
//!   date) → `id_be_u64(8)`. Each string field is length-prefixed so no two
//!   distinct tuples share a key; the date is big-endian days from CE.
//!
//! `append` does the uniqueness check and both puts inside one write
//! transaction. LMDB admits a single writer at a time, so the check-and-insert
//! is atomic across threads.

use std::ops::Bound;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use heed::types::Bytes;
use heed::{Database, Env};

use rollcall_store::{AttendanceLedger, StoreError};
use rollcall_types::{AttendanceRecord, NewAttendance, SessionKey, StudentId};

use crate::LmdbError;

pub struct LmdbAttendanceLedger {
    pub(crate) env: Arc<Env>,
    pub(crate) attendance_db: Database<Bytes, Bytes>,
    pub(crate) attendance_unique_db: Database<Bytes, Bytes>,
}

fn push_field(key: &mut Vec<u8>, field: &str) {
    let bytes = field.as_bytes();
    // Fields are bounded well below u16::MAX by StudentId/SessionKey validation.
    let len = u16::try_from(bytes.len()).unwrap_or(u16::MAX);
    key.extend_from_slice(&len.to_be_bytes());
    key.extend_from_slice(&bytes[..usize::from(len)]);
}

/// Build the composite uniqueness key.
fn unique_key(student: &StudentId, session: &SessionKey, date: NaiveDate) -> Vec<u8> {
    let mut key = Vec::with_capacity(
        6 + student.as_str().len() + session.subject.len() + session.period.len() + 4,
    );
    push_field(&mut key, student.as_str());
    push_field(&mut key, &session.subject);
    push_field(&mut key, &session.period);
    key.extend_from_slice(&date.num_days_from_ce().to_be_bytes());
    key
}

fn decode_id(bytes: &[u8]) -> Result<u64, LmdbError> {
    let arr: [u8; 8] = bytes
        .try_into()
        .map_err(|_| LmdbError::Serialization(format!("bad id key length {}", bytes.len())))?;
    Ok(u64::from_be_bytes(arr))
}

fn decode_record(bytes: &[u8]) -> Result<AttendanceRecord, LmdbError> {
    Ok(bincode::deserialize(bytes)?)
}

impl LmdbAttendanceLedger {
    fn scan(&self, after_id: u64, limit: usize) -> Result<Vec<AttendanceRecord>, LmdbError> {
        let rtxn = self.env.read_txn()?;
        let lower = after_id.to_be_bytes();
        let bounds: (Bound<&[u8]>, Bound<&[u8]>) = (Bound::Excluded(&lower[..]), Bound::Unbounded);
        let mut results = Vec::new();
        for entry in self.attendance_db.range(&rtxn, &bounds)? {
            if results.len() == limit {
                break;
            }
            let (_key, val) = entry?;
            results.push(decode_record(val)?);
        }
        Ok(results)
    }
}

impl AttendanceLedger for LmdbAttendanceLedger {
    fn exists(
        &self,
        student: &StudentId,
        session: &SessionKey,
        date: NaiveDate,
    ) -> Result<bool, StoreError> {
        let key = unique_key(student, session, date);
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let found = self
            .attendance_unique_db
            .get(&rtxn, &key)
            .map_err(LmdbError::from)?
            .is_some();
        Ok(found)
    }

    fn append(&self, entry: NewAttendance) -> Result<AttendanceRecord, StoreError> {
        let key = unique_key(&entry.student_id, &entry.session, entry.date);
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;

        if self
            .attendance_unique_db
            .get(&wtxn, &key)
            .map_err(LmdbError::from)?
            .is_some()
        {
            // Dropping the txn aborts it.
            return Err(StoreError::Duplicate(format!(
                "{} {} {}",
                entry.student_id, entry.session, entry.date
            )));
        }

        let next_id = match self.attendance_db.last(&wtxn).map_err(LmdbError::from)? {
            Some((last_key, _)) => decode_id(last_key)? + 1,
            None => 1,
        };
        let record = AttendanceRecord::from_new(next_id, entry);
        let value = bincode::serialize(&record).map_err(LmdbError::from)?;
        let id_key = next_id.to_be_bytes();

        self.attendance_db
            .put(&mut wtxn, &id_key, &value)
            .map_err(LmdbError::from)?;
        self.attendance_unique_db
            .put(&mut wtxn, &key, &id_key)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(record)
    }

    fn get(&self, id: u64) -> Result<AttendanceRecord, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let bytes = self
            .attendance_db
            .get(&rtxn, &id.to_be_bytes())
            .map_err(LmdbError::from)?
            .ok_or_else(|| LmdbError::NotFound(format!("attendance record {id}")))?;
        Ok(decode_record(bytes)?)
    }

    fn record_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.attendance_db.len(&rtxn).map_err(LmdbError::from)?)
    }

    fn iter_records(&self) -> Result<Vec<AttendanceRecord>, StoreError> {
        Ok(self.scan(0, usize::MAX)?)
    }

    fn iter_records_paged(
        &self,
        after_id: u64,
        limit: usize,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        Ok(self.scan(after_id, limit)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_key_is_unambiguous() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let a = unique_key(
            &"AB".parse().unwrap(),
            &SessionKey::new("C", "P1").unwrap(),
            date,
        );
        let b = unique_key(
            &"A".parse().unwrap(),
            &SessionKey::new("BC", "P1").unwrap(),
            date,
        );
        assert_ne!(a, b);
    }

    #[test]
    fn unique_key_distinguishes_dates() {
        let student: StudentId = "S1".parse().unwrap();
        let session = SessionKey::new("CS101", "P1").unwrap();
        let d1 = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        assert_ne!(unique_key(&student, &session, d1), unique_key(&student, &session, d2));
    }
}
