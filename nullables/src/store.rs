//! Nullable stores: thread-safe in-memory storage for testing.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDate;
use parking_lot::Mutex;
use rollcall_crypto::{hash_password, verify_password};
use rollcall_store::{AttendanceLedger, AuthError, CredentialStore, StoreError, StudentCredential};
use rollcall_types::{AttendanceRecord, NewAttendance, Principal, SessionKey, StudentId};

use crate::NullRandom;

type UniqueKey = (StudentId, SessionKey, NaiveDate);

#[derive(Default)]
struct LedgerState {
    records: Vec<AttendanceRecord>,
    unique: HashSet<UniqueKey>,
}

/// An in-memory attendance ledger.
///
/// One lock covers both the rows and the uniqueness index, so `append` is an
/// atomic check-and-insert exactly like the LMDB write transaction.
#[derive(Default)]
pub struct NullLedger {
    state: Mutex<LedgerState>,
    unavailable: AtomicBool,
}

impl NullLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a backend error (or recover).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("null ledger marked unavailable".into()));
        }
        Ok(())
    }
}

impl AttendanceLedger for NullLedger {
    fn exists(
        &self,
        student: &StudentId,
        session: &SessionKey,
        date: NaiveDate,
    ) -> Result<bool, StoreError> {
        self.check_available()?;
        let key = (student.clone(), session.clone(), date);
        Ok(self.state.lock().unique.contains(&key))
    }

    fn append(&self, entry: NewAttendance) -> Result<AttendanceRecord, StoreError> {
        self.check_available()?;
        let mut state = self.state.lock();
        let key = (entry.student_id.clone(), entry.session.clone(), entry.date);
        if !state.unique.insert(key) {
            return Err(StoreError::Duplicate(format!(
                "{} {} {}",
                entry.student_id, entry.session, entry.date
            )));
        }
        let id = state.records.len() as u64 + 1;
        let record = AttendanceRecord::from_new(id, entry);
        state.records.push(record.clone());
        Ok(record)
    }

    fn get(&self, id: u64) -> Result<AttendanceRecord, StoreError> {
        self.check_available()?;
        self.state
            .lock()
            .records
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("attendance record {id}")))
    }

    fn record_count(&self) -> Result<u64, StoreError> {
        self.check_available()?;
        Ok(self.state.lock().records.len() as u64)
    }

    fn iter_records(&self) -> Result<Vec<AttendanceRecord>, StoreError> {
        self.check_available()?;
        Ok(self.state.lock().records.clone())
    }
}

/// An in-memory credential store.
///
/// Passwords go through the real Argon2id hasher with a deterministic salt.
pub struct NullCredentialStore {
    students: Mutex<HashMap<StudentId, StudentCredential>>,
    rng: NullRandom,
}

impl NullCredentialStore {
    pub fn new() -> Self {
        Self {
            students: Mutex::new(HashMap::new()),
            rng: NullRandom::seeded(42),
        }
    }
}

impl Default for NullCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for NullCredentialStore {
    fn authenticate(&self, student_id: &StudentId, password: &str) -> Result<Principal, AuthError> {
        let credential = self
            .get_student(student_id)?
            .ok_or(AuthError::InvalidCredentials)?;
        match verify_password(password, &credential.password) {
            Ok(true) => Ok(credential.principal()),
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    fn add_student(
        &self,
        student_id: &StudentId,
        name: &str,
        password: &str,
    ) -> Result<(), StoreError> {
        let password =
            hash_password(password, &self.rng).map_err(|e| StoreError::Backend(e.to_string()))?;
        self.students.lock().insert(
            student_id.clone(),
            StudentCredential {
                student_id: student_id.clone(),
                name: name.to_string(),
                password,
            },
        );
        Ok(())
    }

    fn get_student(&self, student_id: &StudentId) -> Result<Option<StudentCredential>, StoreError> {
        Ok(self.students.lock().get(student_id).cloned())
    }

    fn student_count(&self) -> Result<u64, StoreError> {
        Ok(self.students.lock().len() as u64)
    }
}
