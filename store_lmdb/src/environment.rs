//! LMDB environment setup.

use std::path::Path;
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvOpenOptions};
use rollcall_types::RandomSource;

use crate::attendance::LmdbAttendanceLedger;
use crate::credential::LmdbCredentialStore;
use crate::meta::LmdbMetaStore;
use crate::LmdbError;

/// Number of named databases the environment is opened with.
const MAX_DBS: u32 = 8;

/// Wraps the LMDB environment and all database handles.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    /// `id_be_u64(8)` → bincode `AttendanceRecord`.
    pub(crate) attendance_db: Database<Bytes, Bytes>,
    /// Uniqueness index: composite (student, subject, period, date) key → `id_be_u64(8)`.
    pub(crate) attendance_unique_db: Database<Bytes, Bytes>,
    /// `student_id` → bincode `StudentCredential`.
    pub(crate) students_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbEnvironment {
    /// Open or create an LMDB environment at the given path.
    ///
    /// Creates the directory if needed, creates every database, and checks
    /// the stored schema version.
    pub fn open(path: &Path, map_size: usize) -> Result<Self, LmdbError> {
        std::fs::create_dir_all(path)?;

        // SAFETY: the environment is opened once per process per path; the node
        // never opens the same directory twice concurrently.
        let env = unsafe {
            EnvOpenOptions::new()
                .map_size(map_size)
                .max_dbs(MAX_DBS)
                .open(path)?
        };

        let mut wtxn = env.write_txn()?;
        let attendance_db = env.create_database(&mut wtxn, Some("attendance"))?;
        let attendance_unique_db = env.create_database(&mut wtxn, Some("attendance_unique"))?;
        let students_db = env.create_database(&mut wtxn, Some("students"))?;
        let meta_db = env.create_database(&mut wtxn, Some("meta"))?;
        wtxn.commit()?;

        let this = Self {
            env: Arc::new(env),
            attendance_db,
            attendance_unique_db,
            students_db,
            meta_db,
        };
        this.meta_store().ensure_schema()?;
        tracing::info!(path = %path.display(), "opened LMDB environment");
        Ok(this)
    }

    pub fn env(&self) -> &Arc<Env> {
        &self.env
    }

    /// Flush OS buffers to disk.
    pub fn force_sync(&self) -> Result<(), LmdbError> {
        self.env.force_sync()?;
        Ok(())
    }

    pub fn attendance_ledger(&self) -> LmdbAttendanceLedger {
        LmdbAttendanceLedger {
            env: Arc::clone(&self.env),
            attendance_db: self.attendance_db,
            attendance_unique_db: self.attendance_unique_db,
        }
    }

    /// Credential store drawing password salts from `rng`.
    pub fn credential_store(&self, rng: Arc<dyn RandomSource>) -> LmdbCredentialStore {
        LmdbCredentialStore {
            env: Arc::clone(&self.env),
            students_db: self.students_db,
            rng,
        }
    }

    pub fn meta_store(&self) -> LmdbMetaStore {
        LmdbMetaStore {
            env: Arc::clone(&self.env),
            meta_db: self.meta_db,
        }
    }
}
