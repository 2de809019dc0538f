//! LMDB metadata (schema version).

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use crate::LmdbError;

const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";

/// Layout written by this build: `attendance`, `attendance_unique`,
/// `students` and `meta`.
pub const SCHEMA_VERSION: u32 = 1;

pub struct LmdbMetaStore {
    pub(crate) env: Arc<Env>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

impl LmdbMetaStore {
    /// Stored schema version; 0 for a fresh database.
    pub fn get_schema_version(&self) -> Result<u32, LmdbError> {
        let rtxn = self.env.read_txn()?;
        match self.meta_db.get(&rtxn, SCHEMA_VERSION_KEY)? {
            Some(bytes) => {
                let arr: [u8; 4] = bytes.try_into().map_err(|_| {
                    LmdbError::Serialization(
                        "schema_version has unexpected byte length".to_string(),
                    )
                })?;
                Ok(u32::from_le_bytes(arr))
            }
            None => Ok(0),
        }
    }

    /// Stamp a fresh database with [`SCHEMA_VERSION`] and refuse one written
    /// by a newer build.
    pub fn ensure_schema(&self) -> Result<(), LmdbError> {
        match self.get_schema_version()? {
            0 => {
                self.set_schema_version(SCHEMA_VERSION)?;
                tracing::info!(version = SCHEMA_VERSION, "initialised database schema");
                Ok(())
            }
            SCHEMA_VERSION => Ok(()),
            found => Err(LmdbError::Schema {
                found,
                supported: SCHEMA_VERSION,
            }),
        }
    }

    pub fn set_schema_version(&self, version: u32) -> Result<(), LmdbError> {
        let bytes = version.to_le_bytes();
        let mut wtxn = self.env.write_txn()?;
        self.meta_db.put(&mut wtxn, SCHEMA_VERSION_KEY, &bytes)?;
        wtxn.commit()?;
        Ok(())
    }
}
