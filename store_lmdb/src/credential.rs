//! LMDB implementation of CredentialStore.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env};

use rollcall_crypto::{hash_password, verify_password};
use rollcall_store::{AuthError, CredentialStore, StoreError, StudentCredential};
use rollcall_types::{Principal, RandomSource, StudentId};

use crate::LmdbError;

pub struct LmdbCredentialStore {
    pub(crate) env: Arc<Env>,
    pub(crate) students_db: Database<Bytes, Bytes>,
    pub(crate) rng: Arc<dyn RandomSource>,
}

impl CredentialStore for LmdbCredentialStore {
    fn authenticate(&self, student_id: &StudentId, password: &str) -> Result<Principal, AuthError> {
        let credential = self
            .get_student(student_id)?
            .ok_or(AuthError::InvalidCredentials)?;
        match verify_password(password, &credential.password) {
            Ok(true) => Ok(credential.principal()),
            Ok(false) => Err(AuthError::InvalidCredentials),
            Err(e) => {
                tracing::warn!(student = %student_id, error = %e, "stored password hash is unusable");
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    fn add_student(
        &self,
        student_id: &StudentId,
        name: &str,
        password: &str,
    ) -> Result<(), StoreError> {
        let password = hash_password(password, self.rng.as_ref())
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let credential = StudentCredential {
            student_id: student_id.clone(),
            name: name.to_string(),
            password,
        };
        let value = bincode::serialize(&credential).map_err(LmdbError::from)?;
        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        self.students_db
            .put(&mut wtxn, student_id.as_str().as_bytes(), &value)
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn get_student(&self, student_id: &StudentId) -> Result<Option<StudentCredential>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let credential = self
            .students_db
            .get(&rtxn, student_id.as_str().as_bytes())
            .map_err(LmdbError::from)?
            .map(bincode::deserialize::<StudentCredential>)
            .transpose()
            .map_err(LmdbError::from)?;
        Ok(credential)
    }

    fn student_count(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.students_db.len(&rtxn).map_err(LmdbError::from)?)
    }
}
