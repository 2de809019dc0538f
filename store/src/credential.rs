//! Credential store trait.

use rollcall_crypto::PasswordHash;
use rollcall_types::{Principal, StudentId};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::StoreError;

/// A registered student and their password hash.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StudentCredential {
    pub student_id: StudentId,
    pub name: String,
    pub password: PasswordHash,
}

impl StudentCredential {
    pub fn principal(&self) -> Principal {
        Principal::new(self.student_id.clone(), self.name.clone())
    }
}

/// Why a login attempt failed.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Unknown student or wrong password; the two are indistinguishable.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("credential store unavailable: {0}")]
    Store(#[from] StoreError),
}

/// Looks up students and checks their passwords.
pub trait CredentialStore: Send + Sync {
    /// Resolve a principal from a student id and password.
    fn authenticate(&self, student_id: &StudentId, password: &str) -> Result<Principal, AuthError>;

    /// Register a student, replacing any existing credential for the same id.
    fn add_student(&self, student_id: &StudentId, name: &str, password: &str)
        -> Result<(), StoreError>;

    fn get_student(&self, student_id: &StudentId) -> Result<Option<StudentCredential>, StoreError>;

    fn student_count(&self) -> Result<u64, StoreError>;
}
