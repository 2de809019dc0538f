//! Abstract storage traits for rollcall.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The verification engine and the HTTP layer depend only on the
//! traits.

pub mod attendance;
pub mod credential;
pub mod error;
pub mod export;

pub use attendance::AttendanceLedger;
pub use credential::{AuthError, CredentialStore, StudentCredential};
pub use error::StoreError;
pub use export::export_csv;
