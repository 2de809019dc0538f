//! LMDB storage backend for rollcall.
//!
//! Implements the storage traits from `rollcall-store` using the `heed` LMDB
//! bindings. Each logical store maps to one or more LMDB databases within a
//! single environment.

pub mod attendance;
pub mod credential;
pub mod environment;
pub mod error;
pub mod integrity;
pub mod meta;

pub use attendance::LmdbAttendanceLedger;
pub use credential::LmdbCredentialStore;
pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use integrity::{check_integrity, IntegrityReport};
