//! Cryptographic helpers for rollcall.
//!
//! - **Argon2id** password hashing for the credential store
//! - Constant-time comparison for codes and hashes
//! - Random hex identifiers (session token payloads, login tokens)
//! - Uniform numeric codes (OTPs)

pub mod error;
pub mod password;
pub mod random;

pub use error::CryptoError;
pub use password::{hash_password, verify_password, PasswordHash};
pub use random::{constant_time_eq, numeric_code, random_hex, seeded_rng, OsRandom};
