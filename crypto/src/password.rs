//! Argon2id password hashing.
//!
//! A stored credential keeps the random salt, the derived hash and the KDF
//! parameters that produced it, so parameters can be raised later without
//! invalidating existing hashes.

use argon2::{Algorithm, Argon2, Params, Version};
use rollcall_types::RandomSource;
use serde::{Deserialize, Serialize};

use crate::error::CryptoError;
use crate::random::constant_time_eq;

/// Argon2id parameters: 19 MiB memory, 2 iterations, 1 lane (OWASP baseline).
const ARGON2_MEMORY_KIB: u32 = 19 * 1024;
const ARGON2_ITERATIONS: u32 = 2;
const ARGON2_PARALLELISM: u32 = 1;
const ARGON2_OUTPUT_LEN: usize = 32;

/// Salt length in bytes.
const SALT_LEN: usize = 16;

/// A salted Argon2id password hash.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordHash {
    /// Hex-encoded salt.
    pub salt: String,
    /// Hex-encoded derived key.
    pub hash: String,
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

/// Hash `password` with a fresh salt drawn from `rng`.
pub fn hash_password(
    password: &str,
    rng: &dyn RandomSource,
) -> Result<PasswordHash, CryptoError> {
    let mut salt = [0u8; SALT_LEN];
    rng.fill_bytes(&mut salt)?;

    let derived = derive(
        password,
        &salt,
        ARGON2_MEMORY_KIB,
        ARGON2_ITERATIONS,
        ARGON2_PARALLELISM,
    )?;

    Ok(PasswordHash {
        salt: hex::encode(salt),
        hash: hex::encode(derived),
        memory_kib: ARGON2_MEMORY_KIB,
        iterations: ARGON2_ITERATIONS,
        parallelism: ARGON2_PARALLELISM,
    })
}

/// Check `password` against a stored hash in constant time.
pub fn verify_password(password: &str, stored: &PasswordHash) -> Result<bool, CryptoError> {
    let salt = hex::decode(&stored.salt)
        .map_err(|e| CryptoError::MalformedHash(format!("salt: {e}")))?;
    let expected = hex::decode(&stored.hash)
        .map_err(|e| CryptoError::MalformedHash(format!("hash: {e}")))?;
    if expected.len() != ARGON2_OUTPUT_LEN {
        return Err(CryptoError::MalformedHash(format!(
            "expected {ARGON2_OUTPUT_LEN}-byte hash, got {}",
            expected.len()
        )));
    }

    let derived = derive(
        password,
        &salt,
        stored.memory_kib,
        stored.iterations,
        stored.parallelism,
    )?;
    Ok(constant_time_eq(&derived, &expected))
}

fn derive(
    password: &str,
    salt: &[u8],
    memory_kib: u32,
    iterations: u32,
    parallelism: u32,
) -> Result<[u8; ARGON2_OUTPUT_LEN], CryptoError> {
    let params = Params::new(memory_kib, iterations, parallelism, Some(ARGON2_OUTPUT_LEN))
        .map_err(|e| CryptoError::Argon2(format!("params: {e}")))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut output = [0u8; ARGON2_OUTPUT_LEN];
    argon2
        .hash_password_into(password.as_bytes(), salt, &mut output)
        .map_err(|e| CryptoError::Argon2(e.to_string()))?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OsRandom;

    #[test]
    fn correct_password_verifies() {
        let stored = hash_password("hunter2", &OsRandom).unwrap();
        assert!(verify_password("hunter2", &stored).unwrap());
    }

    #[test]
    fn wrong_password_fails() {
        let stored = hash_password("hunter2", &OsRandom).unwrap();
        assert!(!verify_password("hunter3", &stored).unwrap());
    }

    #[test]
    fn salts_differ_between_hashes() {
        let a = hash_password("same", &OsRandom).unwrap();
        let b = hash_password("same", &OsRandom).unwrap();
        assert_ne!(a.salt, b.salt);
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn truncated_hash_is_malformed() {
        let mut stored = hash_password("pw", &OsRandom).unwrap();
        stored.hash.truncate(10);
        assert!(matches!(
            verify_password("pw", &stored),
            Err(CryptoError::MalformedHash(_))
        ));
    }
}
