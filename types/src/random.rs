//! Randomness seam.
//!
//! Token payloads and OTP codes draw their entropy through this trait so tests
//! can substitute a deterministic source.

use crate::RollcallError;

/// A source of random bytes.
pub trait RandomSource: Send + Sync {
    /// Fill `dest` entirely with random bytes.
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<(), RollcallError>;
}
