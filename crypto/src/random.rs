//! Random identifiers and codes.

use rand::distributions::Uniform;
use rand::rngs::{OsRng, StdRng};
use rand::{Rng, RngCore, SeedableRng};
use rollcall_types::{RandomSource, RollcallError};
use subtle::ConstantTimeEq;

/// Operating-system randomness.
#[derive(Clone, Copy, Debug, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    fn fill_bytes(&self, dest: &mut [u8]) -> Result<(), RollcallError> {
        OsRng
            .try_fill_bytes(dest)
            .map_err(|e| RollcallError::Randomness(e.to_string()))
    }
}

/// A CSPRNG seeded with 256 bits drawn from `rng`.
pub fn seeded_rng(rng: &dyn RandomSource) -> Result<StdRng, RollcallError> {
    let mut seed = <StdRng as SeedableRng>::Seed::default();
    rng.fill_bytes(&mut seed)?;
    Ok(StdRng::from_seed(seed))
}

/// `n_bytes` of randomness rendered as lowercase hex (`2 * n_bytes` chars).
pub fn random_hex(rng: &dyn RandomSource, n_bytes: usize) -> Result<String, RollcallError> {
    let mut buf = vec![0u8; n_bytes];
    rng.fill_bytes(&mut buf)?;
    Ok(hex::encode(buf))
}

/// A uniformly distributed decimal code of exactly `digits` characters.
pub fn numeric_code(rng: &dyn RandomSource, digits: usize) -> Result<String, RollcallError> {
    let digit = Uniform::new_inclusive(b'0', b'9');
    let code = seeded_rng(rng)?
        .sample_iter(digit)
        .take(digits)
        .map(char::from)
        .collect();
    Ok(code)
}

/// Compare two byte strings without short-circuiting on the first difference.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}
