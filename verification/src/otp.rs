//! One-time codes keyed by student.
//!
//! Per student: `NoChallenge → Pending → Consumed` (back to `NoChallenge`),
//! or `Pending → Superseded` on a newer request. A challenge is also dropped
//! after too many wrong guesses. Expired challenges are kept until a
//! consume or a newer request so a late attempt still reports `OtpExpired`;
//! the map holds at most one challenge per student.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use rollcall_crypto::{constant_time_eq, numeric_code};
use rollcall_types::{RandomSource, RollcallError, StudentId, Timestamp};

use crate::VerifyError;

struct OtpChallenge {
    code: String,
    issued_at: Timestamp,
    failed_attempts: u32,
}

pub struct OtpRegistry {
    pending: Mutex<HashMap<StudentId, OtpChallenge>>,
    rng: Arc<dyn RandomSource>,
    code_length: usize,
    max_attempts: u32,
}

impl OtpRegistry {
    pub fn new(rng: Arc<dyn RandomSource>, code_length: usize, max_attempts: u32) -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            rng,
            code_length,
            max_attempts,
        }
    }

    /// Issue a fresh code for `student`, replacing any pending one.
    pub fn request(&self, student: &StudentId, now: Timestamp) -> Result<String, RollcallError> {
        let code = numeric_code(self.rng.as_ref(), self.code_length)?;
        let previous = self.pending.lock().insert(
            student.clone(),
            OtpChallenge {
                code: code.clone(),
                issued_at: now,
                failed_attempts: 0,
            },
        );
        if previous.is_some() {
            tracing::debug!(student = %student, "pending one-time code superseded");
        }
        Ok(code)
    }

    /// Check `code` against the pending challenge and delete it on success.
    ///
    /// A mismatch leaves the challenge pending until `max_attempts` wrong
    /// guesses have been made. An expired challenge is deleted.
    pub fn consume(
        &self,
        student: &StudentId,
        code: &str,
        now: Timestamp,
        ttl_secs: u64,
    ) -> Result<(), VerifyError> {
        if code.len() != self.code_length || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(VerifyError::InvalidInput(format!(
                "one-time code must be {} digits",
                self.code_length
            )));
        }

        let mut pending = self.pending.lock();
        let challenge = pending.get_mut(student).ok_or(VerifyError::OtpUnknown)?;

        if !constant_time_eq(challenge.code.as_bytes(), code.as_bytes()) {
            challenge.failed_attempts += 1;
            if challenge.failed_attempts >= self.max_attempts {
                pending.remove(student);
                tracing::info!(student = %student, "one-time code discarded after repeated mismatches");
            }
            return Err(VerifyError::OtpMismatch);
        }

        let expired = challenge.issued_at.is_older_than(ttl_secs, now);
        pending.remove(student);
        if expired {
            return Err(VerifyError::OtpExpired);
        }
        Ok(())
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollcall_nullables::NullRandom;

    const TTL: u64 = 300;

    fn registry() -> OtpRegistry {
        OtpRegistry::new(Arc::new(NullRandom::seeded(9)), 6, 3)
    }

    fn s1() -> StudentId {
        StudentId::new("S1").unwrap()
    }

    fn wrong(code: &str) -> String {
        code.bytes()
            .map(|b| char::from(b'0' + (b - b'0' + 1) % 10))
            .collect()
    }

    #[test]
    fn request_returns_six_digits() {
        let code = registry().request(&s1(), Timestamp::new(0)).unwrap();
        assert_eq!(code.len(), 6);
        assert!(code.bytes().all(|b| b.is_ascii_digit()));
    }

    #[test]
    fn code_is_single_use() {
        let reg = registry();
        let code = reg.request(&s1(), Timestamp::new(0)).unwrap();
        assert_eq!(reg.consume(&s1(), &code, Timestamp::new(1), TTL), Ok(()));
        assert_eq!(
            reg.consume(&s1(), &code, Timestamp::new(2), TTL),
            Err(VerifyError::OtpUnknown)
        );
    }

    #[test]
    fn newer_request_supersedes() {
        let reg = OtpRegistry::new(Arc::new(NullRandom::seeded(11)), 6, 3);
        let first = reg.request(&s1(), Timestamp::new(0)).unwrap();
        let second = reg.request(&s1(), Timestamp::new(1)).unwrap();
        assert_ne!(first, second);
        assert_eq!(
            reg.consume(&s1(), &first, Timestamp::new(2), TTL),
            Err(VerifyError::OtpMismatch)
        );
        assert_eq!(reg.consume(&s1(), &second, Timestamp::new(2), TTL), Ok(()));
    }

    #[test]
    fn mismatch_keeps_challenge_until_limit() {
        let reg = registry();
        let code = reg.request(&s1(), Timestamp::new(0)).unwrap();
        let bad = wrong(&code);

        assert_eq!(reg.consume(&s1(), &bad, Timestamp::new(1), TTL), Err(VerifyError::OtpMismatch));
        assert_eq!(reg.consume(&s1(), &bad, Timestamp::new(1), TTL), Err(VerifyError::OtpMismatch));
        assert_eq!(reg.pending_count(), 1);
        assert_eq!(reg.consume(&s1(), &bad, Timestamp::new(1), TTL), Err(VerifyError::OtpMismatch));
        assert_eq!(reg.pending_count(), 0);
        assert_eq!(
            reg.consume(&s1(), &code, Timestamp::new(1), TTL),
            Err(VerifyError::OtpUnknown)
        );
    }

    #[test]
    fn expired_code_is_deleted() {
        let reg = registry();
        let code = reg.request(&s1(), Timestamp::new(0)).unwrap();
        assert_eq!(
            reg.consume(&s1(), &code, Timestamp::new(TTL + 1), TTL),
            Err(VerifyError::OtpExpired)
        );
        assert_eq!(reg.pending_count(), 0);
    }

    #[test]
    fn code_valid_at_exact_ttl() {
        let reg = registry();
        let code = reg.request(&s1(), Timestamp::new(0)).unwrap();
        assert_eq!(reg.consume(&s1(), &code, Timestamp::new(TTL), TTL), Ok(()));
    }

    #[test]
    fn malformed_code_does_not_count_as_attempt() {
        let reg = OtpRegistry::new(Arc::new(NullRandom::seeded(9)), 6, 1);
        let code = reg.request(&s1(), Timestamp::new(0)).unwrap();
        assert!(matches!(
            reg.consume(&s1(), "12ab56", Timestamp::new(1), TTL),
            Err(VerifyError::InvalidInput(_))
        ));
        assert_eq!(reg.consume(&s1(), &code, Timestamp::new(1), TTL), Ok(()));
    }

    #[test]
    fn expired_challenge_stays_pending_until_used() {
        let reg = registry();
        let code = reg.request(&s1(), Timestamp::new(0)).unwrap();
        assert_eq!(reg.pending_count(), 1);
        assert_eq!(
            reg.consume(&s1(), &code, Timestamp::new(10 * TTL), TTL),
            Err(VerifyError::OtpExpired)
        );
        assert_eq!(reg.pending_count(), 0);
    }
}
