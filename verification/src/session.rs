//! Rotating QR session tokens.
//!
//! A token binds an opaque payload to a [`SessionKey`]. At most one token is
//! live per key: issuing again supersedes the previous payload. Payloads are
//! random and carry no structure; the registry keeps the payload → key
//! mapping server-side.
//!
//! Per key: `NoToken → Live → (Expired | Superseded)`. Expiry is a pure
//! function of `now`; tokens are never consumed, so one QR image serves a
//! whole classroom for its window.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use rollcall_crypto::{constant_time_eq, random_hex};
use rollcall_types::{RandomSource, RollcallError, SessionKey, Timestamp};
use serde::{Deserialize, Serialize};

use crate::VerifyError;

/// Random bytes per payload.
const PAYLOAD_BYTES: usize = 16;

/// Length of a payload in lowercase hex characters.
pub const PAYLOAD_HEX_LEN: usize = PAYLOAD_BYTES * 2;

/// Attempts at drawing a payload that is not already indexed.
const MAX_ISSUE_ATTEMPTS: usize = 4;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionToken {
    pub key: SessionKey,
    pub issued_at: Timestamp,
    pub payload: String,
}

struct IndexEntry {
    key: SessionKey,
    issued_at: Timestamp,
}

#[derive(Default)]
struct Tokens {
    /// The live token per session.
    live: HashMap<SessionKey, SessionToken>,
    /// Every payload still remembered, including superseded ones.
    index: HashMap<String, IndexEntry>,
}

pub struct SessionTokenRegistry {
    tokens: Mutex<Tokens>,
    rng: Arc<dyn RandomSource>,
}

impl SessionTokenRegistry {
    pub fn new(rng: Arc<dyn RandomSource>) -> Self {
        Self {
            tokens: Mutex::new(Tokens::default()),
            rng,
        }
    }

    /// Create a fresh token for `key`, superseding any live one.
    pub fn issue(&self, key: SessionKey, now: Timestamp) -> Result<SessionToken, RollcallError> {
        let mut tokens = self.tokens.lock();

        let mut payload = random_hex(self.rng.as_ref(), PAYLOAD_BYTES)?;
        let mut attempts = 1;
        while tokens.index.contains_key(&payload) {
            if attempts == MAX_ISSUE_ATTEMPTS {
                return Err(RollcallError::Randomness(
                    "random source keeps repeating token payloads".into(),
                ));
            }
            payload = random_hex(self.rng.as_ref(), PAYLOAD_BYTES)?;
            attempts += 1;
        }

        let token = SessionToken {
            key: key.clone(),
            issued_at: now,
            payload: payload.clone(),
        };
        tokens.index.insert(
            payload,
            IndexEntry {
                key: key.clone(),
                issued_at: now,
            },
        );
        if tokens.live.insert(key, token.clone()).is_some() {
            tracing::debug!(session = %token.key, "session token superseded");
        }
        Ok(token)
    }

    /// Resolve a scanned payload to its session if the token is live and fresh.
    ///
    /// Fresh means `now - issued_at <= ttl_secs`. Does not consume the token.
    pub fn validate(
        &self,
        payload: &str,
        now: Timestamp,
        ttl_secs: u64,
    ) -> Result<SessionKey, VerifyError> {
        if !is_well_formed(payload) {
            return Err(VerifyError::InvalidInput("malformed session token".into()));
        }

        let tokens = self.tokens.lock();
        let key = match tokens.index.get(payload) {
            Some(entry) => &entry.key,
            None => return Err(VerifyError::TokenUnknown),
        };
        let live = tokens.live.get(key).ok_or(VerifyError::TokenUnknown)?;
        if !constant_time_eq(live.payload.as_bytes(), payload.as_bytes()) {
            return Err(VerifyError::TokenMismatch);
        }
        if live.issued_at.is_older_than(ttl_secs, now) {
            return Err(VerifyError::TokenExpired);
        }
        Ok(key.clone())
    }

    /// The live token for `key`, fresh or not.
    pub fn current(&self, key: &SessionKey) -> Option<SessionToken> {
        self.tokens.lock().live.get(key).cloned()
    }

    /// Forget superseded payloads issued more than `ttl_secs` ago.
    ///
    /// The live token of every session is kept, expired or not, so a late
    /// scan of it still reports [`VerifyError::TokenExpired`]. A forgotten
    /// payload afterwards validates as [`VerifyError::TokenUnknown`].
    /// Returns the number of payloads forgotten.
    pub fn purge(&self, now: Timestamp, ttl_secs: u64) -> usize {
        let mut tokens = self.tokens.lock();
        let Tokens { live, index } = &mut *tokens;
        let before = index.len();
        index.retain(|payload, entry| {
            let is_live = live
                .get(&entry.key)
                .is_some_and(|token| token.payload == *payload);
            is_live || !entry.issued_at.is_older_than(ttl_secs, now)
        });
        before - index.len()
    }

    /// Payloads still answered with something other than `TokenUnknown`.
    pub fn indexed_count(&self) -> usize {
        self.tokens.lock().index.len()
    }

    pub fn live_count(&self) -> usize {
        self.tokens.lock().live.len()
    }
}

fn is_well_formed(payload: &str) -> bool {
    payload.len() == PAYLOAD_HEX_LEN
        && payload
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollcall_nullables::NullRandom;

    const TTL: u64 = 600;

    fn registry() -> SessionTokenRegistry {
        SessionTokenRegistry::new(Arc::new(NullRandom::seeded(1)))
    }

    fn key(subject: &str, period: &str) -> SessionKey {
        SessionKey::new(subject, period).unwrap()
    }

    #[test]
    fn issued_payload_is_opaque_hex() {
        let reg = registry();
        let token = reg.issue(key("CS101", "P1"), Timestamp::new(1_000)).unwrap();
        assert_eq!(token.payload.len(), PAYLOAD_HEX_LEN);
        assert!(!token.payload.contains("CS101"));
        assert!(is_well_formed(&token.payload));
    }

    #[test]
    fn validate_within_window() {
        let reg = registry();
        let t0 = Timestamp::new(1_000);
        let token = reg.issue(key("CS101", "P1"), t0).unwrap();
        assert_eq!(
            reg.validate(&token.payload, Timestamp::new(1_000 + TTL), TTL),
            Ok(key("CS101", "P1"))
        );
        assert_eq!(
            reg.validate(&token.payload, Timestamp::new(1_001 + TTL), TTL),
            Err(VerifyError::TokenExpired)
        );
    }

    #[test]
    fn tokens_are_reusable() {
        let reg = registry();
        let token = reg.issue(key("CS101", "P1"), Timestamp::new(0)).unwrap();
        for t in 0..5 {
            assert!(reg.validate(&token.payload, Timestamp::new(t), TTL).is_ok());
        }
    }

    #[test]
    fn reissue_supersedes() {
        let reg = registry();
        let old = reg.issue(key("CS101", "P1"), Timestamp::new(0)).unwrap();
        let new = reg.issue(key("CS101", "P1"), Timestamp::new(10)).unwrap();
        assert_ne!(old.payload, new.payload);
        assert_eq!(
            reg.validate(&old.payload, Timestamp::new(20), TTL),
            Err(VerifyError::TokenMismatch)
        );
        assert!(reg.validate(&new.payload, Timestamp::new(20), TTL).is_ok());
        assert_eq!(reg.live_count(), 1);
    }

    #[test]
    fn sessions_are_independent() {
        let reg = registry();
        let a = reg.issue(key("CS101", "P1"), Timestamp::new(0)).unwrap();
        reg.issue(key("CS101", "P2"), Timestamp::new(5)).unwrap();
        assert_eq!(
            reg.validate(&a.payload, Timestamp::new(10), TTL),
            Ok(key("CS101", "P1"))
        );
        assert_eq!(reg.live_count(), 2);
    }

    #[test]
    fn unknown_and_malformed_payloads() {
        let reg = registry();
        assert_eq!(
            reg.validate(&"0".repeat(PAYLOAD_HEX_LEN), Timestamp::new(0), TTL),
            Err(VerifyError::TokenUnknown)
        );
        let malformed = vec![
            String::new(),
            "CS101|P1|1700000000".to_string(),
            "A".repeat(PAYLOAD_HEX_LEN),
            "0".repeat(PAYLOAD_HEX_LEN - 1),
        ];
        for bad in &malformed {
            assert!(matches!(
                reg.validate(bad, Timestamp::new(0), TTL),
                Err(VerifyError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn purge_keeps_expired_live_token() {
        let reg = registry();
        let token = reg.issue(key("CS101", "P1"), Timestamp::new(0)).unwrap();

        assert_eq!(reg.purge(Timestamp::new(700), TTL), 0);
        assert_eq!(reg.live_count(), 1);
        assert_eq!(
            reg.validate(&token.payload, Timestamp::new(700), TTL),
            Err(VerifyError::TokenExpired)
        );
        assert_eq!(
            reg.validate(&token.payload, Timestamp::new(1_000_000), TTL),
            Err(VerifyError::TokenExpired)
        );
    }

    #[test]
    fn purge_forgets_only_stale_superseded_payloads() {
        let reg = registry();
        let oldest = reg.issue(key("CS101", "P1"), Timestamp::new(0)).unwrap();
        let recent = reg.issue(key("CS101", "P1"), Timestamp::new(650)).unwrap();
        let current = reg.issue(key("CS101", "P1"), Timestamp::new(700)).unwrap();
        assert_eq!(reg.indexed_count(), 3);

        assert_eq!(reg.purge(Timestamp::new(700), TTL), 1);
        assert_eq!(reg.indexed_count(), 2);
        assert_eq!(
            reg.validate(&oldest.payload, Timestamp::new(700), TTL),
            Err(VerifyError::TokenUnknown)
        );
        assert_eq!(
            reg.validate(&recent.payload, Timestamp::new(700), TTL),
            Err(VerifyError::TokenMismatch)
        );
        assert!(reg.validate(&current.payload, Timestamp::new(700), TTL).is_ok());
    }

    #[test]
    fn repeating_random_source_is_an_error() {
        let reg = SessionTokenRegistry::new(Arc::new(NullRandom::constant(7)));
        reg.issue(key("CS101", "P1"), Timestamp::new(0)).unwrap();
        assert!(matches!(
            reg.issue(key("CS101", "P2"), Timestamp::new(0)),
            Err(RollcallError::Randomness(_))
        ));
    }
}
