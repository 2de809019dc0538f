//! Bearer login sessions.
//!
//! `POST /login` trades a student id and password for an opaque random token;
//! later requests present it as `Authorization: Bearer <token>`. Sessions
//! live in memory and lapse after a fixed TTL.

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::{header::AUTHORIZATION, HeaderMap};
use parking_lot::Mutex;
use rollcall_crypto::random_hex;
use rollcall_types::{Principal, RandomSource, RollcallError, Timestamp};

use crate::RpcError;

const TOKEN_BYTES: usize = 32;

struct LoginSession {
    principal: Principal,
    issued_at: Timestamp,
}

pub struct LoginSessions {
    sessions: Mutex<HashMap<String, LoginSession>>,
    ttl_secs: u64,
    rng: Arc<dyn RandomSource>,
}

impl LoginSessions {
    pub fn new(ttl_secs: u64, rng: Arc<dyn RandomSource>) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl_secs,
            rng,
        }
    }

    /// Start a session for `principal` and return its bearer token.
    pub fn login(&self, principal: Principal, now: Timestamp) -> Result<String, RollcallError> {
        let token = random_hex(self.rng.as_ref(), TOKEN_BYTES)?;
        self.sessions.lock().insert(
            token.clone(),
            LoginSession {
                principal,
                issued_at: now,
            },
        );
        Ok(token)
    }

    /// The principal behind `token`, if the session exists and has not lapsed.
    pub fn resolve(&self, token: &str, now: Timestamp) -> Option<Principal> {
        let mut sessions = self.sessions.lock();
        let expired = sessions
            .get(token)?
            .issued_at
            .is_older_than(self.ttl_secs, now);
        if expired {
            sessions.remove(token);
            return None;
        }
        sessions.get(token).map(|s| s.principal.clone())
    }

    /// Resolve the bearer token carried in `headers`.
    pub fn authorize(&self, headers: &HeaderMap, now: Timestamp) -> Result<Principal, RpcError> {
        let token = bearer_token(headers).ok_or(RpcError::Unauthorized)?;
        self.resolve(token, now).ok_or(RpcError::Unauthorized)
    }

    /// Forget a session. Returns whether it existed.
    pub fn logout(&self, token: &str) -> bool {
        self.sessions.lock().remove(token).is_some()
    }

    /// Drop lapsed sessions. Returns how many were dropped.
    pub fn purge(&self, now: Timestamp) -> usize {
        let mut sessions = self.sessions.lock();
        let before = sessions.len();
        sessions.retain(|_, s| !s.issued_at.is_older_than(self.ttl_secs, now));
        before - sessions.len()
    }

    pub fn active_count(&self) -> usize {
        self.sessions.lock().len()
    }
}

/// Extract `<token>` from an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then_some(token)
}
