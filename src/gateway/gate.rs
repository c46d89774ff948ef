//! Shared-secret access gate.
//!
//! One static password unlocks the page. A correct unlock issues a random
//! bearer token; tokens are stored as SHA-256 hashes (never plaintext) and
//! all secret comparisons are constant-time.

use sha2::{Digest, Sha256};
use std::sync::Mutex;
use std::time::Instant;

/// Maximum failed unlock attempts before lockout.
const MAX_FAILURES: u32 = 5;
/// Lockout duration in seconds after too many failures.
const LOCKOUT_SECS: u64 = 300;
/// Maximum live tokens. Issuing past the cap revokes the oldest token,
/// matching the session store's own eviction bound.
const MAX_ACTIVE_TOKENS: usize = 64;

/// SHA-256 hash a token for storage.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Constant-time equality comparison for secret strings.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    use subtle::ConstantTimeEq;
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

pub struct AccessGate {
    password: String,
    token_hashes: Mutex<Vec<String>>,
    failure_count: Mutex<u32>,
    lockout_until: Mutex<Option<Instant>>,
}

impl AccessGate {
    pub fn new(password: &str) -> Self {
        Self {
            password: password.to_string(),
            token_hashes: Mutex::new(Vec::new()),
            failure_count: Mutex::new(0),
            lockout_until: Mutex::new(None),
        }
    }

    /// Returns `true` if at least one client has unlocked the gate.
    pub fn is_unlocked(&self) -> bool {
        !self
            .token_hashes
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .is_empty()
    }

    /// Validate a bearer token against stored hashes.
    pub fn is_authorized(&self, token: &str) -> bool {
        if token.is_empty() {
            return false;
        }
        let hash = hash_token(token);
        let hashes = self
            .token_hashes
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut authorized = false;
        for stored in hashes.iter() {
            authorized |= constant_time_eq(stored, &hash);
        }
        authorized
    }

    /// Attempt to unlock with the shared password.
    ///
    /// Returns:
    /// - `Ok(Some(token))` on success (password matched, token issued)
    /// - `Ok(None)` if the password was wrong
    /// - `Err(remaining_lockout_secs)` if locked out
    pub fn unlock(&self, password: &str) -> Result<Option<String>, u64> {
        {
            let lockout = self
                .lockout_until
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if let Some(until) = *lockout {
                let remaining = until.saturating_duration_since(Instant::now());
                if !remaining.is_zero() {
                    return Err(remaining.as_secs().max(1));
                }
            }
        }

        if !constant_time_eq(password, &self.password) {
            let mut failures = self
                .failure_count
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            *failures += 1;
            if *failures >= MAX_FAILURES {
                let mut lockout = self
                    .lockout_until
                    .lock()
                    .unwrap_or_else(std::sync::PoisonError::into_inner);
                *lockout = Some(Instant::now() + std::time::Duration::from_secs(LOCKOUT_SECS));
                *failures = 0;
            }
            return Ok(None);
        }

        let token = generate_access_token();
        {
            let mut hashes = self
                .token_hashes
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            if hashes.len() >= MAX_ACTIVE_TOKENS {
                hashes.remove(0);
            }
            hashes.push(hash_token(&token));
        }
        {
            let mut failures = self
                .failure_count
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            *failures = 0;
        }

        Ok(Some(token))
    }
}

fn generate_access_token() -> String {
    use rand::RngCore;
    let mut buf = [0u8; 32];
    rand::rng().fill_bytes(&mut buf);
    format!("rg_{}", hex::encode(buf))
}
