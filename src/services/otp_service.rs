use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use thiserror::Error;

/// Where a registration attempt stands with respect to the one-time code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationStage {
    Collecting,
    CodeSent,
    VerifiedAndSubmitting,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OtpError {
    #[error("no code has been issued")]
    NotIssued,
    #[error("code expired")]
    Expired,
    #[error("code mismatch")]
    Mismatch,
}

#[derive(Debug, Clone)]
struct OtpChallenge {
    code: String,
    expires_at: DateTime<Utc>,
}

/// Pending codes keyed by the lower-cased team lead email.
pub struct OtpStore {
    ttl: Duration,
    challenges: Mutex<HashMap<String, OtpChallenge>>,
}

pub fn generate_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

fn store_key(email: &str) -> String {
    email.trim().to_lowercase()
}

impl OtpStore {
    pub fn new(ttl_secs: i64) -> Self {
        Self {
            ttl: Duration::seconds(ttl_secs.max(1)),
            challenges: Mutex::new(HashMap::new()),
        }
    }

    /// Issues a fresh random code, replacing any pending one.
    pub fn issue(&self, email: &str) -> String {
        self.issue_with(email, generate_code(), Utc::now())
    }

    pub fn issue_with(&self, email: &str, code: String, now: DateTime<Utc>) -> String {
        let mut challenges = self.challenges.lock().unwrap_or_else(|e| e.into_inner());
        // Lapsed codes linger for one more window so a late submit reads as expired.
        let ttl = self.ttl;
        challenges.retain(|_, c| c.expires_at + ttl > now);
        challenges.insert(
            store_key(email),
            OtpChallenge {
                code: code.clone(),
                expires_at: now + self.ttl,
            },
        );
        code
    }

    pub fn stage(&self, email: &str, now: DateTime<Utc>) -> RegistrationStage {
        let challenges = self.challenges.lock().unwrap_or_else(|e| e.into_inner());
        match challenges.get(&store_key(email)) {
            Some(c) if c.expires_at > now => RegistrationStage::CodeSent,
            _ => RegistrationStage::Collecting,
        }
    }

    /// Checks `submitted` against the pending code without consuming it.
    ///
    /// An expired challenge is dropped so the next submit starts over.
    pub fn verify(
        &self,
        email: &str,
        submitted: &str,
        now: DateTime<Utc>,
    ) -> Result<RegistrationStage, OtpError> {
        let key = store_key(email);
        let mut challenges = self.challenges.lock().unwrap_or_else(|e| e.into_inner());
        let Some(challenge) = challenges.get(&key) else {
            return Err(OtpError::NotIssued);
        };
        if challenge.expires_at <= now {
            challenges.remove(&key);
            return Err(OtpError::Expired);
        }
        if challenge.code != submitted.trim() {
            return Err(OtpError::Mismatch);
        }
        Ok(RegistrationStage::VerifiedAndSubmitting)
    }

    pub fn discard(&self, email: &str) {
        let mut challenges = self.challenges.lock().unwrap_or_else(|e| e.into_inner());
        challenges.remove(&store_key(email));
    }
}
