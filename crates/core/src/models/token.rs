//! Response token model
//!
//! A response token is the capability a provider uses to accept or reject a
//! booking without a session. Only the argon2 hash of the secret half is
//! stored; the plaintext leaves the process once, inside the response link.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// Stored token metadata, kept apart from the booking it unlocks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseToken {
    pub id: Uuid,
    pub booking_id: Uuid,
    /// Argon2 PHC string of the secret
    pub secret_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
    /// Decision submitted when the token was consumed ("accept"/"reject")
    pub decision: Option<String>,
}

impl ResponseToken {
    pub fn new(booking_id: Uuid, secret_hash: String, ttl: Duration) -> Self {
        let now = super::now();
        Self {
            id: Uuid::new_v4(),
            booking_id,
            secret_hash,
            created_at: now,
            expires_at: now + ttl,
            consumed_at: None,
            decision: None,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        self.consumed_at.is_none() && !self.is_expired_at(now)
    }
}

/// Wire form of a token: `<token id>.<secret>`
///
/// The id half is a lookup key only; possession of the secret is what grants
/// the capability.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenString {
    pub id: Uuid,
    pub secret: String,
}

impl TokenString {
    pub fn new(id: Uuid, secret: String) -> Self {
        Self { id, secret }
    }

    pub fn parse(s: &str) -> Result<Self, Error> {
        let (id, secret) = s.split_once('.').ok_or(Error::InvalidToken)?;
        let id = Uuid::try_parse(id).map_err(|_| Error::InvalidToken)?;
        if secret.is_empty() {
            return Err(Error::InvalidToken);
        }
        Ok(Self {
            id,
            secret: secret.to_string(),
        })
    }
}

impl fmt::Display for TokenString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.id.simple(), self.secret)
    }
}

// Never print the secret half in logs
impl fmt::Debug for TokenString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenString")
            .field("id", &self.id)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl FromStr for TokenString {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A freshly issued token: the plaintext plus its expiry
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: TokenString,
    pub booking_id: Uuid,
    pub expires_at: DateTime<Utc>,
}
