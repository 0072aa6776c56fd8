//! Booking lifecycle engine
//!
//! Drives the `pending -> accepted | rejected` state machine. A provider
//! decides through a response token: an opaque, single-use, expiring
//! capability delivered out of band. Only an argon2 hash of the token secret
//! is stored.
//!
//! Responding checks the token, consumes it in one conditional update, then
//! applies the status change as a compare-and-swap. Consumption is final even
//! when the status change loses a race.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{Duration, Utc};
use rand::RngCore;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::directory::Directory;
use crate::error::{Error, Result};
use crate::events::{BookingEvent, EventDispatcher};
use crate::invariants::assert_token_invariants;
use crate::models::{Booking, BookingStatus, Decision, IssuedToken, ResponseToken, TokenString};
use crate::outcome::Outcome;
use crate::store::BookingStore;
use crate::storage::Storage;

/// Random bytes per token secret (256 bits)
const SECRET_BYTES: usize = 32;

/// Default response window for a provider
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 72;

/// Upper bound on token lifetime (one year)
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

static NO_LISTENERS: EventDispatcher = EventDispatcher::new();

/// How response tokens are issued
#[derive(Debug, Clone, Copy)]
pub struct TokenPolicy {
    pub ttl: Duration,
}

impl TokenPolicy {
    /// Lifetime is clamped to `1..=MAX_TOKEN_TTL_HOURS`
    pub fn with_ttl_hours(hours: i64) -> Self {
        Self {
            ttl: Duration::hours(hours.clamp(1, MAX_TOKEN_TTL_HOURS)),
        }
    }
}

impl Default for TokenPolicy {
    fn default() -> Self {
        Self::with_ttl_hours(DEFAULT_TOKEN_TTL_HOURS)
    }
}

/// A new booking and the token its provider answers with
#[derive(Debug, Clone)]
pub struct BookingRequested {
    pub booking: Booking,
    pub token: IssuedToken,
}

pub struct BookingLifecycle<'a> {
    storage: &'a dyn Storage,
    dispatcher: &'a EventDispatcher,
    policy: TokenPolicy,
}

impl<'a> BookingLifecycle<'a> {
    pub fn new(storage: &'a dyn Storage) -> Self {
        Self {
            storage,
            dispatcher: &NO_LISTENERS,
            policy: TokenPolicy::default(),
        }
    }

    pub fn with_dispatcher(mut self, dispatcher: &'a EventDispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn with_policy(mut self, policy: TokenPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Create a pending booking and issue its response token
    #[instrument(skip(self, description))]
    pub fn request_booking(
        &self,
        user_id: Uuid,
        provider_id: Uuid,
        description: &str,
    ) -> Result<Outcome<BookingRequested>> {
        let booking =
            BookingStore::new(self.storage).create_booking(user_id, provider_id, description)?;
        let token = self.issue_token(booking.id)?;

        let warnings = self.dispatcher.dispatch(
            self.storage,
            &BookingEvent::Requested {
                booking: booking.clone(),
            },
        );

        Ok(Outcome::with_warnings(
            BookingRequested { booking, token },
            warnings,
        ))
    }

    /// Apply a provider's decision using a response token.
    ///
    /// Unknown, malformed, expired and already used tokens all fail with
    /// `InvalidToken`. A booking decided in the meantime fails with
    /// `InvalidTransition` and the token stays used.
    #[instrument(skip(self, token, decision), fields(decision = decision.as_str()))]
    pub fn respond(&self, token: &str, decision: Decision) -> Result<Outcome<Booking>> {
        if let Some(price) = decision.price() {
            if !price.is_finite() || price < 0.0 {
                return Err(Error::validation("price must be a non-negative amount"));
            }
        }

        let token = TokenString::parse(token)?;
        let record = self
            .storage
            .find_token_by_id(token.id)?
            .ok_or(Error::InvalidToken)?;
        assert_token_invariants(&record);

        let now = Utc::now();
        if !record.is_usable_at(now) {
            debug!(token_id = %record.id, "Token expired or already used");
            return Err(Error::InvalidToken);
        }
        if !verify_secret(&token.secret, &record.secret_hash) {
            warn!(token_id = %record.id, "Token secret mismatch");
            return Err(Error::InvalidToken);
        }

        // Check and consume in one statement; the loser of a race sees false
        if !self
            .storage
            .consume_token(record.id, decision.as_str(), now)?
        {
            return Err(Error::InvalidToken);
        }

        let booking = BookingStore::new(self.storage).set_status(
            record.booking_id,
            decision.target_status(),
            decision.price(),
        )?;

        let event = match decision {
            Decision::Accept { .. } => BookingEvent::Accepted {
                booking: booking.clone(),
            },
            Decision::Reject => BookingEvent::Rejected {
                booking: booking.clone(),
            },
        };
        let warnings = self.dispatcher.dispatch(self.storage, &event);

        Ok(Outcome::with_warnings(booking, warnings))
    }

    pub fn get_booking(&self, booking_id: Uuid) -> Result<Booking> {
        BookingStore::new(self.storage).get_booking(booking_id)
    }

    pub fn get_status(&self, booking_id: Uuid) -> Result<BookingStatus> {
        Ok(self.get_booking(booking_id)?.status)
    }

    /// Bookings the user requested or received, newest first
    pub fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>> {
        Directory::new(self.storage).resolve_user(user_id)?;
        BookingStore::new(self.storage).list_bookings_for_user(user_id)
    }

    /// Issue a fresh token for a booking that is still pending.
    ///
    /// Earlier tokens stay valid until they expire or are used.
    #[instrument(skip(self))]
    pub fn reissue_token(&self, booking_id: Uuid) -> Result<IssuedToken> {
        let booking = self.get_booking(booking_id)?;
        if booking.status.is_terminal() {
            return Err(Error::InvalidTransition {
                booking_id,
                current: booking.status,
            });
        }
        self.issue_token(booking_id)
    }

    /// Delete expired tokens nobody used
    pub fn purge_expired_tokens(&self) -> Result<u64> {
        let purged = self.storage.purge_expired_tokens(Utc::now())?;
        if purged > 0 {
            info!(purged, "Purged expired response tokens");
        }
        Ok(purged)
    }

    fn issue_token(&self, booking_id: Uuid) -> Result<IssuedToken> {
        let secret = generate_secret();
        let record = ResponseToken::new(booking_id, hash_secret(&secret)?, self.policy.ttl);
        self.storage.create_token(&record)?;

        info!(token_id = %record.id, booking_id = %booking_id, expires_at = %record.expires_at, "Response token issued");
        Ok(IssuedToken {
            token: TokenString::new(record.id, secret),
            booking_id,
            expires_at: record.expires_at,
        })
    }
}

fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Secrets carry 256 bits of entropy, so a light argon2 cost suffices
fn hasher() -> Result<Argon2<'static>> {
    let params = Params::new(8 * 1024, 1, 1, None).map_err(|e| Error::Hashing(e.to_string()))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

fn hash_secret(secret: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = hasher()?
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|e| Error::Hashing(e.to_string()))?;
    Ok(hash.to_string())
}

fn verify_secret(secret: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(secret.as_bytes(), &parsed)
        .is_ok()
}
