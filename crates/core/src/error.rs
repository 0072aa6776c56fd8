//! Error types for HandyHub Core

use thiserror::Error;
use uuid::Uuid;

use crate::models::BookingStatus;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Booking {booking_id} has already been decided ({current})")]
    InvalidTransition {
        booking_id: Uuid,
        current: BookingStatus,
    },

    #[error("Response token is invalid, expired or already used")]
    InvalidToken,

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Token hashing failed: {0}")]
    Hashing(String),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    pub fn not_found(what: &str, id: impl std::fmt::Display) -> Self {
        Error::NotFound(format!("{} {}", what, id))
    }

    /// Storage-level failures are safe to retry with backoff; everything else
    /// reflects the caller's input or a decided booking.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Database(_) | Error::StorageUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
