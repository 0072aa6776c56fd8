//! Database value parsing utilities
//!
//! Provides error-safe parsing of stored values.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Error as SqlError;
use uuid::Uuid;

use crate::models::{BookingStatus, Role};

fn conversion_error(
    column: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> SqlError {
    SqlError::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
}

#[derive(Debug)]
struct BadValue(String);

impl std::fmt::Display for BadValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for BadValue {}

/// Format a timestamp for storage.
///
/// Fixed-width UTC so that stored values compare and sort as strings.
pub fn fmt_datetime(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a UUID from a database string column
pub fn parse_uuid(s: &str) -> Result<Uuid, SqlError> {
    Uuid::parse_str(s).map_err(|e| conversion_error(0, e))
}

/// Parse an optional UUID from a database string column
pub fn parse_uuid_opt(s: Option<String>) -> Result<Option<Uuid>, SqlError> {
    s.map(|s| parse_uuid(&s)).transpose()
}

/// Parse a DateTime from an RFC3339 string
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, SqlError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(0, e))
}

/// Parse an optional DateTime from an RFC3339 string
pub fn parse_datetime_opt(s: Option<String>) -> Result<Option<DateTime<Utc>>, SqlError> {
    s.map(|s| parse_datetime(&s)).transpose()
}

/// Parse a stored role; unknown values are a data error, never a default
pub fn parse_role(s: &str) -> Result<Role, SqlError> {
    s.parse().map_err(|e: String| conversion_error(0, BadValue(e)))
}

/// Parse a stored booking status
pub fn parse_status(s: &str) -> Result<BookingStatus, SqlError> {
    s.parse().map_err(|e: String| conversion_error(0, BadValue(e)))
}

/// Extension trait for converting rusqlite Results to Option
pub trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>, SqlError>;
}

impl<T> OptionalExt<T> for Result<T, SqlError> {
    fn optional(self) -> Result<Option<T>, SqlError> {
        match self {
            Ok(v) => Ok(Some(v)),
            Err(SqlError::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_datetime_roundtrip_and_ordering() {
        let earlier = Utc::now();
        let later = earlier + Duration::milliseconds(1500);
        let a = fmt_datetime(earlier);
        let b = fmt_datetime(later);
        assert!(a < b);
        assert_eq!(a.len(), b.len());
        let parsed = parse_datetime(&a).unwrap();
        assert_eq!(parsed.timestamp_micros(), earlier.timestamp_micros());
    }

    #[test]
    fn test_bad_values_are_errors() {
        assert!(parse_role("admin").is_err());
        assert!(parse_status("cancelled").is_err());
        assert!(parse_uuid("nope").is_err());
        assert!(parse_datetime("yesterday").is_err());
    }
}
