//! Response link generation and parsing
//!
//! Link format: `<base-url>/respond?token=<token>[&decision=accept|reject]`

use std::str::FromStr;

use crate::error::{Error, Result};
use crate::models::TokenString;

const RESPOND_PATH: &str = "/respond";

/// The link a provider clicks to decide a booking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseLink {
    pub base_url: String,
    pub token: TokenString,
}

impl ResponseLink {
    /// Create a new response link
    pub fn new(base_url: impl Into<String>, token: TokenString) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, token }
    }

    /// Format as URL string without a decision
    pub fn to_url(&self) -> String {
        format!("{}{}?token={}", self.base_url, RESPOND_PATH, self.token)
    }

    /// One-click accept link
    pub fn accept_url(&self) -> String {
        format!("{}&decision=accept", self.to_url())
    }

    /// One-click reject link
    pub fn reject_url(&self) -> String {
        format!("{}&decision=reject", self.to_url())
    }

    /// Parse from URL string
    pub fn parse(s: &str) -> Result<Self> {
        let (base_url, query) = s
            .split_once(&format!("{}?", RESPOND_PATH))
            .ok_or_else(|| Error::validation("response link has no /respond query"))?;

        if base_url.is_empty() {
            return Err(Error::validation("response link has no base url"));
        }

        let token = query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == "token")
            .map(|(_, value)| value)
            .ok_or_else(|| Error::validation("response link has no token"))?;

        Ok(Self {
            base_url: base_url.to_string(),
            token: TokenString::parse(token)?,
        })
    }
}

impl std::fmt::Display for ResponseLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_url())
    }
}

impl FromStr for ResponseLink {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn token() -> TokenString {
        TokenString::new(Uuid::new_v4(), "q9Zr-_x2".to_string())
    }

    #[test]
    fn test_link_roundtrip() {
        let link = ResponseLink::new("https://handyhub.example/", token());
        assert!(link.to_url().starts_with("https://handyhub.example/respond?token="));

        let parsed = ResponseLink::parse(&link.accept_url()).unwrap();
        assert_eq!(parsed, link);
        assert!(link.reject_url().ends_with("&decision=reject"));
    }

    #[test]
    fn test_link_parse_invalid() {
        // Wrong path
        assert!(ResponseLink::parse("https://h.example/book?token=x").is_err());

        // Missing token
        assert!(ResponseLink::parse("https://h.example/respond?decision=accept").is_err());

        // Malformed token
        assert!(matches!(
            ResponseLink::parse("https://h.example/respond?token=nodot"),
            Err(Error::InvalidToken)
        ));
    }
}
