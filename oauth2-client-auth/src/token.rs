//! OAuth2 access tokens

use chrono::{DateTime, TimeDelta, Utc};

/// Seconds before the actual expiry at which a token is treated as expired,
/// so a token never expires while its request is in flight.
pub const EXPIRY_DELTA_SECS: i64 = 10;

/// Access token returned by a token endpoint
#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    pub access_token: String,
    /// Raw token type as returned by the endpoint, see [`Token::token_type`]
    pub token_type: String,
    /// `None` means the token does not expire
    pub expiry: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Token")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expiry", &self.expiry)
            .finish()
    }
}

impl Token {
    pub fn new(access_token: impl Into<String>, token_type: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: token_type.into(),
            expiry: None,
        }
    }

    pub fn with_expiry(mut self, expiry: DateTime<Utc>) -> Self {
        self.expiry = Some(expiry);
        self
    }

    /// Token type in its canonical casing, defaulting to `Bearer`
    pub fn token_type(&self) -> &str {
        let raw = self.token_type.as_str();
        if raw.is_empty() || raw.eq_ignore_ascii_case("bearer") {
            "Bearer"
        } else if raw.eq_ignore_ascii_case("mac") {
            "MAC"
        } else if raw.eq_ignore_ascii_case("basic") {
            "Basic"
        } else {
            raw
        }
    }

    /// Value for the `Authorization` header
    pub fn authorization_value(&self) -> String {
        format!("{} {}", self.token_type(), self.access_token)
    }

    /// Whether the token has expired at `now`, including [`EXPIRY_DELTA_SECS`]
    pub fn expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => expiry - TimeDelta::seconds(EXPIRY_DELTA_SECS) <= now,
            None => false,
        }
    }

    /// Non-empty and not expired
    pub fn valid(&self) -> bool {
        !self.access_token.is_empty() && !self.expired_at(Utc::now())
    }
}
