//! Caller configuration for parsing and verification.
//!
//! Both types are plain serde data so they can be embedded in a relying
//! party's own configuration file.

use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::fields::MessageFields;
use crate::parser::{LenientParser, MessageParser, StrictParser};
use crate::timestamp::IsoTimestamp;

/// Selects the parser used to read message text.
///
/// # Example
///
/// ```rust
/// use siws::ParseMode;
///
/// let mode: ParseMode = serde_json::from_str("\"lenient\"").unwrap();
/// assert_eq!(mode, ParseMode::Lenient);
/// assert_eq!(ParseMode::default(), ParseMode::Strict);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParseMode {
    /// Exact, ordered line grammar. See [`StrictParser`].
    #[default]
    Strict,
    /// Pattern-based extraction. See [`LenientParser`].
    Lenient,
}

impl MessageParser for ParseMode {
    fn parse(&self, text: &str) -> Result<MessageFields, ParseError> {
        match self {
            Self::Strict => StrictParser.parse(text),
            Self::Lenient => LenientParser.parse(text),
        }
    }
}

/// Optional overrides for [`Message::verify`](crate::Message::verify).
///
/// An unset `domain` or `nonce` skips that comparison. An unset `timestamp`
/// means "now", read once when verification starts.
///
/// # Example
///
/// ```rust
/// use siws::{IsoTimestamp, VerifyOptions};
///
/// let options = VerifyOptions::default()
///     .with_domain("example.com")
///     .with_nonce("abcdefgh12")
///     .at(IsoTimestamp::parse("2024-01-01T12:00:00Z").unwrap());
/// assert_eq!(options.domain.as_deref(), Some("example.com"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyOptions {
    /// Domain the message must have been issued for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    /// Nonce the relying party issued for this sign-in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,

    /// Instant at which validity is evaluated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<IsoTimestamp>,
}

impl VerifyOptions {
    /// Requires the message domain to equal `domain`.
    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Requires the message nonce to equal `nonce`.
    #[must_use]
    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    /// Evaluates validity at `timestamp` instead of the current time.
    #[must_use]
    pub fn at(mut self, timestamp: impl Into<IsoTimestamp>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }
}
