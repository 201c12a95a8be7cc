//! The validated sign-in message and its canonical text form.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::config::ParseMode;
use crate::error::{SiwsError, ValidationError};
use crate::fields::MessageFields;
use crate::grammar::{
    EXPIRATION_TIME_TAG, HEADER_SUFFIX, ISSUED_AT_TAG, NONCE_TAG, NOT_BEFORE_TAG, REQUEST_ID_TAG,
    RESOURCE_ITEM_PREFIX, RESOURCES_TAG, URI_TAG,
};
use crate::parser::MessageParser;
use crate::timestamp::IsoTimestamp;
use crate::uri::Uri;
use crate::validate::validate;

/// A validated Sign-In With Stacks message.
///
/// A `Message` can only be obtained through [`validate`], so every value
/// satisfies the field constraints. It is immutable; [`Display`] and
/// [`prepare_message`](Self::prepare_message) render the exact text a wallet
/// signs.
///
/// # Example
///
/// ```rust
/// use siws::{Message, ParseMode};
///
/// let text = "example.com wants you to sign in with your Stacks account:\n\
///             SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7\n\
///             \n\
///             \n\
///             URI: https://example.com/login\n\
///             Nonce: abcdefgh12\n\
///             Issued At: 2024-01-01T00:00:00Z";
///
/// let message = Message::parse(text, ParseMode::Strict).unwrap();
/// assert_eq!(message.domain(), "example.com");
/// assert_eq!(message.prepare_message(), text);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MessageFields", into = "MessageFields")]
pub struct Message {
    pub(crate) domain: String,
    pub(crate) address: String,
    pub(crate) uri: Uri,
    pub(crate) issued_at: IsoTimestamp,
    pub(crate) nonce: String,
    pub(crate) statement: Option<String>,
    pub(crate) expiration_time: Option<IsoTimestamp>,
    pub(crate) not_before: Option<IsoTimestamp>,
    pub(crate) request_id: Option<String>,
    pub(crate) resources: Option<Vec<Uri>>,
}

impl Message {
    /// Parses and validates message text.
    ///
    /// # Errors
    ///
    /// Returns [`SiwsError::Parse`] if the text does not match the grammar
    /// selected by `mode`, or [`SiwsError::Validation`] if a field violates
    /// its constraints.
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(mode = ?mode)))]
    pub fn parse(text: &str, mode: ParseMode) -> Result<Self, SiwsError> {
        let fields = mode.parse(text)?;
        Ok(validate(fields)?)
    }

    /// Validates a caller-supplied field map.
    ///
    /// A missing `issued_at` defaults to the current time.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MalformedSession`] listing every offending
    /// field.
    pub fn from_fields(fields: MessageFields) -> Result<Self, ValidationError> {
        validate(fields)
    }

    /// Converts back into a raw field map.
    #[must_use]
    pub fn to_fields(&self) -> MessageFields {
        MessageFields {
            domain: Some(self.domain.clone()),
            address: Some(self.address.clone()),
            uri: Some(self.uri.to_string()),
            issued_at: Some(self.issued_at.to_string()),
            nonce: Some(self.nonce.clone()),
            statement: self.statement.clone(),
            expiration_time: self.expiration_time.as_ref().map(ToString::to_string),
            not_before: self.not_before.as_ref().map(ToString::to_string),
            request_id: self.request_id.clone(),
            resources: self
                .resources
                .as_ref()
                .map(|resources| resources.iter().map(ToString::to_string).collect()),
        }
    }

    /// Renders the canonical text that is signed.
    #[must_use]
    pub fn prepare_message(&self) -> String {
        self.to_string()
    }

    /// Domain requesting the sign-in.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Account address performing the sign-in.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// URI the sign-in is for.
    #[must_use]
    pub const fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Issuance time.
    #[must_use]
    pub const fn issued_at(&self) -> &IsoTimestamp {
        &self.issued_at
    }

    /// Anti-replay nonce.
    #[must_use]
    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    /// Human-readable statement, if any.
    #[must_use]
    pub fn statement(&self) -> Option<&str> {
        self.statement.as_deref()
    }

    /// Expiry time, if any.
    #[must_use]
    pub const fn expiration_time(&self) -> Option<&IsoTimestamp> {
        self.expiration_time.as_ref()
    }

    /// Start of validity, if any.
    #[must_use]
    pub const fn not_before(&self) -> Option<&IsoTimestamp> {
        self.not_before.as_ref()
    }

    /// Relying-party request identifier, if any.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Resources the sign-in grants access to, if any.
    #[must_use]
    pub fn resources(&self) -> Option<&[Uri]> {
        self.resources.as_deref()
    }
}

impl Display for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{HEADER_SUFFIX}\n{}\n\n", self.domain, self.address)?;
        match &self.statement {
            Some(statement) => write!(f, "{statement}\n\n")?,
            None => f.write_str("\n")?,
        }
        write!(
            f,
            "{URI_TAG}{}\n{NONCE_TAG}{}\n{ISSUED_AT_TAG}{}",
            self.uri, self.nonce, self.issued_at
        )?;
        if let Some(expiration_time) = &self.expiration_time {
            write!(f, "\n{EXPIRATION_TIME_TAG}{expiration_time}")?;
        }
        if let Some(not_before) = &self.not_before {
            write!(f, "\n{NOT_BEFORE_TAG}{not_before}")?;
        }
        if let Some(request_id) = &self.request_id {
            write!(f, "\n{REQUEST_ID_TAG}{request_id}")?;
        }
        if let Some(resources) = &self.resources {
            write!(f, "\n{RESOURCES_TAG}")?;
            for resource in resources {
                write!(f, "\n{RESOURCE_ITEM_PREFIX}{resource}")?;
            }
        }
        Ok(())
    }
}

impl FromStr for Message {
    type Err = SiwsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s, ParseMode::Strict)
    }
}

impl TryFrom<MessageFields> for Message {
    type Error = ValidationError;

    fn try_from(fields: MessageFields) -> Result<Self, Self::Error> {
        validate(fields)
    }
}

impl From<Message> for MessageFields {
    fn from(message: Message) -> Self {
        message.to_fields()
    }
}
