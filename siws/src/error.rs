//! Error types for Sign-In With Stacks messages.
//!
//! Each stage of the protocol has its own error enum so callers can tell a
//! syntactically broken message apart from a semantically invalid one, and
//! both apart from a message that fails verification. [`SiwsError`] wraps
//! all of them for callers that only need a single error type.

use std::fmt;

/// A structural element of the message grammar.
///
/// Carried by [`ParseError::MalformedMessage`] to say which part of the text
/// could not be matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageElement {
    /// The `<domain> wants you to sign in with your Stacks account:` line.
    Header,
    /// The domain inside the header line.
    Domain,
    /// The account address line.
    Address,
    /// A blank separator line.
    BlankLine,
    /// The optional statement line.
    Statement,
    /// The `URI:` line.
    Uri,
    /// The `Nonce:` line.
    Nonce,
    /// The `Issued At:` line.
    IssuedAt,
    /// The `Expiration Time:` line.
    ExpirationTime,
    /// The `Not Before:` line.
    NotBefore,
    /// The `Request ID:` line.
    RequestId,
    /// The `Resources:` header line.
    Resources,
    /// A `- <uri>` resource entry.
    Resource,
    /// Text left over after the last recognised line.
    TrailingContent,
}

impl MessageElement {
    /// Returns a short human-readable name for the element.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Domain => "domain",
            Self::Address => "address",
            Self::BlankLine => "blank line",
            Self::Statement => "statement",
            Self::Uri => "uri",
            Self::Nonce => "nonce",
            Self::IssuedAt => "issued-at",
            Self::ExpirationTime => "expiration-time",
            Self::NotBefore => "not-before",
            Self::RequestId => "request-id",
            Self::Resources => "resources",
            Self::Resource => "resource",
            Self::TrailingContent => "trailing content",
        }
    }
}

impl fmt::Display for MessageElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while turning message text into a field map.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// The text does not match the message grammar.
    #[error("Malformed message: unexpected {element} at line {line}")]
    MalformedMessage {
        /// The element that could not be matched.
        element: MessageElement,
        /// 1-based line number where matching failed.
        line: usize,
    },
}

impl ParseError {
    /// Returns the element that could not be matched.
    #[must_use]
    pub const fn element(&self) -> MessageElement {
        match self {
            Self::MalformedMessage { element, .. } => *element,
        }
    }
}

/// Errors raised while validating a field map into a [`Message`](crate::Message).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// One or more fields are missing or violate their constraints.
    ///
    /// Every offending field is listed, in canonical message order.
    #[error("Malformed session, offending fields: {}", .missing_fields.join(", "))]
    MalformedSession {
        /// Names of every missing or invalid field.
        missing_fields: Vec<&'static str>,
    },
}

impl ValidationError {
    /// Returns the names of every offending field.
    #[must_use]
    pub fn missing_fields(&self) -> &[&'static str] {
        match self {
            Self::MalformedSession { missing_fields } => missing_fields,
        }
    }
}

/// Errors raised by the verification pipeline.
///
/// Checks run in a fixed order and the first failing one is reported.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum VerificationError {
    /// The expected domain differs from the message domain.
    #[error("Domain does not match the expected domain")]
    DomainMismatch,
    /// The expected nonce differs from the message nonce.
    #[error("Nonce does not match the expected nonce")]
    NonceMismatch,
    /// The verification time is at or past `Expiration Time`.
    #[error("Message is expired")]
    ExpiredMessage,
    /// The verification time is at or before `Not Before`.
    #[error("Message is not yet valid")]
    NotYetValidMessage,
    /// The signature does not verify against the message and public key.
    #[error("Signature is invalid")]
    InvalidSignature,
    /// The signature string does not carry a recognised recovery byte.
    #[error("Signature format not supported")]
    UnsupportedSignatureFormat,
    /// The public key cannot be decoded as a curve point.
    #[error("Public key is invalid")]
    InvalidPublicKey,
}

impl VerificationError {
    /// Returns a stable machine-readable reason code.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::DomainMismatch => "domain_mismatch",
            Self::NonceMismatch => "nonce_mismatch",
            Self::ExpiredMessage => "expired_message",
            Self::NotYetValidMessage => "not_yet_valid_message",
            Self::InvalidSignature => "invalid_signature",
            Self::UnsupportedSignatureFormat => "unsupported_signature_format",
            Self::InvalidPublicKey => "invalid_public_key",
        }
    }
}

/// Errors raised by binary encoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    /// The value is negative, not an integer, or too large to encode.
    #[error("value out of range")]
    ValueOutOfRange,
}

/// Base error type for Sign-In With Stacks operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SiwsError {
    /// The message text could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The parsed fields failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The message failed verification.
    #[error(transparent)]
    Verification(#[from] VerificationError),

    /// A value could not be encoded.
    #[error(transparent)]
    Encoding(#[from] EncodingError),
}
