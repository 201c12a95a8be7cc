//! The untyped field map shared by both parsers and the validator.

use serde::{Deserialize, Serialize};

/// Raw message fields, before validation.
///
/// This is what the parsers extract from message text and what callers may
/// supply directly (for instance as JSON) to build a [`Message`](crate::Message).
/// No constraint is enforced here; see [`validate`](fn@crate::validate).
///
/// # Example
///
/// ```rust
/// use siws::MessageFields;
///
/// let fields: MessageFields = serde_json::from_str(r#"{
///     "domain": "example.com",
///     "address": "SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7",
///     "uri": "https://example.com/login",
///     "nonce": "abcdefgh12",
///     "issued_at": "2024-01-01T00:00:00Z"
/// }"#).unwrap();
/// assert_eq!(fields.domain.as_deref(), Some("example.com"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageFields {
    /// Domain requesting the sign-in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Account address performing the sign-in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// URI of the resource the sign-in is for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uri: Option<String>,
    /// Issuance time, ISO-8601.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<String>,
    /// Anti-replay nonce.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    /// Human-readable statement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statement: Option<String>,
    /// Expiry time, ISO-8601.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<String>,
    /// Start of validity, ISO-8601.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_before: Option<String>,
    /// Relying-party request identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Resources the sign-in grants access to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_missing_fields_are_none() {
        let fields: MessageFields = serde_json::from_str(r#"{"domain":"example.com"}"#).unwrap();
        assert_eq!(fields.domain.as_deref(), Some("example.com"));
        assert!(fields.address.is_none());
        assert!(fields.resources.is_none());
    }

    #[test]
    fn test_serialize_skips_absent_fields() {
        let fields = MessageFields {
            nonce: Some("abcdefgh12".into()),
            resources: Some(vec!["https://example.com/a".into()]),
            ..MessageFields::default()
        };
        let json = serde_json::to_string(&fields).unwrap();
        assert_eq!(
            json,
            r#"{"nonce":"abcdefgh12","resources":["https://example.com/a"]}"#
        );
    }
}
