//! Field validation: turns a raw [`MessageFields`] into a [`Message`].
//!
//! Validation does not depend on which parser produced the fields. Every
//! field is checked even after one fails, so the error lists all problems at
//! once, in canonical field order.

#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::error::ValidationError;
use crate::fields::MessageFields;
use crate::grammar::{self, MIN_NONCE_LEN};
use crate::message::Message;
use crate::timestamp::IsoTimestamp;
use crate::uri::Uri;

/// Collects the names of offending fields while checks run.
#[derive(Debug, Default)]
struct Report {
    offending: Vec<&'static str>,
}

impl Report {
    /// Records `name` if a required value is absent or invalid.
    fn required<T>(&mut self, name: &'static str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.offending.push(name);
        }
        value
    }

    /// Checks an optional value. Absence is fine, a failed conversion is not.
    fn optional<S, T>(
        &mut self,
        name: &'static str,
        value: Option<S>,
        convert: impl FnOnce(S) -> Option<T>,
    ) -> Option<Option<T>> {
        match value {
            None => Some(None),
            Some(raw) => self.required(name, convert(raw)).map(Some),
        }
    }

    fn into_error(self) -> ValidationError {
        ValidationError::MalformedSession {
            missing_fields: self.offending,
        }
    }
}

fn is_valid_nonce(nonce: &str) -> bool {
    nonce.len() >= MIN_NONCE_LEN && grammar::is_nonce_token(nonce)
}

fn parse_resources(resources: Vec<String>) -> Option<Vec<Uri>> {
    if resources.is_empty() {
        return None;
    }
    resources
        .iter()
        .map(|resource| Uri::parse(resource).ok())
        .collect()
}

/// Validates a field map into a [`Message`].
///
/// Rules:
///
/// - `domain` is a single token with no `/`, `?` or `#`
/// - `address` is a single non-empty token
/// - `uri` and every entry of `resources` is an absolute URI
/// - `issued_at`, `expiration_time` and `not_before` are single-token
///   ISO-8601 dates or date-times; a missing `issued_at` defaults to the
///   current time
/// - `nonce` is at least eight ASCII letters or digits
/// - `statement` is a single non-empty line
/// - `request_id` is a single non-empty token
/// - `resources`, when present, has at least one entry
///
/// # Errors
///
/// Returns [`ValidationError::MalformedSession`] naming every missing or
/// invalid field.
#[cfg_attr(feature = "telemetry", instrument(skip_all, err))]
pub fn validate(fields: MessageFields) -> Result<Message, ValidationError> {
    let mut report = Report::default();

    let domain = report.required("domain", fields.domain.filter(|d| grammar::is_domain(d)));
    let address = report.required("address", fields.address.filter(|a| grammar::is_token(a)));
    let uri = report.required("uri", fields.uri.and_then(|u| Uri::parse(&u).ok()));
    let issued_at = report.required(
        "issued_at",
        fields
            .issued_at
            .map_or_else(|| Some(IsoTimestamp::now()), |t| IsoTimestamp::parse(&t).ok()),
    );
    let nonce = report.required("nonce", fields.nonce.filter(|n| is_valid_nonce(n)));
    let statement = report.optional("statement", fields.statement, |s| {
        grammar::is_statement(&s).then_some(s)
    });
    let expiration_time = report.optional("expiration_time", fields.expiration_time, |t| {
        IsoTimestamp::parse(&t).ok()
    });
    let not_before = report.optional("not_before", fields.not_before, |t| {
        IsoTimestamp::parse(&t).ok()
    });
    let request_id = report.optional("request_id", fields.request_id, |r| {
        grammar::is_token(&r).then_some(r)
    });
    let resources = report.optional("resources", fields.resources, parse_resources);

    let (
        Some(domain),
        Some(address),
        Some(uri),
        Some(issued_at),
        Some(nonce),
        Some(statement),
        Some(expiration_time),
        Some(not_before),
        Some(request_id),
        Some(resources),
    ) = (
        domain,
        address,
        uri,
        issued_at,
        nonce,
        statement,
        expiration_time,
        not_before,
        request_id,
        resources,
    )
    else {
        #[cfg(feature = "telemetry")]
        tracing::debug!(offending = ?report.offending, "message fields failed validation");
        return Err(report.into_error());
    };

    Ok(Message {
        domain,
        address,
        uri,
        issued_at,
        nonce,
        statement,
        expiration_time,
        not_before,
        request_id,
        resources,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> MessageFields {
        MessageFields {
            domain: Some("example.com".into()),
            address: Some("SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7".into()),
            uri: Some("https://example.com/login".into()),
            issued_at: Some("2024-01-01T00:00:00Z".into()),
            nonce: Some("abcdefgh12".into()),
            ..MessageFields::default()
        }
    }

    fn offending(fields: MessageFields) -> Vec<&'static str> {
        validate(fields).unwrap_err().missing_fields().to_vec()
    }

    #[test]
    fn test_valid_minimal() {
        let message = validate(valid()).unwrap();
        assert_eq!(message.domain(), "example.com");
        assert!(message.statement().is_none());
        assert!(message.resources().is_none());
    }

    #[test]
    fn test_empty_map_lists_required_fields() {
        assert_eq!(
            offending(MessageFields::default()),
            vec!["domain", "address", "uri", "nonce"]
        );
    }

    #[test]
    fn test_every_offending_field_is_reported_in_order() {
        let fields = MessageFields {
            domain: Some("example.com/login".into()),
            nonce: Some("short".into()),
            statement: Some("two\nlines".into()),
            not_before: Some("tomorrow".into()),
            resources: Some(vec![]),
            ..valid()
        };
        assert_eq!(
            offending(fields),
            vec!["domain", "nonce", "statement", "not_before", "resources"]
        );
    }

    #[test]
    fn test_nonce_rules() {
        for nonce in ["abcdefg", "abcdefg!", "abcd efgh", ""] {
            let fields = MessageFields {
                nonce: Some(nonce.into()),
                ..valid()
            };
            assert_eq!(offending(fields), vec!["nonce"], "nonce {nonce:?}");
        }
        let fields = MessageFields {
            nonce: Some("ABCDefgh".into()),
            ..valid()
        };
        assert!(validate(fields).is_ok());
    }

    #[test]
    fn test_domain_rules() {
        for domain in ["example.com?x", "example.com#frag", "exa mple.com", ""] {
            let fields = MessageFields {
                domain: Some(domain.into()),
                ..valid()
            };
            assert_eq!(offending(fields), vec!["domain"], "domain {domain:?}");
        }
    }

    #[test]
    fn test_invalid_uri_and_resource() {
        let fields = MessageFields {
            uri: Some("not a uri".into()),
            resources: Some(vec!["https://example.com/a".into(), "relative/path".into()]),
            ..valid()
        };
        assert_eq!(offending(fields), vec!["uri", "resources"]);
    }

    #[test]
    fn test_invalid_timestamps() {
        let fields = MessageFields {
            issued_at: Some("2024-01-01 00:00:00Z".into()),
            expiration_time: Some("never".into()),
            not_before: Some("2024-01-01T00:00:00Z ".into()),
            ..valid()
        };
        assert_eq!(
            offending(fields),
            vec!["issued_at", "expiration_time", "not_before"]
        );
    }

    #[test]
    fn test_valid_timestamps_reparse_strictly() {
        for raw in [
            "2024-01-01T00:00:00Z",
            "2024-01-01T02:00:00.250+02:00",
            "2024-01-01T00:00:00",
            "2024-01-01",
            "2024-01-01T00:00Z",
            "20240101T000000Z",
            "2024-01-01T00:00:00+0000",
        ] {
            let message = validate(MessageFields {
                issued_at: Some(raw.into()),
                expiration_time: Some(raw.into()),
                not_before: Some(raw.into()),
                ..valid()
            })
            .unwrap_or_else(|err| panic!("{raw}: {err}"));
            let parsed = crate::parser::parse_strict(&message.prepare_message())
                .unwrap_or_else(|err| panic!("{raw}: {err}"));
            assert_eq!(parsed.issued_at.as_deref(), Some(raw));
            assert_eq!(parsed.expiration_time.as_deref(), Some(raw));
            assert_eq!(parsed.not_before.as_deref(), Some(raw));
        }
    }

    #[test]
    fn test_request_id_must_be_a_token() {
        let fields = MessageFields {
            request_id: Some("two words".into()),
            ..valid()
        };
        assert_eq!(offending(fields), vec!["request_id"]);
    }

    #[test]
    fn test_missing_issued_at_defaults_to_now() {
        let before = chrono::Utc::now();
        let message = validate(MessageFields {
            issued_at: None,
            ..valid()
        })
        .unwrap();
        let issued = message.issued_at().instant();
        assert!(issued >= before - chrono::Duration::milliseconds(1));
        assert!(issued <= chrono::Utc::now());
    }

    #[test]
    fn test_error_display() {
        let err = validate(MessageFields {
            address: None,
            ..valid()
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "Malformed session, offending fields: address");
    }
}
