//! RFC 3986 URIs as they appear in the `URI` and `Resources` lines.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use url::Url;

use crate::grammar;

/// An absolute URI that keeps the exact text it was built from.
///
/// The text is validated with [`url::Url`] but never normalized, so a message
/// re-serializes to the bytes that were signed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Uri {
    raw: String,
    parsed: Url,
}

/// Error returned when a string is not an absolute URI.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid URI {0:?}")]
pub struct UriFormatError(String);

impl Uri {
    /// Parses an absolute URI.
    ///
    /// # Errors
    ///
    /// Returns [`UriFormatError`] if the text contains whitespace, has no
    /// scheme, or is otherwise rejected by the URL parser.
    pub fn parse(raw: &str) -> Result<Self, UriFormatError> {
        if !grammar::is_uri_token(raw) {
            return Err(UriFormatError(raw.to_owned()));
        }
        let parsed = Url::parse(raw).map_err(|_| UriFormatError(raw.to_owned()))?;
        Ok(Self {
            raw: raw.to_owned(),
            parsed,
        })
    }

    /// Returns the original text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the URI scheme, lowercased.
    #[must_use]
    pub fn scheme(&self) -> &str {
        self.parsed.scheme()
    }

    /// Returns the host, if the URI has one.
    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.parsed.host_str()
    }
}

impl FromStr for Uri {
    type Err = UriFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Display for Uri {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl AsRef<str> for Uri {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

impl Serialize for Uri {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Uri {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_text_verbatim() {
        let uri = Uri::parse("HTTPS://Example.com:443/login").unwrap();
        assert_eq!(uri.as_str(), "HTTPS://Example.com:443/login");
        assert_eq!(uri.scheme(), "https");
        assert_eq!(uri.host(), Some("example.com"));
    }

    #[test]
    fn test_non_http_schemes() {
        assert!(Uri::parse("ipfs://bafybeiemxf5abjwjbikoz4mc3a3dla6ual3jsgpdr4cjr3oz3evfyavhwq").is_ok());
        let urn = Uri::parse("urn:uuid:6e8bc430-9c3a-11d9-9669-0800200c9a66").unwrap();
        assert_eq!(urn.host(), None);
    }

    #[test]
    fn test_rejects_relative_and_spaced() {
        assert!(Uri::parse("/login").is_err());
        assert!(Uri::parse("example.com").is_err());
        assert!(Uri::parse("https://example.com/a b").is_err());
        assert!(Uri::parse("").is_err());
    }

    #[test]
    fn test_serde_as_string() {
        let uri: Uri = serde_json::from_str("\"https://example.com/login\"").unwrap();
        assert_eq!(serde_json::to_string(&uri).unwrap(), "\"https://example.com/login\"");
        assert!(serde_json::from_str::<Uri>("\"nope\"").is_err());
    }
}
