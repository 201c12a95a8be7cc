//! Wire-format literals and token rules of the message grammar.
//!
//! The strict parser, the lenient parser, the validator and the serializer all
//! read from this module, so the literal text of a message is defined once.

/// Account system named in the header line.
pub const ACCOUNT_SYSTEM: &str = "Stacks";

/// Text following the domain on the header line.
pub const HEADER_SUFFIX: &str = " wants you to sign in with your Stacks account:";

/// Tag of the `URI` line.
pub const URI_TAG: &str = "URI: ";
/// Tag of the `Nonce` line.
pub const NONCE_TAG: &str = "Nonce: ";
/// Tag of the `Issued At` line.
pub const ISSUED_AT_TAG: &str = "Issued At: ";
/// Tag of the `Expiration Time` line.
pub const EXPIRATION_TIME_TAG: &str = "Expiration Time: ";
/// Tag of the `Not Before` line.
pub const NOT_BEFORE_TAG: &str = "Not Before: ";
/// Tag of the `Request ID` line.
pub const REQUEST_ID_TAG: &str = "Request ID: ";
/// The `Resources` header line.
pub const RESOURCES_TAG: &str = "Resources:";
/// Prefix of each resource entry line.
pub const RESOURCE_ITEM_PREFIX: &str = "- ";

/// Minimum nonce length.
pub const MIN_NONCE_LEN: usize = 8;

/// Characters a domain may never contain.
pub const DOMAIN_FORBIDDEN: [char; 3] = ['/', '?', '#'];

/// Returns `true` if `value` is a single non-empty token without whitespace.
pub(crate) fn is_token(value: &str) -> bool {
    !value.is_empty() && !value.chars().any(char::is_whitespace)
}

/// Domain: an authority with no path, query or fragment delimiters.
pub(crate) fn is_domain(value: &str) -> bool {
    is_token(value) && !value.contains(DOMAIN_FORBIDDEN)
}

/// Nonce: ASCII letters and digits only.
pub(crate) fn is_nonce_token(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Statement: a single non-empty line of text.
pub(crate) fn is_statement(value: &str) -> bool {
    !value.is_empty() && !value.chars().any(|c| c == '\n' || c == '\r')
}

/// URI shape as required by the grammar: `scheme ":" rest` with no whitespace.
///
/// Full URI validation happens in the validator.
pub(crate) fn is_uri_token(value: &str) -> bool {
    if !is_token(value) {
        return false;
    }
    let Some((scheme, _)) = value.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
