//! Ordered line-grammar parser.
//!
//! ```text
//! <domain> wants you to sign in with your Stacks account:
//! <address>
//!
//! [<statement>]
//!
//! URI: <uri>
//! Nonce: <nonce>
//! Issued At: <timestamp>
//! [Expiration Time: <timestamp>]
//! [Not Before: <timestamp>]
//! [Request ID: <request-id>]
//! [Resources:
//! - <uri>
//! ...]
//! ```
//!
//! Lines are separated by a single `\n`. Without a statement the address is
//! followed by two blank lines. Nothing may follow the last field.

use super::MessageParser;
use crate::error::{MessageElement, ParseError};
use crate::fields::MessageFields;
use crate::grammar::{
    self, EXPIRATION_TIME_TAG, HEADER_SUFFIX, ISSUED_AT_TAG, NONCE_TAG, NOT_BEFORE_TAG,
    REQUEST_ID_TAG, RESOURCE_ITEM_PREFIX, RESOURCES_TAG, URI_TAG,
};

/// Parser enforcing the exact, ordered message grammar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StrictParser;

impl MessageParser for StrictParser {
    fn parse(&self, text: &str) -> Result<MessageFields, ParseError> {
        parse_strict(text)
    }
}

/// Parses message text against the strict line grammar.
///
/// # Errors
///
/// Returns [`ParseError::MalformedMessage`] naming the first element that does
/// not match, with its 1-based line number.
pub fn parse_strict(text: &str) -> Result<MessageFields, ParseError> {
    let mut cursor = Cursor::new(text);

    let header = cursor.next(MessageElement::Header)?;
    let domain = header
        .strip_suffix(HEADER_SUFFIX)
        .ok_or_else(|| cursor.fail(MessageElement::Header))?;
    if !grammar::is_domain(domain) {
        return Err(cursor.fail(MessageElement::Domain));
    }

    let address = cursor.next(MessageElement::Address)?;
    if !grammar::is_token(address) {
        return Err(cursor.fail(MessageElement::Address));
    }

    cursor.blank()?;
    let statement = match cursor.peek() {
        Some("") => {
            cursor.advance();
            None
        }
        Some(line) if line.starts_with(URI_TAG) && cursor.peek_after() != Some("") => {
            cursor.advance();
            return Err(cursor.fail(MessageElement::BlankLine));
        }
        Some(_) => {
            let line = cursor.next(MessageElement::Statement)?;
            if !grammar::is_statement(line) {
                return Err(cursor.fail(MessageElement::Statement));
            }
            cursor.blank()?;
            Some(line)
        }
        None => return Err(cursor.missing(MessageElement::Uri)),
    };

    let uri = cursor.tagged(URI_TAG, MessageElement::Uri, grammar::is_uri_token)?;
    let nonce = cursor.tagged(NONCE_TAG, MessageElement::Nonce, grammar::is_nonce_token)?;
    let issued_at = cursor.tagged(ISSUED_AT_TAG, MessageElement::IssuedAt, grammar::is_token)?;
    let expiration_time = cursor.optional_tagged(
        EXPIRATION_TIME_TAG,
        MessageElement::ExpirationTime,
        grammar::is_token,
    )?;
    let not_before =
        cursor.optional_tagged(NOT_BEFORE_TAG, MessageElement::NotBefore, grammar::is_token)?;
    let request_id =
        cursor.optional_tagged(REQUEST_ID_TAG, MessageElement::RequestId, grammar::is_token)?;

    let resources = if cursor.peek() == Some(RESOURCES_TAG) {
        cursor.advance();
        let mut resources = Vec::new();
        while let Some(line) = cursor.peek() {
            let Some(resource) = line.strip_prefix(RESOURCE_ITEM_PREFIX) else {
                break;
            };
            cursor.advance();
            if !grammar::is_uri_token(resource) {
                return Err(cursor.fail(MessageElement::Resource));
            }
            resources.push(resource.to_owned());
        }
        Some(resources)
    } else {
        None
    };

    if let Some(line) = cursor.peek() {
        cursor.advance();
        return Err(cursor.fail(classify(line)));
    }

    Ok(MessageFields {
        domain: Some(domain.to_owned()),
        address: Some(address.to_owned()),
        uri: Some(uri.to_owned()),
        issued_at: Some(issued_at.to_owned()),
        nonce: Some(nonce.to_owned()),
        statement: statement.map(str::to_owned),
        expiration_time: expiration_time.map(str::to_owned),
        not_before: not_before.map(str::to_owned),
        request_id: request_id.map(str::to_owned),
        resources,
    })
}

/// Names the element a stray line looks like, for error reporting.
fn classify(line: &str) -> MessageElement {
    [
        (URI_TAG, MessageElement::Uri),
        (NONCE_TAG, MessageElement::Nonce),
        (ISSUED_AT_TAG, MessageElement::IssuedAt),
        (EXPIRATION_TIME_TAG, MessageElement::ExpirationTime),
        (NOT_BEFORE_TAG, MessageElement::NotBefore),
        (REQUEST_ID_TAG, MessageElement::RequestId),
        (RESOURCES_TAG, MessageElement::Resources),
        (RESOURCE_ITEM_PREFIX, MessageElement::Resource),
    ]
    .into_iter()
    .find_map(|(tag, element)| line.starts_with(tag).then_some(element))
    .unwrap_or(MessageElement::TrailingContent)
}

/// Line cursor. `consumed` is the number of lines taken so far, which is also
/// the 1-based number of the most recently taken line.
struct Cursor<'a> {
    lines: Vec<&'a str>,
    consumed: usize,
}

impl<'a> Cursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.split('\n').collect(),
            consumed: 0,
        }
    }

    fn peek(&self) -> Option<&'a str> {
        self.lines.get(self.consumed).copied()
    }

    fn peek_after(&self) -> Option<&'a str> {
        self.lines.get(self.consumed + 1).copied()
    }

    fn advance(&mut self) {
        self.consumed += 1;
    }

    /// Error for the most recently taken line.
    const fn fail(&self, element: MessageElement) -> ParseError {
        ParseError::MalformedMessage {
            element,
            line: self.consumed,
        }
    }

    /// Error for a line that should exist but does not.
    const fn missing(&self, element: MessageElement) -> ParseError {
        ParseError::MalformedMessage {
            element,
            line: self.consumed + 1,
        }
    }

    fn next(&mut self, element: MessageElement) -> Result<&'a str, ParseError> {
        let line = self.peek().ok_or_else(|| self.missing(element))?;
        self.advance();
        Ok(line)
    }

    fn blank(&mut self) -> Result<(), ParseError> {
        let line = self.next(MessageElement::BlankLine)?;
        if line.is_empty() {
            Ok(())
        } else {
            Err(self.fail(MessageElement::BlankLine))
        }
    }

    fn tagged(
        &mut self,
        tag: &str,
        element: MessageElement,
        accept: fn(&str) -> bool,
    ) -> Result<&'a str, ParseError> {
        let line = self.next(element)?;
        match line.strip_prefix(tag) {
            Some(value) if accept(value) => Ok(value),
            _ => Err(self.fail(element)),
        }
    }

    fn optional_tagged(
        &mut self,
        tag: &str,
        element: MessageElement,
        accept: fn(&str) -> bool,
    ) -> Result<Option<&'a str>, ParseError> {
        match self.peek() {
            Some(line) if line.starts_with(tag) => self.tagged(tag, element, accept).map(Some),
            _ => Ok(None),
        }
    }
}
