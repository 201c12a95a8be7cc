//! Pattern-based parser that tolerates formatting drift.
//!
//! Each field is located by its own pattern instead of by position. Compared to
//! the strict parser this accepts:
//!
//! - `\r\n` line endings
//! - leading, trailing and repeated whitespace around tags and values
//! - extra blank lines between fields
//! - tagged lines and the resource list in any order after the address
//!
//! It still rejects text with a missing required line, a duplicated tag, or a
//! line it cannot attribute to any field.

use std::sync::LazyLock;

use regex::Regex;

use super::MessageParser;
use crate::error::{MessageElement, ParseError};
use crate::fields::MessageFields;
use crate::grammar::{
    EXPIRATION_TIME_TAG, HEADER_SUFFIX, ISSUED_AT_TAG, NONCE_TAG, NOT_BEFORE_TAG, REQUEST_ID_TAG,
    RESOURCE_ITEM_PREFIX, RESOURCES_TAG, URI_TAG,
};

/// Parser that locates fields by pattern and tolerates whitespace and order
/// differences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LenientParser;

impl MessageParser for LenientParser {
    fn parse(&self, text: &str) -> Result<MessageFields, ParseError> {
        parse_lenient(text)
    }
}

/// Turns a literal into a pattern where every run of spaces matches any
/// horizontal or vertical whitespace.
fn loose(literal: &str) -> String {
    literal
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+")
}

static HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^\s*(?P<domain>\S+)\s+{}\s*$", loose(HEADER_SUFFIX)))
        .expect("header pattern is valid")
});

static RESOURCES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^\s*{}\s*$", loose(RESOURCES_TAG))).expect("resources pattern is valid")
});

static RESOURCE_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^\s*{}\s*(?P<value>\S+)\s*$",
        loose(RESOURCE_ITEM_PREFIX)
    ))
    .expect("resource item pattern is valid")
});

/// A single-value tagged line, such as `Nonce: <value>`.
struct TaggedLine {
    element: MessageElement,
    label: Regex,
    required: bool,
}

impl TaggedLine {
    fn new(tag: &str, element: MessageElement, required: bool) -> Self {
        let label = Regex::new(&format!(r"^\s*{}(?P<rest>.*)$", loose(tag)))
            .expect("tag pattern is valid");
        Self {
            element,
            label,
            required,
        }
    }
}

static TAGGED_LINES: LazyLock<[TaggedLine; 6]> = LazyLock::new(|| {
    [
        TaggedLine::new(URI_TAG, MessageElement::Uri, true),
        TaggedLine::new(NONCE_TAG, MessageElement::Nonce, true),
        TaggedLine::new(ISSUED_AT_TAG, MessageElement::IssuedAt, true),
        TaggedLine::new(EXPIRATION_TIME_TAG, MessageElement::ExpirationTime, false),
        TaggedLine::new(NOT_BEFORE_TAG, MessageElement::NotBefore, false),
        TaggedLine::new(REQUEST_ID_TAG, MessageElement::RequestId, false),
    ]
});

/// Returns `true` if the line opens a tagged field or the resource list.
fn is_structural(line: &str) -> bool {
    TAGGED_LINES.iter().any(|tag| tag.label.is_match(line))
        || RESOURCES.is_match(line)
        || RESOURCE_ITEM.is_match(line)
}

fn malformed(element: MessageElement, line: usize) -> ParseError {
    ParseError::MalformedMessage { element, line }
}

/// Parses message text, locating each field by pattern.
///
/// # Errors
///
/// Returns [`ParseError::MalformedMessage`] if the header, the address or a
/// required tagged line cannot be found, if a tag appears twice, or if a line
/// cannot be attributed to any field.
pub fn parse_lenient(text: &str) -> Result<MessageFields, ParseError> {
    let lines: Vec<&str> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();
    let past_end = lines.len() + 1;
    let mut consumed = vec![false; lines.len()];

    let non_blank_from = |start: usize| {
        (start..lines.len()).find(|&idx| !lines[idx].trim().is_empty())
    };

    let header_idx = non_blank_from(0).ok_or_else(|| malformed(MessageElement::Header, 1))?;
    let domain = HEADER
        .captures(lines[header_idx])
        .and_then(|caps| caps.name("domain"))
        .map(|m| m.as_str().to_owned())
        .ok_or_else(|| malformed(MessageElement::Header, header_idx + 1))?;
    consumed[header_idx] = true;

    let address_idx = non_blank_from(header_idx + 1)
        .ok_or_else(|| malformed(MessageElement::Address, past_end))?;
    let address = lines[address_idx].trim();
    if address.chars().any(char::is_whitespace) || is_structural(address) {
        return Err(malformed(MessageElement::Address, address_idx + 1));
    }
    consumed[address_idx] = true;
    let body_start = address_idx + 1;

    let statement = match non_blank_from(body_start) {
        Some(idx) if !is_structural(lines[idx]) => {
            consumed[idx] = true;
            Some(lines[idx].trim().to_owned())
        }
        _ => None,
    };

    let mut values: [Option<String>; 6] = Default::default();
    for (slot, tag) in values.iter_mut().zip(TAGGED_LINES.iter()) {
        for idx in body_start..lines.len() {
            if consumed[idx] {
                continue;
            }
            let Some(rest) = tag.label.captures(lines[idx]).and_then(|caps| caps.name("rest"))
            else {
                continue;
            };
            let value = rest.as_str().trim();
            if slot.is_some() || value.is_empty() || value.chars().any(char::is_whitespace) {
                return Err(malformed(tag.element, idx + 1));
            }
            consumed[idx] = true;
            *slot = Some(value.to_owned());
        }
        if tag.required && slot.is_none() {
            return Err(malformed(tag.element, past_end));
        }
    }

    let mut resources = None;
    for idx in body_start..lines.len() {
        if consumed[idx] || !RESOURCES.is_match(lines[idx]) {
            continue;
        }
        if resources.is_some() {
            return Err(malformed(MessageElement::Resources, idx + 1));
        }
        consumed[idx] = true;
        let mut entries = Vec::new();
        for (item_idx, line) in lines.iter().enumerate().skip(idx + 1) {
            if line.trim().is_empty() {
                continue;
            }
            let Some(value) = RESOURCE_ITEM.captures(line).and_then(|caps| caps.name("value"))
            else {
                break;
            };
            consumed[item_idx] = true;
            entries.push(value.as_str().to_owned());
        }
        resources = Some(entries);
    }

    if let Some(idx) = (0..lines.len()).find(|&idx| !consumed[idx] && !lines[idx].trim().is_empty())
    {
        let element = if RESOURCE_ITEM.is_match(lines[idx]) {
            MessageElement::Resource
        } else {
            MessageElement::TrailingContent
        };
        return Err(malformed(element, idx + 1));
    }

    let [uri, nonce, issued_at, expiration_time, not_before, request_id] = values;
    Ok(MessageFields {
        domain: Some(domain),
        address: Some(address.to_owned()),
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
