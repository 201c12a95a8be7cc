//! Message text parsers.
//!
//! Two interchangeable strategies turn message text into [`MessageFields`]:
//!
//! - [`StrictParser`] walks the line grammar in order and rejects any deviation.
//! - [`LenientParser`] locates each field with its own pattern and tolerates
//!   extra whitespace, CRLF line endings and reordered optional lines.
//!
//! Both implement [`MessageParser`]; callers usually pick one through
//! [`ParseMode`](crate::ParseMode).

use crate::error::ParseError;
use crate::fields::MessageFields;

mod lenient;
mod strict;

pub use lenient::{LenientParser, parse_lenient};
pub use strict::{StrictParser, parse_strict};

/// A strategy for extracting [`MessageFields`] from message text.
pub trait MessageParser {
    /// Parses `text` into raw fields.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::MalformedMessage`] if a required structural element
    /// cannot be located.
    fn parse(&self, text: &str) -> Result<MessageFields, ParseError>;
}

impl<P: MessageParser + ?Sized> MessageParser for &P {
    fn parse(&self, text: &str) -> Result<MessageFields, ParseError> {
        (**self).parse(text)
    }
}
