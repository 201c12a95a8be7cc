#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Core types for Sign-In With Stacks.
//!
//! This crate implements the chain-agnostic half of an EIP-4361 style sign-in
//! protocol: a relying party produces a human-readable, line-oriented message,
//! a wallet signs it, and the relying party later verifies the signature
//! together with the message's domain, nonce and validity window.
//! Stacks-specific signing conventions live in the `siws-stacks` crate and
//! plug in through [`SignatureScheme`].
//!
//! # Overview
//!
//! ```text
//! text ──► MessageParser ──► MessageFields ──► validate ──► Message
//!                                                            │
//!                          SignatureScheme ◄── prepare_message
//!                                │
//!                             verify ──► bool / VerificationError
//! ```
//!
//! # Modules
//!
//! - [`config`] - Parser selection and verification options
//! - [`error`] - Error taxonomy for parsing, validation, verification and encoding
//! - [`fields`] - Untyped field map shared by parsers and validator
//! - [`grammar`] - Literal tags and token rules of the message format
//! - [`message`] - The validated message and its canonical text
//! - [`nonce`] - Random nonce generation
//! - [`parser`] - Strict and lenient message parsers
//! - [`timestamp`] - ISO-8601 timestamps that keep their original text
//! - [`uri`] - Absolute URIs that keep their original text
//! - [`validate`](mod@validate) - Field validation
//! - [`verify`] - The verification pipeline and the signature scheme trait
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation for debugging and monitoring

pub mod config;
pub mod error;
pub mod fields;
pub mod grammar;
pub mod message;
pub mod nonce;
pub mod parser;
pub mod timestamp;
pub mod uri;
pub mod validate;
pub mod verify;

pub use config::{ParseMode, VerifyOptions};
pub use error::{
    EncodingError, MessageElement, ParseError, SiwsError, ValidationError, VerificationError,
};
pub use fields::MessageFields;
pub use message::Message;
pub use nonce::generate_nonce;
pub use parser::{LenientParser, MessageParser, StrictParser, parse_lenient, parse_strict};
pub use timestamp::{IsoTimestamp, TimestampFormatError};
pub use uri::{Uri, UriFormatError};
pub use validate::validate;
pub use verify::SignatureScheme;
