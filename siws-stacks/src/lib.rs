#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Stacks signing conventions for Sign-In With Stacks.
//!
//! This crate plugs the Stacks wallet signature format into the
//! chain-agnostic [`siws`] verification pipeline.
//!
//! # Architecture
//!
//! - [`codec`] - Signed-message prefix, `CompactSize` varints, RSV/VRS
//!   signature and public-key decoding
//! - [`verifier`] - [`StacksScheme`], the SHA-256 + secp256k1 implementation
//!   of [`siws::SignatureScheme`]
//! - [`signer`] - [`StacksSigner`], a local key producing wallet-identical
//!   signatures
//!
//! # Example
//!
//! ```rust
//! use siws::{IsoTimestamp, Message, MessageFields, VerifyOptions};
//! use siws_stacks::{SignatureLayout, StacksSigner, verify};
//!
//! let message = Message::from_fields(MessageFields {
//!     domain: Some("example.com".into()),
//!     address: Some("SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7".into()),
//!     uri: Some("https://example.com/login".into()),
//!     nonce: Some(siws::generate_nonce()),
//!     ..MessageFields::default()
//! })
//! .unwrap();
//!
//! let signer = StacksSigner::from_bytes(&[0x42; 32]).unwrap();
//! let signature = signer.sign_message(&message, SignatureLayout::Vrs).unwrap();
//!
//! let options = VerifyOptions::default()
//!     .with_domain("example.com")
//!     .with_nonce(message.nonce());
//! assert!(verify(&message, &signature, &signer.public_key_hex(), &options).unwrap());
//! ```
//!
//! # Feature Flags
//!
//! - `telemetry` - Enables tracing instrumentation in this crate and in `siws`

pub mod codec;
pub mod signer;
pub mod verifier;

pub use codec::{
    MAX_SAFE_INTEGER, STACKS_MESSAGE_PREFIX, VarInt, decode_signature, decode_trailing_layout,
    encode_for_signing, message_digest, varint_encode,
};
pub use signer::{SignatureLayout, SignerError, StacksSigner};
pub use verifier::{StacksScheme, StacksSignature, verify};
