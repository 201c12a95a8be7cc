//! Local secp256k1 signer producing Stacks message signatures.
//!
//! Intended for relying-party tooling and tests. Wallets sign on the user's
//! side; this reproduces their output byte for byte.

use alloy_primitives::hex;
use k256::ecdsa::{RecoveryId, Signature, SigningKey};
use siws::Message;
use std::fmt;

use crate::codec::{self, strip_hex_prefix};

/// Where the recovery byte sits in an encoded signature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SignatureLayout {
    /// `r || s || v`
    #[default]
    Rsv,
    /// `v || r || s`
    Vrs,
}

/// Errors from [`StacksSigner`].
#[derive(Debug, thiserror::Error)]
pub enum SignerError {
    /// The secret key is not a valid secp256k1 scalar.
    #[error("Invalid secret key")]
    InvalidSecretKey,
    /// The curve library failed to produce a signature.
    #[error("Signing failed: {0}")]
    Signing(#[from] k256::ecdsa::Error),
}

/// A secp256k1 key that signs sign-in messages the way a Stacks wallet does.
#[derive(Clone)]
pub struct StacksSigner {
    signing_key: SigningKey,
}

impl fmt::Debug for StacksSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StacksSigner")
            .field("public_key", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}

impl StacksSigner {
    /// Creates a signer from a 32-byte secret key.
    ///
    /// # Errors
    ///
    /// Returns [`SignerError::InvalidSecretKey`] if the bytes are zero or not
    /// below the curve order.
    pub fn from_bytes(secret: &[u8; 32]) -> Result<Self, SignerError> {
        SigningKey::from_slice(secret)
            .map(|signing_key| Self { signing_key })
            .map_err(|_| SignerError::InvalidSecretKey)
    }

    /// Creates a signer from a hex secret key, with or without `0x`.
    ///
    /// A 33-byte key ending in `01`, the form Stacks tooling uses to mark a
    /// compressed public key, is accepted as well.
    ///
    /// # Errors
    ///
    /// Returns [`SignerError::InvalidSecretKey`] if the text is not a valid key.
    pub fn from_hex(secret: &str) -> Result<Self, SignerError> {
        let bytes = hex::decode(strip_hex_prefix(secret)).map_err(|_| SignerError::InvalidSecretKey)?;
        let scalar = match bytes.as_slice() {
            [scalar @ .., 0x01] if scalar.len() == 32 => scalar,
            scalar if scalar.len() == 32 => scalar,
            _ => return Err(SignerError::InvalidSecretKey),
        };
        SigningKey::from_slice(scalar)
            .map(|signing_key| Self { signing_key })
            .map_err(|_| SignerError::InvalidSecretKey)
    }

    /// Compressed SEC1 public key as lowercase hex.
    #[must_use]
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.signing_key.verifying_key().to_encoded_point(true).as_bytes())
    }

    /// Uncompressed SEC1 public key as lowercase hex.
    #[must_use]
    pub fn uncompressed_public_key_hex(&self) -> String {
        hex::encode(self.signing_key.verifying_key().to_encoded_point(false).as_bytes())
    }

    /// Signs a 32-byte digest, returning a low-S signature and its recovery id.
    ///
    /// # Errors
    ///
    /// Returns [`SignerError::Signing`] if the curve library fails.
    pub fn sign_digest(&self, digest: &[u8; 32]) -> Result<(Signature, RecoveryId), SignerError> {
        Ok(self.signing_key.sign_prehash_recoverable(digest)?)
    }

    /// Signs raw message text and encodes the signature as hex.
    ///
    /// # Errors
    ///
    /// Returns [`SignerError::Signing`] if the curve library fails.
    pub fn sign_text(&self, text: &str, layout: SignatureLayout) -> Result<String, SignerError> {
        let (signature, recovery_id) = self.sign_digest(&codec::message_digest(text))?;
        let rs = hex::encode(signature.to_bytes());
        let v = hex::encode([recovery_id.to_byte()]);
        Ok(match layout {
            SignatureLayout::Rsv => format!("{rs}{v}"),
            SignatureLayout::Vrs => format!("{v}{rs}"),
        })
    }

    /// Signs the canonical text of `message`.
    ///
    /// # Errors
    ///
    /// Returns [`SignerError::Signing`] if the curve library fails.
    pub fn sign_message(
        &self,
        message: &Message,
        layout: SignatureLayout,
    ) -> Result<String, SignerError> {
        self.sign_text(&message.prepare_message(), layout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_secret() {
        assert!(matches!(
            StacksSigner::from_bytes(&[0; 32]),
            Err(SignerError::InvalidSecretKey)
        ));
        assert!(matches!(
            StacksSigner::from_bytes(&[0xFF; 32]),
            Err(SignerError::InvalidSecretKey)
        ));
        assert!(StacksSigner::from_hex("abcd").is_err());
    }

    #[test]
    fn test_from_hex_forms_agree() {
        let plain = StacksSigner::from_bytes(&[0x11; 32]).unwrap();
        let hex32 = "11".repeat(32);
        let from_hex = StacksSigner::from_hex(&format!("0x{hex32}")).unwrap();
        let compressed_marker = StacksSigner::from_hex(&format!("{hex32}01")).unwrap();
        assert_eq!(from_hex.public_key_hex(), plain.public_key_hex());
        assert_eq!(compressed_marker.public_key_hex(), plain.public_key_hex());
    }

    #[test]
    fn test_public_key_shapes() {
        let signer = StacksSigner::from_bytes(&[0x11; 32]).unwrap();
        let compressed = signer.public_key_hex();
        assert_eq!(compressed.len(), 66);
        assert!(compressed.starts_with("02") || compressed.starts_with("03"));
        let uncompressed = signer.uncompressed_public_key_hex();
        assert_eq!(uncompressed.len(), 130);
        assert!(uncompressed.starts_with("04"));
        assert_eq!(compressed[2..], uncompressed[2..66]);
    }

    #[test]
    fn test_signatures_are_deterministic_and_laid_out() {
        let signer = StacksSigner::from_bytes(&[0x11; 32]).unwrap();
        let rsv = signer.sign_text("hello", SignatureLayout::Rsv).unwrap();
        let vrs = signer.sign_text("hello", SignatureLayout::Vrs).unwrap();
        assert_eq!(rsv, signer.sign_text("hello", SignatureLayout::Rsv).unwrap());
        assert_eq!(rsv.len(), 130);
        assert_eq!(vrs.len(), 130);
        assert_eq!(rsv[..128], vrs[2..]);
        assert_eq!(rsv[128..], vrs[..2]);
        assert!(["00", "01"].contains(&&vrs[..2]));
    }

    #[test]
    fn test_debug_hides_secret() {
        let signer = StacksSigner::from_bytes(&[0x11; 32]).unwrap();
        let debug = format!("{signer:?}");
        assert!(debug.contains(&signer.public_key_hex()));
        assert!(!debug.contains(&"11".repeat(32)));
    }
}
