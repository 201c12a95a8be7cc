//! secp256k1 signature verification for Stacks sign-in messages.

use k256::ecdsa::signature::hazmat::PrehashVerifier;
use k256::ecdsa::{Signature, VerifyingKey};
use sha2::{Digest, Sha256};
use siws::{Message, SignatureScheme, VerificationError, VerifyOptions};

use crate::codec;

/// A decoded Stacks signature.
///
/// A signature with a recovery byte at both ends has two readings. The
/// leading-indicator one is tried first and the trailing one is kept as a
/// fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StacksSignature {
    primary: Signature,
    fallback: Option<Signature>,
}

impl StacksSignature {
    /// Returns the readings in the order they are tried.
    pub fn readings(&self) -> impl Iterator<Item = &Signature> {
        std::iter::once(&self.primary).chain(self.fallback.as_ref())
    }
}

/// The Stacks signing convention: prefixed, varint-framed message bytes,
/// SHA-256, ECDSA over secp256k1.
///
/// Plug it into [`Message::verify`], or use [`verify`] directly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StacksScheme;

impl SignatureScheme for StacksScheme {
    type Signature = StacksSignature;
    type PublicKey = VerifyingKey;

    fn encode_for_signing(&self, message: &str) -> Vec<u8> {
        codec::encode_for_signing(message)
    }

    fn decode_signature(&self, signature: &str) -> Result<StacksSignature, VerificationError> {
        let rs = codec::decode_signature(signature)?;
        let fallback = codec::decode_trailing_layout(signature)
            .and_then(|rs| Signature::from_slice(rs.as_slice()).ok());
        match (Signature::from_slice(rs.as_slice()), fallback) {
            (Ok(primary), fallback) => Ok(StacksSignature { primary, fallback }),
            (Err(_), Some(primary)) => Ok(StacksSignature {
                primary,
                fallback: None,
            }),
            (Err(_), None) => Err(VerificationError::InvalidSignature),
        }
    }

    fn decode_public_key(&self, public_key: &str) -> Result<VerifyingKey, VerificationError> {
        let sec1 = codec::decode_public_key_bytes(public_key)?;
        let key = VerifyingKey::from_sec1_bytes(&sec1);
        #[cfg(feature = "telemetry")]
        if let Err(err) = &key {
            tracing::debug!(error = %err, len = sec1.len(), "public key is not a curve point");
        }
        key.map_err(|_| VerificationError::InvalidPublicKey)
    }

    fn verify_signature(
        &self,
        encoded: &[u8],
        signature: &StacksSignature,
        public_key: &VerifyingKey,
    ) -> bool {
        let digest = Sha256::digest(encoded);
        let verified = signature.readings().any(|signature| {
            let signature = signature.normalize_s().unwrap_or(*signature);
            public_key.verify_prehash(&digest, &signature).is_ok()
        });
        #[cfg(feature = "telemetry")]
        tracing::trace!(verified, encoded_len = encoded.len(), "secp256k1 check");
        verified
    }
}

/// Verifies a message with the Stacks signing convention.
///
/// Shorthand for `message.verify(&StacksScheme, signature, public_key, options)`.
///
/// # Errors
///
/// See [`Message::verify`].
pub fn verify(
    message: &Message,
    signature: &str,
    public_key: &str,
    options: &VerifyOptions,
) -> Result<bool, VerificationError> {
    message.verify(&StacksScheme, signature, public_key, options)
}
