//! The verification pipeline.
//!
//! [`Message::verify`] runs a fixed, short-circuiting sequence of checks and
//! reports the first failure:
//!
//! 1. expected domain
//! 2. expected nonce
//! 3. expiration time
//! 4. not-before time
//! 5. signature over the canonical text
//!
//! Signature work is delegated to a [`SignatureScheme`], which owns the
//! chain-specific encoding of the signed bytes and the curve primitive.

use chrono::{DateTime, Utc};
#[cfg(feature = "telemetry")]
use tracing::instrument;

use crate::config::VerifyOptions;
use crate::error::VerificationError;
use crate::message::Message;
use crate::timestamp::IsoTimestamp;

/// Chain-specific signing conventions plugged into [`Message::verify`].
///
/// Implementations decide how canonical text becomes signed bytes and how
/// signature and public-key strings are decoded. The pipeline only calls
/// these after every non-cryptographic check has passed.
pub trait SignatureScheme {
    /// Decoded signature.
    type Signature;
    /// Decoded public key.
    type PublicKey;

    /// Encodes canonical message text into the bytes that are signed.
    fn encode_for_signing(&self, message: &str) -> Vec<u8>;

    /// Decodes a signature string.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError::UnsupportedSignatureFormat`] if the string
    /// is not in a recognised layout.
    fn decode_signature(&self, signature: &str) -> Result<Self::Signature, VerificationError>;

    /// Decodes a public-key string.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError::InvalidPublicKey`] if the string is not a
    /// valid key.
    fn decode_public_key(&self, public_key: &str) -> Result<Self::PublicKey, VerificationError>;

    /// Returns `true` if `signature` over `encoded` verifies under `public_key`.
    fn verify_signature(
        &self,
        encoded: &[u8],
        signature: &Self::Signature,
        public_key: &Self::PublicKey,
    ) -> bool;
}

impl<S: SignatureScheme + ?Sized> SignatureScheme for &S {
    type Signature = S::Signature;
    type PublicKey = S::PublicKey;

    fn encode_for_signing(&self, message: &str) -> Vec<u8> {
        (**self).encode_for_signing(message)
    }

    fn decode_signature(&self, signature: &str) -> Result<Self::Signature, VerificationError> {
        (**self).decode_signature(signature)
    }

    fn decode_public_key(&self, public_key: &str) -> Result<Self::PublicKey, VerificationError> {
        (**self).decode_public_key(public_key)
    }

    fn verify_signature(
        &self,
        encoded: &[u8],
        signature: &Self::Signature,
        public_key: &Self::PublicKey,
    ) -> bool {
        (**self).verify_signature(encoded, signature, public_key)
    }
}

impl Message {
    /// Verifies the message against a signature and public key.
    ///
    /// An empty expected domain or nonce in `options` is treated as unset.
    /// Validity is evaluated at `options.timestamp`, or at the current time
    /// read once before any check runs.
    ///
    /// # Errors
    ///
    /// Returns the [`VerificationError`] of the first failing check:
    /// [`DomainMismatch`](VerificationError::DomainMismatch),
    /// [`NonceMismatch`](VerificationError::NonceMismatch),
    /// [`ExpiredMessage`](VerificationError::ExpiredMessage) when the time is
    /// at or past `Expiration Time`,
    /// [`NotYetValidMessage`](VerificationError::NotYetValidMessage) when the
    /// time is at or before `Not Before`, then any decoding error from the
    /// scheme, and finally [`InvalidSignature`](VerificationError::InvalidSignature).
    #[cfg_attr(feature = "telemetry", instrument(skip_all, err, fields(
        domain = %self.domain,
        address = %self.address,
    )))]
    pub fn verify<S: SignatureScheme + ?Sized>(
        &self,
        scheme: &S,
        signature: &str,
        public_key: &str,
        options: &VerifyOptions,
    ) -> Result<bool, VerificationError> {
        let verification_time = options
            .timestamp
            .as_ref()
            .map_or_else(Utc::now, IsoTimestamp::instant);

        assert_domain(self, options.domain.as_deref())?;
        assert_nonce(self, options.nonce.as_deref())?;
        assert_time(self, verification_time)?;
        assert_signature(self, scheme, signature, public_key)?;

        #[cfg(feature = "telemetry")]
        tracing::debug!("message verified");
        Ok(true)
    }
}

fn assert_domain(message: &Message, expected: Option<&str>) -> Result<(), VerificationError> {
    match expected {
        Some(domain) if !domain.is_empty() && domain != message.domain => {
            Err(VerificationError::DomainMismatch)
        }
        _ => Ok(()),
    }
}

fn assert_nonce(message: &Message, expected: Option<&str>) -> Result<(), VerificationError> {
    match expected {
        Some(nonce) if !nonce.is_empty() && nonce != message.nonce => {
            Err(VerificationError::NonceMismatch)
        }
        _ => Ok(()),
    }
}

fn assert_time(message: &Message, now: DateTime<Utc>) -> Result<(), VerificationError> {
    if let Some(expiration_time) = &message.expiration_time
        && now >= expiration_time.instant()
    {
        #[cfg(feature = "telemetry")]
        tracing::trace!(%now, expiration_time = %expiration_time, "message expired");
        return Err(VerificationError::ExpiredMessage);
    }
    if let Some(not_before) = &message.not_before
        && now <= not_before.instant()
    {
        #[cfg(feature = "telemetry")]
        tracing::trace!(%now, not_before = %not_before, "message not yet valid");
        return Err(VerificationError::NotYetValidMessage);
    }
    Ok(())
}

fn assert_signature<S: SignatureScheme + ?Sized>(
    message: &Message,
    scheme: &S,
    signature: &str,
    public_key: &str,
) -> Result<(), VerificationError> {
    let encoded = scheme.encode_for_signing(&message.prepare_message());
    let signature = scheme.decode_signature(signature)?;
    let public_key = scheme.decode_public_key(public_key)?;
    if scheme.verify_signature(&encoded, &signature, &public_key) {
        Ok(())
    } else {
        Err(VerificationError::InvalidSignature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::MessageFields;
    use std::cell::Cell;

    /// Accepts a signature equal to `"<public key>:<encoded length>"`.
    #[derive(Default)]
    struct LengthScheme {
        signature_work: Cell<usize>,
    }

    impl SignatureScheme for LengthScheme {
        type Signature = String;
        type PublicKey = String;

        fn encode_for_signing(&self, message: &str) -> Vec<u8> {
            self.signature_work.set(self.signature_work.get() + 1);
            message.as_bytes().to_vec()
        }

        fn decode_signature(&self, signature: &str) -> Result<String, VerificationError> {
            if signature.contains(':') {
                Ok(signature.to_owned())
            } else {
                Err(VerificationError::UnsupportedSignatureFormat)
            }
        }

        fn decode_public_key(&self, public_key: &str) -> Result<String, VerificationError> {
            if public_key.is_empty() {
                Err(VerificationError::InvalidPublicKey)
            } else {
                Ok(public_key.to_owned())
            }
        }

        fn verify_signature(&self, encoded: &[u8], signature: &String, public_key: &String) -> bool {
            *signature == format!("{public_key}:{}", encoded.len())
        }
    }

    fn message() -> Message {
        Message::from_fields(MessageFields {
            domain: Some("example.com".into()),
            address: Some("SP2J6ZY48GV1EZ5V2V5RB9MP66SW86PYKKNRV9EJ7".into()),
            uri: Some("https://example.com/login".into()),
            issued_at: Some("2024-01-01T00:00:00Z".into()),
            nonce: Some("abcdefgh12".into()),
            expiration_time: Some("2024-01-02T00:00:00Z".into()),
            not_before: Some("2023-12-31T00:00:00Z".into()),
            ..MessageFields::default()
        })
        .unwrap()
    }

    fn good_signature(message: &Message) -> String {
        format!("key:{}", message.prepare_message().len())
    }

    fn at(ts: &str) -> VerifyOptions {
        VerifyOptions::default().at(IsoTimestamp::parse(ts).unwrap())
    }

    #[test]
    fn test_verify_success() {
        let message = message();
        let options = at("2024-01-01T12:00:00Z")
            .with_domain("example.com")
            .with_nonce("abcdefgh12");
        let result = message.verify(&LengthScheme::default(), &good_signature(&message), "key", &options);
        assert_eq!(result, Ok(true));
    }

    #[test]
    fn test_domain_mismatch_precedes_signature_work() {
        let scheme = LengthScheme::default();
        let options = at("2024-01-01T12:00:00Z").with_domain("evil.com");
        let result = message().verify(&scheme, "bogus:0", "key", &options);
        assert_eq!(result, Err(VerificationError::DomainMismatch));
        assert_eq!(scheme.signature_work.get(), 0);
    }

    #[test]
    fn test_nonce_mismatch() {
        let message = message();
        let options = at("2024-01-01T12:00:00Z")
            .with_domain("example.com")
            .with_nonce("zzzzzzzz99");
        let result = message.verify(&LengthScheme::default(), &good_signature(&message), "key", &options);
        assert_eq!(result, Err(VerificationError::NonceMismatch));
    }

    #[test]
    fn test_empty_expectations_are_ignored() {
        let message = message();
        let options = at("2024-01-01T12:00:00Z").with_domain("").with_nonce("");
        let result = message.verify(&LengthScheme::default(), &good_signature(&message), "key", &options);
        assert_eq!(result, Ok(true));
    }

    #[test]
    fn test_expired_at_exact_expiration_instant() {
        let message = message();
        let result = message.verify(
            &LengthScheme::default(),
            &good_signature(&message),
            "key",
            &at("2024-01-02T00:00:00Z"),
        );
        assert_eq!(result, Err(VerificationError::ExpiredMessage));
    }

    #[test]
    fn test_expiry_compares_instants_not_text() {
        let message = message();
        let result = message.verify(
            &LengthScheme::default(),
            &good_signature(&message),
            "key",
            &at("2024-01-01T23:30:00-01:00"),
        );
        assert_eq!(result, Err(VerificationError::ExpiredMessage));
    }

    #[test]
    fn test_not_yet_valid_at_exact_not_before_instant() {
        let message = message();
        let result = message.verify(
            &LengthScheme::default(),
            &good_signature(&message),
            "key",
            &at("2023-12-31T00:00:00Z"),
        );
        assert_eq!(result, Err(VerificationError::NotYetValidMessage));
    }

    #[test]
    fn test_invalid_signature() {
        let message = message();
        let result = message.verify(&LengthScheme::default(), "key:1", "key", &at("2024-01-01T12:00:00Z"));
        assert_eq!(result, Err(VerificationError::InvalidSignature));
    }

    #[test]
    fn test_decoding_errors_propagate() {
        let message = message();
        let scheme = LengthScheme::default();
        let options = at("2024-01-01T12:00:00Z");
        assert_eq!(
            message.verify(&scheme, "no-separator", "key", &options),
            Err(VerificationError::UnsupportedSignatureFormat)
        );
        assert_eq!(
            message.verify(&scheme, &good_signature(&message), "", &options),
            Err(VerificationError::InvalidPublicKey)
        );
    }

    #[test]
    fn test_default_time_is_now() {
        let message = message();
        let result = message.verify(
            &LengthScheme::default(),
            &good_signature(&message),
            "key",
            &VerifyOptions::default(),
        );
        assert_eq!(result, Err(VerificationError::ExpiredMessage));
    }
}
