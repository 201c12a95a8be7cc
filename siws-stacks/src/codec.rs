//! Stacks signed-message encoding and signature decoding.
//!
//! A Stacks wallet never signs the message text directly. It signs
//!
//! ```text
//! 0x17 "Stacks Signed Message:\n" || varint(len(message)) || message
//! ```
//!
//! hashed with SHA-256. Signatures travel as 65-byte hex strings carrying a
//! one-byte recovery id either before (`VRS`) or after (`RSV`) the 64-byte
//! `r || s` pair.

use alloy_primitives::B512;
use alloy_primitives::hex::{self, FromHex};
use sha2::{Digest, Sha256};
use siws::{EncodingError, VerificationError};

/// Prefix prepended to every message before hashing.
pub const STACKS_MESSAGE_PREFIX: &[u8; 24] = b"\x17Stacks Signed Message:\n";

/// Largest integer a [`VarInt`] accepts, `2^53 - 1`.
pub const MAX_SAFE_INTEGER: u64 = (1 << 53) - 1;

/// Hex length of a signature including its recovery byte.
const SIGNATURE_HEX_LEN: usize = 130;

/// Recovery-byte values a signature may carry.
const RECOVERY_INDICATORS: [&str; 2] = ["00", "01"];

/// A non-negative integer in `0..=2^53 - 1`, encodable as a Bitcoin-style
/// `CompactSize` varint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarInt(u64);

impl VarInt {
    /// Creates a varint.
    ///
    /// # Errors
    ///
    /// Returns [`EncodingError::ValueOutOfRange`] if `value` exceeds
    /// [`MAX_SAFE_INTEGER`].
    pub const fn new(value: u64) -> Result<Self, EncodingError> {
        if value > MAX_SAFE_INTEGER {
            Err(EncodingError::ValueOutOfRange)
        } else {
            Ok(Self(value))
        }
    }

    /// Returns the wrapped value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Number of bytes [`encode`](Self::encode) produces.
    #[must_use]
    pub const fn encoded_len(self) -> usize {
        compact_size_len(self.0)
    }

    /// Encodes the value.
    #[must_use]
    pub fn encode(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        write_compact_size(&mut out, self.0);
        out
    }
}

impl TryFrom<u64> for VarInt {
    type Error = EncodingError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<usize> for VarInt {
    type Error = EncodingError;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        u64::try_from(value)
            .map_err(|_| EncodingError::ValueOutOfRange)
            .and_then(Self::new)
    }
}

impl TryFrom<i64> for VarInt {
    type Error = EncodingError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u64::try_from(value)
            .map_err(|_| EncodingError::ValueOutOfRange)
            .and_then(Self::new)
    }
}

impl TryFrom<f64> for VarInt {
    type Error = EncodingError;

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if !value.is_finite() || value < 0.0 || value.fract() != 0.0 {
            return Err(EncodingError::ValueOutOfRange);
        }
        if value > MAX_SAFE_INTEGER as f64 {
            return Err(EncodingError::ValueOutOfRange);
        }
        Self::new(value as u64)
    }
}

/// Encodes an integer as a `CompactSize` varint.
///
/// | Value | Encoding |
/// |---|---|
/// | `< 0xFD` | the value as one byte |
/// | `<= 0xFFFF` | `0xFD` then `u16` little-endian |
/// | `<= 0xFFFF_FFFF` | `0xFE` then `u32` little-endian |
/// | otherwise | `0xFF` then `u64` little-endian |
///
/// # Errors
///
/// Returns [`EncodingError::ValueOutOfRange`] for negative, non-integral or
/// too-large input.
pub fn varint_encode<T>(value: T) -> Result<Vec<u8>, EncodingError>
where
    T: TryInto<VarInt, Error = EncodingError>,
{
    Ok(value.try_into()?.encode())
}

const fn compact_size_len(value: u64) -> usize {
    match value {
        0..0xFD => 1,
        0xFD..=0xFFFF => 3,
        0x1_0000..=0xFFFF_FFFF => 5,
        _ => 9,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn write_compact_size(out: &mut Vec<u8>, value: u64) {
    match value {
        0..0xFD => out.push(value as u8),
        0xFD..=0xFFFF => {
            out.push(0xFD);
            out.extend_from_slice(&(value as u16).to_le_bytes());
        }
        0x1_0000..=0xFFFF_FFFF => {
            out.push(0xFE);
            out.extend_from_slice(&(value as u32).to_le_bytes());
        }
        _ => {
            out.push(0xFF);
            out.extend_from_slice(&value.to_le_bytes());
        }
    }
}

/// Builds the exact bytes a Stacks wallet signs for `message`.
#[must_use]
pub fn encode_for_signing(message: &str) -> Vec<u8> {
    let bytes = message.as_bytes();
    let len = bytes.len() as u64;
    let mut out = Vec::with_capacity(STACKS_MESSAGE_PREFIX.len() + compact_size_len(len) + bytes.len());
    out.extend_from_slice(STACKS_MESSAGE_PREFIX);
    write_compact_size(&mut out, len);
    out.extend_from_slice(bytes);
    out
}

/// SHA-256 digest of [`encode_for_signing`], the value that is actually signed.
#[must_use]
pub fn message_digest(message: &str) -> [u8; 32] {
    Sha256::digest(encode_for_signing(message)).into()
}

/// Strips an optional `0x` or `0X` prefix.
pub(crate) fn strip_hex_prefix(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}

/// Decodes a 65-byte hex signature into its 64-byte `r || s` part.
///
/// A leading `00`/`01` is taken as the recovery byte first; otherwise a
/// trailing one is. An optional `0x` prefix is accepted.
///
/// # Errors
///
/// Returns [`VerificationError::UnsupportedSignatureFormat`] if the string is
/// not 65 bytes of hex with a recovery byte at either end.
pub fn decode_signature(signature: &str) -> Result<B512, VerificationError> {
    let signature = strip_hex_prefix(signature);
    if signature.len() != SIGNATURE_HEX_LEN || !signature.is_ascii() {
        return Err(VerificationError::UnsupportedSignatureFormat);
    }
    let (head, rest) = signature.split_at(2);
    let (body, tail) = signature.split_at(SIGNATURE_HEX_LEN - 2);
    let rs = if RECOVERY_INDICATORS.contains(&head) {
        #[cfg(feature = "telemetry")]
        tracing::trace!(layout = "vrs", "recovery byte found");
        rest
    } else if RECOVERY_INDICATORS.contains(&tail) {
        #[cfg(feature = "telemetry")]
        tracing::trace!(layout = "rsv", "recovery byte found");
        body
    } else {
        #[cfg(feature = "telemetry")]
        tracing::debug!("signature carries no recognised recovery byte");
        return Err(VerificationError::UnsupportedSignatureFormat);
    };
    B512::from_hex(rs).map_err(|_| VerificationError::UnsupportedSignatureFormat)
}

/// Decodes the trailing-indicator (`RSV`) reading of a signature that carries
/// a recovery byte at both ends.
///
/// [`decode_signature`] prefers the leading byte, so an `RSV` signature whose
/// `r` starts with `00` or `01` is misread there. This returns the other
/// reading, or `None` when the signature is not ambiguous.
#[must_use]
pub fn decode_trailing_layout(signature: &str) -> Option<B512> {
    let signature = strip_hex_prefix(signature);
    if signature.len() != SIGNATURE_HEX_LEN || !signature.is_ascii() {
        return None;
    }
    let (head, _) = signature.split_at(2);
    let (body, tail) = signature.split_at(SIGNATURE_HEX_LEN - 2);
    if RECOVERY_INDICATORS.contains(&head) && RECOVERY_INDICATORS.contains(&tail) {
        B512::from_hex(body).ok()
    } else {
        None
    }
}

/// Decodes a hex public key into SEC1 bytes.
///
/// Accepts compressed (33-byte) and uncompressed (65-byte) SEC1 points, and a
/// bare 64-byte `x || y` point, which is returned with the `0x04` tag added.
///
/// # Errors
///
/// Returns [`VerificationError::InvalidPublicKey`] for anything else.
pub fn decode_public_key_bytes(public_key: &str) -> Result<Vec<u8>, VerificationError> {
    let bytes = hex::decode(strip_hex_prefix(public_key))
        .map_err(|_| VerificationError::InvalidPublicKey)?;
    match bytes.len() {
        33 | 65 => Ok(bytes),
        64 => {
            let mut tagged = Vec::with_capacity(65);
            tagged.push(0x04);
            tagged.extend_from_slice(&bytes);
            Ok(tagged)
        }
        _ => Err(VerificationError::InvalidPublicKey),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_bytes() {
        assert_eq!(STACKS_MESSAGE_PREFIX.len(), 24);
        assert_eq!(STACKS_MESSAGE_PREFIX[0], 0x17);
        assert_eq!(&STACKS_MESSAGE_PREFIX[1..], b"Stacks Signed Message:\n");
    }

    #[test]
    fn test_varint_boundaries() {
        assert_eq!(varint_encode(0_u64).unwrap(), vec![0x00]);
        assert_eq!(varint_encode(252_u64).unwrap(), vec![0xFC]);
        assert_eq!(varint_encode(253_u64).unwrap(), vec![0xFD, 0xFD, 0x00]);
        assert_eq!(varint_encode(0xFFFF_u64).unwrap(), vec![0xFD, 0xFF, 0xFF]);
        assert_eq!(
            varint_encode(0x1_0000_u64).unwrap(),
            vec![0xFE, 0x00, 0x00, 0x01, 0x00]
        );
        assert_eq!(
            varint_encode(0xFFFF_FFFF_u64).unwrap(),
            vec![0xFE, 0xFF, 0xFF, 0xFF, 0xFF]
        );
        assert_eq!(
            varint_encode(0x1_0000_0000_u64).unwrap(),
            vec![0xFF, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00]
        );
        assert_eq!(varint_encode(MAX_SAFE_INTEGER).unwrap().len(), 9);
    }

    #[test]
    fn test_varint_encoded_len_matches() {
        for value in [0, 252, 253, 0xFFFF, 0x1_0000, 0xFFFF_FFFF, 0x1_0000_0000] {
            let varint = VarInt::new(value).unwrap();
            assert_eq!(varint.encode().len(), varint.encoded_len(), "value {value}");
        }
    }

    #[test]
    fn test_varint_rejects_out_of_range() {
        assert_eq!(varint_encode(-1_i64), Err(EncodingError::ValueOutOfRange));
        assert_eq!(varint_encode(1.5_f64), Err(EncodingError::ValueOutOfRange));
        assert_eq!(varint_encode(f64::NAN), Err(EncodingError::ValueOutOfRange));
        assert_eq!(varint_encode(-0.5_f64), Err(EncodingError::ValueOutOfRange));
        assert_eq!(
            varint_encode(MAX_SAFE_INTEGER + 1),
            Err(EncodingError::ValueOutOfRange)
        );
        assert_eq!(varint_encode(300.0_f64).unwrap(), vec![0xFD, 0x2C, 0x01]);
        assert_eq!(varint_encode(7_i64).unwrap(), vec![0x07]);
    }

    #[test]
    fn test_encode_for_signing_short() {
        let encoded = encode_for_signing("hi");
        assert_eq!(&encoded[..24], STACKS_MESSAGE_PREFIX);
        assert_eq!(&encoded[24..], &[0x02, b'h', b'i']);
    }

    #[test]
    fn test_encode_for_signing_long() {
        let message = "a".repeat(300);
        let encoded = encode_for_signing(&message);
        assert_eq!(&encoded[24..27], &[0xFD, 0x2C, 0x01]);
        assert_eq!(encoded.len(), 24 + 3 + 300);
    }

    #[test]
    fn test_encode_for_signing_counts_bytes_not_chars() {
        let encoded = encode_for_signing("é");
        assert_eq!(encoded[24], 2);
    }

    #[test]
    fn test_message_digest_is_sha256_of_encoding() {
        let expected: [u8; 32] = Sha256::digest(encode_for_signing("hello")).into();
        assert_eq!(message_digest("hello"), expected);
    }

    #[test]
    fn test_decode_signature_layouts_agree() {
        let rs = "ab".repeat(64);
        let vrs = format!("01{rs}");
        let rsv = format!("{rs}00");
        let expected = B512::from_hex(&rs).unwrap();
        assert_eq!(decode_signature(&vrs).unwrap(), expected);
        assert_eq!(decode_signature(&rsv).unwrap(), expected);
        assert_eq!(decode_signature(&format!("0x{rsv}")).unwrap(), expected);
    }

    #[test]
    fn test_decode_signature_leading_indicator_wins() {
        let body = format!("{}01", "cd".repeat(63));
        let ambiguous = format!("00{body}");
        let decoded = decode_signature(&ambiguous).unwrap();
        assert_eq!(decoded, B512::from_hex(&body).unwrap());
    }

    #[test]
    fn test_trailing_layout_only_for_ambiguous_signatures() {
        let body = format!("01{}", "cd".repeat(63));
        let ambiguous = format!("{body}00");
        assert_eq!(
            decode_trailing_layout(&ambiguous),
            Some(B512::from_hex(&body).unwrap())
        );
        assert_eq!(
            decode_trailing_layout(&format!("0x{ambiguous}")),
            Some(B512::from_hex(&body).unwrap())
        );
        let rs = "ab".repeat(64);
        assert_eq!(decode_trailing_layout(&format!("{rs}01")), None);
        assert_eq!(decode_trailing_layout(&format!("01{rs}")), None);
        assert_eq!(decode_trailing_layout("0001"), None);
    }

    #[test]
    fn test_decode_signature_rejects_unknown_layout() {
        let rs = "ab".repeat(64);
        assert_eq!(
            decode_signature(&format!("1b{rs}")),
            Err(VerificationError::UnsupportedSignatureFormat)
        );
        assert_eq!(
            decode_signature(&rs),
            Err(VerificationError::UnsupportedSignatureFormat)
        );
        assert_eq!(
            decode_signature(&format!("00{}", "zz".repeat(64))),
            Err(VerificationError::UnsupportedSignatureFormat)
        );
        assert_eq!(
            decode_signature(&format!("00{}é", "ab".repeat(63))),
            Err(VerificationError::UnsupportedSignatureFormat)
        );
    }

    #[test]
    fn test_decode_public_key_bytes() {
        let compressed = format!("02{}", "11".repeat(32));
        assert_eq!(decode_public_key_bytes(&compressed).unwrap().len(), 33);
        let bare = "22".repeat(64);
        let tagged = decode_public_key_bytes(&format!("0x{bare}")).unwrap();
        assert_eq!(tagged.len(), 65);
        assert_eq!(tagged[0], 0x04);
        assert_eq!(
            decode_public_key_bytes("abcd"),
            Err(VerificationError::InvalidPublicKey)
        );
        assert_eq!(
            decode_public_key_bytes("not hex"),
            Err(VerificationError::InvalidPublicKey)
        );
    }
}
