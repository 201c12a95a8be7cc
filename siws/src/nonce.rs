//! Random nonce generation.

use rand::RngExt;
use rand::rng;

use crate::grammar::MIN_NONCE_LEN;

/// Characters a generated nonce is drawn from.
pub const NONCE_ALPHABET: &[u8; 62] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Length of a generated nonce.
pub const NONCE_LEN: usize = 11;

const _: () = assert!(NONCE_LEN >= MIN_NONCE_LEN);

/// Generates a random alphanumeric nonce.
///
/// Each of the [`NONCE_LEN`] characters is drawn uniformly from
/// [`NONCE_ALPHABET`] using the thread-local CSPRNG, so the result always
/// satisfies the nonce rules enforced by [`validate`](fn@crate::validate).
#[must_use]
pub fn generate_nonce() -> String {
    let mut rng = rng();
    (0..NONCE_LEN)
        .map(|_| char::from(NONCE_ALPHABET[rng.random_range(0..NONCE_ALPHABET.len())]))
        .collect()
}
