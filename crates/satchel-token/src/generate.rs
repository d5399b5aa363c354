//! Token generation and comparison.
//!
//! # Security
//!
//! Tokens are drawn from the thread-local CSPRNG and compared in constant
//! time, so neither their value nor a partial match leaks through timing.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use subtle::ConstantTimeEq;

/// Generate a URL-safe token from `entropy_bytes` random bytes.
///
/// The encoded length is `ceil(entropy_bytes * 4 / 3)` characters.
pub fn generate_token(entropy_bytes: usize) -> String {
    let mut bytes = vec![0u8; entropy_bytes];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Compare two strings in constant time.
///
/// Strings of different lengths never match; the comparison still runs so
/// a length mismatch costs the same as a content mismatch.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let a_bytes = a.as_bytes();
    let b_bytes = b.as_bytes();

    if a_bytes.len() == b_bytes.len() {
        a_bytes.ct_eq(b_bytes).into()
    } else {
        let _ = a_bytes.ct_eq(a_bytes);
        false
    }
}
