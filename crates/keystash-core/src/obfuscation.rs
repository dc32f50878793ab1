//! Reversible passphrase-keyed obfuscation.
//!
//! This is NOT encryption. The scheme XORs UTF-16 code units with a key
//! derived from the phrase and base64-encodes the result. It hides values
//! from casual inspection of the store and nothing more: there is no key
//! stretching, no integrity check, and phrases with the same code-unit sum
//! are interchangeable.
//!
//! ## Format
//!
//! ```text
//! base64( be16(unit ^ key) for unit in utf16(MARKER + plaintext) )
//! ```
//!
//! The marker lets [`try_decode`] reject payloads produced under another
//! phrase instead of handing back garbage. Empty plaintext maps to empty
//! ciphertext and vice versa.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

/// Prefix mixed into every non-empty plaintext before obfuscation.
const SALT_MARKER: &str = "ks1:";

/// Reasons an obfuscated string could not be recovered.
///
/// These never cross [`decode`]; they are only surfaced by [`try_decode`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObfuscationError {
    /// Input is not standard padded base64
    #[error("Invalid base64: {0}")]
    InvalidBase64(String),

    /// Decoded byte count cannot hold whole UTF-16 code units
    #[error("Odd payload length: {0} bytes")]
    OddLength(usize),

    /// Recovered code units do not form a valid string
    #[error("Recovered text is not valid UTF-16")]
    InvalidUtf16,

    /// Recovered text lacks the salt marker (wrong phrase or foreign data)
    #[error("Salt marker mismatch")]
    MarkerMismatch,
}

/// Derive the XOR key for a phrase.
///
/// The key is the wrapping sum of the phrase's UTF-16 code units.
pub fn derive_key(phrase: &str) -> u16 {
    phrase
        .encode_utf16()
        .fold(0u16, |acc, unit| acc.wrapping_add(unit))
}

/// Obfuscate `plaintext` under `phrase`.
///
/// # Examples
///
/// ```
/// use keystash_core::obfuscation::{decode, encode};
///
/// let hidden = encode("my-secret-phrase", "Hello, World!");
/// assert_ne!(hidden, "Hello, World!");
/// assert_eq!(decode("my-secret-phrase", &hidden), "Hello, World!");
/// ```
pub fn encode(phrase: &str, plaintext: &str) -> String {
    if plaintext.is_empty() {
        return String::new();
    }

    let key = derive_key(phrase);
    let mut bytes = Vec::with_capacity((SALT_MARKER.len() + plaintext.len()) * 2);
    for unit in SALT_MARKER.encode_utf16().chain(plaintext.encode_utf16()) {
        bytes.extend_from_slice(&(unit ^ key).to_be_bytes());
    }
    STANDARD.encode(bytes)
}

/// Recover the plaintext, reporting why recovery failed.
///
/// # Errors
///
/// Returns an [`ObfuscationError`] if the input is not base64, does not
/// hold whole code units, does not rebuild a valid string, or was produced
/// under a different phrase.
pub fn try_decode(phrase: &str, ciphertext: &str) -> Result<String, ObfuscationError> {
    if ciphertext.is_empty() {
        return Ok(String::new());
    }

    let bytes = STANDARD
        .decode(ciphertext.as_bytes())
        .map_err(|e| ObfuscationError::InvalidBase64(e.to_string()))?;
    if bytes.len() % 2 != 0 {
        return Err(ObfuscationError::OddLength(bytes.len()));
    }

    let key = derive_key(phrase);
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]) ^ key)
        .collect();
    let text = String::from_utf16(&units).map_err(|_| ObfuscationError::InvalidUtf16)?;

    text.strip_prefix(SALT_MARKER)
        .map(str::to_string)
        .ok_or(ObfuscationError::MarkerMismatch)
}

/// Recover the plaintext, failing closed to an empty string.
///
/// Corrupted input or a wrong phrase yields `""`; this function never
/// panics or errors.
pub fn decode(phrase: &str, ciphertext: &str) -> String {
    match try_decode(phrase, ciphertext) {
        Ok(text) => text,
        Err(err) => {
            tracing::trace!(error = %err, "obfuscated payload rejected");
            String::new()
        }
    }
}
