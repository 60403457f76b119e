//! OTP (One-Time Password) module for hardware token authentication.
//!
//! Yubico OTPs are verified offline: the passcode is checked for a well-formed
//! modhex encoding and split into the device's public identity and the
//! encrypted token. No verification server is contacted.
//!
//! Device identities are persisted through [`create_hash`] so the stored value
//! is never the raw device identifier.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::future::Future;

/// Modhex alphabet; the character at index `n` encodes the nibble `n`.
pub const MODHEX_ALPHABET: &str = "cbdefghijklnrtuv";

/// Length of the encrypted part of a Yubico OTP.
pub const ENCRYPTED_LEN: usize = 32;

/// Longest public identity a Yubico OTP carries.
pub const MAX_IDENTITY_LEN: usize = 16;

/// Error types for OTP verification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    #[error("OTP must be between {min} and {max} characters, got {len}")]
    InvalidLength { len: usize, min: usize, max: usize },
    #[error("Invalid modhex character {character:?} at position {position}")]
    InvalidCharacter { character: char, position: usize },
    #[error("OTP verification failed: {0}")]
    Verifier(String),
}

/// Payload reported by an offline verifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfflineOtp {
    /// Public device identity, modhex encoded.
    pub identity: String,
    /// Encrypted token, modhex encoded.
    pub encrypted: String,
    /// Encrypted token, hex encoded.
    pub encrypted_hex: String,
    /// Device serial decoded from the identity.
    pub serial: u64,
}

/// Result of [`validate_otp`]: the verifier payload marked as valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpVerification {
    #[serde(flatten)]
    pub otp: OfflineOtp,
    pub valid: bool,
}

/// Port for offline OTP verifiers.
pub trait OfflineVerifier: Send + Sync {
    /// Verifies `otp` locally and returns the decoded payload.
    fn verify_offline(
        &self,
        otp: &str,
    ) -> impl Future<Output = Result<OfflineOtp, VerificationError>> + Send;
}

/// Offline verifier for modhex encoded Yubico OTPs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModhexVerifier;

impl OfflineVerifier for ModhexVerifier {
    async fn verify_offline(&self, otp: &str) -> Result<OfflineOtp, VerificationError> {
        parse_otp(otp)
    }
}

/// Returns the base64-encoded SHA-256 digest of `token`.
pub fn create_hash(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    STANDARD.encode(digest)
}

/// Verifies `otp` offline with the default [`ModhexVerifier`].
pub async fn validate_otp(otp: &str) -> Result<OtpVerification, VerificationError> {
    validate_otp_with(&ModhexVerifier, otp).await
}

/// Verifies `otp` with `verifier`. Errors are returned as is; a payload is
/// only produced when the verifier succeeds.
pub async fn validate_otp_with<V: OfflineVerifier>(
    verifier: &V,
    otp: &str,
) -> Result<OtpVerification, VerificationError> {
    let otp = verifier.verify_offline(otp).await?;
    Ok(OtpVerification { otp, valid: true })
}

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Decodes a modhex string into its nibble values.
fn modhex_nibbles(input: &str) -> Result<Vec<u8>, VerificationError> {
    input
        .chars()
        .enumerate()
        .map(|(position, character)| {
            MODHEX_ALPHABET
                .find(character)
                .and_then(|n| u8::try_from(n).ok())
                .ok_or(VerificationError::InvalidCharacter {
                    character,
                    position,
                })
        })
        .collect()
}

fn nibbles_to_hex(nibbles: &[u8]) -> String {
    nibbles
        .iter()
        .map(|&n| char::from(HEX_DIGITS[usize::from(n)]))
        .collect()
}

/// Converts modhex to lowercase hex.
pub fn modhex_to_hex(input: &str) -> Result<String, VerificationError> {
    Ok(nibbles_to_hex(&modhex_nibbles(input)?))
}

/// Parses a Yubico OTP into identity, encrypted token and serial.
///
/// The OTP is trimmed and lower-cased first. Everything before the final 32
/// characters is the public identity; its nibbles read big-endian give the
/// serial.
pub fn parse_otp(otp: &str) -> Result<OfflineOtp, VerificationError> {
    let otp = otp.trim().to_ascii_lowercase();
    let len = otp.chars().count();
    let (min, max) = (ENCRYPTED_LEN, ENCRYPTED_LEN + MAX_IDENTITY_LEN);
    if len < min || len > max {
        return Err(VerificationError::InvalidLength { len, min, max });
    }

    // Every character is ASCII from here on, so byte and char offsets agree.
    let nibbles = modhex_nibbles(&otp)?;
    let split = len - ENCRYPTED_LEN;
    let (identity_nibbles, encrypted_nibbles) = nibbles.split_at(split);

    let serial = identity_nibbles
        .iter()
        .fold(0u64, |acc, &n| (acc << 4) | u64::from(n));

    Ok(OfflineOtp {
        identity: otp[..split].to_owned(),
        encrypted: otp[split..].to_owned(),
        encrypted_hex: nibbles_to_hex(encrypted_nibbles),
        serial,
    })
}
