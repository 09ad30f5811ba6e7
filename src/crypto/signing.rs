//! HMAC-SHA256 integrity signatures for audit records.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::CryptoError;

type HmacSha256 = Hmac<Sha256>;

/// Signature value emitted when no integrity key is configured.
pub const UNSIGNED: &str = "unsigned";

/// Signature value emitted when the MAC could not be computed.
pub const SIGNING_ERROR: &str = "signing-error";

/// Keyed signer over canonical record bytes.
#[derive(Clone)]
pub struct IntegritySigner {
    key: Vec<u8>,
}

impl std::fmt::Debug for IntegritySigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntegritySigner").finish_non_exhaustive()
    }
}

impl IntegritySigner {
    /// Create a signer. The key is used as raw UTF-8/byte material.
    pub fn new(key: impl AsRef<[u8]>) -> Result<Self, CryptoError> {
        let key = key.as_ref();
        if key.is_empty() {
            return Err(CryptoError::EmptyKey);
        }
        Ok(Self { key: key.to_vec() })
    }

    /// Build an optional signer from configuration; empty or absent keys yield `None`.
    pub fn from_optional(key: Option<&str>) -> Option<Self> {
        key.filter(|k| !k.is_empty()).and_then(|k| Self::new(k).ok())
    }

    fn mac(&self) -> Result<HmacSha256, CryptoError> {
        HmacSha256::new_from_slice(&self.key).map_err(|e| CryptoError::Cipher(e.to_string()))
    }

    /// Compute the base64 HMAC-SHA256 of `content`.
    pub fn sign(&self, content: &[u8]) -> Result<String, CryptoError> {
        let mut mac = self.mac()?;
        mac.update(content);
        Ok(BASE64.encode(mac.finalize().into_bytes()))
    }

    /// Constant-time verification of a base64 signature.
    pub fn verify(&self, content: &[u8], signature: &str) -> bool {
        let Ok(expected) = BASE64.decode(signature) else {
            return false;
        };
        let Ok(mut mac) = self.mac() else {
            return false;
        };
        mac.update(content);
        mac.verify_slice(&expected).is_ok()
    }
}
