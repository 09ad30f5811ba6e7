//! Field-level AES-256-GCM encryption for PII values.
//!
//! Wire layout of every ciphertext: `base64(nonce[12] || ciphertext || tag[16])`.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use super::CryptoError;

/// Marker prepended to encrypted values inside audit records.
pub const ENCRYPTED_PREFIX: &str = "[ENCRYPTED]";

/// Value substituted when encryption fails at request time.
pub const ENCRYPTION_ERROR: &str = "[ENCRYPTION_ERROR]";

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Authenticated symmetric cipher bound to one key for the process lifetime.
pub struct FieldCipher {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for FieldCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldCipher").finish_non_exhaustive()
    }
}

impl FieldCipher {
    /// Build a cipher from a base64-encoded 32-byte key.
    pub fn from_base64_key(key: &str) -> Result<Self, CryptoError> {
        let bytes = BASE64
            .decode(key.trim())
            .map_err(|e| CryptoError::KeyEncoding(e.to_string()))?;
        Self::from_key_bytes(&bytes)
    }

    /// Build a cipher from raw key bytes.
    pub fn from_key_bytes(key: &[u8]) -> Result<Self, CryptoError> {
        let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| CryptoError::KeyLength(key.len()))?;
        Ok(Self { cipher })
    }

    /// Encrypt with a fresh random nonce, returning the base64 envelope.
    pub fn try_encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| CryptoError::Cipher(e.to_string()))?;

        let mut message = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        message.extend_from_slice(&nonce);
        message.extend_from_slice(&ciphertext);

        Ok(BASE64.encode(message))
    }

    /// Request-time encryption.
    ///
    /// `None` passes through untouched. Failures are logged and reduced to
    /// [`ENCRYPTION_ERROR`] so the caller's flow is never interrupted.
    pub fn encrypt(&self, plaintext: Option<&str>) -> Option<String> {
        let plaintext = plaintext?;
        match self.try_encrypt(plaintext) {
            Ok(ciphertext) => Some(ciphertext),
            Err(e) => {
                tracing::error!(error = %e, "Encryption failed");
                Some(ENCRYPTION_ERROR.to_string())
            }
        }
    }

    /// Decrypt a base64 envelope produced by [`FieldCipher::try_encrypt`].
    pub fn decrypt(&self, encoded: &str) -> Result<String, CryptoError> {
        let message = BASE64
            .decode(encoded)
            .map_err(|e| CryptoError::Malformed(e.to_string()))?;

        if message.len() < NONCE_LEN + TAG_LEN {
            return Err(CryptoError::Malformed(format!(
                "envelope too short ({} bytes)",
                message.len()
            )));
        }

        let (nonce, ciphertext) = message.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|e| CryptoError::Cipher(e.to_string()))?;

        String::from_utf8(plaintext).map_err(|e| CryptoError::Malformed(e.to_string()))
    }

    /// Decrypt a value as stored in an audit record (`[ENCRYPTED]<base64>`).
    pub fn decrypt_tagged(&self, value: &str) -> Result<String, CryptoError> {
        let encoded = value
            .strip_prefix(ENCRYPTED_PREFIX)
            .ok_or_else(|| CryptoError::Malformed("missing encryption marker".to_string()))?;
        self.decrypt(encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cipher() -> FieldCipher {
        let key = BASE64.encode(b"12345678901234567890123456789012");
        FieldCipher::from_base64_key(&key).unwrap()
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let cipher = test_cipher();
        let encrypted = cipher.encrypt(Some("Sensitive Data")).unwrap();

        assert_ne!(encrypted, "Sensitive Data");
        assert!(!encrypted.is_empty());
        assert_eq!(cipher.decrypt(&encrypted).unwrap(), "Sensitive Data");
    }

    #[test]
    fn test_encrypt_none_passes_through() {
        assert!(test_cipher().encrypt(None).is_none());
    }

    #[test]
    fn test_fresh_nonce_per_call() {
        let cipher = test_cipher();
        let a = cipher.try_encrypt("same").unwrap();
        let b = cipher.try_encrypt("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_rejects_short_key() {
        let key = BASE64.encode(b"too-short");
        assert!(matches!(
            FieldCipher::from_base64_key(&key),
            Err(CryptoError::KeyLength(9))
        ));
    }

    #[test]
    fn test_rejects_non_base64_key() {
        assert!(matches!(
            FieldCipher::from_base64_key("not base64!!"),
            Err(CryptoError::KeyEncoding(_))
        ));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let cipher = test_cipher();
        let encrypted = cipher.try_encrypt("payload").unwrap();
        let mut bytes = BASE64.decode(&encrypted).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;

        assert!(cipher.decrypt(&BASE64.encode(bytes)).is_err());
    }

    #[test]
    fn test_decrypt_tagged() {
        let cipher = test_cipher();
        let tagged = format!("{}{}", ENCRYPTED_PREFIX, cipher.try_encrypt("alice").unwrap());
        assert_eq!(cipher.decrypt_tagged(&tagged).unwrap(), "alice");
        assert!(cipher.decrypt_tagged("alice").is_err());
    }
}
