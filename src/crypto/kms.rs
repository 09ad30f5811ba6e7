//! Key management capability.
//!
//! External KMS clients are out of scope; the shield only relies on the
//! opaque "store / fetch / rotate by key id" contract below.

use dashmap::DashMap;

use super::rotation::generate_key;
use super::CryptoError;

/// Opaque key storage capability keyed by identifier.
pub trait KeyProvider: Send + Sync {
    /// Provider name for logging.
    fn name(&self) -> &str;

    /// Fetch base64 key material.
    fn get_key(&self, key_id: &str) -> Result<String, CryptoError>;

    /// Store base64 key material under `key_id`.
    fn store_key(&self, key_id: &str, key_material: &str);

    /// Create and store a fresh key version, returning it.
    fn rotate_key(&self, key_id: &str) -> Result<String, CryptoError>;

    fn key_exists(&self, key_id: &str) -> bool;

    fn delete_key(&self, key_id: &str);

    /// Whether the backing service is reachable and configured.
    fn is_available(&self) -> bool;
}

/// Process-local provider used when no external KMS is configured.
#[derive(Debug, Default)]
pub struct InMemoryKeyProvider {
    keys: DashMap<String, String>,
}

impl InMemoryKeyProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyProvider for InMemoryKeyProvider {
    fn name(&self) -> &str {
        "local"
    }

    fn get_key(&self, key_id: &str) -> Result<String, CryptoError> {
        self.keys
            .get(key_id)
            .map(|r| r.value().clone())
            .ok_or_else(|| CryptoError::KeyNotFound(key_id.to_string()))
    }

    fn store_key(&self, key_id: &str, key_material: &str) {
        self.keys.insert(key_id.to_string(), key_material.to_string());
    }

    fn rotate_key(&self, key_id: &str) -> Result<String, CryptoError> {
        let key = generate_key();
        self.keys.insert(key_id.to_string(), key.clone());
        tracing::info!(provider = self.name(), key_id, "Key rotated");
        Ok(key)
    }

    fn key_exists(&self, key_id: &str) -> bool {
        self.keys.contains_key(key_id)
    }

    fn delete_key(&self, key_id: &str) {
        self.keys.remove(key_id);
    }

    fn is_available(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::FieldCipher;

    #[test]
    fn test_store_and_fetch() {
        let kms = InMemoryKeyProvider::new();
        assert!(kms.get_key("audit").is_err());

        kms.store_key("audit", "a2V5");
        assert!(kms.key_exists("audit"));
        assert_eq!(kms.get_key("audit").unwrap(), "a2V5");

        kms.delete_key("audit");
        assert!(!kms.key_exists("audit"));
    }

    #[test]
    fn test_rotated_key_is_usable() {
        let kms = InMemoryKeyProvider::new();
        let first = kms.rotate_key("audit").unwrap();
        let second = kms.rotate_key("audit").unwrap();

        assert_ne!(first, second);
        assert_eq!(kms.get_key("audit").unwrap(), second);
        assert!(FieldCipher::from_base64_key(&second).is_ok());
    }
}
