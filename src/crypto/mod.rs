//! Cryptographic primitives.
//!
//! # Data Flow
//! ```text
//! ShieldConfig.encryption_key (base64, 32 bytes)
//!     → cipher.rs (AES-256-GCM field encryption for PII)
//!
//! ShieldConfig.integrity_key
//!     → signing.rs (HMAC-SHA256 over canonical audit bytes)
//!
//! kms.rs / rotation.rs
//!     → opaque key storage + rotation schedule
//! ```
//!
//! # Design Decisions
//! - Keys are validated at construction; a malformed key is a startup error
//! - Request-time failures never escape: callers receive sentinel strings

pub mod cipher;
pub mod kms;
pub mod rotation;
pub mod signing;

use thiserror::Error;

pub use cipher::{FieldCipher, ENCRYPTED_PREFIX, ENCRYPTION_ERROR};
pub use kms::{InMemoryKeyProvider, KeyProvider};
pub use rotation::KeyRotationManager;
pub use signing::{IntegritySigner, SIGNING_ERROR, UNSIGNED};

/// Request-time field encryption used for PII protection.
pub trait FieldEncryptor: Send + Sync + std::fmt::Debug {
    /// Encrypt one value into its base64 envelope.
    fn try_encrypt(&self, plaintext: &str) -> Result<String, CryptoError>;
}

/// Signature over canonical audit record bytes.
pub trait RecordSigner: Send + Sync + std::fmt::Debug {
    fn sign(&self, content: &[u8]) -> Result<String, CryptoError>;
}

impl FieldEncryptor for FieldCipher {
    fn try_encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        FieldCipher::try_encrypt(self, plaintext)
    }
}

impl RecordSigner for IntegritySigner {
    fn sign(&self, content: &[u8]) -> Result<String, CryptoError> {
        IntegritySigner::sign(self, content)
    }
}

/// Errors raised by the cryptographic primitives.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Key material was not valid base64.
    #[error("invalid key encoding: {0}")]
    KeyEncoding(String),

    /// Key material had the wrong length for the algorithm.
    #[error("invalid key length: expected 32 bytes, got {0}")]
    KeyLength(usize),

    /// An empty key was supplied where one is required.
    #[error("key must not be empty")]
    EmptyKey,

    /// The AEAD cipher rejected the operation.
    #[error("cipher failure: {0}")]
    Cipher(String),

    /// Ciphertext could not be decoded or was truncated.
    #[error("malformed ciphertext: {0}")]
    Malformed(String),

    /// Key provider lookup failed.
    #[error("key '{0}' not found")]
    KeyNotFound(String),
}
