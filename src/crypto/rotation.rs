//! Encryption key rotation schedule.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;

use super::kms::KeyProvider;
use super::CryptoError;

const DEFAULT_ROTATION_DAYS: u64 = 90;

/// Generate a fresh base64-encoded AES-256 key.
pub fn generate_key() -> String {
    let mut key = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut key);
    BASE64.encode(key)
}

#[derive(Debug)]
struct KeyVersion {
    material: String,
    created_at: DateTime<Utc>,
}

/// Tracks the active encryption key and when it is due for rotation.
#[derive(Debug)]
pub struct KeyRotationManager {
    current: ArcSwapOption<KeyVersion>,
    rotation_interval_days: u64,
}

impl KeyRotationManager {
    /// A zero interval falls back to 90 days.
    pub fn new(rotation_interval_days: u64) -> Self {
        let rotation_interval_days = if rotation_interval_days > 0 {
            rotation_interval_days
        } else {
            DEFAULT_ROTATION_DAYS
        };
        tracing::debug!(rotation_interval_days, "Key rotation manager initialized");
        Self {
            current: ArcSwapOption::empty(),
            rotation_interval_days,
        }
    }

    /// Adopt an existing key (e.g. the configured encryption key) created at `created_at`.
    pub fn adopt(&self, material: impl Into<String>, created_at: DateTime<Utc>) {
        self.current.store(Some(Arc::new(KeyVersion {
            material: material.into(),
            created_at,
        })));
    }

    /// Generate a new key and make it current.
    pub fn rotate_key(&self) -> String {
        let material = generate_key();
        self.adopt(material.clone(), Utc::now());
        tracing::info!("Encryption key rotated");
        material
    }

    /// Rotate through an external provider so the new version is persisted there.
    pub fn rotate_with(&self, provider: &dyn KeyProvider, key_id: &str) -> Result<String, CryptoError> {
        let material = provider.rotate_key(key_id)?;
        self.adopt(material.clone(), Utc::now());
        Ok(material)
    }

    pub fn current_key(&self) -> Option<String> {
        self.current.load().as_ref().map(|k| k.material.clone())
    }

    pub fn key_created_at(&self) -> Option<DateTime<Utc>> {
        self.current.load().as_ref().map(|k| k.created_at)
    }

    /// True when no key is set or the current key is older than the interval.
    pub fn is_rotation_needed(&self) -> bool {
        self.is_rotation_needed_at(Utc::now())
    }

    pub fn is_rotation_needed_at(&self, now: DateTime<Utc>) -> bool {
        match self.days_until_rotation_at(now) {
            Some(days) => days <= 0,
            None => true,
        }
    }

    /// Whole days left before rotation is due; negative when overdue.
    pub fn days_until_rotation(&self) -> Option<i64> {
        self.days_until_rotation_at(Utc::now())
    }

    pub fn days_until_rotation_at(&self, now: DateTime<Utc>) -> Option<i64> {
        let created = self.key_created_at()?;
        let due = created + Duration::days(self.rotation_interval_days as i64);
        Some((due - now).num_days())
    }

    pub fn rotation_interval_days(&self) -> u64 {
        self.rotation_interval_days
    }
}
