//! Audit record engine: build → protect → sign → emit.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::audit::anonymize::{anonymize_ip, UNKNOWN_ADDRESS};
use crate::audit::pii::protect_pii;
use crate::audit::record::{canonical_bytes, AuditRecord, SignedAuditRecord, SIGNATURE_FIELD};
use crate::audit::AuditError;
use crate::config::ShieldConfig;
use crate::crypto::{
    CryptoError, FieldCipher, FieldEncryptor, IntegritySigner, RecordSigner, SIGNING_ERROR, UNSIGNED,
};
use crate::http::{RequestView, ResponseView};
use crate::observability::metrics;
use crate::observability::AUDIT_TARGET;

/// Produces one signed record per request/response exchange.
#[derive(Debug)]
pub struct AuditEngine {
    enabled: bool,
    anonymize_ip: bool,
    cipher: Option<Arc<dyn FieldEncryptor>>,
    signer: Option<Arc<dyn RecordSigner>>,
}

impl AuditEngine {
    pub fn new(
        enabled: bool,
        anonymize_ip: bool,
        cipher: Option<FieldCipher>,
        signer: Option<IntegritySigner>,
    ) -> Self {
        Self {
            enabled,
            anonymize_ip,
            cipher: cipher.map(|c| Arc::new(c) as Arc<dyn FieldEncryptor>),
            signer: signer.map(|s| Arc::new(s) as Arc<dyn RecordSigner>),
        }
    }

    /// Replace the PII encryptor.
    pub fn with_encryptor(mut self, cipher: Arc<dyn FieldEncryptor>) -> Self {
        self.cipher = Some(cipher);
        self
    }

    /// Replace the record signer.
    pub fn with_signer(mut self, signer: Arc<dyn RecordSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Build from configuration.
    ///
    /// A malformed encryption key is an error. PII encryption requested
    /// without any key is downgraded to clear-text logging with a warning.
    pub fn from_config(config: &ShieldConfig) -> Result<Self, CryptoError> {
        let logging = &config.logging;
        let key = config.encryption_key.as_deref().filter(|k| !k.trim().is_empty());

        let cipher = match (logging.encrypt_pii, key) {
            (true, Some(key)) => Some(FieldCipher::from_base64_key(key)?),
            (true, None) => {
                tracing::warn!("PII encryption enabled but no encryption_key configured; PII fields will be logged in clear");
                None
            }
            (false, _) => None,
        };

        let signer = IntegritySigner::from_optional(config.integrity_key.as_deref());
        if logging.enabled && signer.is_none() {
            tracing::warn!("No integrity_key configured; audit records will be marked unsigned");
        }

        Ok(Self::new(logging.enabled, logging.anonymize_ip, cipher, signer))
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn encrypts_pii(&self) -> bool {
        self.cipher.is_some()
    }

    pub fn signs_records(&self) -> bool {
        self.signer.is_some()
    }

    pub fn anonymizes_ip(&self) -> bool {
        self.anonymize_ip
    }

    /// Client address as it should appear in records and events.
    pub fn client_ip(&self, request: &RequestView) -> String {
        if self.anonymize_ip {
            anonymize_ip(request.remote_addr.as_deref())
        } else {
            request
                .remote_addr
                .clone()
                .unwrap_or_else(|| UNKNOWN_ADDRESS.to_string())
        }
    }

    /// Build the record, with PII protection applied when configured.
    pub fn build(&self, request: &RequestView, response: &ResponseView) -> AuditRecord {
        let record = AuditRecord::from_exchange(request, response, self.client_ip(request));
        match &self.cipher {
            Some(cipher) => AuditRecord::from_fields(protect_pii(record.fields(), cipher.as_ref())),
            None => record,
        }
    }

    /// Sign the canonical bytes and append `integrity_hash`.
    pub fn sign(&self, record: AuditRecord) -> Result<SignedAuditRecord, AuditError> {
        let bytes = record.canonical_bytes()?;
        let (signature, signed) = match &self.signer {
            Some(signer) => match signer.sign(&bytes) {
                Ok(signature) => (signature, true),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to sign audit record");
                    (SIGNING_ERROR.to_string(), false)
                }
            },
            None => (UNSIGNED.to_string(), false),
        };

        let mut fields = record.into_fields();
        fields.insert(SIGNATURE_FIELD.into(), Value::String(signature));
        let line = serde_json::to_string(&fields)?;

        Ok(SignedAuditRecord::new(fields, line, signed))
    }

    pub fn process(
        &self,
        request: &RequestView,
        response: &ResponseView,
    ) -> Result<SignedAuditRecord, AuditError> {
        self.sign(self.build(request, response))
    }

    /// Build, sign and write the record to the audit log.
    ///
    /// Never fails: errors collapse into a single fallback line.
    pub fn record(&self, request: &RequestView, response: &ResponseView) -> Option<SignedAuditRecord> {
        if !self.enabled {
            return None;
        }
        self.emit(self.process(request, response))
    }

    /// Write a processed record, or the fallback line for a failed one.
    pub fn emit(&self, outcome: Result<SignedAuditRecord, AuditError>) -> Option<SignedAuditRecord> {
        match outcome {
            Ok(record) => {
                tracing::info!(target: AUDIT_TARGET, "{}", record.line());
                metrics::record_audit_record(record.is_signed());
                Some(record)
            }
            Err(e) => {
                tracing::error!(target: AUDIT_TARGET, "FAILED_TO_LOG_AUDIT_ENTRY: {}", e);
                metrics::record_audit_failure();
                None
            }
        }
    }
}

/// Check a logged audit line against its `integrity_hash`.
///
/// The signature field is removed and the remaining fields are
/// reserialized in their original order before verification.
pub fn verify_record(line: &str, signer: &IntegritySigner) -> Result<bool, AuditError> {
    let value: Value = serde_json::from_str(line)?;
    let Value::Object(fields) = value else {
        return Err(AuditError::NotAnObject);
    };

    let signature = fields
        .get(SIGNATURE_FIELD)
        .and_then(Value::as_str)
        .ok_or(AuditError::MissingSignature)?
        .to_string();

    let content: Map<String, Value> = fields
        .into_iter()
        .filter(|(key, _)| key != SIGNATURE_FIELD)
        .collect();

    Ok(signer.verify(&canonical_bytes(&content)?, &signature))
}
