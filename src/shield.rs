//! The assembled request shield.
//!
//! # Data Flow
//! ```text
//! request
//!     → admit()          blocklist, rate limit (deny → alert)
//!     → check_session()  fingerprint drift (mismatch → alert)
//!     → handler
//!     → complete()       audit record → SIEM fan-out → webhook
//! ```
//!
//! One `Shield` owns all cross-request state. It is built once from a
//! validated [`ShieldConfig`] and shared behind an `Arc`.

use std::path::Path;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use notify::RecommendedWatcher;
use serde::Serialize;
use thiserror::Error;

use crate::audit::{AuditEngine, SignedAuditRecord};
use crate::config::{SessionConfig, ShieldConfig};
use crate::crypto::{CryptoError, KeyRotationManager};
use crate::delivery::{EventType, SinkEvent, WebhookNotifier};
use crate::http::{RequestView, ResponseView};
use crate::lifecycle::Shutdown;
use crate::security::{AdmissionControl, AdmissionDecision, Blocklist, BlocklistError};
use crate::session::{SessionGuard, SessionValidation};
use crate::siem::{SiemDispatcher, SinkError};

#[derive(Debug, Error)]
pub enum ShieldError {
    #[error("crypto configuration: {0}")]
    Crypto(#[from] CryptoError),

    #[error("event delivery setup: {0}")]
    Sink(#[from] SinkError),

    #[error("blocklist: {0}")]
    Blocklist(#[from] BlocklistError),
}

pub struct Shield {
    audit: AuditEngine,
    admission: AdmissionControl,
    siem: SiemDispatcher,
    webhook: WebhookNotifier,
    sessions: Option<SessionGuard>,
    session_config: SessionConfig,
    key_rotation: KeyRotationManager,
    blocklist_watcher: Mutex<Option<RecommendedWatcher>>,
}

impl Shield {
    /// Build every component. Must be called from within a Tokio runtime.
    pub fn from_config(config: &ShieldConfig, shutdown: &Shutdown) -> Result<Arc<Self>, ShieldError> {
        let audit = AuditEngine::from_config(config)?;

        let blocklist = Arc::new(Blocklist::new());
        let mut watcher = None;
        if let Some(path) = config.active_defense.blocklist_path.as_deref() {
            let path = Path::new(path);
            blocklist.refresh_from_file(path)?;
            watcher = Some(blocklist.watch_file(path)?);
        }
        let admission = AdmissionControl::from_config(&config.active_defense, blocklist);

        let siem = SiemDispatcher::from_config(&config.siem)?;
        let webhook = WebhookNotifier::from_config(&config.notifications.webhook, shutdown)?;

        let sessions = config
            .session
            .guard_enabled
            .then(|| SessionGuard::from_config(&config.session));

        let key_rotation = KeyRotationManager::new(config.kms.rotation_interval_days);
        if let Some(key) = config.encryption_key.as_deref().filter(|k| !k.is_empty()) {
            key_rotation.adopt(key, Utc::now());
        }

        tracing::info!(
            audit = audit.is_enabled(),
            signed = audit.signs_records(),
            pii_encryption = audit.encrypts_pii(),
            rate_limit = admission.rate_limiter().is_some(),
            blocklist = admission.blocklist_enabled(),
            siem_sinks = ?siem.sink_names(),
            webhook = webhook.is_enabled(),
            session_guard = sessions.is_some(),
            "Request shield initialized"
        );

        Ok(Arc::new(Self {
            audit,
            admission,
            siem,
            webhook,
            sessions,
            session_config: config.session.clone(),
            key_rotation,
            blocklist_watcher: Mutex::new(watcher),
        }))
    }

    /// Assemble from prepared parts.
    pub fn from_parts(
        audit: AuditEngine,
        admission: AdmissionControl,
        siem: SiemDispatcher,
        webhook: WebhookNotifier,
        sessions: Option<SessionGuard>,
        session_config: SessionConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            audit,
            admission,
            siem,
            webhook,
            sessions,
            session_config,
            key_rotation: KeyRotationManager::new(0),
            blocklist_watcher: Mutex::new(None),
        })
    }

    /// Admission decision for a request; denials also raise an alert.
    pub fn admit(&self, request: &RequestView) -> AdmissionDecision {
        let decision = self.admission.evaluate(request.client_key());
        if let AdmissionDecision::Deny(denial) = &decision {
            let event = SinkEvent::new(
                denial.reason.event_type(),
                request.client_key(),
                request.path.as_str(),
                request.method.as_str(),
                denial.message,
            )
            .with_metadata("status_code", denial.status);
            self.raise(event);
        }
        decision
    }

    /// Check the request against its session. `None` when the guard is off.
    pub fn check_session(&self, session_id: Option<&str>, request: &RequestView) -> Option<SessionValidation> {
        let guard = self.sessions.as_ref()?;
        let validation = guard.validate(session_id, request);

        if let SessionValidation::Mismatch { invalidated } = validation {
            let message = if invalidated {
                "Session invalidated due to fingerprint mismatch"
            } else {
                "Session fingerprint mismatch detected"
            };
            let event = SinkEvent::new(
                EventType::HighRiskRequest,
                request.client_key(),
                request.path.as_str(),
                request.method.as_str(),
                message,
            )
            .with_metadata("invalidated", invalidated);
            self.raise(event);
        }
        Some(validation)
    }

    /// Open a session bound to the request's fingerprint; returns its id.
    pub fn open_session(&self, request: &RequestView) -> Option<String> {
        let guard = self.sessions.as_ref()?;
        let session_id = uuid::Uuid::new_v4().to_string();
        guard.register_fingerprint(&session_id, request);
        Some(session_id)
    }

    pub fn destroy_session(&self, session_id: &str) -> bool {
        self.sessions
            .as_ref()
            .is_some_and(|guard| guard.destroy_session(session_id))
    }

    /// Post-response bookkeeping: audit, SIEM fan-out, webhook.
    pub async fn complete(&self, request: RequestView, response: ResponseView) -> Option<SignedAuditRecord> {
        let record = self.audit.record(&request, &response)?;
        let event = self.audit_event(&record, &request);

        if !self.siem.is_empty() {
            self.siem.dispatch(&event).await;
        }
        self.webhook.notify(event);
        Some(record)
    }

    fn audit_event(&self, record: &SignedAuditRecord, request: &RequestView) -> SinkEvent {
        let status = record.status().unwrap_or_default();
        let mut event = SinkEvent::new(
            EventType::AuditLog,
            self.audit.client_ip(request),
            request.path.as_str(),
            request.method.as_str(),
            format!("{} {} {}", request.method, request.path, status),
        )
        .with_metadata("status_code", status)
        .with_metadata("duration_ms", record.duration_ms().unwrap_or_default());

        if let Some(level) = record.level() {
            event = event.with_metadata("level", level);
        }
        if let Some(signature) = record.signature() {
            event = event.with_metadata("integrity_hash", signature);
        }
        event
    }

    /// Send an alert to the webhook queue; never blocks.
    pub fn raise(&self, event: SinkEvent) {
        self.webhook.notify(event);
    }

    pub fn blocklist(&self) -> &Arc<Blocklist> {
        self.admission.blocklist()
    }

    pub fn session_guard(&self) -> Option<&SessionGuard> {
        self.sessions.as_ref()
    }

    pub fn session_cookie_name(&self) -> &str {
        &self.session_config.cookie_name
    }

    pub fn audit(&self) -> &AuditEngine {
        &self.audit
    }

    pub fn webhook(&self) -> &WebhookNotifier {
        &self.webhook
    }

    pub fn key_rotation(&self) -> &KeyRotationManager {
        &self.key_rotation
    }

    /// Stop watching the blocklist file.
    pub fn stop_watching(&self) {
        if let Ok(mut watcher) = self.blocklist_watcher.lock() {
            watcher.take();
        }
    }

    pub fn status_report(&self) -> ShieldStatus {
        let rate_limiter = self.admission.rate_limiter();
        ShieldStatus {
            version: env!("CARGO_PKG_VERSION"),
            audit: AuditStatus {
                enabled: self.audit.is_enabled(),
                signed: self.audit.signs_records(),
                pii_encryption: self.audit.encrypts_pii(),
                anonymize_ip: self.audit.anonymizes_ip(),
            },
            admission: AdmissionStatus {
                rate_limit_enabled: rate_limiter.is_some(),
                rate_limit_capacity: rate_limiter.map(|r| r.capacity()),
                rate_limit_window_secs: rate_limiter.map(|r| r.window().as_secs()),
                tracked_clients: rate_limiter.map(|r| r.tracked_keys()).unwrap_or(0),
                blocklist_enabled: self.admission.blocklist_enabled(),
                blocked_ips: self.blocklist().len(),
            },
            siem_sinks: self.siem.sink_names(),
            webhook: WebhookStatus {
                enabled: self.webhook.is_enabled(),
                queue_depth: self.webhook.queue_depth(),
                queue_capacity: self.webhook.queue_capacity(),
            },
            sessions: SessionStatus {
                guard_enabled: self.sessions.is_some(),
                active_sessions: self.sessions.as_ref().map(|g| g.session_count()).unwrap_or(0),
                fingerprinted: self.sessions.as_ref().map(|g| g.fingerprinted_count()).unwrap_or(0),
            },
            key_rotation: KeyRotationStatus {
                interval_days: self.key_rotation.rotation_interval_days(),
                days_until_rotation: self.key_rotation.days_until_rotation(),
                rotation_needed: self.key_rotation.is_rotation_needed(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ShieldStatus {
    pub version: &'static str,
    pub audit: AuditStatus,
    pub admission: AdmissionStatus,
    pub siem_sinks: Vec<&'static str>,
    pub webhook: WebhookStatus,
    pub sessions: SessionStatus,
    pub key_rotation: KeyRotationStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditStatus {
    pub enabled: bool,
    pub signed: bool,
    pub pii_encryption: bool,
    pub anonymize_ip: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdmissionStatus {
    pub rate_limit_enabled: bool,
    pub rate_limit_capacity: Option<u64>,
    pub rate_limit_window_secs: Option<u64>,
    pub tracked_clients: usize,
    pub blocklist_enabled: bool,
    pub blocked_ips: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct WebhookStatus {
    pub enabled: bool,
    pub queue_depth: usize,
    pub queue_capacity: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionStatus {
    pub guard_enabled: bool,
    pub active_sessions: usize,
    pub fingerprinted: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyRotationStatus {
    pub interval_days: u64,
    pub days_until_rotation: Option<i64>,
    pub rotation_needed: bool,
}
