//! Admission decision: blocklist first, then rate limit.

use std::sync::Arc;
use std::time::Duration;

use crate::config::ActiveDefenseConfig;
use crate::delivery::EventType;
use crate::observability::metrics;
use crate::observability::DEFENSE_TARGET;
use crate::security::blocklist::Blocklist;
use crate::security::rate_limit::RateLimiter;

/// Header carrying the retry hint on rate-limit denials.
pub const RETRY_AFTER_HEADER: &str = "X-Rate-Limit-Retry-After-Seconds";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    Blocklisted,
    RateLimited,
}

impl DenialReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenialReason::Blocklisted => "blocklist",
            DenialReason::RateLimited => "rate_limit",
        }
    }

    pub fn event_type(&self) -> EventType {
        match self {
            DenialReason::Blocklisted => EventType::IpBlocked,
            DenialReason::RateLimited => EventType::RateLimitExceeded,
        }
    }
}

/// Status, body and headers the host should answer with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    pub reason: DenialReason,
    pub status: u16,
    pub message: &'static str,
    pub headers: Vec<(&'static str, String)>,
}

impl Denial {
    fn blocklisted() -> Self {
        Self {
            reason: DenialReason::Blocklisted,
            status: 403,
            message: "Access Denied (High Risk IP)",
            headers: Vec::new(),
        }
    }

    fn rate_limited(retry_after_secs: u64) -> Self {
        Self {
            reason: DenialReason::RateLimited,
            status: 429,
            message: "Too Many Requests",
            headers: vec![
                (RETRY_AFTER_HEADER, retry_after_secs.to_string()),
                ("Retry-After", retry_after_secs.to_string()),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionDecision {
    Allow,
    Deny(Denial),
}

impl AdmissionDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AdmissionDecision::Allow)
    }
}

/// Owns the admission state for one shield instance.
#[derive(Debug)]
pub struct AdmissionControl {
    blocklist: Arc<Blocklist>,
    blocklist_enabled: bool,
    rate_limiter: Option<RateLimiter>,
}

impl AdmissionControl {
    pub fn new(blocklist: Arc<Blocklist>, blocklist_enabled: bool, rate_limiter: Option<RateLimiter>) -> Self {
        Self {
            blocklist,
            blocklist_enabled,
            rate_limiter,
        }
    }

    pub fn from_config(config: &ActiveDefenseConfig, blocklist: Arc<Blocklist>) -> Self {
        let rate_limiter = config.rate_limit_enabled.then(|| {
            RateLimiter::new(
                config.rate_limit_capacity,
                Duration::from_secs(config.rate_limit_window_secs),
            )
        });
        Self::new(blocklist, config.blocklist_enabled, rate_limiter)
    }

    /// Decide for one request keyed by client address.
    ///
    /// A blocklisted key is denied without touching its rate-limit bucket.
    pub fn evaluate(&self, key: &str) -> AdmissionDecision {
        if self.blocklist_enabled && self.blocklist.is_blocked(key) {
            tracing::warn!(target: DEFENSE_TARGET, client = %key, "Blocked request from blocklisted address");
            metrics::record_admission_denied(DenialReason::Blocklisted.as_str());
            return AdmissionDecision::Deny(Denial::blocklisted());
        }

        if let Some(limiter) = &self.rate_limiter {
            let decision = limiter.check(key);
            if !decision.allowed {
                tracing::warn!(
                    target: DEFENSE_TARGET,
                    client = %key,
                    retry_after_secs = decision.retry_after_secs,
                    "Rate limit exceeded"
                );
                metrics::record_admission_denied(DenialReason::RateLimited.as_str());
                return AdmissionDecision::Deny(Denial::rate_limited(decision.retry_after_secs));
            }
        }

        AdmissionDecision::Allow
    }

    pub fn blocklist(&self) -> &Arc<Blocklist> {
        &self.blocklist
    }

    pub fn blocklist_enabled(&self) -> bool {
        self.blocklist_enabled
    }

    pub fn rate_limiter(&self) -> Option<&RateLimiter> {
        self.rate_limiter.as_ref()
    }
}
