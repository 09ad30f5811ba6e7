//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (capacities > 0, windows > 0)
//! - Check that enabled integrations carry the settings they need
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ShieldConfig → Result<(), Vec<ValidationError>>
//! - Missing integration settings are not errors; the integration is
//!   treated as disabled at runtime and a warning is logged

use std::fmt;

use crate::config::schema::ShieldConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate_config(config: &ShieldConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let defense = &config.active_defense;
    if defense.rate_limit_capacity == 0 {
        errors.push(ValidationError::new(
            "active_defense.rate_limit_capacity",
            "must be greater than 0",
        ));
    }
    if defense.rate_limit_window_secs == 0 {
        errors.push(ValidationError::new(
            "active_defense.rate_limit_window_secs",
            "must be greater than 0",
        ));
    }

    let webhook = &config.notifications.webhook;
    if webhook.queue_capacity == 0 {
        errors.push(ValidationError::new(
            "notifications.webhook.queue_capacity",
            "must be greater than 0",
        ));
    }
    if webhook.retry_attempts == 0 {
        errors.push(ValidationError::new(
            "notifications.webhook.retry_attempts",
            "must be at least 1",
        ));
    }
    if let Some(url) = webhook.url.as_deref().filter(|u| !u.is_empty()) {
        if url::Url::parse(url).is_err() {
            errors.push(ValidationError::new(
                "notifications.webhook.url",
                format!("'{}' is not a valid URL", url),
            ));
        }
    }

    for (field, value) in [
        ("siem.splunk.url", config.siem.splunk.url.as_deref()),
        ("siem.graylog.url", config.siem.graylog.url.as_deref()),
        ("siem.datadog.endpoint", config.siem.datadog.endpoint.as_deref()),
    ] {
        if let Some(url) = value.filter(|u| !u.is_empty()) {
            if url::Url::parse(url).is_err() {
                errors.push(ValidationError::new(field, format!("'{}' is not a valid URL", url)));
            }
        }
    }

    if config.session.cookie_name.trim().is_empty() {
        errors.push(ValidationError::new("session.cookie_name", "must not be empty"));
    }

    if config.admin.enabled && config.admin.api_key.is_empty() {
        errors.push(ValidationError::new("admin.api_key", "required when admin API is enabled"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
