//! Audit record structure and canonical serialization.
//!
//! Field order is insertion order and is part of the signed bytes:
//!
//! ```text
//! timestamp, level, component, event_id,
//! request { method, url, ip, user_agent },
//! response { status, duration_ms },
//! user { user_id, username, email }   (only when known)
//! integrity_hash                      (appended after signing)
//! ```

use chrono::{SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::http::{RequestView, ResponseView};

/// Component tag carried by every record.
pub const COMPONENT: &str = "REQUEST-SHIELD";

/// Event identifier for request/response records.
pub const EVENT_HTTP_ACCESS: &str = "HTTP_ACCESS";

/// Field holding the integrity signature.
pub const SIGNATURE_FIELD: &str = "integrity_hash";

/// An unsigned audit record.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditRecord {
    fields: Map<String, Value>,
}

impl AuditRecord {
    /// Build the record for one exchange. `client_ip` is already anonymized if required.
    pub fn from_exchange(request: &RequestView, response: &ResponseView, client_ip: String) -> Self {
        let mut fields = Map::new();
        fields.insert(
            "timestamp".into(),
            Value::from(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        fields.insert("level".into(), Value::from(level_for_status(response.status)));
        fields.insert("component".into(), Value::from(COMPONENT));
        fields.insert("event_id".into(), Value::from(EVENT_HTTP_ACCESS));

        let mut req = Map::new();
        req.insert("method".into(), Value::from(request.method.as_str()));
        req.insert("url".into(), Value::from(request.path.as_str()));
        req.insert("ip".into(), Value::from(client_ip));
        req.insert(
            "user_agent".into(),
            request.user_agent().map(Value::from).unwrap_or(Value::Null),
        );
        fields.insert("request".into(), Value::Object(req));

        let mut resp = Map::new();
        resp.insert("status".into(), Value::from(response.status));
        resp.insert(
            "duration_ms".into(),
            Value::from(response.duration.as_millis().min(u64::MAX as u128) as u64),
        );
        fields.insert("response".into(), Value::Object(resp));

        if let Some(user) = request.user.as_ref().filter(|u| !u.is_empty()) {
            let mut user_map = Map::new();
            for (key, value) in [
                ("user_id", &user.user_id),
                ("username", &user.username),
                ("email", &user.email),
            ] {
                if let Some(value) = value {
                    user_map.insert(key.into(), Value::from(value.as_str()));
                }
            }
            fields.insert("user".into(), Value::Object(user_map));
        }

        Self { fields }
    }

    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }

    /// Canonical bytes: compact JSON in insertion order.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        canonical_bytes(&self.fields)
    }
}

/// "WARN" for 4xx/5xx, "INFO" otherwise.
pub fn level_for_status(status: u16) -> &'static str {
    if status >= 400 {
        "WARN"
    } else {
        "INFO"
    }
}

pub(crate) fn canonical_bytes(fields: &Map<String, Value>) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(fields)
}

/// A record with its signature attached, ready to log.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedAuditRecord {
    fields: Map<String, Value>,
    line: String,
    signed: bool,
}

impl SignedAuditRecord {
    pub(crate) fn new(fields: Map<String, Value>, line: String, signed: bool) -> Self {
        Self { fields, line, signed }
    }

    /// All fields including `integrity_hash`.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// The exact JSON line written to the audit log.
    pub fn line(&self) -> &str {
        &self.line
    }

    /// False when no integrity key was configured or signing failed.
    pub fn is_signed(&self) -> bool {
        self.signed
    }

    pub fn signature(&self) -> Option<&str> {
        self.fields.get(SIGNATURE_FIELD).and_then(Value::as_str)
    }

    pub fn status(&self) -> Option<u16> {
        self.fields
            .get("response")
            .and_then(|r| r.get("status"))
            .and_then(Value::as_u64)
            .and_then(|s| u16::try_from(s).ok())
    }

    pub fn duration_ms(&self) -> Option<u64> {
        self.fields
            .get("response")
            .and_then(|r| r.get("duration_ms"))
            .and_then(Value::as_u64)
    }

    pub fn level(&self) -> Option<&str> {
        self.fields.get("level").and_then(Value::as_str)
    }
}
