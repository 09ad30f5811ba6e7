//! Session fingerprint guard.

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::config::SessionConfig;
use crate::http::RequestView;
use crate::observability::metrics;
use crate::session::fingerprint::{compute_fingerprint, short};

#[derive(Debug, Clone)]
struct SessionEntry {
    opened_at: DateTime<Utc>,
    fingerprint: Option<String>,
    fingerprint_created_at: Option<DateTime<Utc>>,
}

impl SessionEntry {
    fn open(now: DateTime<Utc>) -> Self {
        Self {
            opened_at: now,
            fingerprint: None,
            fingerprint_created_at: None,
        }
    }
}

/// Outcome of checking one request against its session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionValidation {
    /// No live session for the identifier.
    NoSession,
    /// First request of the session; fingerprint registered.
    NewSession,
    /// Fingerprint matches.
    Valid,
    /// Fingerprint differs. `invalidated` is true when the session was destroyed.
    Mismatch { invalidated: bool },
}

impl SessionValidation {
    pub fn is_valid(&self) -> bool {
        matches!(self, SessionValidation::NewSession | SessionValidation::Valid)
    }
}

/// Tracks live sessions and their bound fingerprints.
#[derive(Debug)]
pub struct SessionGuard {
    sessions: DashMap<String, SessionEntry>,
    include_ip: bool,
    invalidate_on_mismatch: bool,
}

impl SessionGuard {
    pub fn new(include_ip: bool, invalidate_on_mismatch: bool) -> Self {
        Self {
            sessions: DashMap::new(),
            include_ip,
            invalidate_on_mismatch,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.include_ip_in_fingerprint, config.invalidate_on_mismatch)
    }

    /// Start a session (typically right after authentication).
    pub fn open_session(&self, session_id: &str) {
        self.sessions
            .insert(session_id.to_string(), SessionEntry::open(Utc::now()));
    }

    pub fn destroy_session(&self, session_id: &str) -> bool {
        self.sessions.remove(session_id).is_some()
    }

    pub fn has_session(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    /// Bind the request's fingerprint to the session, opening it if needed.
    pub fn register_fingerprint(&self, session_id: &str, request: &RequestView) -> String {
        let fingerprint = compute_fingerprint(request, self.include_ip);
        let now = Utc::now();
        let mut entry = self
            .sessions
            .entry(session_id.to_string())
            .or_insert_with(|| SessionEntry::open(now));
        entry.fingerprint = Some(fingerprint.clone());
        entry.fingerprint_created_at = Some(now);
        fingerprint
    }

    /// Validate a request against its session.
    pub fn validate(&self, session_id: Option<&str>, request: &RequestView) -> SessionValidation {
        let Some(session_id) = session_id else {
            return SessionValidation::NoSession;
        };
        let current = compute_fingerprint(request, self.include_ip);

        // The entry guard holds the shard lock, so check and removal act on
        // the same session even if the id is reopened concurrently.
        let mut entry = match self.sessions.entry(session_id.to_string()) {
            Entry::Occupied(entry) => entry,
            Entry::Vacant(_) => return SessionValidation::NoSession,
        };

        let Some(stored) = entry.get().fingerprint.clone() else {
            let session = entry.get_mut();
            session.fingerprint = Some(current);
            session.fingerprint_created_at = Some(Utc::now());
            tracing::debug!("Fingerprint registered for new session");
            return SessionValidation::NewSession;
        };

        if stored == current {
            return SessionValidation::Valid;
        }

        tracing::warn!(
            stored = short(&stored),
            current = short(&current),
            invalidate = self.invalidate_on_mismatch,
            "Session fingerprint mismatch"
        );
        metrics::record_session_mismatch(self.invalidate_on_mismatch);

        if self.invalidate_on_mismatch {
            entry.remove();
            SessionValidation::Mismatch { invalidated: true }
        } else {
            SessionValidation::Mismatch { invalidated: false }
        }
    }

    pub fn has_fingerprint(&self, session_id: &str) -> bool {
        self.sessions
            .get(session_id)
            .is_some_and(|e| e.fingerprint.is_some())
    }

    pub fn fingerprint_created_at(&self, session_id: &str) -> Option<DateTime<Utc>> {
        self.sessions.get(session_id).and_then(|e| e.fingerprint_created_at)
    }

    pub fn session_opened_at(&self, session_id: &str) -> Option<DateTime<Utc>> {
        self.sessions.get(session_id).map(|e| e.opened_at)
    }

    /// Live sessions. State is only removed by destroy or invalidation.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn fingerprinted_count(&self) -> usize {
        self.sessions.iter().filter(|e| e.fingerprint.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(user_agent: &str) -> RequestView {
        RequestView::new("GET", "/account")
            .with_header("user-agent", user_agent)
            .with_header("accept-language", "en")
            .with_header("accept-encoding", "gzip")
            .with_remote_addr("10.0.0.1")
    }

    #[test]
    fn test_lifecycle_with_invalidation() {
        let guard = SessionGuard::new(false, true);
        guard.open_session("s1");

        assert_eq!(guard.validate(Some("s1"), &request("A")), SessionValidation::NewSession);
        assert!(guard.has_fingerprint("s1"));
        assert!(guard.fingerprint_created_at("s1").is_some());
        assert_eq!(guard.validate(Some("s1"), &request("A")), SessionValidation::Valid);
        assert_eq!(
            guard.validate(Some("s1"), &request("B")),
            SessionValidation::Mismatch { invalidated: true }
        );
        assert_eq!(guard.validate(Some("s1"), &request("A")), SessionValidation::NoSession);
        assert!(!guard.has_session("s1"));
    }

    #[test]
    fn test_flag_only_policy_keeps_session() {
        let guard = SessionGuard::new(false, false);
        guard.register_fingerprint("s1", &request("A"));

        assert_eq!(
            guard.validate(Some("s1"), &request("B")),
            SessionValidation::Mismatch { invalidated: false }
        );
        assert!(guard.has_session("s1"));
        assert_eq!(guard.validate(Some("s1"), &request("A")), SessionValidation::Valid);
    }

    #[test]
    fn test_unknown_or_missing_session() {
        let guard = SessionGuard::new(false, true);
        assert_eq!(guard.validate(None, &request("A")), SessionValidation::NoSession);
        assert_eq!(guard.validate(Some("nope"), &request("A")), SessionValidation::NoSession);
        assert_eq!(guard.session_count(), 0);
    }

    #[test]
    fn test_destroy_and_counts() {
        let guard = SessionGuard::new(false, true);
        guard.open_session("a");
        guard.register_fingerprint("b", &request("A"));

        assert_eq!(guard.session_count(), 2);
        assert_eq!(guard.fingerprinted_count(), 1);
        assert!(guard.destroy_session("a"));
        assert!(!guard.destroy_session("a"));
        assert_eq!(guard.session_count(), 1);
    }

    #[test]
    fn test_ip_policy() {
        let guard = SessionGuard::new(true, true);
        guard.register_fingerprint("s1", &request("A"));
        let moved = request("A").with_header("x-forwarded-for", "203.0.113.1");
        assert_eq!(
            guard.validate(Some("s1"), &moved),
            SessionValidation::Mismatch { invalidated: true }
        );
    }

    #[test]
    fn test_reopened_session_is_not_destroyed() {
        let guard = SessionGuard::new(false, true);
        guard.register_fingerprint("s1", &request("A"));
        assert_eq!(
            guard.validate(Some("s1"), &request("B")),
            SessionValidation::Mismatch { invalidated: true }
        );

        guard.open_session("s1");
        assert_eq!(guard.validate(Some("s1"), &request("A")), SessionValidation::NewSession);
        assert_eq!(guard.validate(Some("s1"), &request("A")), SessionValidation::Valid);
        assert!(guard.has_session("s1"));
    }

    #[test]
    fn test_concurrent_reopen_and_mismatch() {
        let guard = std::sync::Arc::new(SessionGuard::new(false, true));

        let handles: Vec<_> = (0..4)
            .map(|i| {
                let guard = guard.clone();
                std::thread::spawn(move || {
                    for _ in 0..200 {
                        if i % 2 == 0 {
                            guard.register_fingerprint("shared", &request("A"));
                        } else {
                            let outcome = guard.validate(Some("shared"), &request("B"));
                            assert_ne!(outcome, SessionValidation::Valid);
                            assert_ne!(outcome, SessionValidation::Mismatch { invalidated: false });
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        guard.register_fingerprint("shared", &request("A"));
        assert_eq!(guard.validate(Some("shared"), &request("A")), SessionValidation::Valid);
    }
}

