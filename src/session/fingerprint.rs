//! Device fingerprints.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use sha2::{Digest, Sha256};

use crate::http::RequestView;

const MISSING: &str = "unknown";

/// Client address for fingerprinting: first `X-Forwarded-For` entry, then
/// `X-Real-IP`, then the transport address.
pub fn resolve_client_ip(request: &RequestView) -> Option<String> {
    let forwarded = request
        .header("x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = forwarded {
        return Some(ip.to_string());
    }

    let real_ip = request
        .header("x-real-ip")
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = real_ip {
        return Some(ip.to_string());
    }

    request.remote_addr.clone()
}

/// base64(SHA-256("UA|Accept-Language|Accept-Encoding[|client-ip]")).
pub fn compute_fingerprint(request: &RequestView, include_ip: bool) -> String {
    let mut material = [
        request.user_agent(),
        request.header("accept-language"),
        request.header("accept-encoding"),
    ]
    .iter()
    .map(|v| v.unwrap_or(MISSING))
    .collect::<Vec<_>>()
    .join("|");

    if include_ip {
        material.push('|');
        material.push_str(resolve_client_ip(request).as_deref().unwrap_or(MISSING));
    }

    BASE64.encode(Sha256::digest(material.as_bytes()))
}

/// First eight characters, for logs.
pub fn short(fingerprint: &str) -> &str {
    fingerprint.get(..8).unwrap_or(fingerprint)
}
