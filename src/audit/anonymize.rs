//! Client address anonymization.

use std::net::Ipv4Addr;

/// Placeholder for requests without a transport address.
pub const UNKNOWN_ADDRESS: &str = "unknown";

/// Zero the last octet of an IPv4 address.
///
/// Non-IPv4 input is returned unchanged; an absent address becomes
/// [`UNKNOWN_ADDRESS`]. Applying it twice yields the same value.
pub fn anonymize_ip(ip: Option<&str>) -> String {
    let Some(ip) = ip else {
        return UNKNOWN_ADDRESS.to_string();
    };

    match ip.parse::<Ipv4Addr>() {
        Ok(addr) => {
            let [a, b, c, _] = addr.octets();
            Ipv4Addr::new(a, b, c, 0).to_string()
        }
        Err(_) => ip.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masks_last_octet() {
        assert_eq!(anonymize_ip(Some("192.168.1.123")), "192.168.1.0");
    }

    #[test]
    fn test_idempotent() {
        assert_eq!(anonymize_ip(Some("10.0.0.0")), "10.0.0.0");
        let once = anonymize_ip(Some("203.0.113.77"));
        assert_eq!(anonymize_ip(Some(&once)), once);
    }

    #[test]
    fn test_non_ipv4_unchanged() {
        assert_eq!(anonymize_ip(Some("2001:db8::1")), "2001:db8::1");
        assert_eq!(anonymize_ip(Some("localhost")), "localhost");
    }

    #[test]
    fn test_absent_address() {
        assert_eq!(anonymize_ip(None), "unknown");
    }
}
