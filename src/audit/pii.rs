//! PII field protection.
//!
//! Walks a record and replaces the string value of every sensitive key with
//! `[ENCRYPTED]<base64>`. The input is never mutated; a new structure is
//! returned.

use serde_json::{Map, Value};

use crate::crypto::{FieldEncryptor, ENCRYPTED_PREFIX, ENCRYPTION_ERROR};

/// Keys treated as personal data, matched case-insensitively.
pub const SENSITIVE_KEYS: [&str; 5] = ["user_id", "email", "username", "ip", "user_agent"];

pub fn is_sensitive_key(key: &str) -> bool {
    SENSITIVE_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

/// Return a copy of `fields` with sensitive string values encrypted.
///
/// Nested objects and arrays are descended into. Non-string sensitive
/// values (null, numbers) are kept as they are.
pub fn protect_pii(fields: &Map<String, Value>, cipher: &dyn FieldEncryptor) -> Map<String, Value> {
    fields
        .iter()
        .map(|(key, value)| {
            let protected = if is_sensitive_key(key) {
                match value {
                    Value::String(s) => Value::String(encrypt_tagged(s, cipher)),
                    other => protect_value(other, cipher),
                }
            } else {
                protect_value(value, cipher)
            };
            (key.clone(), protected)
        })
        .collect()
}

fn protect_value(value: &Value, cipher: &dyn FieldEncryptor) -> Value {
    match value {
        Value::Object(map) => Value::Object(protect_pii(map, cipher)),
        Value::Array(items) => Value::Array(items.iter().map(|v| protect_value(v, cipher)).collect()),
        other => other.clone(),
    }
}

/// Failures are logged and reduced to [`ENCRYPTION_ERROR`].
fn encrypt_tagged(plaintext: &str, cipher: &dyn FieldEncryptor) -> String {
    match cipher.try_encrypt(plaintext) {
        Ok(ciphertext) => format!("{ENCRYPTED_PREFIX}{ciphertext}"),
        Err(e) => {
            tracing::error!(error = %e, "PII field encryption failed");
            ENCRYPTION_ERROR.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{CryptoError, FieldCipher};
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    use serde_json::json;

    #[derive(Debug)]
    struct BrokenCipher;

    impl FieldEncryptor for BrokenCipher {
        fn try_encrypt(&self, _plaintext: &str) -> Result<String, CryptoError> {
            Err(CryptoError::Cipher("hardware fault".into()))
        }
    }

    fn cipher() -> FieldCipher {
        FieldCipher::from_key_bytes(&[7u8; 32]).unwrap()
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_user_agent_is_encrypted() {
        let input = object(json!({ "user_agent": "X" }));
        let output = protect_pii(&input, &cipher());

        let value = output["user_agent"].as_str().unwrap();
        assert_ne!(value, "X");
        let encoded = value.strip_prefix("[ENCRYPTED]").unwrap();
        assert!(!encoded.is_empty());
        assert!(BASE64.decode(encoded).is_ok());
    }

    #[test]
    fn test_nested_and_case_insensitive() {
        let input = object(json!({
            "request": { "IP": "10.0.0.0", "method": "GET" },
            "user": { "Email": "a@example.com", "roles": ["admin"] },
            "events": [{ "username": "bob" }]
        }));
        let cipher = cipher();
        let output = protect_pii(&input, &cipher);

        assert_eq!(output["request"]["method"], "GET");
        assert_eq!(output["user"]["roles"], json!(["admin"]));

        let ip = output["request"]["IP"].as_str().unwrap();
        assert_eq!(cipher.decrypt_tagged(ip).unwrap(), "10.0.0.0");
        let email = output["user"]["Email"].as_str().unwrap();
        assert_eq!(cipher.decrypt_tagged(email).unwrap(), "a@example.com");
        let username = output["events"][0]["username"].as_str().unwrap();
        assert_eq!(cipher.decrypt_tagged(username).unwrap(), "bob");
    }

    #[test]
    fn test_input_untouched_and_order_kept() {
        let input = object(json!({ "timestamp": "t", "ip": "1.2.3.0", "level": "INFO" }));
        let output = protect_pii(&input, &cipher());

        assert_eq!(input["ip"], "1.2.3.0");
        let keys: Vec<_> = output.keys().cloned().collect();
        assert_eq!(keys, vec!["timestamp", "ip", "level"]);
    }

    #[test]
    fn test_null_sensitive_value_passes_through() {
        let input = object(json!({ "user_agent": null }));
        let output = protect_pii(&input, &cipher());
        assert!(output["user_agent"].is_null());
    }

    #[test]
    fn test_encryption_failure_uses_sentinel() {
        let input = object(json!({ "email": "a@example.com", "user_agent": null, "path": "/x" }));
        let output = protect_pii(&input, &BrokenCipher);

        assert_eq!(output["email"], "[ENCRYPTION_ERROR]");
        assert!(output["user_agent"].is_null());
        assert_eq!(output["path"], "/x");
    }
}
