//! # Gateway token scheme
//!
//! Every message exchanged with the provider carries a `Token` field: the lowercase hex SHA-256 digest over
//! the canonical form of the message. The canonical form is built by
//!
//! 1. dropping any pre-existing token field (matched case-insensitively),
//! 2. dropping structured sub-objects (the itemized `Receipt` is never part of the signature base),
//! 3. injecting the shared password under the literal key `Password`,
//! 4. stringifying every remaining scalar (booleans become the tokens `true`/`false`, numbers use their
//!    plain decimal form, null becomes the empty string),
//! 5. sorting keys lexicographically by byte value and concatenating the *values* with no separators.
//!
//! Verification recomputes the digest and compares in constant time.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// The parameter key carrying the signature on the wire.
pub const TOKEN_KEY: &str = "Token";
/// The key under which the shared secret is injected into the signature base.
const PASSWORD_KEY: &str = "Password";

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Bool(b) => Some(if *b { "true".to_string() } else { "false".to_string() }),
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null => Some(String::new()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Compute the signature token for the given parameter set.
pub fn sign(params: &Map<String, Value>, password: &str) -> String {
    let mut canonical = BTreeMap::new();
    for (key, value) in params {
        if key.eq_ignore_ascii_case(TOKEN_KEY) {
            continue;
        }
        if let Some(s) = scalar_to_string(value) {
            canonical.insert(key.clone(), s);
        }
    }
    canonical.insert(PASSWORD_KEY.to_string(), password.to_string());
    let concatenated = canonical.values().map(String::as_str).collect::<String>();
    let digest = Sha256::digest(concatenated.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Verify a candidate signature against the parameter set. A missing password or missing candidate always
/// verifies false. The comparison is constant-time.
pub fn verify(params: &Map<String, Value>, password: &str, candidate: Option<&str>) -> bool {
    let candidate = match candidate {
        Some(c) if !c.is_empty() => c,
        _ => return false,
    };
    if password.is_empty() {
        return false;
    }
    let expected = sign(params, password);
    expected.as_bytes().ct_eq(candidate.as_bytes()).into()
}

/// Pull the token out of an inbound parameter set. The provider is inconsistent about the field's casing.
pub fn extract_token(params: &Map<String, Value>) -> Option<String> {
    params
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(TOKEN_KEY))
        .and_then(|(_, value)| value.as_str().map(str::to_string))
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    const PASSWORD: &str = "secret123";

    fn callback_params() -> Map<String, Value> {
        json!({
            "TerminalKey": "TestTerminal",
            "OrderId": "wf-12-user-34-1700000000",
            "Success": true,
            "Status": "CONFIRMED",
            "PaymentId": 123456,
            "Amount": 9900,
            "ErrorCode": "0",
        })
        .as_object()
        .unwrap()
        .clone()
    }

    #[test]
    fn sign_matches_fixed_vector() {
        // SHA-256 over "9900" "0" "wf-12-user-34-1700000000" "secret123" "123456" "CONFIRMED" "true" "TestTerminal"
        let expected = "721645a137eda568c8e39c7b60b606ff104688997169686e681ee9596911883e";
        assert_eq!(sign(&callback_params(), PASSWORD), expected);
    }

    #[test]
    fn refund_request_matches_fixed_vector() {
        let params = json!({ "TerminalKey": "TestTerminal", "PaymentId": "12345" }).as_object().unwrap().clone();
        let expected = "61440f64234b3f1c9ee354be00ddee3d3b1240ce0774788ea4ae4039fef2a60c";
        assert_eq!(sign(&params, PASSWORD), expected);
    }

    #[test]
    fn sign_is_independent_of_insertion_order() {
        let forward = callback_params();
        let mut reversed = Map::new();
        for (k, v) in forward.iter().rev() {
            reversed.insert(k.clone(), v.clone());
        }
        assert_eq!(sign(&forward, PASSWORD), sign(&reversed, PASSWORD));
    }

    #[test]
    fn existing_token_and_nested_objects_are_excluded() {
        let mut params = callback_params();
        let baseline = sign(&params, PASSWORD);
        params.insert("token".to_string(), json!("deadbeef"));
        params.insert("Receipt".to_string(), json!({ "Items": [{ "Name": "Watchface", "Amount": 9900 }] }));
        assert_eq!(sign(&params, PASSWORD), baseline);
    }

    #[test]
    fn verify_accepts_the_correct_token() {
        let params = callback_params();
        let token = sign(&params, PASSWORD);
        assert!(verify(&params, PASSWORD, Some(&token)));
    }

    #[test]
    fn verify_rejects_tampered_values() {
        let mut params = callback_params();
        let token = sign(&params, PASSWORD);
        params.insert("Amount".to_string(), json!(1));
        assert!(!verify(&params, PASSWORD, Some(&token)));
    }

    #[test]
    fn verify_rejects_wrong_secret_and_missing_token() {
        let params = callback_params();
        let token = sign(&params, PASSWORD);
        assert!(!verify(&params, "otherpassword", Some(&token)));
        assert!(!verify(&params, PASSWORD, None));
        assert!(!verify(&params, PASSWORD, Some("")));
        assert!(!verify(&params, "", Some(&token)));
    }

    #[test]
    fn extract_token_is_case_insensitive() {
        let mut params = Map::new();
        params.insert("token".to_string(), json!("abc123"));
        assert_eq!(extract_token(&params), Some("abc123".to_string()));
        let mut params = Map::new();
        params.insert("Token".to_string(), json!("def456"));
        assert_eq!(extract_token(&params), Some("def456".to_string()));
        assert_eq!(extract_token(&Map::new()), None);
    }
}
