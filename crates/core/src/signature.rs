//! Project request signing.
//!
//! Signed requests carry `x-api-key`, `x-nonce` and `x-signature`
//! headers. The signature is the lower-case hex HMAC-SHA256 of
//! `secret + nonce`, keyed by the API key.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Compute the `x-signature` header value.
pub fn compute_signature(api_key: &str, api_secret: &str, nonce: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(api_key.as_bytes()).expect("HMAC accepts any key length");
    mac.update(api_secret.as_bytes());
    mac.update(nonce.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Current unix time in seconds, used as the request nonce.
pub fn current_nonce() -> String {
    chrono::Utc::now().timestamp().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_lowercase_hex_sha256() {
        let sig = compute_signature("key", "secret", "1700000000");
        assert_eq!(sig.len(), 64);
        assert!(sig
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn signature_matches_single_message_hmac() {
        let mut mac = HmacSha256::new_from_slice(b"key").unwrap();
        mac.update(b"secret1700000000");
        let expected = hex::encode(mac.finalize().into_bytes());

        assert_eq!(compute_signature("key", "secret", "1700000000"), expected);
    }

    #[test]
    fn signature_changes_with_nonce() {
        assert_ne!(
            compute_signature("key", "secret", "1"),
            compute_signature("key", "secret", "2"),
        );
    }

    #[test]
    fn nonce_is_numeric() {
        let nonce = current_nonce();
        assert!(!nonce.is_empty());
        assert!(nonce.chars().all(|c| c.is_ascii_digit()));
    }
}
