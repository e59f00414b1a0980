//! Webhook signature verification.
//!
//! The platform signs every delivery: `x-line-signature` carries the
//! base64-encoded HMAC-SHA256 of the raw request body, keyed by the channel
//! secret. Verification must happen on the raw bytes, before any parsing.

use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Validate a signature header value against the raw request body.
pub fn validate(channel_secret: &str, signature: &str, body: &[u8]) -> bool {
    let expected = sign(channel_secret, body);
    expected.as_bytes().ct_eq(signature.as_bytes()).into()
}

/// Compute the signature for a body. Exposed for tests and local tooling.
pub fn sign(channel_secret: &str, body: &[u8]) -> String {
    // HMAC accepts keys of any length, so new_from_slice cannot fail here.
    let mut mac = HmacSha256::new_from_slice(channel_secret.as_bytes())
        .unwrap_or_else(|_| unreachable!("HMAC key of any length is valid"));
    mac.update(body);
    base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_signature_accepted() {
        let secret = "test-secret";
        let body = br#"{"events":[]}"#;
        let sig = sign(secret, body);
        assert!(validate(secret, &sig, body));
    }

    #[test]
    fn invalid_signature_rejected() {
        assert!(!validate("test-secret", "bm90LXRoZS1zaWduYXR1cmU=", b"body"));
    }

    #[test]
    fn signature_for_different_body_rejected() {
        let secret = "test-secret";
        let sig = sign(secret, b"body-a");
        assert!(!validate(secret, &sig, b"body-b"));
    }

    #[test]
    fn signature_with_wrong_secret_rejected() {
        let body = b"payload";
        let sig = sign("secret-a", body);
        assert!(!validate("secret-b", &sig, body));
    }

    #[test]
    fn empty_signature_rejected() {
        assert!(!validate("secret", "", b"payload"));
    }
}
