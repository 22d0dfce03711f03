use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Check an `X-Line-Signature` header against the raw request body.
/// The header carries base64(HMAC-SHA256(channel_secret, body)).
pub fn verify(channel_secret: &str, body: &[u8], signature: &str) -> bool {
    let Ok(claimed) = BASE64.decode(signature) else {
        return false;
    };
    let mut mac = HmacSha256::new_from_slice(channel_secret.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(body);
    mac.verify_slice(&claimed).is_ok()
}

/// Produce the signature for a body. Counterpart of [`verify`], used in tests.
pub fn sign(channel_secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(channel_secret.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(body);
    BASE64.encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_body_verifies() {
        let body = br#"{"events":[]}"#;
        let signature = sign("secret", body);
        assert!(verify("secret", body, &signature));
    }

    #[test]
    fn tampered_body_fails() {
        let signature = sign("secret", b"original");
        assert!(!verify("secret", b"tampered", &signature));
    }

    #[test]
    fn wrong_secret_fails() {
        let signature = sign("secret", b"body");
        assert!(!verify("other-secret", b"body", &signature));
    }

    #[test]
    fn garbage_header_fails_without_panicking() {
        assert!(!verify("secret", b"body", "not-base64!!!"));
        assert!(!verify("secret", b"body", ""));
    }
}
