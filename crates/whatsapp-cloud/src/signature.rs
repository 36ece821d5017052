//! `X-Hub-Signature-256` verification for webhook deliveries.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header Meta signs webhook bodies with.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Compute the header value (`sha256=<hex>`) for a body.
pub fn sign(app_secret: &str, body: &[u8]) -> String {
    // HMAC accepts keys of any length
    let mut mac = match HmacSha256::new_from_slice(app_secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

/// Check a header value against the raw request body.
///
/// Comparison is constant-time.
pub fn verify(app_secret: &str, body: &[u8], header_value: &str) -> bool {
    let Some(hex_sig) = header_value.trim().strip_prefix("sha256=") else {
        return false;
    };
    let Ok(expected) = hex::decode(hex_sig) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(app_secret.as_bytes()) else {
        return false;
    };

    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_then_verify() {
        let body = br#"{"object":"whatsapp_business_account","entry":[]}"#;
        let header = sign("app-secret", body);

        assert!(header.starts_with("sha256="));
        assert_eq!(header.len(), "sha256=".len() + 64);
        assert!(verify("app-secret", body, &header));
    }

    #[test]
    fn test_verify_rejects_tampering() {
        let body = b"{}";
        let header = sign("app-secret", body);

        assert!(!verify("other-secret", body, &header));
        assert!(!verify("app-secret", b"{ }", &header));
        assert!(!verify("app-secret", body, header.trim_start_matches("sha256=")));
        assert!(!verify("app-secret", body, "sha256=not-hex"));
        assert!(!verify("app-secret", body, ""));
    }
}
