//! Webhook signature verification using HMAC-SHA256.
//!
//! GitHub signs each delivery with the shared webhook secret and sends the
//! result in `X-Hub-Signature-256` as `sha256=<hex>`. Verification runs before
//! anything else touches the body; a failed check is final and never retried.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Parses a signature header (e.g., "sha256=abc123...") into raw bytes.
///
/// Returns `None` for malformed headers (missing prefix, invalid hex, etc.).
///
/// # Examples
///
/// ```
/// use repo_steward::webhooks::parse_signature_header;
///
/// assert!(parse_signature_header("sha256=abcd1234").is_some());
/// assert!(parse_signature_header("abcd1234").is_none());
/// assert!(parse_signature_header("sha1=abcd1234").is_none());
/// assert!(parse_signature_header("sha256=xyz").is_none());
/// ```
pub fn parse_signature_header(header: &str) -> Option<Vec<u8>> {
    let hex_sig = header.strip_prefix("sha256=")?;
    hex::decode(hex_sig).ok()
}

/// Computes the HMAC-SHA256 of `payload` under `secret`.
pub fn compute_signature(payload: &[u8], secret: &[u8]) -> Vec<u8> {
    // HMAC accepts keys of any length, so this never takes the fallback.
    match HmacSha256::new_from_slice(secret) {
        Ok(mut mac) => {
            mac.update(payload);
            mac.finalize().into_bytes().to_vec()
        }
        Err(_) => Vec::new(),
    }
}

/// Formats a signature as a header value: `sha256=<hex>`.
pub fn format_signature_header(signature: &[u8]) -> String {
    format!("sha256={}", hex::encode(signature))
}

/// Verifies a signature header against the payload and secret.
///
/// Comparison is constant-time (delegated to the HMAC implementation).
///
/// # Examples
///
/// ```
/// use repo_steward::webhooks::{compute_signature, format_signature_header, verify_signature};
///
/// let payload = br#"{"action":"created"}"#;
/// let header = format_signature_header(&compute_signature(payload, b"s3cret"));
///
/// assert!(verify_signature(payload, &header, b"s3cret"));
/// assert!(!verify_signature(payload, &header, b"other"));
/// ```
pub fn verify_signature(payload: &[u8], signature_header: &str, secret: &[u8]) -> bool {
    let Some(provided) = parse_signature_header(signature_header) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(&provided).is_ok()
}

/// Verifies a delivery whose signature header may be absent.
///
/// A missing header is treated exactly like a wrong one.
pub fn verify_delivery(payload: &[u8], signature_header: Option<&str>, secret: &[u8]) -> bool {
    signature_header.is_some_and(|header| verify_signature(payload, header, secret))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sign(payload: &[u8], secret: &[u8]) -> String {
        format_signature_header(&compute_signature(payload, secret))
    }

    #[test]
    fn parse_header_decodes_hex() {
        assert_eq!(
            parse_signature_header("sha256=1234abcd"),
            Some(vec![0x12, 0x34, 0xab, 0xcd])
        );
        assert_eq!(
            parse_signature_header("sha256=ABCD"),
            Some(vec![0xab, 0xcd])
        );
    }

    #[test]
    fn parse_header_rejects_malformed_values() {
        assert_eq!(parse_signature_header(""), None);
        assert_eq!(parse_signature_header("sha256=abc"), None);
        assert_eq!(parse_signature_header("sha1=1234"), None);
    }

    /// Test vector from GitHub's "Validating webhook deliveries" documentation.
    #[test]
    fn matches_github_documentation_vector() {
        let header = "sha256=757107ea0eb2509fc211221cce984b8a37570b6d7586c22c46f4379c8b043e17";
        assert!(verify_signature(
            b"Hello, World!",
            header,
            b"It's a Secret to Everybody"
        ));
    }

    #[test]
    fn absent_header_is_rejected() {
        assert!(!verify_delivery(b"{}", None, b"secret"));
        assert!(verify_delivery(b"{}", Some(&sign(b"{}", b"secret")), b"secret"));
    }

    #[test]
    fn malformed_headers_return_false() {
        for header in ["", "sha256=", "sha256=zz", "sha1=abc123", "not-a-header"] {
            assert!(!verify_signature(b"body", header, b"secret"), "{header}");
        }
    }

    #[test]
    fn signature_is_32_bytes() {
        assert_eq!(compute_signature(b"payload", b"secret").len(), 32);
    }

    proptest! {
        #[test]
        fn valid_only_for_exact_body_and_secret(payload: Vec<u8>, secret: Vec<u8>) {
            let header = sign(&payload, &secret);
            prop_assert!(verify_signature(&payload, &header, &secret));
        }

        #[test]
        fn flipping_one_body_byte_invalidates(
            payload in prop::collection::vec(any::<u8>(), 1..256),
            secret: Vec<u8>,
            index: prop::sample::Index,
            flip in 1u8..=255,
        ) {
            let header = sign(&payload, &secret);
            let mut mutated = payload.clone();
            let i = index.index(mutated.len());
            mutated[i] ^= flip;
            prop_assert!(!verify_signature(&mutated, &header, &secret));
        }

        #[test]
        fn flipping_one_secret_byte_invalidates(
            payload: Vec<u8>,
            secret in prop::collection::vec(any::<u8>(), 1..64),
            index: prop::sample::Index,
            flip in 1u8..=255,
        ) {
            let header = sign(&payload, &secret);
            let mut mutated = secret.clone();
            let i = index.index(mutated.len());
            mutated[i] ^= flip;
            prop_assert!(!verify_signature(&payload, &header, &mutated));
        }

        #[test]
        fn arbitrary_headers_never_panic(header: String, payload: Vec<u8>, secret: Vec<u8>) {
            let _ = verify_signature(&payload, &header, &secret);
        }
    }
}
