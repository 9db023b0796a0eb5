//! Content fingerprinting
//!
//! This module computes the content fingerprint used to detect whether a
//! rendered configuration differs from the previously applied one.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use sha2::{Digest, Sha512};

/// Compute the fingerprint of a serialized configuration.
///
/// The fingerprint is the URL-safe base64 encoding of the SHA-512 digest of
/// the input bytes. It is used purely for change detection, never for
/// addressing.
pub fn content_fingerprint(bytes: &[u8]) -> String {
    let digest = Sha512::digest(bytes);
    URL_SAFE.encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_stable() {
        let a = content_fingerprint(b"test-header\n");
        let b = content_fingerprint(b"test-header\n");
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_differs_on_content_change() {
        let a = content_fingerprint(b"frontend dyna-frontend-443");
        let b = content_fingerprint(b"frontend dyna-frontend-6443");
        assert_ne!(a, b);
    }

    #[test]
    fn test_fingerprint_encoding_shape() {
        // SHA-512 is 64 bytes; padded base64 of 64 bytes is 88 characters.
        let fp = content_fingerprint(b"");
        assert_eq!(fp.len(), 88);
        assert!(fp.ends_with("=="));
        assert!(!fp.contains('/') && !fp.contains('+'), "encoding must be URL-safe");
    }
}
