//! # Password Module
//!
//! Salted PBKDF2-HMAC-SHA256 password hashes.
//!
//! Encoded form: `pbkdf2_sha256$<iterations>$<salt>$<base64 digest>`.
//! The salt is chosen by the caller; this module never generates randomness.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha2::Sha256;
use subtle::ConstantTimeEq;

/// Algorithm tag stored in the encoded hash.
pub const ALGORITHM: &str = "pbkdf2_sha256";

/// Default number of hashing rounds.
pub const DEFAULT_ITERATIONS: u32 = 20_000;

/// Hash `password` with `salt` using the default iteration count.
#[must_use]
pub fn hash_password(password: &str, salt: &str) -> String {
    hash_with_iterations(password, salt, DEFAULT_ITERATIONS)
}

/// Hash `password` with an explicit iteration count (minimum 1).
#[must_use]
pub fn hash_with_iterations(password: &str, salt: &str, iterations: u32) -> String {
    let iterations = iterations.max(1);
    let digest = derive(password, salt, iterations);
    format!(
        "{ALGORITHM}${iterations}${salt}${}",
        STANDARD.encode(digest)
    )
}

/// Check `password` against an encoded hash.
///
/// Malformed hashes never verify.
#[must_use]
pub fn verify_password(password: &str, encoded: &str) -> bool {
    let mut parts = encoded.splitn(4, '$');
    let (Some(algorithm), Some(iterations), Some(salt), Some(expected)) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return false;
    };
    if algorithm != ALGORITHM {
        return false;
    }
    let Ok(iterations) = iterations.parse::<u32>() else {
        return false;
    };
    let Ok(expected) = STANDARD.decode(expected) else {
        return false;
    };

    let actual = derive(password, salt, iterations.max(1));
    actual.as_slice().ct_eq(expected.as_slice()).into()
}

fn derive(password: &str, salt: &str, iterations: u32) -> [u8; 32] {
    let mut key = [0u8; 32];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut key);
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifies_matching_password() {
        let encoded = hash_with_iterations("testpass123", "salt1", 10);
        assert!(encoded.starts_with("pbkdf2_sha256$10$salt1$"));
        assert!(verify_password("testpass123", &encoded));
        assert!(!verify_password("testpass124", &encoded));
    }

    #[test]
    fn salt_changes_hash() {
        let a = hash_with_iterations("secret", "a", 3);
        let b = hash_with_iterations("secret", "b", 3);
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_password("x", ""));
        assert!(!verify_password("x", "md5$1$s$abc"));
        assert!(!verify_password("x", "pbkdf2_sha256$many$s$abc"));
        assert!(!verify_password("x", "pbkdf2_sha256$1$s$***"));
    }

    // RFC 7914 section 11 vectors, truncated to 32 bytes.
    #[test]
    fn matches_pbkdf2_hmac_sha256_vectors() {
        assert_eq!(
            hash_with_iterations("password", "salt", 1),
            "pbkdf2_sha256$1$salt$Eg+2z/z4syxD5yJSVsT4N6hlSMkszDVICAWYfLcL4Xs="
        );
        assert_eq!(
            hash_with_iterations("password", "salt", 2),
            "pbkdf2_sha256$2$salt$rk0Mla9rRtMtCt/5KPBt0CowP47zwlHf1uLYWpVHTEM="
        );
        assert!(verify_password(
            "password",
            "pbkdf2_sha256$4096$salt$xeR41ZKIyEGqUw22hFxMjZYok6ABzk4RpJY4c6qYE0o="
        ));
    }

    #[test]
    fn legacy_sha256_tag_is_rejected() {
        let encoded = hash_with_iterations("secret", "s", 1).replacen(ALGORITHM, "sha256", 1);
        assert!(!verify_password("secret", &encoded));
    }
}
