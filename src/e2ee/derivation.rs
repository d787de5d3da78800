//! Password-based key derivation.
//!
//! # Algorithm
//!
//! PBKDF2 with HMAC-SHA-256, 100 000 iterations, 32-byte output.
//!
//! The derived key is the passphrase of the wrapped private key container.
//! It is never persisted and is zeroized when dropped.

use pbkdf2::pbkdf2_hmac;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

// =============================================================================
// Constants
// =============================================================================

/// PBKDF2 iteration count
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Salt length for key derivation (16 bytes)
pub const SALT_LEN: usize = 16;

/// Derived key length (32 bytes)
pub const DERIVED_KEY_LEN: usize = 32;

// =============================================================================
// Derived Key
// =============================================================================

/// A 32-byte symmetric key derived from a password and salt.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey([u8; DERIVED_KEY_LEN]);

impl DerivedKey {
    pub fn as_bytes(&self) -> &[u8; DERIVED_KEY_LEN] {
        &self.0
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("DerivedKey(<redacted>)")
    }
}

// =============================================================================
// Derivation
// =============================================================================

/// Derive the wrapping key for `password` under `salt`.
///
/// Deterministic: the same (password, salt) always yields the same key.
/// Total over its inputs. CPU-bound; async callers should run it on the
/// blocking pool.
pub fn derive(password: &str, salt: &[u8; SALT_LEN]) -> DerivedKey {
    let mut key = [0u8; DERIVED_KEY_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ITERATIONS, &mut key);
    let derived = DerivedKey(key);
    key.zeroize();
    derived
}

/// Generate cryptographically secure random bytes.
pub fn generate_random_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derivation_is_deterministic() {
        let salt: [u8; SALT_LEN] = generate_random_bytes();

        let key1 = derive("test-password-123", &salt);
        let key2 = derive("test-password-123", &salt);
        assert_eq!(key1.as_bytes(), key2.as_bytes());

        // Different salt = different key
        let salt2: [u8; SALT_LEN] = generate_random_bytes();
        let key3 = derive("test-password-123", &salt2);
        assert_ne!(key1.as_bytes(), key3.as_bytes());

        // Different password = different key
        let key4 = derive("test-password-124", &salt);
        assert_ne!(key1.as_bytes(), key4.as_bytes());
    }

    #[test]
    fn test_rfc_style_vector() {
        // PBKDF2-HMAC-SHA256("password", "salt", 1, 32) is a published vector;
        // check the primitive wiring against it before trusting the iterated form.
        let mut out = [0u8; 32];
        pbkdf2_hmac::<Sha256>(b"password", b"salt", 1, &mut out);
        assert_eq!(
            hex::encode(out),
            "120fb6cffcf8b32c43e7225256c4f837a86548c92ccc35480805987cb70be17b"
        );
    }

    #[test]
    fn test_empty_password_is_valid_input() {
        let salt = [7u8; SALT_LEN];
        let key = derive("", &salt);
        assert_eq!(key.as_bytes().len(), DERIVED_KEY_LEN);
        assert_ne!(key.as_bytes(), &[0u8; DERIVED_KEY_LEN]);
    }

    #[test]
    fn test_random_bytes() {
        let bytes1: [u8; 16] = generate_random_bytes();
        let bytes2: [u8; 16] = generate_random_bytes();
        assert_ne!(bytes1, bytes2);
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = derive("pw", &[1u8; SALT_LEN]);
        assert_eq!(format!("{key:?}"), "DerivedKey(<redacted>)");
    }
}
