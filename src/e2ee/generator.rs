//! Identity key pair generation.

use rand::rngs::OsRng;
use rsa::{BigUint, RsaPrivateKey};

use crate::types::{E2eeError, KeyPair, PrivateKey, Result};

/// RSA modulus size in bits
pub const RSA_KEY_BITS: usize = 2048;

/// RSA public exponent
pub const RSA_PUBLIC_EXPONENT: u64 = 65537;

/// Generate a new RSA identity key pair.
///
/// Uses the OS cryptographically secure random number generator. Failure
/// means entropy or resource exhaustion and is not retried.
pub fn generate() -> Result<KeyPair> {
    let exponent = BigUint::from(RSA_PUBLIC_EXPONENT);
    let rsa_key = RsaPrivateKey::new_with_exp(&mut OsRng, RSA_KEY_BITS, &exponent)
        .map_err(|e| E2eeError::KeyGeneration(e.to_string()))?;

    let private_key = PrivateKey::new(rsa_key);
    Ok(KeyPair {
        public_key: private_key.public_key(),
        private_key,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::e2ee::test_support::first_pair;
    use rsa::traits::PublicKeyParts;

    #[test]
    fn test_keypair_parameters() {
        let pair = first_pair();
        let public = pair.public_key.as_rsa();

        assert_eq!(public.size() * 8, RSA_KEY_BITS);
        assert_eq!(public.e(), &BigUint::from(RSA_PUBLIC_EXPONENT));
        assert_eq!(pair.private_key.public_key(), pair.public_key);
    }

    #[test]
    fn test_generation_is_not_deterministic() {
        let a = generate().unwrap();
        let b = generate().unwrap();
        assert_ne!(a.public_key, b.public_key);
    }
}
