//! Key pair verification by canary round trip.
//!
//! This is the single authority for "this key pair is usable": neither a
//! freshly generated pair nor a recovered one is trusted until it passes.

use tracing::debug;

use super::cache::SessionKeyCache;
use super::codec;
use crate::types::{PrivateKey, PublicKey};

/// Known plaintext encrypted with the public key and expected back from the
/// private key.
pub const CANARY: &str = "e2ee-keyring canary: the quick brown fox";

/// Check that `public_key` and `private_key` are a matched pair.
///
/// Codec failures are converted to `false`, never propagated.
pub fn verify(public_key: &PublicKey, private_key: &PrivateKey) -> bool {
    let ciphertext = match codec::encrypt(public_key, CANARY) {
        Ok(c) => c,
        Err(e) => {
            debug!(error = %e, "Canary encryption failed");
            return false;
        }
    };

    match codec::decrypt(private_key, &ciphertext) {
        Ok(plaintext) => plaintext == CANARY,
        Err(e) => {
            debug!(error = %e, "Canary decryption failed");
            false
        }
    }
}

/// Verify whatever is currently cached. An empty slot fails verification.
pub fn verify_cached(cache: &SessionKeyCache) -> bool {
    match (cache.get_public(), cache.get_private()) {
        (Some(public_key), Some(private_key)) => verify(&public_key, &private_key),
        _ => false,
    }
}
