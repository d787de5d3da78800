//! End-to-end-encryption identity keys
//!
//! Establishes the user's RSA identity key pair for a session without ever
//! handing plaintext key material to the remote service.
//!
//! # Architecture
//!
//! - Key pair: RSA-2048, e = 65537
//! - Private key is wrapped with the user's password (PBKDF2-SHA-256 derived
//!   passphrase over an encrypted PKCS#8 container) and escrowed remotely
//! - Public key and wrapped private key are fetched back and unwrapped locally
//! - A canary round trip (RSA-OAEP) gates every path before keys are usable
//! - Verified keys live in a write-once in-memory cache for the session

pub mod cache;
pub mod codec;
pub mod derivation;
pub mod envelope;
pub mod generator;
pub mod lifecycle;
pub mod verifier;

#[cfg(test)]
pub(crate) mod test_support;

pub use cache::SessionKeyCache;
pub use derivation::{derive, DerivedKey, PBKDF2_ITERATIONS, SALT_LEN};
pub use envelope::{unwrap, wrap, WrappedPrivateKey};
pub use generator::generate;
pub use lifecycle::{KeyLifecycle, LifecycleOutcome, LifecyclePath, LifecycleState};
pub use verifier::{verify, verify_cached};
