//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::{Arc, OnceLock};

use e2ee_keyring::api::InMemoryKeyService;
use e2ee_keyring::e2ee::{codec, generate, wrap, KeyLifecycle, SessionKeyCache};
use e2ee_keyring::types::KeyPair;

/// One generated key pair per test binary.
pub fn pair() -> &'static KeyPair {
    static PAIR: OnceLock<KeyPair> = OnceLock::new();
    PAIR.get_or_init(|| generate().expect("key generation"))
}

/// A second, unrelated key pair.
pub fn other_pair() -> &'static KeyPair {
    static PAIR: OnceLock<KeyPair> = OnceLock::new();
    PAIR.get_or_init(|| generate().expect("key generation"))
}

pub fn public_pem(pair: &KeyPair) -> String {
    codec::encode_public(&pair.public_key).expect("public key PEM")
}

/// A remote that already holds `pair()` wrapped under `password`.
pub fn remote_with_keys(password: &str) -> Arc<InMemoryKeyService> {
    let wrapped = wrap(&pair().private_key, password).expect("wrap");
    Arc::new(InMemoryKeyService::with_stored(public_pem(pair()), wrapped))
}

pub fn lifecycle_for(remote: Arc<InMemoryKeyService>) -> KeyLifecycle {
    KeyLifecycle::new(remote, Arc::new(SessionKeyCache::new()))
}
