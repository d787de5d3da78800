//! Shared key pairs for unit tests. RSA generation is slow, so each fixture
//! is generated once per test binary.

use std::sync::OnceLock;

use super::generator::generate;
use crate::types::KeyPair;

pub(crate) fn first_pair() -> &'static KeyPair {
    static PAIR: OnceLock<KeyPair> = OnceLock::new();
    PAIR.get_or_init(|| generate().expect("key generation"))
}

pub(crate) fn second_pair() -> &'static KeyPair {
    static PAIR: OnceLock<KeyPair> = OnceLock::new();
    PAIR.get_or_init(|| generate().expect("key generation"))
}
