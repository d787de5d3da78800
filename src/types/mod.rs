//! Shared types: the crate error and typed key handles.

pub mod error;
pub mod keys;

pub use error::{E2eeError, Result};
pub use keys::{KeyHandle, KeyKind, KeyPair, PrivateKey, PublicKey};
