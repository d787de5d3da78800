//! Typed key handles.
//!
//! RSA primitives are never passed around as untyped blobs: public and
//! private halves have their own newtypes, and code that must hold either one
//! uses [`KeyHandle`].

use std::fmt;

use rsa::pkcs8::EncodePublicKey;
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};

/// An RSA public key.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey(RsaPublicKey);

/// An RSA private key. `Debug` never prints key material.
#[derive(Clone)]
pub struct PrivateKey(RsaPrivateKey);

impl PublicKey {
    pub fn new(key: RsaPublicKey) -> Self {
        Self(key)
    }

    pub fn as_rsa(&self) -> &RsaPublicKey {
        &self.0
    }

    /// Lowercase hex SHA-256 over the SubjectPublicKeyInfo DER.
    ///
    /// This is what gets logged in place of key material.
    pub fn fingerprint(&self) -> String {
        match self.0.to_public_key_der() {
            Ok(der) => hex::encode(Sha256::digest(der.as_bytes())),
            Err(_) => "unencodable".to_string(),
        }
    }
}

impl PrivateKey {
    pub fn new(key: RsaPrivateKey) -> Self {
        Self(key)
    }

    pub fn as_rsa(&self) -> &RsaPrivateKey {
        &self.0
    }

    /// The public half of this key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey(self.0.to_public_key())
    }

    /// Fingerprint of the public half.
    pub fn fingerprint(&self) -> String {
        self.public_key().fingerprint()
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PublicKey").field(&self.fingerprint()).finish()
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PrivateKey").field(&"<redacted>").finish()
    }
}

/// A freshly generated identity key pair.
#[derive(Debug, Clone)]
pub struct KeyPair {
    pub public_key: PublicKey,
    pub private_key: PrivateKey,
}

/// Which half of a key pair a handle holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Public,
    Private,
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyKind::Public => write!(f, "public"),
            KeyKind::Private => write!(f, "private"),
        }
    }
}

/// Either half of an identity key pair.
#[derive(Debug, Clone)]
pub enum KeyHandle {
    Public(PublicKey),
    Private(PrivateKey),
}

impl KeyHandle {
    pub fn kind(&self) -> KeyKind {
        match self {
            KeyHandle::Public(_) => KeyKind::Public,
            KeyHandle::Private(_) => KeyKind::Private,
        }
    }

    pub fn fingerprint(&self) -> String {
        match self {
            KeyHandle::Public(key) => key.fingerprint(),
            KeyHandle::Private(key) => key.fingerprint(),
        }
    }
}

impl From<PublicKey> for KeyHandle {
    fn from(key: PublicKey) -> Self {
        KeyHandle::Public(key)
    }
}

impl From<PrivateKey> for KeyHandle {
    fn from(key: PrivateKey) -> Self {
        KeyHandle::Private(key)
    }
}
