//! In-memory session key cache.
//!
//! Holds at most one public and one private identity key for the lifetime of
//! the process.
//!
//! # Invariant
//!
//! Slots are write-once. Once populated, a slot keeps its first value until
//! [`SessionKeyCache::clear_all`]; later writes are ignored and logged.

use std::sync::RwLock;

use tracing::{debug, warn};

use crate::types::{KeyHandle, KeyKind, PrivateKey, PublicKey};

#[derive(Default)]
struct Slots {
    public: Option<PublicKey>,
    private: Option<PrivateKey>,
}

/// Write-once holder for the session's identity keys.
#[derive(Default)]
pub struct SessionKeyCache {
    slots: RwLock<Slots>,
}

impl SessionKeyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_public(&self) -> Option<PublicKey> {
        self.slots.read().ok().and_then(|s| s.public.clone())
    }

    pub fn get_private(&self) -> Option<PrivateKey> {
        self.slots.read().ok().and_then(|s| s.private.clone())
    }

    /// Store the public key unless one is already cached.
    ///
    /// Returns true if the key was stored.
    pub fn set_public_once(&self, key: PublicKey) -> bool {
        self.set_once(KeyHandle::Public(key))
    }

    /// Store the private key unless one is already cached.
    ///
    /// Returns true if the key was stored.
    pub fn set_private_once(&self, key: PrivateKey) -> bool {
        self.set_once(KeyHandle::Private(key))
    }

    /// Drop both slots.
    pub fn clear_all(&self) {
        if let Ok(mut slots) = self.slots.write() {
            *slots = Slots::default();
            debug!("Session key cache cleared");
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slots
            .read()
            .map(|s| s.public.is_none() && s.private.is_none())
            .unwrap_or(true)
    }

    /// Fingerprint of the cached public key, if any.
    pub fn fingerprint(&self) -> Option<String> {
        self.get_public().map(|k| k.fingerprint())
    }

    fn set_once(&self, key: KeyHandle) -> bool {
        let kind = key.kind();
        let fingerprint = key.fingerprint();

        let Ok(mut slots) = self.slots.write() else {
            warn!(%kind, "Session key cache lock poisoned; key not stored");
            return false;
        };

        let stored = match key {
            KeyHandle::Public(k) if slots.public.is_none() => {
                slots.public = Some(k);
                true
            }
            KeyHandle::Private(k) if slots.private.is_none() => {
                slots.private = Some(k);
                true
            }
            _ => false,
        };

        if stored {
            debug!(%kind, %fingerprint, "Cached session key");
        } else {
            warn!(%kind, %fingerprint, "Ignored write to populated session key slot");
        }
        stored
    }

    /// Which slots are populated, for diagnostics.
    pub fn populated(&self) -> Vec<KeyKind> {
        let mut kinds = Vec::with_capacity(2);
        if let Ok(slots) = self.slots.read() {
            if slots.public.is_some() {
                kinds.push(KeyKind::Public);
            }
            if slots.private.is_some() {
                kinds.push(KeyKind::Private);
            }
        }
        kinds
    }
}
