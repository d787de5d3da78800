//! Remote key service boundary.
//!
//! The remote holds the public key and the password-wrapped private key but
//! never any plaintext key material. Nothing it returns is trusted until the
//! key lifecycle has verified it.
//!
//! "Not found" and "rejected" are ordinary outcomes ([`Lookup::NotFound`],
//! [`SubmitOutcome::Rejected`]); only transport-level failures are errors.

pub mod client;
pub mod memory;
pub mod models;

use async_trait::async_trait;

use crate::e2ee::WrappedPrivateKey;
use crate::types::Result;

pub use client::{ApiClient, ApiConfig};
pub use memory::InMemoryKeyService;

/// Result of a lookup against the remote key service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    /// The remote answered with a structured "not present" message.
    NotFound(String),
}

impl<T> Lookup<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }
}

/// Result of submitting new key material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted,
    Rejected(String),
}

/// The remote party that stores a user's public key and wrapped private key.
#[async_trait]
pub trait RemoteKeyService: Send + Sync {
    /// Fetch the stored public key (SubjectPublicKeyInfo PEM).
    async fn fetch_public_key(&self) -> Result<Lookup<String>>;

    /// Fetch the stored wrapped private key and its salt.
    async fn fetch_wrapped_private_key(&self) -> Result<Lookup<WrappedPrivateKey>>;

    /// Submit a new public key together with its wrapped private key.
    async fn submit_key_material(
        &self,
        public_key_pem: &str,
        wrapped: &WrappedPrivateKey,
    ) -> Result<SubmitOutcome>;
}
