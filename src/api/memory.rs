//! In-process remote key service.
//!
//! Stores key material the way the HTTP service would (PEM text plus hex
//! salt) and can be configured to misbehave: fail lookups, reject or drop
//! submissions, withhold the private key. Used by the test suites and by
//! the CLI's `--offline` mode.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use super::{Lookup, RemoteKeyService, SubmitOutcome};
use crate::e2ee::WrappedPrivateKey;
use crate::types::{E2eeError, Result};

#[derive(Default)]
struct StoredMaterial {
    public_key_pem: Option<String>,
    wrapped: Option<WrappedPrivateKey>,
}

/// In-memory [`RemoteKeyService`] with fault injection.
#[derive(Default)]
pub struct InMemoryKeyService {
    stored: Mutex<StoredMaterial>,
    public_lookup_status: Option<u16>,
    reject_reason: Option<String>,
    drop_submissions: bool,
    withhold_private_key: bool,
    public_fetches: AtomicU32,
    private_fetches: AtomicU32,
    submissions: AtomicU32,
}

impl InMemoryKeyService {
    /// An empty service: no key material registered yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// A service that already holds key material.
    pub fn with_stored(public_key_pem: impl Into<String>, wrapped: WrappedPrivateKey) -> Self {
        Self {
            stored: Mutex::new(StoredMaterial {
                public_key_pem: Some(public_key_pem.into()),
                wrapped: Some(wrapped),
            }),
            ..Default::default()
        }
    }

    /// Make every public key lookup fail with the given HTTP status.
    pub fn with_public_lookup_failure(mut self, status: u16) -> Self {
        self.public_lookup_status = Some(status);
        self
    }

    /// Reject every submission with `reason`.
    pub fn rejecting_submissions(mut self, reason: impl Into<String>) -> Self {
        self.reject_reason = Some(reason.into());
        self
    }

    /// Accept submissions but never store them.
    pub fn dropping_submissions(mut self) -> Self {
        self.drop_submissions = true;
        self
    }

    /// Answer private key lookups with "not found" even when one is stored.
    pub fn withholding_private_key(mut self) -> Self {
        self.withhold_private_key = true;
        self
    }

    /// Replace the stored public key, as a tampering server would.
    pub async fn replace_public_key(&self, public_key_pem: impl Into<String>) {
        self.stored.lock().await.public_key_pem = Some(public_key_pem.into());
    }

    pub async fn stored_public_key(&self) -> Option<String> {
        self.stored.lock().await.public_key_pem.clone()
    }

    pub async fn stored_wrapped_key(&self) -> Option<WrappedPrivateKey> {
        self.stored.lock().await.wrapped.clone()
    }

    pub fn public_fetch_count(&self) -> u32 {
        self.public_fetches.load(Ordering::SeqCst)
    }

    pub fn private_fetch_count(&self) -> u32 {
        self.private_fetches.load(Ordering::SeqCst)
    }

    pub fn submission_count(&self) -> u32 {
        self.submissions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteKeyService for InMemoryKeyService {
    async fn fetch_public_key(&self) -> Result<Lookup<String>> {
        self.public_fetches.fetch_add(1, Ordering::SeqCst);

        if let Some(status) = self.public_lookup_status {
            return Err(E2eeError::UnexpectedStatus {
                url: "memory://e2ee/public".to_string(),
                status,
                body: String::new(),
            });
        }

        Ok(match &self.stored.lock().await.public_key_pem {
            Some(pem) => Lookup::Found(pem.clone()),
            None => Lookup::NotFound("No E2EE public key registered".to_string()),
        })
    }

    async fn fetch_wrapped_private_key(&self) -> Result<Lookup<WrappedPrivateKey>> {
        self.private_fetches.fetch_add(1, Ordering::SeqCst);

        let stored = self.stored.lock().await;
        Ok(match (&stored.wrapped, self.withhold_private_key) {
            (Some(wrapped), false) => Lookup::Found(wrapped.clone()),
            _ => Lookup::NotFound("No E2EE private key registered".to_string()),
        })
    }

    async fn submit_key_material(
        &self,
        public_key_pem: &str,
        wrapped: &WrappedPrivateKey,
    ) -> Result<SubmitOutcome> {
        self.submissions.fetch_add(1, Ordering::SeqCst);

        if let Some(reason) = &self.reject_reason {
            return Ok(SubmitOutcome::Rejected(reason.clone()));
        }

        let mut stored = self.stored.lock().await;
        if stored.public_key_pem.is_some() {
            return Ok(SubmitOutcome::Rejected(
                "E2EE keys are already registered".to_string(),
            ));
        }

        if !self.drop_submissions {
            stored.public_key_pem = Some(public_key_pem.to_string());
            stored.wrapped = Some(wrapped.clone());
        }
        debug!(salt = %wrapped.salt_hex(), "Stored submitted key material");

        Ok(SubmitOutcome::Accepted)
    }
}
