//! Key lifecycle orchestrator.
//!
//! Drives setup vs. recovery of the user's identity key pair:
//!
//! ```text
//! Start → CheckingRemote ─┬─ found ──→ Recovering ──→ Verifying ─┬→ Ready
//!              ↑          └─ absent ─→ Provisioning              └→ Failed
//!              └───────── accepted ────────┘
//! ```
//!
//! Provisioning never trusts the locally generated pair: after the remote
//! accepts it, the run goes back to `CheckingRemote` and recovers what the
//! remote actually stored. Every path ends at the same verification gate.
//! Only `Verifying → Ready` publishes the session as usable.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use super::cache::SessionKeyCache;
use super::{codec, envelope, generator, verifier};
use crate::api::{Lookup, RemoteKeyService, SubmitOutcome};
use crate::types::{E2eeError, KeyKind, Result};

/// States of a lifecycle run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Start,
    CheckingRemote,
    Recovering,
    Provisioning,
    Verifying,
    Ready,
    Failed,
}

/// How a successful run obtained its key pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecyclePath {
    /// The remote already held key material for this user.
    Recovered,
    /// New key material was generated, submitted, and fetched back.
    Provisioned,
}

impl fmt::Display for LifecyclePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifecyclePath::Recovered => write!(f, "recovered"),
            LifecyclePath::Provisioned => write!(f, "provisioned"),
        }
    }
}

/// Result of a run that reached `Ready`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleOutcome {
    pub path: LifecyclePath,
    /// Fingerprint of the verified public key
    pub fingerprint: String,
}

/// What a single run has learned so far.
#[derive(Debug, Default)]
struct RunContext {
    /// New key material was submitted in this run.
    provisioned: bool,
    /// The fetched private key could not be unwrapped.
    unwrap_failed: bool,
    /// A fetched key differs from the one already cached, so the cached
    /// pair is not what the remote holds.
    stale_cache: bool,
}

/// The single entry point for establishing the session's identity keys.
pub struct KeyLifecycle {
    remote: Arc<dyn RemoteKeyService>,
    cache: Arc<SessionKeyCache>,
    ready: AtomicBool,
    in_flight: Mutex<()>,
}

impl KeyLifecycle {
    pub fn new(remote: Arc<dyn RemoteKeyService>, cache: Arc<SessionKeyCache>) -> Self {
        Self {
            remote,
            cache,
            ready: AtomicBool::new(false),
            in_flight: Mutex::new(()),
        }
    }

    pub fn cache(&self) -> &Arc<SessionKeyCache> {
        &self.cache
    }

    /// True only after a run has passed verification and the cache still
    /// holds the verified pair.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst) && !self.cache.is_empty()
    }

    /// Run the lifecycle with the user's password.
    ///
    /// Concurrent calls are serialized. On verification failure the session
    /// cache is cleared and [`E2eeError::Password`] is returned; every other
    /// error propagates unchanged and leaves the cache as it was.
    pub async fn initialize(&self, password: &str) -> Result<LifecycleOutcome> {
        let _guard = self.in_flight.lock().await;
        self.ready.store(false, Ordering::SeqCst);

        let password = Zeroizing::new(password.to_owned());
        let mut state = LifecycleState::Start;
        let mut run = RunContext::default();

        loop {
            debug!(?state, "Key lifecycle state");

            let next = match state {
                LifecycleState::Start => Ok(LifecycleState::CheckingRemote),
                LifecycleState::CheckingRemote => self.check_remote(&mut run).await,
                LifecycleState::Recovering => self.recover(&password, &mut run).await,
                LifecycleState::Provisioning => {
                    let next = self.provision(&password).await;
                    run.provisioned = next.is_ok();
                    next
                }
                LifecycleState::Verifying => self.verify(&run).await,
                LifecycleState::Ready => {
                    self.ready.store(true, Ordering::SeqCst);
                    let outcome = LifecycleOutcome {
                        path: if run.provisioned {
                            LifecyclePath::Provisioned
                        } else {
                            LifecyclePath::Recovered
                        },
                        fingerprint: self.cache.fingerprint().unwrap_or_default(),
                    };
                    info!(path = %outcome.path, fingerprint = %outcome.fingerprint, "E2EE keys ready");
                    return Ok(outcome);
                }
                LifecycleState::Failed => {
                    self.cache.clear_all();
                    warn!("E2EE key verification failed; session keys cleared");
                    return Err(E2eeError::Password);
                }
            };

            state = match next {
                Ok(next) => next,
                Err(e) => {
                    warn!(?state, error = %e, "Key lifecycle aborted");
                    return Err(e);
                }
            };
        }
    }

    /// Ask the remote whether key material exists.
    async fn check_remote(&self, run: &mut RunContext) -> Result<LifecycleState> {
        match self.remote.fetch_public_key().await? {
            Lookup::Found(pem) => {
                let public_key = codec::decode_public(&pem)?;
                let fingerprint = public_key.fingerprint();
                if !self.cache.set_public_once(public_key) {
                    self.note_cached_fingerprint(run, KeyKind::Public, &fingerprint);
                }
                Ok(LifecycleState::Recovering)
            }
            Lookup::NotFound(detail) if run.provisioned => Err(E2eeError::Remote(format!(
                "Submitted E2EE keys were accepted but are not available: {detail}"
            ))),
            Lookup::NotFound(detail) => {
                info!(%detail, "No E2EE keys registered; provisioning");
                Ok(LifecycleState::Provisioning)
            }
        }
    }

    /// Fetch and unwrap the private key.
    ///
    /// An unwrap failure is not an error here: the run moves on to
    /// verification, which fails it.
    async fn recover(
        &self,
        password: &Zeroizing<String>,
        run: &mut RunContext,
    ) -> Result<LifecycleState> {
        let wrapped = match self.remote.fetch_wrapped_private_key().await {
            Ok(Lookup::Found(wrapped)) => wrapped,
            Ok(Lookup::NotFound(detail)) => {
                return Err(E2eeError::Remote(format!(
                    "An error occurred while trying to fetch your E2EE private key: {detail}"
                )))
            }
            Err(E2eeError::KeyUnwrap(reason)) => {
                warn!(%reason, "Stored private key is malformed");
                run.unwrap_failed = true;
                return Ok(LifecycleState::Verifying);
            }
            Err(e) => return Err(e),
        };

        let password = password.clone();
        let unwrapped =
            tokio::task::spawn_blocking(move || envelope::unwrap(&wrapped, &password)).await?;

        match unwrapped {
            Ok(private_key) => {
                let fingerprint = private_key.fingerprint();
                if !self.cache.set_private_once(private_key) {
                    self.note_cached_fingerprint(run, KeyKind::Private, &fingerprint);
                }
            }
            Err(E2eeError::KeyUnwrap(reason)) => {
                warn!(%reason, "Private key unwrap failed");
                run.unwrap_failed = true;
            }
            Err(e) => return Err(e),
        }

        Ok(LifecycleState::Verifying)
    }

    /// A write-once slot kept its earlier key. Flag the run if that key is
    /// not the one just fetched.
    fn note_cached_fingerprint(&self, run: &mut RunContext, kind: KeyKind, fetched: &str) {
        let cached = match kind {
            KeyKind::Public => self.cache.get_public().map(|k| k.fingerprint()),
            KeyKind::Private => self.cache.get_private().map(|k| k.fingerprint()),
        };

        if cached.as_deref() != Some(fetched) {
            warn!(%kind, %fetched, cached = ?cached, "Remote key differs from cached session key");
            run.stale_cache = true;
        }
    }

    /// Generate, wrap, and submit a fresh key pair.
    async fn provision(&self, password: &Zeroizing<String>) -> Result<LifecycleState> {
        let password = password.clone();
        let (public_pem, wrapped) = tokio::task::spawn_blocking(move || {
            let pair = generator::generate()?;
            let wrapped = envelope::wrap(&pair.private_key, &password)?;
            let public_pem = codec::encode_public(&pair.public_key)?;
            debug!(fingerprint = %pair.public_key.fingerprint(), "Generated E2EE key pair");
            Ok::<_, E2eeError>((public_pem, wrapped))
        })
        .await??;

        match self.remote.submit_key_material(&public_pem, &wrapped).await? {
            SubmitOutcome::Accepted => {
                info!("E2EE key material accepted by remote");
                Ok(LifecycleState::CheckingRemote)
            }
            SubmitOutcome::Rejected(reason) => Err(E2eeError::Remote(format!(
                "An error occurred while trying to setup E2EE: {reason}"
            ))),
        }
    }

    /// Run the canary check against whatever is cached.
    ///
    /// A run whose own unwrap failed, or whose fetched keys differ from the
    /// cached ones, never passes, even if an earlier run left a verified pair
    /// in the write-once cache.
    async fn verify(&self, run: &RunContext) -> Result<LifecycleState> {
        if run.unwrap_failed || run.stale_cache {
            return Ok(LifecycleState::Failed);
        }

        let (public_key, private_key) = match (self.cache.get_public(), self.cache.get_private())
        {
            (Some(public_key), Some(private_key)) => (public_key, private_key),
            _ => return Ok(LifecycleState::Failed),
        };

        let matched =
            tokio::task::spawn_blocking(move || verifier::verify(&public_key, &private_key))
                .await?;

        Ok(if matched {
            LifecycleState::Ready
        } else {
            LifecycleState::Failed
        })
    }
}
