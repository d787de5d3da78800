//! e2ee-keyring - client-side identity keys for end-to-end encryption
//!
//! The remote key service stores a user's public key and a password-wrapped
//! copy of the private key. It never sees the password or plaintext private
//! key, and nothing it returns is trusted before local verification.
//!
//! ## Components
//!
//! - **e2ee**: derivation, key generation, OAEP codec, private key envelope,
//!   canary verifier, session key cache, and the lifecycle orchestrator
//! - **api**: the remote key service boundary, its HTTP client and an
//!   in-memory implementation
//! - **config**: CLI arguments and environment handling

pub mod api;
pub mod config;
pub mod e2ee;
pub mod types;

pub use config::Args;
pub use types::{E2eeError, Result};
