//! Configuration for e2ee-keyring
//!
//! CLI arguments and environment variable handling using clap.

use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::api::ApiConfig;

/// e2ee-keyring - end-to-end-encryption identity keys for the game client
#[derive(Parser, Debug, Clone)]
#[command(name = "e2ee-keyring")]
#[command(about = "Set up and recover E2EE identity keys against the remote key service")]
pub struct Args {
    /// Base URL of the remote key service
    #[arg(long, env = "E2EE_BASE_URL", default_value = "https://tcg.lemon.industries")]
    pub base_url: String,

    /// API key sent as X-API-Key on every request
    #[arg(long, env = "E2EE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Request timeout in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "30000")]
    pub request_timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Provision or recover the E2EE key pair and verify it
    SetupE2ee {
        /// Password protecting the private key
        #[arg(long, env = "E2EE_PASSWORD", hide_env_values = true)]
        password: String,

        /// Run against an in-process key service instead of the network
        #[arg(long, default_value = "false")]
        offline: bool,
    },

    /// Check that the key service answers
    Ping,

    /// Report whether the key service holds a public key
    Status,
}

impl Args {
    /// Validate configuration before any work starts.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(format!(
                "E2EE_BASE_URL must start with http:// or https://, got '{}'",
                self.base_url
            ));
        }

        if self.request_timeout_ms == 0 {
            return Err("REQUEST_TIMEOUT_MS must be greater than zero".to_string());
        }

        if let Command::SetupE2ee { password, .. } = &self.command {
            if password.is_empty() {
                return Err("E2EE password must not be empty".to_string());
            }
        }

        Ok(())
    }

    /// The subset of configuration the HTTP client needs.
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            timeout: Duration::from_millis(self.request_timeout_ms),
        }
    }
}
