//! e2ee-keyring - command-line entry point and composition root

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use e2ee_keyring::{
    api::{ApiClient, InMemoryKeyService, Lookup, RemoteKeyService},
    config::{Args, Command},
    e2ee::{codec, KeyLifecycle, SessionKeyCache},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("e2ee_keyring={},info", args.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    match &args.command {
        Command::SetupE2ee { password, offline } => {
            let remote: Arc<dyn RemoteKeyService> = if *offline {
                info!("Using in-process key service (offline)");
                Arc::new(InMemoryKeyService::new())
            } else {
                info!("Key service: {}", args.base_url);
                Arc::new(ApiClient::new(args.api_config())?)
            };

            let lifecycle = KeyLifecycle::new(remote, Arc::new(SessionKeyCache::new()));
            let outcome = lifecycle.initialize(password).await?;

            println!("E2EE keys {} and verified", outcome.path);
            println!("Fingerprint: {}", outcome.fingerprint);
        }
        Command::Ping => {
            let client = ApiClient::new(args.api_config())?;
            if client.ping().await? {
                println!("Pong from {}", args.base_url);
            } else {
                println!("{} answered, but not with Pong", args.base_url);
            }
        }
        Command::Status => {
            let client = ApiClient::new(args.api_config())?;
            match client.fetch_public_key().await? {
                Lookup::Found(pem) => {
                    let key = codec::decode_public(&pem)?;
                    println!("E2EE public key registered");
                    println!("Fingerprint: {}", key.fingerprint());
                }
                Lookup::NotFound(detail) => {
                    println!("No E2EE public key registered ({detail})");
                }
            }
        }
    }

    Ok(())
}
