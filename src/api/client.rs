//! HTTP client for the remote key service.
//!
//! Every request carries the `X-API-Key` header. Responses are classified as:
//!
//! - `200`: typed payload
//! - `400`: structured domain failure (`{"detail": ...}`), returned as an outcome
//!   by the `/e2ee` endpoints; `/ping` expects only `200`
//! - `403`: [`E2eeError::InvalidApiKey`]
//! - anything else: [`E2eeError::UnexpectedStatus`], fatal and unretried

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::models::{
    pem_from_wire, pem_to_header, E2eeEncryptedPrivateKey, E2eePublicKey, ErrorResponse,
    MessageResponse, API_KEY_HEADER, ENCRYPTED_PRIVATE_KEY_HEADER, PUBLIC_KEY_HEADER,
    SALT_HEX_HEADER,
};
use super::{Lookup, RemoteKeyService, SubmitOutcome};
use crate::e2ee::WrappedPrivateKey;
use crate::types::{E2eeError, Result};

/// Client configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL of the key service (e.g. "https://tcg.lemon.industries")
    pub base_url: String,
    /// API credential; requests fail with `CredentialMissing` without it
    pub api_key: Option<String>,
    /// Request timeout
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://tcg.lemon.industries".to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// A response after status classification.
enum Reply<T> {
    Ok(T),
    Domain(ErrorResponse),
}

/// HTTP implementation of [`RemoteKeyService`], plus the `/ping` probe.
pub struct ApiClient {
    config: ApiConfig,
    http: Client,
}

impl ApiClient {
    /// Create a new client. No request is made until an operation is called.
    pub fn new(config: ApiConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| E2eeError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Join path segments onto the base URL.
    pub fn generate_url(&self, endpoint_path: &[&str]) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint_path.join("/")
        )
    }

    /// Check that the server is reachable and answers `Pong`.
    pub async fn ping(&self) -> Result<bool> {
        let url = self.generate_url(&["ping"]);
        let response = self.authorized(self.http.get(&url))?.send().await?;

        // Only 200 is expected here; a 400 has no domain meaning for ping
        if response.status() != StatusCode::OK {
            return Err(Self::failure(&url, response).await);
        }

        let msg: MessageResponse = response.json().await?;
        Ok(msg.message == "Pong")
    }

    /// Attach the API credential. Fails before any network traffic if none
    /// is configured.
    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        match self.config.api_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(request.header(API_KEY_HEADER, key)),
            _ => Err(E2eeError::CredentialMissing),
        }
    }

    async fn classify<T: DeserializeOwned>(
        &self,
        url: &str,
        response: Response,
    ) -> Result<Reply<T>> {
        debug!(%url, status = response.status().as_u16(), "Key service response");

        match response.status() {
            StatusCode::OK => Ok(Reply::Ok(response.json().await?)),
            StatusCode::BAD_REQUEST => Ok(Reply::Domain(response.json().await?)),
            _ => Err(Self::failure(url, response).await),
        }
    }

    /// Map a non-success response to its transport error.
    async fn failure(url: &str, response: Response) -> E2eeError {
        let status = response.status();

        if status == StatusCode::FORBIDDEN {
            return E2eeError::InvalidApiKey;
        }

        E2eeError::UnexpectedStatus {
            url: url.to_string(),
            status: status.as_u16(),
            body: response.text().await.unwrap_or_default(),
        }
    }
}

#[async_trait]
impl RemoteKeyService for ApiClient {
    async fn fetch_public_key(&self) -> Result<Lookup<String>> {
        let url = self.generate_url(&["e2ee", "public"]);
        let response = self.authorized(self.http.get(&url))?.send().await?;

        Ok(match self.classify::<E2eePublicKey>(&url, response).await? {
            Reply::Ok(body) => Lookup::Found(pem_from_wire(&body.key)),
            Reply::Domain(err) => Lookup::NotFound(err.detail),
        })
    }

    async fn fetch_wrapped_private_key(&self) -> Result<Lookup<WrappedPrivateKey>> {
        let url = self.generate_url(&["e2ee", "private"]);
        let response = self.authorized(self.http.get(&url))?.send().await?;

        match self
            .classify::<E2eeEncryptedPrivateKey>(&url, response)
            .await?
        {
            Reply::Ok(body) => {
                let wrapped = WrappedPrivateKey::from_wire(pem_from_wire(&body.key), &body.salt_hex)?;
                Ok(Lookup::Found(wrapped))
            }
            Reply::Domain(err) => Ok(Lookup::NotFound(err.detail)),
        }
    }

    async fn submit_key_material(
        &self,
        public_key_pem: &str,
        wrapped: &WrappedPrivateKey,
    ) -> Result<SubmitOutcome> {
        let url = self.generate_url(&["e2ee"]);
        let request = self
            .authorized(self.http.post(&url))?
            .header(PUBLIC_KEY_HEADER, pem_to_header(public_key_pem))
            .header(
                ENCRYPTED_PRIVATE_KEY_HEADER,
                pem_to_header(wrapped.ciphertext()),
            )
            .header(SALT_HEX_HEADER, wrapped.salt_hex());

        let response = request.send().await?;

        Ok(match self.classify::<E2eePublicKey>(&url, response).await? {
            Reply::Ok(_) => SubmitOutcome::Accepted,
            Reply::Domain(err) => SubmitOutcome::Rejected(err.detail),
        })
    }
}
