//! Instance metadata service client.
//!
//! # Responsibilities
//! - Obtain and cache IMDSv2 session tokens
//! - Read named metadata paths
//! - Classify each read as present, absent, or transient failure
//!
//! # Design Decisions
//! - No retries or sleeps here; retry policy belongs to the poller
//! - A 404 is the normal "nothing pending" answer, never an error
//! - The whole token + read sequence shares one timeout budget

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use tokio::sync::Mutex;
use tokio::time::{timeout, Instant};

use crate::config::MetadataConfig;
use crate::metadata::types::{MetadataError, RawMetadataResult};

/// Header carrying the requested token lifetime on the handshake call.
pub const TOKEN_TTL_HEADER: &str = "X-aws-ec2-metadata-token-ttl-seconds";

/// Header carrying the session token on metadata reads.
pub const TOKEN_HEADER: &str = "X-aws-ec2-metadata-token";

/// Tokens are refreshed up to this long before the service would expire them.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// How long a freshly issued token is reused.
///
/// The margin is capped at half the TTL so short-lived tokens are still
/// reused for part of their life.
fn token_reuse_window(ttl: Duration) -> Duration {
    ttl.saturating_sub(TOKEN_REFRESH_MARGIN.min(ttl / 2))
}

/// Read access to instance metadata.
#[async_trait]
pub trait MetadataClient: Send + Sync {
    /// Perform one best-effort read of `path`.
    async fn fetch(&self, path: &str) -> RawMetadataResult;
}

struct CachedToken {
    value: String,
    refresh_at: Instant,
}

/// IMDSv2 client over HTTP.
pub struct ImdsClient {
    http: reqwest::Client,
    endpoint: String,
    token_ttl: Duration,
    fetch_timeout: Duration,
    token: Mutex<Option<CachedToken>>,
}

impl ImdsClient {
    /// Create a client from metadata configuration.
    pub fn new(config: &MetadataConfig) -> Result<Self, MetadataError> {
        let fetch_timeout = config.fetch_timeout();
        // The link-local endpoint must never be routed through an HTTP proxy.
        let http = reqwest::Client::builder()
            .no_proxy()
            .timeout(fetch_timeout)
            .build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            token_ttl: config.token_ttl(),
            fetch_timeout,
            token: Mutex::new(None),
        })
    }

    fn token_url(&self) -> String {
        format!("{}/latest/api/token", self.endpoint)
    }

    fn metadata_url(&self, path: &str) -> String {
        format!(
            "{}/latest/meta-data/{}",
            self.endpoint,
            path.trim_start_matches('/')
        )
    }

    async fn session_token(&self) -> Result<String, MetadataError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.value.clone());
            }
        }

        let response = self
            .http
            .put(self.token_url())
            .header(TOKEN_TTL_HEADER, self.token_ttl.as_secs().to_string())
            .send()
            .await
            .map_err(|e| MetadataError::Token(e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(MetadataError::Token(format!("status {}", status.as_u16())));
        }

        let value = response
            .text()
            .await
            .map_err(|e| MetadataError::Token(e.to_string()))?
            .trim()
            .to_string();
        if value.is_empty() {
            return Err(MetadataError::Token("empty token".to_string()));
        }

        tracing::debug!(ttl_secs = self.token_ttl.as_secs(), "Obtained metadata session token");

        *cached = Some(CachedToken {
            value: value.clone(),
            refresh_at: Instant::now() + token_reuse_window(self.token_ttl),
        });
        Ok(value)
    }

    async fn invalidate_token(&self) {
        self.token.lock().await.take();
    }

    async fn read(&self, path: &str) -> Result<Option<String>, MetadataError> {
        let token = self.session_token().await?;

        let response = self
            .http
            .get(self.metadata_url(path))
            .header(TOKEN_HEADER, token)
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(Some(response.text().await?)),
            StatusCode::NOT_FOUND => Ok(None),
            StatusCode::UNAUTHORIZED => {
                self.invalidate_token().await;
                Err(MetadataError::Unauthorized)
            }
            status => Err(MetadataError::Status(status.as_u16())),
        }
    }
}

#[async_trait]
impl MetadataClient for ImdsClient {
    async fn fetch(&self, path: &str) -> RawMetadataResult {
        match timeout(self.fetch_timeout, self.read(path)).await {
            Ok(Ok(Some(body))) => RawMetadataResult::Present(body),
            Ok(Ok(None)) => RawMetadataResult::Absent,
            Ok(Err(e)) => RawMetadataResult::TransientError(e),
            Err(_) => RawMetadataResult::TransientError(MetadataError::Timeout(self.fetch_timeout)),
        }
    }
}
