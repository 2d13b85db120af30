//! Microblog (Twitter/X) publishing
//!
//! Content over the platform limit is cut down and marked with an ellipsis
//! before it reaches the client.

use anyhow::{bail, Context};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::resolve_credentials;
use crate::config::ComponentConfig;
use crate::error::{AgentError, Result};
use crate::preflight::Environment;
use crate::util::{sanitize_base_url, truncate_with_marker};

/// Platform character limit
pub const CHAR_LIMIT: usize = 280;
const ELLIPSIS: &str = "...";
const DEFAULT_API_BASE: &str = "https://api.twitter.com";

/// Result of a create-post call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostRecord {
    pub id: Option<String>,
}

/// Posting capability of a microblog platform
#[async_trait]
pub trait MicroblogClient: Send + Sync {
    async fn create_post(&self, text: &str) -> anyhow::Result<PostRecord>;
}

/// Twitter API v2 client authenticated with the consumer key pair
pub struct TwitterClient {
    base_url: String,
    api_key: String,
    api_secret: String,
    client: HttpClient,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct CreateTweetResponse {
    #[serde(default)]
    data: Option<TweetData>,
}

#[derive(Deserialize)]
struct TweetData {
    #[serde(default)]
    id: Option<String>,
}

impl TwitterClient {
    pub fn new(base_url: &str, api_key: String, api_secret: String) -> anyhow::Result<Self> {
        let base_url = sanitize_base_url(base_url, "Twitter API base URL")?;
        let client = HttpClient::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            api_secret,
            client,
        })
    }

    async fn bearer_token(&self) -> anyhow::Result<String> {
        let response = self
            .client
            .post(format!("{}/oauth2/token", self.base_url))
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .context("token request failed")?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            bail!("Twitter authentication failed: {}", text);
        }
        Ok(response.json::<TokenResponse>().await?.access_token)
    }
}

#[async_trait]
impl MicroblogClient for TwitterClient {
    async fn create_post(&self, text: &str) -> anyhow::Result<PostRecord> {
        let token = self.bearer_token().await?;
        let response = self
            .client
            .post(format!("{}/2/tweets", self.base_url))
            .bearer_auth(token)
            .json(&json!({ "text": text }))
            .send()
            .await
            .context("create tweet request failed")?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            bail!("Twitter API error: {}", text);
        }
        let body: CreateTweetResponse = response.json().await?;
        Ok(PostRecord {
            id: body.data.and_then(|d| d.id),
        })
    }
}

pub struct MicroblogDestination {
    client: Box<dyn MicroblogClient>,
}

impl std::fmt::Debug for MicroblogDestination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MicroblogDestination").finish_non_exhaustive()
    }
}

impl MicroblogDestination {
    pub fn new(client: Box<dyn MicroblogClient>) -> Self {
        Self { client }
    }

    /// Keys: `api_key_env`, `api_secret_env`, optional `base_url`
    pub fn from_config(config: &ComponentConfig, env: &dyn Environment) -> Result<Self> {
        let mut credentials =
            resolve_credentials("twitter", config, env, &["api_key_env", "api_secret_env"])?.into_iter();
        let (Some(api_key), Some(api_secret)) = (credentials.next(), credentials.next()) else {
            return Err(AgentError::InvalidConfig {
                message: "Invalid Twitter configuration".to_string(),
            });
        };

        let base_url = config.get("base_url").map(String::as_str).unwrap_or(DEFAULT_API_BASE);
        let client = TwitterClient::new(base_url, api_key, api_secret).map_err(|e| AgentError::InvalidConfig {
            message: e.to_string(),
        })?;
        tracing::info!("Successfully initialized Twitter client");
        Ok(Self::new(Box::new(client)))
    }

    pub async fn post(&self, content: &str) -> bool {
        let text = truncate_with_marker(content, CHAR_LIMIT, ELLIPSIS);

        match self.client.create_post(&text).await {
            Ok(PostRecord { id: Some(id) }) => {
                tracing::info!("Successfully posted tweet: {}", id);
                true
            }
            Ok(PostRecord { id: None }) => {
                tracing::error!("Failed to post tweet: No response data");
                false
            }
            Err(e) => {
                tracing::error!("Error posting to Twitter: {:#}", e);
                false
            }
        }
    }
}
