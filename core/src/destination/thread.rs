//! Threads publishing via the Graph API
//!
//! Posting is two requests: create a media container carrying the caption,
//! then publish that container.

use anyhow::{bail, Context};
use reqwest::Client as HttpClient;
use serde::Deserialize;
use std::time::Duration;

use super::resolve_credentials;
use crate::config::ComponentConfig;
use crate::error::{AgentError, Result};
use crate::preflight::Environment;
use crate::util::sanitize_base_url;

const GRAPH_HOST: &str = "https://graph.facebook.com";
const DEFAULT_API_VERSION: &str = "v17.0";

#[derive(Deserialize)]
struct IdResponse {
    #[serde(default)]
    id: Option<String>,
}

pub struct ThreadDestination {
    base_url: String,
    user_id: String,
    access_token: String,
    client: HttpClient,
}

impl std::fmt::Debug for ThreadDestination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadDestination")
            .field("base_url", &self.base_url)
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

impl ThreadDestination {
    /// Keys: `user_id_env`, `access_token_env`, optional `api_version` and `base_url`
    pub fn from_config(config: &ComponentConfig, env: &dyn Environment) -> Result<Self> {
        let mut credentials =
            resolve_credentials("thread", config, env, &["user_id_env", "access_token_env"])?.into_iter();
        let (Some(user_id), Some(access_token)) = (credentials.next(), credentials.next()) else {
            return Err(AgentError::InvalidConfig {
                message: "Invalid Threads destination configuration".to_string(),
            });
        };

        let api_version = config.get("api_version").map(String::as_str).unwrap_or(DEFAULT_API_VERSION);
        let host = config.get("base_url").map(String::as_str).unwrap_or(GRAPH_HOST);
        let host = sanitize_base_url(host, "Threads base URL").map_err(|e| AgentError::InvalidConfig {
            message: e.to_string(),
        })?;

        let client = HttpClient::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            base_url: format!("{}/{}", host.trim_end_matches('/'), api_version),
            user_id,
            access_token,
            client,
        })
    }

    pub async fn post(&self, content: &str) -> bool {
        match self.publish(content).await {
            Ok(thread_id) => {
                tracing::info!("Successfully posted to Threads with ID: {}", thread_id);
                true
            }
            Err(e) => {
                tracing::error!("Error posting to Threads: {:#}", e);
                false
            }
        }
    }

    async fn publish(&self, content: &str) -> anyhow::Result<String> {
        let response = self
            .client
            .post(format!("{}/{}/media", self.base_url, self.user_id))
            .query(&[
                ("access_token", self.access_token.as_str()),
                ("caption", content),
                ("media_type", "THREADS"),
            ])
            .send()
            .await
            .context("media container request failed")?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            bail!("Failed to create Threads media: {}", text);
        }
        let media_id = response
            .json::<IdResponse>()
            .await
            .context("invalid media container response")?
            .id
            .filter(|id| !id.is_empty())
            .context("No media ID received from Threads API")?;
        tracing::debug!("Created Threads media container {}", media_id);

        let response = self
            .client
            .post(format!("{}/{}/media_publish", self.base_url, self.user_id))
            .query(&[
                ("access_token", self.access_token.as_str()),
                ("creation_id", media_id.as_str()),
            ])
            .send()
            .await
            .context("publish request failed")?;

        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            bail!("Failed to publish thread: {}", text);
        }
        let published = response.json::<IdResponse>().await.ok().and_then(|r| r.id);
        Ok(published.unwrap_or_else(|| "unknown".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn destination(server: &MockServer) -> ThreadDestination {
        let config: ComponentConfig = [
            ("user_id_env", "THREADS_USER_ID"),
            ("access_token_env", "THREADS_ACCESS_TOKEN"),
            ("base_url", server.uri().as_str()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let env = HashMap::from([
            ("THREADS_USER_ID".to_string(), "1789".to_string()),
            ("THREADS_ACCESS_TOKEN".to_string(), "tok".to_string()),
        ]);
        ThreadDestination::from_config(&config, &env).unwrap()
    }

    #[tokio::test]
    async fn test_two_step_publish() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v17.0/1789/media"))
            .and(query_param("media_type", "THREADS"))
            .and(query_param("caption", "Hello team"))
            .and(query_param("access_token", "tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "container-1" })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v17.0/1789/media_publish"))
            .and(query_param("creation_id", "container-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "thread-9" })))
            .expect(1)
            .mount(&server)
            .await;

        assert!(destination(&server).post("Hello team").await);
    }

    #[tokio::test]
    async fn test_rejected_container_fails_without_publishing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v17.0/1789/media"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": { "message": "Invalid OAuth access token" }
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v17.0/1789/media_publish"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        assert!(!destination(&server).post("Hello").await);
    }

    #[tokio::test]
    async fn test_missing_container_id_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v17.0/1789/media"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        assert!(!destination(&server).post("Hello").await);
    }

    #[tokio::test]
    async fn test_rejected_publish_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v17.0/1789/media"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "c" })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v17.0/1789/media_publish"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        assert!(!destination(&server).post("Hello").await);
    }
}
