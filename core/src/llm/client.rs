//! Completion client for an OpenAI-compatible inference server
//!
//! Works with llama.cpp, vLLM, LM Studio and Ollama's `/v1` surface.
//! Loading a backend means confirming that the server lists the model;
//! generation uses the plain `/completions` endpoint so the raw prompt is
//! continued rather than wrapped in a chat template.

use super::{BackendLoader, Generation, TextGenerator};
use crate::config::{BackendDescriptor, EngineConfig, GenerationParams};
use crate::util::sanitize_base_url;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Client bound to one model on one server
#[derive(Debug, Clone)]
pub struct CompletionClient {
    base_url: String,
    model: String,
    http_client: HttpClient,
}

impl CompletionClient {
    /// Create a client without contacting the server
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        let base_url = sanitize_base_url(base_url, "Engine base URL")?;
        let http_client = HttpClient::builder()
            .timeout(timeout)
            .user_agent("social-agent/0.2")
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            http_client,
        })
    }

    /// Create a client and make sure the server actually serves the model
    pub async fn connect(base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        let client = Self::new(base_url, model, timeout)?;
        client.ensure_model_available().await?;
        Ok(client)
    }

    async fn ensure_model_available(&self) -> Result<()> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to reach inference server at {}", self.base_url))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Model listing failed ({}): {}", status, body);
        }

        let listing: ModelList = response
            .json()
            .await
            .context("Failed to parse model listing")?;

        if listing.data.iter().any(|m| m.id == self.model) {
            Ok(())
        } else {
            bail!("Model {} is not served by {}", self.model, self.base_url)
        }
    }
}

#[async_trait]
impl TextGenerator for CompletionClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<Vec<Generation>> {
        let url = format!("{}/completions", self.base_url);
        let body = CompletionRequest {
            model: &self.model,
            prompt,
            max_tokens: params.max_new_tokens,
            // Greedy decoding when sampling is off
            temperature: if params.do_sample { params.temperature } else { 0.0 },
            top_p: params.top_p,
            repetition_penalty: params.repetition_penalty,
            n: params.num_return_sequences.max(1),
            pad_token_id: params.pad_token_id,
            stream: false,
        };

        tracing::debug!(
            "Completion request: model={}, prompt_chars={}, max_tokens={}",
            self.model,
            prompt.len(),
            params.max_new_tokens
        );

        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("Failed to send completion request")?;

        match response.status() {
            StatusCode::OK => {
                let text = response
                    .text()
                    .await
                    .context("Failed to read completion response text")?;
                let parsed: CompletionResponse = match serde_json::from_str(&text) {
                    Ok(parsed) => parsed,
                    Err(e) => {
                        tracing::error!("Failed to parse completion response: {}. Raw body: {}", e, text);
                        bail!("Failed to parse completion response: {}", e);
                    }
                };

                Ok(parsed
                    .choices
                    .into_iter()
                    .map(|choice| Generation {
                        generated_text: format!("{}{}", prompt, choice.text),
                    })
                    .collect())
            }
            StatusCode::NOT_FOUND => {
                bail!("Model {} is no longer available on {}", self.model, self.base_url);
            }
            status => {
                let error_body: Option<serde_json::Value> = response.json().await.ok();
                let error_msg = error_body
                    .as_ref()
                    .and_then(|v| v.get("error").and_then(|e| e.get("message")))
                    .and_then(|v| v.as_str())
                    .unwrap_or("Unknown error");
                bail!("Completion request failed ({}): {}", status, error_msg);
            }
        }
    }
}

/// Production loader: one [`CompletionClient`] per descriptor
#[derive(Debug, Clone)]
pub struct HttpBackendLoader {
    engine: EngineConfig,
}

impl HttpBackendLoader {
    pub fn new(engine: EngineConfig) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl BackendLoader for HttpBackendLoader {
    async fn load(
        &self,
        backend_id: &str,
        descriptor: &BackendDescriptor,
    ) -> Result<Box<dyn TextGenerator>> {
        tracing::info!("Attempting to load model: {} ({})", descriptor.name, backend_id);
        let client = CompletionClient::connect(
            &self.engine.base_url,
            &descriptor.name,
            Duration::from_secs(self.engine.timeout_secs),
        )
        .await?;
        Ok(Box::new(client))
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    max_tokens: u32,
    temperature: f32,
    top_p: f32,
    repetition_penalty: f32,
    n: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pad_token_id: Option<u32>,
    stream: bool,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Deserialize)]
struct ModelEntry {
    id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemorySize;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn descriptor(name: &str) -> BackendDescriptor {
        BackendDescriptor {
            name: name.to_string(),
            description: String::new(),
            min_ram: MemorySize::from_bytes(0),
            recommended_ram: None,
            generation: GenerationParams::story(),
        }
    }

    fn engine(server: &MockServer) -> EngineConfig {
        EngineConfig {
            base_url: format!("{}/v1", server.uri()),
            timeout_secs: 5,
        }
    }

    async fn serve_models(server: &MockServer, ids: &[&str]) {
        let data: Vec<_> = ids.iter().map(|id| json!({ "id": id, "object": "model" })).collect();
        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": data })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_load_succeeds_when_model_is_served() {
        let server = MockServer::start().await;
        serve_models(&server, &["gpt2", "facebook/opt-350m"]).await;

        let loader = HttpBackendLoader::new(engine(&server));
        let backend = loader.load("opt-350m", &descriptor("facebook/opt-350m")).await.unwrap();
        assert_eq!(backend.model(), "facebook/opt-350m");
    }

    #[tokio::test]
    async fn test_load_fails_when_model_is_missing() {
        let server = MockServer::start().await;
        serve_models(&server, &["gpt2"]).await;

        let loader = HttpBackendLoader::new(engine(&server));
        let err = loader
            .load("bloom-560m", &descriptor("bigscience/bloom-560m"))
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("not served"));
    }

    #[tokio::test]
    async fn test_generate_returns_prompt_and_continuation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/completions"))
            .and(body_partial_json(json!({ "model": "gpt2", "max_tokens": 150, "n": 1 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "index": 0, "text": " and then it rained.", "finish_reason": "length" }]
            })))
            .mount(&server)
            .await;

        let client = CompletionClient::new(&format!("{}/v1", server.uri()), "gpt2", Duration::from_secs(5)).unwrap();
        let out = client.generate("Once", &GenerationParams::story()).await.unwrap();
        assert_eq!(out, vec![Generation { generated_text: "Once and then it rained.".to_string() }]);
    }

    #[tokio::test]
    async fn test_generate_surfaces_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/completions"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({
                "error": { "message": "out of memory" }
            })))
            .mount(&server)
            .await;

        let client = CompletionClient::new(&format!("{}/v1", server.uri()), "gpt2", Duration::from_secs(5)).unwrap();
        let err = client.generate("Once", &GenerationParams::story()).await.unwrap_err();
        assert!(err.to_string().contains("out of memory"));
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        assert!(CompletionClient::new("localhost:8000", "gpt2", Duration::from_secs(1)).is_err());
    }
}
