//! Chat providers: cloud APIs (Claude, Gemini, Qwen) and local Ollama models.
//!
//! [`ChatProvider`] is the seam the session layer talks to; [`ProviderHub`] is the
//! implementation that routes a [`Target`] to the right client. No retries, no streaming.

mod anthropic;
mod gemini;
mod ollama;
mod qwen;

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;

use crate::candidate::{Candidate, CloudProvider, Target};
use crate::config::{self, Config};

pub use anthropic::AnthropicClient;
pub use gemini::GeminiClient;
pub use ollama::{
    base_url_from_env, ChatMessage, ChatResponse, OllamaClient, OllamaError, OllamaModel,
    LIST_MODELS_TIMEOUT,
};
pub use qwen::QwenClient;

/// Backend prefix for local Ollama models (`ollama:<model>`).
pub const OLLAMA_BACKEND: &str = "ollama";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{0} API key not configured. Set {} or run `ai-cli config set-key {0} <key>`.", .0.env_var())]
    NotConfigured(CloudProvider),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("api error: {0}")]
    Api(String),
    #[error("{0} returned no text")]
    EmptyResponse(String),
    #[error("unknown model: {0}")]
    UnknownModel(String),
    #[error("Ollama is not available ({0}). Install and start the Ollama server.")]
    LocalBackendUnavailable(String),
    #[error("model '{model}' not available. Available models: {available}")]
    LocalModelMissing { model: String, available: String },
    #[error(transparent)]
    Ollama(#[from] OllamaError),
}

/// Sends one prompt to one model and returns the reply text.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    async fn chat(&self, target: &Target, prompt: &str) -> Result<String, ProviderError>;
}

/// Routes prompts to the configured cloud clients and the local Ollama server.
#[derive(Debug, Clone)]
pub struct ProviderHub {
    keys: BTreeMap<CloudProvider, String>,
    http: reqwest::Client,
    ollama: OllamaClient,
}

impl ProviderHub {
    /// `ollama_url` of None means the default local address. All clients share one
    /// connection pool with bounded connect and request times.
    pub fn new(keys: BTreeMap<CloudProvider, String>, ollama_url: Option<String>) -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        let ollama = OllamaClient::new(ollama_url, http.clone());
        Self { keys, http, ollama }
    }

    /// Keys resolved from env and config; Ollama at `OLLAMA_HOST` or the default address.
    pub fn from_config(config: &Config) -> Self {
        let keys = CloudProvider::ALL
            .into_iter()
            .filter_map(|p| config::resolve_api_key(config, p).map(|k| (p, k)))
            .collect();
        Self::new(keys, base_url_from_env())
    }

    pub fn has_key(&self, provider: CloudProvider) -> bool {
        self.keys.contains_key(&provider)
    }

    /// Names of models served by the local Ollama server; empty when it is unreachable.
    pub async fn local_models(&self) -> Vec<String> {
        match self.ollama.list_models().await {
            Ok(models) => models.into_iter().map(|m| m.name).collect(),
            Err(e) => {
                log::debug!("ollama at {} not available: {}", self.ollama.base_url(), e);
                Vec::new()
            }
        }
    }

    /// Cloud models with a key (qwen, claude, gemini), then `ollama:<model>` for each local model.
    pub async fn available_models(&self) -> Vec<Candidate> {
        let mut models: Vec<Candidate> = CloudProvider::ALL
            .into_iter()
            .filter(|p| self.has_key(*p))
            .map(Candidate::cloud)
            .collect();
        models.extend(
            self.local_models()
                .await
                .into_iter()
                .map(|m| Candidate::local(OLLAMA_BACKEND, m)),
        );
        models
    }

    async fn cloud_chat(&self, provider: CloudProvider, prompt: &str) -> Result<String, ProviderError> {
        let key = self
            .keys
            .get(&provider)
            .cloned()
            .ok_or(ProviderError::NotConfigured(provider))?;
        log::info!("sending prompt to {}", provider);
        match provider {
            CloudProvider::Claude => AnthropicClient::new(key, None, self.http.clone()).complete(prompt).await,
            CloudProvider::Gemini => GeminiClient::new(key, None, self.http.clone()).complete(prompt).await,
            CloudProvider::Qwen => QwenClient::new(key, None, self.http.clone()).complete(prompt).await,
        }
    }

    async fn ollama_chat(&self, model: &str, prompt: &str) -> Result<String, ProviderError> {
        let models = self
            .ollama
            .list_models()
            .await
            .map_err(|e| ProviderError::LocalBackendUnavailable(e.to_string()))?;
        let Some(found) = models.iter().find(|m| m.answers_to(model)) else {
            let available = if models.is_empty() {
                "None".to_string()
            } else {
                models.iter().map(|m| m.name.as_str()).collect::<Vec<_>>().join(", ")
            };
            return Err(ProviderError::LocalModelMissing {
                model: model.to_string(),
                available,
            });
        };
        log::info!("sending prompt to ollama model {}", found.name);
        let res = self.ollama.chat(&found.name, vec![ChatMessage::user(prompt)]).await?;
        let content = res.content().trim();
        if content.is_empty() {
            return Err(ProviderError::EmptyResponse(format!("{}:{}", OLLAMA_BACKEND, model)));
        }
        Ok(content.to_string())
    }
}

#[async_trait]
impl ChatProvider for ProviderHub {
    async fn chat(&self, target: &Target, prompt: &str) -> Result<String, ProviderError> {
        match target {
            Target::CloudModel(provider) => self.cloud_chat(*provider, prompt).await,
            Target::LocalModel { backend, model } if backend == OLLAMA_BACKEND => {
                self.ollama_chat(model, prompt).await
            }
            Target::LocalModel { backend, model } => {
                Err(ProviderError::UnknownModel(format!("{}:{}", backend, model)))
            }
            Target::CliTool(name) => Err(ProviderError::UnknownModel(name.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hub_with_ollama(url: String) -> ProviderHub {
        ProviderHub::new(BTreeMap::new(), Some(url))
    }

    #[tokio::test]
    async fn missing_key_is_reported_per_provider() {
        let hub = hub_with_ollama("http://127.0.0.1:9".into());
        let err = hub
            .chat(&Target::CloudModel(CloudProvider::Claude), "hi")
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(CloudProvider::Claude)));
        assert!(err.to_string().contains("CLAUDE_API_KEY"));
    }

    #[tokio::test]
    async fn cloud_models_follow_keys_and_skip_unreachable_ollama() {
        let mut keys = BTreeMap::new();
        keys.insert(CloudProvider::Gemini, "g".to_string());
        keys.insert(CloudProvider::Qwen, "q".to_string());
        let hub = ProviderHub::new(keys, Some("http://127.0.0.1:9".into()));
        let names: Vec<String> = hub.available_models().await.iter().map(Candidate::name).collect();
        assert_eq!(names, vec!["qwen", "gemini"]);
    }

    #[tokio::test]
    async fn local_models_are_namespaced() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/tags")
            .with_status(200)
            .with_body(r#"{"models":[{"name":"llama2:latest"}]}"#)
            .create_async()
            .await;
        let hub = hub_with_ollama(server.url());
        let names: Vec<String> = hub.available_models().await.iter().map(Candidate::name).collect();
        assert_eq!(names, vec!["ollama:llama2:latest"]);
    }

    #[tokio::test]
    async fn unlisted_local_model_names_the_available_ones() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/tags")
            .with_status(200)
            .with_body(r#"{"models":[{"name":"qwen3:8b"}]}"#)
            .create_async()
            .await;
        let hub = hub_with_ollama(server.url());
        let target = Target::parse_model("ollama:llama2").unwrap();
        let err = hub.chat(&target, "hi").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "model 'llama2' not available. Available models: qwen3:8b"
        );
    }

    #[tokio::test]
    async fn local_chat_uses_listed_name() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/tags")
            .with_status(200)
            .with_body(r#"{"models":[{"name":"llama2:latest"}]}"#)
            .create_async()
            .await;
        let chat = server
            .mock("POST", "/api/chat")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"model":"llama2:latest","stream":false}"#.to_string(),
            ))
            .with_status(200)
            .with_body(r#"{"message":{"role":"assistant","content":"  pong \n"},"done":true}"#)
            .create_async()
            .await;
        let hub = hub_with_ollama(server.url());
        let reply = hub.chat(&Target::parse_model("ollama:llama2").unwrap(), "ping").await.unwrap();
        assert_eq!(reply, "pong");
        chat.assert_async().await;
    }

    #[tokio::test]
    async fn tools_and_unknown_backends_are_not_models() {
        let hub = hub_with_ollama("http://127.0.0.1:9".into());
        let err = hub.chat(&Target::CliTool("aider".into()), "hi").await.unwrap_err();
        assert!(matches!(err, ProviderError::UnknownModel(_)));
        let lm = Target::LocalModel {
            backend: "lmstudio".into(),
            model: "x".into(),
        };
        assert!(matches!(
            hub.chat(&lm, "hi").await,
            Err(ProviderError::UnknownModel(_))
        ));
    }

    #[tokio::test]
    async fn silent_ollama_does_not_block_model_listing() {
        let silent = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let mut keys = BTreeMap::new();
        keys.insert(CloudProvider::Claude, "c".to_string());
        let hub = ProviderHub::new(keys, Some(format!("http://{}", silent.local_addr().unwrap())));
        let models = tokio::time::timeout(LIST_MODELS_TIMEOUT * 3, hub.available_models())
            .await
            .expect("model listing should finish despite a silent ollama");
        let names: Vec<String> = models.iter().map(Candidate::name).collect();
        assert_eq!(names, vec!["claude"]);
    }
}
