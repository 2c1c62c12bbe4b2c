//! Qwen via DashScope's OpenAI-compatible chat completions endpoint.

use serde::{Deserialize, Serialize};

use super::ProviderError;

const DEFAULT_BASE_URL: &str = "https://dashscope.aliyuncs.com/compatible-mode";
const MODEL: &str = "qwen-max";

#[derive(Debug, Clone)]
pub struct QwenClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl QwenClient {
    pub fn new(api_key: String, base_url: Option<String>, client: reqwest::Client) -> Self {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            base_url,
            api_key,
            client,
        }
    }

    /// POST /v1/chat/completions; returns the first choice's content.
    pub async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = CompletionRequest {
            model: MODEL,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(ProviderError::Api(format!("qwen: {} {}", status, body)));
        }
        let data: CompletionResponse = res.json().await?;
        data.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ProviderError::EmptyResponse("qwen".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn returns_first_choice() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer q-key")
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"你好"}}]}"#)
            .create_async()
            .await;
        let client = QwenClient::new("q-key".into(), Some(server.url()), reqwest::Client::new());
        assert_eq!(client.complete("hi").await.unwrap(), "你好");
    }

    #[tokio::test]
    async fn empty_choices_is_an_empty_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;
        let client = QwenClient::new("k".into(), Some(server.url()), reqwest::Client::new());
        assert!(matches!(
            client.complete("hi").await,
            Err(ProviderError::EmptyResponse(_))
        ));
    }
}
