//! OpenAI-compatible chat completions backend

use super::{ChatMessage, ChatModel};
use crate::config::ChatConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Chat model speaking the OpenAI chat completions protocol (Groq et al.)
#[derive(Debug)]
pub struct HttpChatModel {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

impl HttpChatModel {
    pub fn new(config: &ChatConfig, api_key: &str) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Llm("Chat API key is missing".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl ChatModel for HttpChatModel {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let url = format!("{}/chat/completions", self.api_url);
        debug!("Requesting completion from {} ({})", url, self.model);

        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Llm(format!(
                "Chat completion request failed ({}): {}",
                status, body
            )));
        }

        let completion: ChatCompletionResponse = response.json().await?;
        let answer = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::Llm("Chat completion returned no choices".to_string()))?;

        Ok(answer)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(url: &str) -> ChatConfig {
        ChatConfig {
            model: "llama-3.1-8b-instant".to_string(),
            api_url: url.to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            temperature: 0.0,
            timeout_secs: 5,
        }
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "llama-3.1-8b-instant",
                "temperature": 0.0,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "Paris."}}]
            })))
            .mount(&server)
            .await;

        let model = HttpChatModel::new(&test_config(&server.uri()), "test-key").unwrap();
        let answer = model
            .complete(&[ChatMessage::user("Capital of France?")])
            .await
            .unwrap();
        assert_eq!(answer, "Paris.");
    }

    #[tokio::test]
    async fn test_error_status_surfaces_as_llm_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;

        let model = HttpChatModel::new(&test_config(&server.uri()), "bad-key").unwrap();
        let err = model.complete(&[ChatMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(err, Error::Llm(ref msg) if msg.contains("401")));
    }

    #[test]
    fn test_missing_key_rejected_at_construction() {
        let err = HttpChatModel::new(&test_config("http://localhost"), "").unwrap_err();
        assert!(matches!(err, Error::Llm(_)));
    }
}
