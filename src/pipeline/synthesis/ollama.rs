use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ChatMessage, CompletionProvider, SynthesisFailure};
use crate::config::SynthesisConfig;

/// Ollama `/api/chat` client. The HTTP client is built on first use.
pub struct OllamaChatClient {
    base_url: String,
    model: String,
    timeout: Duration,
    connect_timeout: Duration,
    client: OnceLock<reqwest::Client>,
}

/// Request body for Ollama /api/chat
#[derive(Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

/// Response body from Ollama /api/chat
#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaResponseMessage,
}

#[derive(Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

/// Response body from Ollama /api/tags
#[derive(Deserialize)]
struct OllamaTagsResponse {
    models: Vec<OllamaModel>,
}

#[derive(Deserialize)]
struct OllamaModel {
    name: String,
}

impl OllamaChatClient {
    pub fn new(config: &SynthesisConfig) -> Self {
        Self {
            base_url: config.ollama_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            timeout: config.timeout(),
            connect_timeout: config.connect_timeout(),
            client: OnceLock::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn client(&self) -> &reqwest::Client {
        self.client.get_or_init(|| {
            reqwest::Client::builder()
                .timeout(self.timeout)
                .connect_timeout(self.connect_timeout)
                .build()
                .unwrap_or_default()
        })
    }

    fn map_send_error(&self, e: reqwest::Error) -> SynthesisFailure {
        if e.is_connect() {
            SynthesisFailure::Connection(self.base_url.clone())
        } else if e.is_timeout() {
            SynthesisFailure::Timeout(self.timeout.as_millis() as u64)
        } else {
            SynthesisFailure::HttpClient(e.to_string())
        }
    }

    /// Names of installed models.
    pub async fn list_models(&self) -> Result<Vec<String>, SynthesisFailure> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client()
            .get(&url)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SynthesisFailure::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let tags: OllamaTagsResponse = response
            .json()
            .await
            .map_err(|e| SynthesisFailure::MalformedJson(e.to_string()))?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

/// `llama3.2` matches `llama3.2:latest`; a tagged name must match exactly.
fn model_matches(installed: &str, wanted: &str) -> bool {
    if wanted.contains(':') {
        installed == wanted
    } else {
        installed == wanted || installed.split(':').next() == Some(wanted)
    }
}

#[async_trait]
impl CompletionProvider for OllamaChatClient {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, SynthesisFailure> {
        let url = format!("{}/api/chat", self.base_url);
        let body = OllamaChatRequest {
            model: &self.model,
            messages,
            stream: false,
        };

        let response = self
            .client()
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SynthesisFailure::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| SynthesisFailure::MalformedJson(e.to_string()))?;

        if parsed.message.content.trim().is_empty() {
            return Err(SynthesisFailure::EmptyResponse);
        }
        Ok(parsed.message.content)
    }

    async fn is_available(&self) -> bool {
        match self.list_models().await {
            Ok(models) => models.iter().any(|m| model_matches(m, &self.model)),
            Err(e) => {
                tracing::warn!(error = %e, "Ollama not available");
                false
            }
        }
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::synthesis::ChatRole;

    #[test]
    fn model_name_matching() {
        assert!(model_matches("llama3.2:latest", "llama3.2"));
        assert!(model_matches("llama3.2", "llama3.2"));
        assert!(!model_matches("llama3.2:1b", "llama3.2:3b"));
        assert!(!model_matches("llama3.1:latest", "llama3.2"));
    }

    #[test]
    fn request_serializes_to_ollama_shape() {
        let messages = vec![ChatMessage::system("sys"), ChatMessage::user("hi")];
        let body = OllamaChatRequest {
            model: "llama3.2",
            messages: &messages,
            stream: false,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "hi");
    }

    #[test]
    fn response_deserializes() {
        let parsed: OllamaChatResponse = serde_json::from_str(
            r#"{"model": "llama3.2", "message": {"role": "assistant", "content": "ok"}, "done": true}"#,
        )
        .unwrap();
        assert_eq!(parsed.message.content, "ok");
        assert_eq!(ChatMessage::assistant("ok").role, ChatRole::Assistant);
    }

    #[tokio::test]
    async fn unreachable_server_is_unavailable() {
        let client = OllamaChatClient::new(&SynthesisConfig {
            ollama_url: "http://127.0.0.1:9".into(),
            connect_timeout_ms: 200,
            ..SynthesisConfig::default()
        });
        assert!(!client.is_available().await);
        let err = client.complete(&[ChatMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(
            err,
            SynthesisFailure::Connection(_) | SynthesisFailure::HttpClient(_)
        ));
    }
}
