use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use logbrief_types::LogEntry;
use logbrief_types::config::SummarizerConfig;

use crate::{ModelFallback, Summarizer, SummaryError, build_prompt};

const MAX_ERROR_BODY: usize = 512;

#[derive(Debug, Serialize, PartialEq)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize, PartialEq)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> MessagesRequest<'a> {
    fn user(model: &'a str, prompt: &'a str, max_tokens: u32) -> Self {
        Self {
            model,
            max_tokens,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        }
    }
}

/// Summarizer backed by a messages-style HTTP API
pub struct MessagesSummarizer {
    http: reqwest::Client,
    endpoint: String,
    api_key_env: String,
    api_key: String,
    api_version: String,
    models: ModelFallback,
}

impl MessagesSummarizer {
    /// An empty `api_key` is accepted here and reported on first use
    pub fn new(settings: &SummarizerConfig, api_key: String) -> Result<Self, SummaryError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()
            .map_err(SummaryError::Client)?;

        Ok(Self {
            http,
            endpoint: settings.endpoint.clone(),
            api_key_env: settings.api_key_env.clone(),
            api_key: api_key.trim().to_string(),
            api_version: settings.api_version.clone(),
            models: ModelFallback::new(settings.models.clone()),
        })
    }

    async fn complete(
        &self,
        model: &str,
        prompt: &str,
        max_tokens: u32,
    ) -> Result<String, SummaryError> {
        debug!(%model, endpoint = %self.endpoint, "sending summary request");

        let response = self
            .http
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .json(&MessagesRequest::user(model, prompt, max_tokens))
            .send()
            .await
            .map_err(|source| SummaryError::Request {
                endpoint: self.endpoint.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let mut body = body.trim().to_string();
            if body.len() > MAX_ERROR_BODY {
                let mut end = MAX_ERROR_BODY;
                while !body.is_char_boundary(end) {
                    end -= 1;
                }
                body.truncate(end);
            }
            return Err(SummaryError::Status {
                model: model.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|source| SummaryError::Request {
                endpoint: self.endpoint.clone(),
                source,
            })?;
        extract_text(&body)
    }
}

#[async_trait]
impl Summarizer for MessagesSummarizer {
    async fn summarize(
        &self,
        entries: &[LogEntry],
        max_output_tokens: u32,
    ) -> Result<String, SummaryError> {
        if self.api_key.is_empty() {
            return Err(SummaryError::MissingCredentials(self.api_key_env.clone()));
        }
        let prompt = build_prompt(entries)?;
        let text = self
            .models
            .invoke(|model| {
                let prompt = prompt.as_str();
                async move { self.complete(&model, prompt, max_output_tokens).await }
            })
            .await?;

        if let Some(model) = self.models.current() {
            info!(%model, chars = text.len(), "summary generated");
        }
        Ok(text)
    }
}

/// Text of the first content block of a messages response
pub fn extract_text(body: &Value) -> Result<String, SummaryError> {
    body.get("content")
        .and_then(|c| c.get(0))
        .and_then(|block| block.get("text"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| SummaryError::Format(body.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(MessagesRequest::user("m-1", "hello", 4096)).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "m-1",
                "max_tokens": 4096,
                "messages": [{"role": "user", "content": "hello"}]
            })
        );
    }

    #[test]
    fn test_extract_text() {
        let body = json!({
            "id": "msg_01",
            "content": [{"type": "text", "text": "## Summary\nAll good"}],
            "stop_reason": "end_turn"
        });
        assert_eq!(extract_text(&body).unwrap(), "## Summary\nAll good");
    }

    #[test]
    fn test_extract_text_unexpected_format() {
        let err = extract_text(&json!({"content": []})).unwrap_err();
        assert!(matches!(err, SummaryError::Format(_)));

        let err = extract_text(&json!({"error": {"type": "overloaded_error"}})).unwrap_err();
        assert!(err.to_string().contains("overloaded_error"));
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let summarizer = MessagesSummarizer::new(&SummarizerConfig::default(), "  ".into()).unwrap();
        let entries = [LogEntry::new("api-1", "api", "ERROR boom")];
        let err = summarizer.summarize(&entries, 1024).await.unwrap_err();
        assert_eq!(err.to_string(), "no API key found in $ANTHROPIC_API_KEY");
    }
}
