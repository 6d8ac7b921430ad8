//! LLM client abstraction.
//!
//! The agent core consumes an [`LlmClient`] and never interprets provider
//! wire formats: a client takes the outbound message list and returns
//! response text, either in one blocking call or as a token stream. A thin
//! HTTP-backed client is bundled for endpoints that speak a plain
//! messages-in/text-out contract.

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use reqwest::Client;
use serde::Serialize;

use crate::core_types::Message;
use crate::errors::AgentError;

/// Chunks of response text as they arrive from a streaming client.
pub type TokenStream = BoxStream<'static, Result<String, AgentError>>;

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Sends the message list and returns the complete response text.
    async fn call(&self, messages: &[Message]) -> Result<String, AgentError>;

    /// Sends the message list and returns a token stream. Clients without
    /// streaming support keep the default, which reports a configuration
    /// error immediately; the agent surfaces it without retrying.
    async fn call_stream(&self, _messages: &[Message]) -> Result<TokenStream, AgentError> {
        Err(AgentError::Config(
            "LLM client does not support streaming; disable streaming or use a client that implements call_stream".to_string(),
        ))
    }
}

/// HTTP client for endpoints accepting `{"messages": [...]}` and answering
/// with the response text in the body.
pub struct HttpLlmClient {
    pub endpoint_url: String,
    client: Client,
}

impl HttpLlmClient {
    pub fn new(endpoint_url: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            client: Client::new(),
        }
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn call(&self, messages: &[Message]) -> Result<String, AgentError> {
        #[derive(Serialize)]
        struct RequestPayload<'a> {
            messages: &'a [Message],
        }

        log::debug!(
            "HttpLlmClient sending {} messages to {}",
            messages.len(),
            self.endpoint_url
        );

        let response = self
            .client
            .post(&self.endpoint_url)
            .json(&RequestPayload { messages })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error while reading error response body".to_string());
            let err_msg = format!("LLM API request failed with status {}: {}", status, error_text);
            log::error!("{}", err_msg);
            return Err(AgentError::LLMError(err_msg));
        }

        let text = response.text().await?;
        log::debug!("HttpLlmClient received {} bytes", text.len());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_types::Role;

    struct BlockingOnlyClient;

    #[async_trait]
    impl LlmClient for BlockingOnlyClient {
        async fn call(&self, _messages: &[Message]) -> Result<String, AgentError> {
            Ok("ok".to_string())
        }
    }

    #[tokio::test]
    async fn test_default_call_stream_is_a_config_error() {
        let client = BlockingOnlyClient;
        let messages = vec![Message::new(Role::User, "hi")];
        match client.call_stream(&messages).await {
            Err(AgentError::Config(message)) => {
                assert!(message.contains("does not support streaming"));
            }
            other => panic!("expected config error, got {:?}", other.map(|_| ())),
        }
    }
}
