// OpenAI API endpoint functions.
// Typed chat completion call used by the agent.

use async_trait::async_trait;

use crate::agent::ChatBackend;
use crate::error::Result;

use super::client::OpenAiClient;
use super::types::{ChatRequest, ChatResponse};

impl OpenAiClient {
    /// Create a chat completion.
    pub async fn chat_completion(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let response = self.post("/chat/completions", request).await?;
        let completion: ChatResponse = response.json().await?;
        Ok(completion)
    }
}

#[async_trait]
impl ChatBackend for OpenAiClient {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse> {
        self.chat_completion(request).await
    }
}
