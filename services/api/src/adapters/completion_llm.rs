//! services/api/src/adapters/completion_llm.rs
//!
//! This module contains the adapter for the chat-completion LLM.
//! It implements the `CompletionService` port from the `core` crate against any
//! OpenAI-compatible endpoint (Groq in production).

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use college_assistant_core::{
    domain::{ChatMessage, ChatRole},
    ports::{CompletionService, PortError, PortResult},
    prompt::build_messages,
};
use tracing::debug;

const TEMPERATURE: f32 = 0.5;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `CompletionService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiCompletionAdapter {
    client: Client<OpenAIConfig>,
    model: String,
    max_tokens: u32,
}

impl OpenAiCompletionAdapter {
    /// Creates a new `OpenAiCompletionAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String, max_tokens: u32) -> Self {
        Self {
            client,
            model,
            max_tokens,
        }
    }

    /// Builds a client for an OpenAI-compatible API at `api_base`.
    pub fn client_for(api_key: &str, api_base: &str) -> Client<OpenAIConfig> {
        Client::with_config(
            OpenAIConfig::new()
                .with_api_key(api_key)
                .with_api_base(api_base),
        )
    }
}

fn to_request_message(message: ChatMessage) -> PortResult<ChatCompletionRequestMessage> {
    let built = match message.role {
        ChatRole::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(message.content)
            .build()
            .map(ChatCompletionRequestMessage::from),
        ChatRole::User => ChatCompletionRequestUserMessageArgs::default()
            .content(message.content)
            .build()
            .map(ChatCompletionRequestMessage::from),
    };
    built.map_err(|e| PortError::Unexpected(e.to_string()))
}

//=========================================================================================
// `CompletionService` Trait Implementation
//=========================================================================================

#[async_trait]
impl CompletionService for OpenAiCompletionAdapter {
    async fn complete(&self, user_query: &str, system_prompt: Option<&str>) -> PortResult<String> {
        let messages = build_messages(user_query, system_prompt)
            .into_iter()
            .map(to_request_message)
            .collect::<PortResult<Vec<_>>>()?;

        debug!(
            model = %self.model,
            message_count = messages.len(),
            "Sending chat completion request"
        );

        #[allow(deprecated)]
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(TEMPERATURE)
            .max_tokens(self.max_tokens)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Upstream(e.to_string()))?;

        let choice = response.choices.into_iter().next().ok_or_else(|| {
            PortError::InvalidResponse("completion returned no choices".to_string())
        })?;

        choice.message.content.ok_or_else(|| {
            PortError::InvalidResponse("completion choice contained no text content".to_string())
        })
    }
}
