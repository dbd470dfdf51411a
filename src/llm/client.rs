use super::types::*;
use crate::{Error, Result, config::LlmConfig};
use async_openai::{Client, config::OpenAIConfig, types as openai_types};
use async_trait::async_trait;
use futures::StreamExt;
use tracing::debug;

#[async_trait]
pub trait CompletionStreamer: Send + Sync {
    /// Issues a streaming chat completion. The returned stream yields text
    /// deltas; errors raised after this call returns are mid-stream failures.
    async fn stream_chat_completion(&self, request: ChatCompletionRequest)
    -> Result<FragmentStream>;
}

/// Streams completions from an OpenAI-compatible endpoint (Groq by default).
pub struct OpenAiStreamer {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
}

impl OpenAiStreamer {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::config("LLM API key is not set"))?;

        let mut openai_config = OpenAIConfig::new().with_api_key(api_key);

        if !config.base_url.is_empty() {
            openai_config = openai_config.with_api_base(config.base_url);
        }

        let client = Client::with_config(openai_config);

        Ok(Self {
            client,
            model: config.model,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            top_p: config.top_p,
        })
    }

    fn build_request(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<openai_types::CreateChatCompletionRequest> {
        let mut messages = Vec::new();
        for msg in &request.messages {
            messages.push(msg.to_openai_message()?);
        }

        let mut request_builder = openai_types::CreateChatCompletionRequestArgs::default();
        request_builder
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .max_tokens(self.max_tokens)
            .top_p(self.top_p)
            .stream(true);

        Ok(request_builder.build()?)
    }
}

#[async_trait]
impl CompletionStreamer for OpenAiStreamer {
    async fn stream_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> Result<FragmentStream> {
        debug!(
            "Opening streaming chat completion with {} messages on {}",
            request.messages.len(),
            self.model
        );

        let openai_request = self.build_request(request)?;
        let stream = self.client.chat().create_stream(openai_request).await?;

        let fragments = stream.map(|item| match item {
            Ok(chunk) => Ok(chunk
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.delta.content)
                .unwrap_or_default()),
            Err(e) => Err(Error::upstream_stream(e.to_string())),
        });

        Ok(Box::pin(fragments))
    }
}
