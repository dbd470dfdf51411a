use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    ChatCompletionRequestUserMessageContent,
};
use futures::Stream;
use std::pin::Pin;

/// Incremental text deltas from a streaming completion, in arrival order.
/// An `Ok("")` is a keep-alive or role-only event with no text.
pub type FragmentStream = Pin<Box<dyn Stream<Item = crate::Result<String>> + Send>>;

#[derive(Debug, Clone, PartialEq)]
pub enum Role {
    User,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Sampling parameters are fixed by the provider configuration.
#[derive(Debug, Clone, Default)]
pub struct ChatCompletionRequest {
    pub messages: Vec<ChatMessage>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn to_openai_message(&self) -> Result<ChatCompletionRequestMessage, crate::Error> {
        match self.role {
            Role::User => {
                let msg = ChatCompletionRequestUserMessageArgs::default()
                    .content(ChatCompletionRequestUserMessageContent::Text(
                        self.content.clone(),
                    ))
                    .build()
                    .map_err(|e| {
                        crate::Error::llm(format!("Failed to build user message: {}", e))
                    })?;
                Ok(msg.into())
            }
        }
    }
}

impl ChatCompletionRequest {
    /// A single user-role turn, as sent for advice generation.
    pub fn single_user_turn(content: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::user(content)],
        }
    }
}
