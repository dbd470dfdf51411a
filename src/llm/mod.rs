pub mod client;
pub mod types;

pub use client::{CompletionStreamer, OpenAiStreamer};
pub use types::*;
