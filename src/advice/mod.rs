pub mod prompt;
pub mod relay;
pub mod session;

pub use prompt::{AdvicePrompt, Confidence, build_advice_prompt};
pub use relay::{OpenRelay, OutboundChunk, RelaySettings};
pub use session::{CloseReason, RelayEvent, RelayState, StreamSession};
