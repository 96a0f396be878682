mod generation;
pub mod openai_compatible;

pub use elicit_core::{LlmRequest, LlmResponse, Message, Role, ToolCall, ToolSpec};
pub use generation::LlmGeneration;
pub use openai_compatible::{ChatCompletionRequest, OpenAiCompatibleBuilder, OpenAiCompatibleClient};

use elicit_core::Runnable;

pub trait Llm: Runnable<LlmRequest, LlmResponse> + Send + Sync {}

impl<T> Llm for T where T: Runnable<LlmRequest, LlmResponse> + Send + Sync {}
