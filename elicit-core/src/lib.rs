mod error;
pub mod generation;
mod llm;
mod output_parsers;
mod runnable;
pub mod state;

pub use error::ElicitError;
pub use generation::{
    Generation, GenerationExt, Prompt, SchemaDescriptor, StructuredOutput,
    DEFAULT_BATCH_CONCURRENCY,
};
pub use llm::{LlmRequest, LlmResponse, Message, Role, ToolCall, ToolSpec};
pub use output_parsers::{strip_code_fence, StrOutputParser, StructuredOutputParser};
pub use runnable::Runnable;
pub use state::{GraphState, StateSchema, StateUpdate};

pub type Value = serde_json::Value;
