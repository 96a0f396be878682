use std::marker::PhantomData;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::{ElicitError, LlmResponse, Runnable};

/// Strips a surrounding markdown code fence (```json … ``` or ``` … ```).
pub fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    if let Some(rest) = trimmed.strip_prefix("```json") {
        rest.trim_end_matches("```").trim()
    } else if let Some(rest) = trimmed.strip_prefix("```") {
        rest.trim_end_matches("```").trim()
    } else {
        trimmed
    }
}

/// Extracts the text content of an `LlmResponse`.
#[derive(Clone, Default)]
pub struct StrOutputParser;

#[async_trait]
impl Runnable<LlmResponse, String> for StrOutputParser {
    async fn invoke(&self, input: LlmResponse) -> Result<String, ElicitError> {
        Ok(input.content)
    }
}

/// Extracts structured output from an `LlmResponse`.
/// The first tool call's arguments win; otherwise `content` is parsed as JSON.
/// Every failure is reported as a `SchemaMismatch` against `shape`.
#[derive(Clone)]
pub struct StructuredOutputParser<T = serde_json::Value> {
    shape: String,
    _marker: PhantomData<T>,
}

impl<T> StructuredOutputParser<T> {
    pub fn new(shape: impl Into<String>) -> Self {
        Self {
            shape: shape.into(),
            _marker: PhantomData,
        }
    }

    fn mismatch(&self, reason: impl Into<String>) -> ElicitError {
        ElicitError::SchemaMismatch {
            shape: self.shape.clone(),
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl<T: DeserializeOwned + Send + Sync + 'static> Runnable<LlmResponse, T>
    for StructuredOutputParser<T>
{
    async fn invoke(&self, input: LlmResponse) -> Result<T, ElicitError> {
        if let Some(call) = input.tool_calls.into_iter().next() {
            return serde_json::from_value(call.args).map_err(|err| self.mismatch(err.to_string()));
        }

        let cleaned = strip_code_fence(&input.content);
        if cleaned.is_empty() {
            return Err(self.mismatch("no structured output found in tool calls or content"));
        }

        serde_json::from_str(cleaned).map_err(|err| self.mismatch(err.to_string()))
    }
}
