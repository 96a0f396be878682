//! The generation capability consumed by every workflow component.
//!
//! A backend only has to answer single prompts; the batch operations have
//! order-preserving default implementations that fan out with bounded
//! concurrency and fail as a whole.

use std::future::Future;

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use schemars::JsonSchema;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::{ElicitError, Value};

pub const DEFAULT_BATCH_CONCURRENCY: usize = 8;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

/// Describes the shape a structured generation must conform to.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    pub name: String,
    pub description: String,
    /// JSON Schema of the expected value.
    pub schema: Value,
}

impl SchemaDescriptor {
    pub fn of<T: JsonSchema>() -> Self {
        let root = schemars::schema_for!(T);
        let description = root
            .schema
            .metadata
            .as_ref()
            .and_then(|meta| meta.description.clone())
            .unwrap_or_else(|| T::schema_name());
        let mut schema = serde_json::to_value(&root).unwrap_or_default();
        if let Value::Object(map) = &mut schema {
            map.remove("$schema");
        }
        Self {
            name: T::schema_name(),
            description,
            schema,
        }
    }

    /// Deserializes `value` into `T`, reporting failures against this shape.
    pub fn coerce<T: DeserializeOwned>(&self, value: Value) -> Result<T, ElicitError> {
        serde_json::from_value(value).map_err(|err| ElicitError::SchemaMismatch {
            shape: self.name.clone(),
            reason: err.to_string(),
        })
    }
}

/// Types that can be requested from [`Generation::generate_structured`].
pub trait StructuredOutput: JsonSchema + DeserializeOwned + Send + 'static {}

impl<T> StructuredOutput for T where T: JsonSchema + DeserializeOwned + Send + 'static {}

#[async_trait]
pub trait Generation: Send + Sync {
    async fn generate_text(&self, prompt: &Prompt) -> Result<String, ElicitError>;

    async fn generate_structured(
        &self,
        prompt: &Prompt,
        shape: &SchemaDescriptor,
    ) -> Result<Value, ElicitError>;

    /// Upper bound on in-flight calls issued by the batch operations.
    fn batch_concurrency(&self) -> usize {
        DEFAULT_BATCH_CONCURRENCY
    }

    async fn generate_text_batch(&self, prompts: &[Prompt]) -> Result<Vec<String>, ElicitError> {
        let calls: Vec<_> = prompts
            .iter()
            .map(|prompt| self.generate_text(prompt))
            .collect();
        ordered_batch(calls, self.batch_concurrency()).await
    }

    async fn generate_structured_batch(
        &self,
        prompts: &[Prompt],
        shape: &SchemaDescriptor,
    ) -> Result<Vec<Value>, ElicitError> {
        let calls: Vec<_> = prompts
            .iter()
            .map(|prompt| self.generate_structured(prompt, shape))
            .collect();
        ordered_batch(calls, self.batch_concurrency()).await
    }
}

/// Typed structured generation on top of any [`Generation`].
#[async_trait]
pub trait GenerationExt: Generation {
    async fn generate_as<T: StructuredOutput>(&self, prompt: &Prompt) -> Result<T, ElicitError> {
        let shape = SchemaDescriptor::of::<T>();
        let value = self.generate_structured(prompt, &shape).await?;
        shape.coerce(value)
    }

    async fn generate_as_batch<T: StructuredOutput>(
        &self,
        prompts: &[Prompt],
    ) -> Result<Vec<T>, ElicitError> {
        let shape = SchemaDescriptor::of::<T>();
        let values = self.generate_structured_batch(prompts, &shape).await?;
        values.into_iter().map(|value| shape.coerce(value)).collect()
    }
}

impl<G: Generation + ?Sized> GenerationExt for G {}

/// Drives `calls` with at most `concurrency` of them in flight.
///
/// The futures must be lazy. Results are yielded in input order regardless
/// of completion order, and the first error aborts the batch, dropping the
/// remaining in-flight calls.
pub async fn ordered_batch<T, I>(calls: I, concurrency: usize) -> Result<Vec<T>, ElicitError>
where
    I: IntoIterator,
    I::Item: Future<Output = Result<T, ElicitError>>,
{
    stream::iter(calls)
        .buffered(concurrency.max(1))
        .try_collect()
        .await
}
