use async_trait::async_trait;
use elicit_core::{
    ElicitError, Generation, LlmRequest, Message, Prompt, Runnable, SchemaDescriptor,
    StrOutputParser, StructuredOutputParser, ToolSpec, Value, DEFAULT_BATCH_CONCURRENCY,
};

use crate::Llm;

/// [`Generation`] over any chat model.
///
/// Structured requests bind the schema as the only tool, so providers that
/// support forced tool calls return arguments conforming to it; plain JSON
/// content is accepted as a fallback.
pub struct LlmGeneration<L> {
    llm: L,
    model: String,
    temperature: Option<f32>,
    concurrency: usize,
}

impl<L> LlmGeneration<L> {
    pub fn new(llm: L) -> Self {
        Self {
            llm,
            model: String::new(),
            temperature: Some(0.0),
            concurrency: DEFAULT_BATCH_CONCURRENCY,
        }
    }

    /// Overrides the client's default model. Empty means "client default".
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    fn request(&self, prompt: &Prompt, tools: Vec<ToolSpec>) -> LlmRequest {
        LlmRequest {
            model: self.model.clone(),
            messages: vec![
                Message::system(prompt.system.clone()),
                Message::user(prompt.user.clone()),
            ],
            tools,
            temperature: self.temperature,
        }
    }
}

#[async_trait]
impl<L> Generation for LlmGeneration<L>
where
    L: Llm + 'static,
{
    async fn generate_text(&self, prompt: &Prompt) -> Result<String, ElicitError> {
        let response = self.llm.invoke(self.request(prompt, Vec::new())).await?;
        StrOutputParser.invoke(response).await
    }

    async fn generate_structured(
        &self,
        prompt: &Prompt,
        shape: &SchemaDescriptor,
    ) -> Result<Value, ElicitError> {
        let tool = ToolSpec {
            name: shape.name.clone(),
            description: shape.description.clone(),
            parameters: shape.schema.clone(),
        };
        let response = self.llm.invoke(self.request(prompt, vec![tool])).await?;
        StructuredOutputParser::<Value>::new(shape.name.clone())
            .invoke(response)
            .await
    }

    fn batch_concurrency(&self) -> usize {
        self.concurrency
    }
}
