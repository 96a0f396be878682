use std::sync::Arc;

use elicit_core::{ElicitError, Generation, GenerationExt};

use crate::model::{Persona, PersonaBatch};
use crate::prompts::PERSONA_PROMPT;

/// Produces a batch of diverse personas for a user request.
#[derive(Clone)]
pub struct PersonaGenerator {
    generation: Arc<dyn Generation>,
}

impl PersonaGenerator {
    pub const COMPONENT: &'static str = "persona_generator";

    pub fn new(generation: Arc<dyn Generation>) -> Self {
        Self { generation }
    }

    /// Asks for `count` personas. Surplus personas are dropped; a short but
    /// non-empty batch is accepted.
    pub async fn generate(
        &self,
        user_request: &str,
        count: usize,
    ) -> Result<Vec<Persona>, ElicitError> {
        if count == 0 {
            return Err(ElicitError::InvalidConfig(
                "persona count must be greater than zero".to_string(),
            ));
        }
        self.request(user_request, count)
            .await
            .map_err(|err| ElicitError::generation_failed(Self::COMPONENT, err))
    }

    async fn request(&self, user_request: &str, count: usize) -> Result<Vec<Persona>, ElicitError> {
        let k = count.to_string();
        let prompt = PERSONA_PROMPT.render(&[("k", k.as_str()), ("user_request", user_request)])?;
        let mut personas = self
            .generation
            .generate_as::<PersonaBatch>(&prompt)
            .await?
            .personas;

        if personas.is_empty() {
            return Err(ElicitError::SchemaMismatch {
                shape: "PersonaBatch".to_string(),
                reason: "no personas returned".to_string(),
            });
        }
        if personas.len() > count {
            tracing::debug!(requested = count, received = personas.len(), "truncating persona batch");
            personas.truncate(count);
        } else if personas.len() < count {
            tracing::warn!(requested = count, received = personas.len(), "persona batch is short");
        }
        Ok(personas)
    }
}
