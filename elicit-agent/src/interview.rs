use std::sync::Arc;

use elicit_core::{ElicitError, Generation, Prompt};

use crate::model::{Interview, Persona};
use crate::prompts::{persona_vars, ANSWER_PROMPT, QUESTION_PROMPT};

/// Interviews personas in two batched phases: questions, then answers given
/// in each persona's voice.
#[derive(Clone)]
pub struct InterviewConductor {
    generation: Arc<dyn Generation>,
}

impl InterviewConductor {
    pub const COMPONENT: &'static str = "interview_conductor";

    pub fn new(generation: Arc<dyn Generation>) -> Self {
        Self { generation }
    }

    /// Returns one interview per persona, in the order given.
    pub async fn conduct(
        &self,
        user_request: &str,
        personas: &[Persona],
    ) -> Result<Vec<Interview>, ElicitError> {
        if personas.is_empty() {
            return Ok(Vec::new());
        }
        self.interview(user_request, personas)
            .await
            .map_err(|err| ElicitError::generation_failed(Self::COMPONENT, err))
    }

    async fn interview(
        &self,
        user_request: &str,
        personas: &[Persona],
    ) -> Result<Vec<Interview>, ElicitError> {
        let question_prompts = personas
            .iter()
            .map(|persona| {
                let [name, background] = persona_vars(persona);
                QUESTION_PROMPT.render(&[("user_request", user_request), name, background])
            })
            .collect::<Result<Vec<Prompt>, _>>()?;
        let questions = self.generation.generate_text_batch(&question_prompts).await?;
        ensure_len("question", personas.len(), questions.len())?;

        let answer_prompts = personas
            .iter()
            .zip(&questions)
            .map(|(persona, question)| {
                let [name, background] = persona_vars(persona);
                ANSWER_PROMPT.render(&[name, background, ("question", question.as_str())])
            })
            .collect::<Result<Vec<Prompt>, _>>()?;
        let answers = self.generation.generate_text_batch(&answer_prompts).await?;
        ensure_len("answer", personas.len(), answers.len())?;

        Ok(personas
            .iter()
            .cloned()
            .zip(questions.into_iter().zip(answers))
            .map(|(persona, (question, answer))| Interview {
                persona,
                question,
                answer,
            })
            .collect())
    }
}

fn ensure_len(phase: &str, expected: usize, actual: usize) -> Result<(), ElicitError> {
    if expected == actual {
        Ok(())
    } else {
        Err(ElicitError::Capability(format!(
            "{phase} batch returned {actual} results for {expected} prompts"
        )))
    }
}
