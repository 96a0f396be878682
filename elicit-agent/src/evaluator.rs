use std::sync::Arc;

use elicit_core::{ElicitError, Generation, GenerationExt};

use crate::model::{EvaluationVerdict, Interview};
use crate::prompts::{format_interviews, EVALUATION_PROMPT};

/// Judges whether the interview history supports a requirements document.
#[derive(Clone)]
pub struct SufficiencyEvaluator {
    generation: Arc<dyn Generation>,
}

impl SufficiencyEvaluator {
    pub const COMPONENT: &'static str = "sufficiency_evaluator";

    pub fn new(generation: Arc<dyn Generation>) -> Self {
        Self { generation }
    }

    pub async fn evaluate(
        &self,
        user_request: &str,
        interviews: &[Interview],
    ) -> Result<EvaluationVerdict, ElicitError> {
        let transcript = format_interviews(interviews);
        let result = async {
            let prompt = EVALUATION_PROMPT.render(&[
                ("user_request", user_request),
                ("interview_results", transcript.as_str()),
            ])?;
            self.generation
                .generate_as::<EvaluationVerdict>(&prompt)
                .await
        }
        .await;
        result.map_err(|err| ElicitError::generation_failed(Self::COMPONENT, err))
    }
}
