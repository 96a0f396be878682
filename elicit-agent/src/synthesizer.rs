use std::sync::Arc;

use elicit_core::{ElicitError, Generation};

use crate::model::Interview;
use crate::prompts::{format_interviews, DOCUMENT_PROMPT};

/// Writes the final requirements document.
///
/// The document is free text; section presence is left to the model.
#[derive(Clone)]
pub struct DocumentSynthesizer {
    generation: Arc<dyn Generation>,
}

impl DocumentSynthesizer {
    pub const COMPONENT: &'static str = "document_synthesizer";

    pub fn new(generation: Arc<dyn Generation>) -> Self {
        Self { generation }
    }

    pub async fn synthesize(
        &self,
        user_request: &str,
        interviews: &[Interview],
    ) -> Result<String, ElicitError> {
        let transcript = format_interviews(interviews);
        let result = async {
            let prompt = DOCUMENT_PROMPT.render(&[
                ("user_request", user_request),
                ("interview_results", transcript.as_str()),
            ])?;
            self.generation.generate_text(&prompt).await
        }
        .await;
        result.map_err(|err| ElicitError::generation_failed(Self::COMPONENT, err))
    }
}
