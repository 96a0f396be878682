#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use elicit_agent::prompts::{DOCUMENT_SYSTEM, QUESTION_SYSTEM};
use elicit_core::{ElicitError, Generation, Prompt, SchemaDescriptor, Value};
use serde_json::json;

/// A deterministic backend that plays the whole workflow.
///
/// Personas are numbered `P1, P2, ...` across rounds. Questions and answers
/// echo the persona they were generated for, so callers can check which
/// persona each interview belongs to.
pub struct ScriptedGeneration {
    batch_size: usize,
    verdicts: Mutex<VecDeque<bool>>,
    fail_answers_in_round: Option<usize>,
    text_delay: Duration,
    persona_rounds: AtomicUsize,
    answer_calls: AtomicUsize,
    evaluated: Mutex<Vec<usize>>,
    synthesized: Mutex<Vec<usize>>,
}

impl ScriptedGeneration {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size,
            verdicts: Mutex::new(VecDeque::new()),
            fail_answers_in_round: None,
            text_delay: Duration::ZERO,
            persona_rounds: AtomicUsize::new(0),
            answer_calls: AtomicUsize::new(0),
            evaluated: Mutex::new(Vec::new()),
            synthesized: Mutex::new(Vec::new()),
        }
    }

    /// Verdicts returned by successive evaluations; once exhausted every
    /// evaluation is insufficient.
    pub fn with_verdicts(self, verdicts: impl IntoIterator<Item = bool>) -> Self {
        *self.verdicts.lock().unwrap() = verdicts.into_iter().collect();
        self
    }

    pub fn failing_answers_in_round(mut self, round: usize) -> Self {
        self.fail_answers_in_round = Some(round);
        self
    }

    pub fn with_text_delay(mut self, delay: Duration) -> Self {
        self.text_delay = delay;
        self
    }

    pub fn persona_rounds(&self) -> usize {
        self.persona_rounds.load(Ordering::SeqCst)
    }

    pub fn answer_calls(&self) -> usize {
        self.answer_calls.load(Ordering::SeqCst)
    }

    /// Number of interviews in each evaluation prompt, in call order.
    pub fn evaluated_sizes(&self) -> Vec<usize> {
        self.evaluated.lock().unwrap().clone()
    }

    /// Number of interviews in each synthesis prompt, in call order.
    pub fn synthesized_sizes(&self) -> Vec<usize> {
        self.synthesized.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Generation for ScriptedGeneration {
    async fn generate_text(&self, prompt: &Prompt) -> Result<String, ElicitError> {
        if !self.text_delay.is_zero() {
            tokio::time::sleep(self.text_delay).await;
        }

        if prompt.system == QUESTION_SYSTEM {
            let name = persona_after(&prompt.user, "Persona: ");
            return Ok(question_for(&name));
        }
        if prompt.system == DOCUMENT_SYSTEM {
            let interviews = count_transcript_blocks(&prompt.user);
            self.synthesized.lock().unwrap().push(interviews);
            return Ok(format!("# Requirements\n\nBased on {interviews} interviews."));
        }

        self.answer_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_answers_in_round == Some(self.persona_rounds()) {
            return Err(ElicitError::Capability("model overloaded".to_string()));
        }
        let name = persona_after(&prompt.system, "following persona: ");
        let question = prompt.user.trim_start_matches("Question: ");
        Ok(answer_for(&name, question))
    }

    async fn generate_structured(
        &self,
        prompt: &Prompt,
        shape: &SchemaDescriptor,
    ) -> Result<Value, ElicitError> {
        match shape.name.as_str() {
            "PersonaBatch" => {
                let round = self.persona_rounds.fetch_add(1, Ordering::SeqCst) + 1;
                let first = (round - 1) * self.batch_size + 1;
                let personas: Vec<Value> = (first..first + self.batch_size)
                    .map(|n| {
                        json!({
                            "name": format!("P{n}"),
                            "background": format!("persona {n} from round {round}"),
                        })
                    })
                    .collect();
                Ok(json!({ "personas": personas }))
            }
            "EvaluationVerdict" => {
                self.evaluated
                    .lock()
                    .unwrap()
                    .push(count_transcript_blocks(&prompt.user));
                let sufficient = self.verdicts.lock().unwrap().pop_front().unwrap_or(false);
                Ok(json!({
                    "reason": if sufficient { "enough detail" } else { "need more perspectives" },
                    "is_sufficient": sufficient,
                }))
            }
            other => Err(ElicitError::SchemaMismatch {
                shape: other.to_string(),
                reason: "unexpected shape".to_string(),
            }),
        }
    }
}

pub fn question_for(name: &str) -> String {
    format!("What matters to {name}?")
}

pub fn answer_for(name: &str, question: &str) -> String {
    format!("{name} answers: {question}")
}

fn persona_after(text: &str, marker: &str) -> String {
    text.split_once(marker)
        .and_then(|(_, rest)| rest.split_once(" - "))
        .map(|(name, _)| name.to_string())
        .unwrap_or_default()
}

fn count_transcript_blocks(text: &str) -> usize {
    text.matches("Persona: ").count()
}

/// Returns fixed payloads and records every prompt it sees.
pub struct FixedGeneration {
    text: Result<String, String>,
    structured: Value,
    prompts: Mutex<Vec<Prompt>>,
}

impl FixedGeneration {
    pub fn structured(value: Value) -> Self {
        Self {
            text: Ok(String::new()),
            structured: value,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn text(text: &str) -> Self {
        Self {
            text: Ok(text.to_string()),
            structured: Value::Null,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn unavailable(message: &str) -> Self {
        Self {
            text: Err(message.to_string()),
            structured: Value::Null,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Generation for FixedGeneration {
    async fn generate_text(&self, prompt: &Prompt) -> Result<String, ElicitError> {
        self.prompts.lock().unwrap().push(prompt.clone());
        self.text.clone().map_err(ElicitError::Capability)
    }

    async fn generate_structured(
        &self,
        prompt: &Prompt,
        _shape: &SchemaDescriptor,
    ) -> Result<Value, ElicitError> {
        self.prompts.lock().unwrap().push(prompt.clone());
        if let Err(message) = &self.text {
            return Err(ElicitError::Capability(message.clone()));
        }
        Ok(self.structured.clone())
    }
}
