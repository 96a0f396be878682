use elicit_core::state::{Append, Overwrite, Reducer};
use elicit_core::StateSchema;
use serde::{Deserialize, Serialize};

use crate::model::{Interview, Persona};

/// Everything one elicitation run accumulates.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub user_request: String,
    pub personas: Vec<Persona>,
    pub interviews: Vec<Interview>,
    pub requirement_doc: String,
    pub iteration: u32,
    pub is_information_sufficient: bool,
}

impl WorkflowState {
    pub fn new(user_request: impl Into<String>) -> Self {
        Self {
            user_request: user_request.into(),
            ..Self::default()
        }
    }

    /// The personas the next interview round covers: the last `window`
    /// personas, never reaching back into ones that already have an interview.
    pub fn pending_interviews(&self, window: usize) -> &[Persona] {
        let start = self
            .personas
            .len()
            .saturating_sub(window)
            .max(self.interviews.len())
            .min(self.personas.len());
        &self.personas[start..]
    }
}

/// The partial update a single step produces.
///
/// Sequences are appended, `advance_iteration` adds exactly one round, and
/// `requirement_doc` is only accepted while the document is still empty.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowDelta {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub personas: Vec<Persona>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub interviews: Vec<Interview>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirement_doc: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub advance_iteration: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_information_sufficient: Option<bool>,
}

impl StateSchema for WorkflowState {
    type Update = WorkflowDelta;

    fn apply(current: &Self, update: WorkflowDelta) -> Self {
        let requirement_doc = match update.requirement_doc {
            Some(doc) if current.requirement_doc.is_empty() => doc,
            _ => current.requirement_doc.clone(),
        };

        Self {
            user_request: current.user_request.clone(),
            personas: Append.reduce(current.personas.clone(), update.personas),
            interviews: Append.reduce(current.interviews.clone(), update.interviews),
            requirement_doc,
            iteration: current.iteration + u32::from(update.advance_iteration),
            is_information_sufficient: update
                .is_information_sufficient
                .map_or(current.is_information_sufficient, |flag| {
                    Overwrite.reduce(current.is_information_sufficient, flag)
                }),
        }
    }
}
