use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A synthetic interviewee.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Persona {
    /// Name of the persona
    pub name: String,
    /// Short background of the persona
    pub background: String,
}

impl Persona {
    pub fn new(name: impl Into<String>, background: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            background: background.into(),
        }
    }
}

/// A list of personas.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PersonaBatch {
    /// The generated personas
    #[serde(default)]
    pub personas: Vec<Persona>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interview {
    pub persona: Persona,
    pub question: String,
    pub answer: String,
}

/// Judgement on whether the collected interviews support a requirements document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EvaluationVerdict {
    /// Reason for the judgement
    pub reason: String,
    /// Whether the information is sufficient
    pub is_sufficient: bool,
}
