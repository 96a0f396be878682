//! Prompt templates for each workflow component.
//!
//! Templates use `{{name}}` placeholders; unknown placeholders render as the
//! empty string.

use elicit_core::{ElicitError, Prompt};
use regex::Regex;

use crate::model::{Interview, Persona};

#[derive(Debug, Clone, Copy)]
pub struct PromptTemplate {
    template: &'static str,
}

impl PromptTemplate {
    pub const fn new(template: &'static str) -> Self {
        Self { template }
    }

    pub fn render(&self, vars: &[(&str, &str)]) -> Result<String, ElicitError> {
        let pattern = Regex::new(r"\{\{\s*(\w+)\s*\}\}")
            .map_err(|e| ElicitError::InvalidConfig(e.to_string()))?;
        let rendered = pattern.replace_all(self.template, |caps: &regex::Captures| {
            let key = &caps[1];
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| value.to_string())
                .unwrap_or_default()
        });
        Ok(rendered.into_owned())
    }
}

/// A system/user template pair.
#[derive(Debug, Clone, Copy)]
pub struct ChatPrompt {
    system: PromptTemplate,
    user: PromptTemplate,
}

impl ChatPrompt {
    pub const fn new(system: &'static str, user: &'static str) -> Self {
        Self {
            system: PromptTemplate::new(system),
            user: PromptTemplate::new(user),
        }
    }

    pub fn render(&self, vars: &[(&str, &str)]) -> Result<Prompt, ElicitError> {
        Ok(Prompt::new(self.system.render(vars)?, self.user.render(vars)?))
    }
}

pub const PERSONA_SYSTEM: &str = "You are an expert at creating personas for user interviews.";

pub const PERSONA_USER: &str = "Generate {{k}} diverse personas to interview about the following user request.

User request: {{user_request}}

Give each persona a name and a short background. Make the personas diverse in age, gender, occupation and technical expertise.";

pub const QUESTION_SYSTEM: &str =
    "You are an expert at writing interview questions that uncover user requirements.";

pub const QUESTION_USER: &str = "Write one interview question about the following user request for the persona below.

User request: {{user_request}}
Persona: {{persona_name}} - {{persona_background}}

The question should be specific and draw out what matters most from this persona's point of view.";

pub const ANSWER_SYSTEM: &str =
    "You are answering as the following persona: {{persona_name}} - {{persona_background}}";

pub const ANSWER_USER: &str = "Question: {{question}}";

pub const EVALUATION_SYSTEM: &str = "You are an expert at judging whether enough information has been gathered to write a comprehensive requirements document.";

pub const EVALUATION_USER: &str = "Based on the user request and interview results below, decide whether enough information has been collected to write a comprehensive requirements document.

User request: {{user_request}}

Interview results:
{{interview_results}}";

pub const DOCUMENT_SYSTEM: &str =
    "You are an expert at writing requirements documents from collected information.";

pub const DOCUMENT_USER: &str = "Write a requirements document from the user request and interview results below.

User request: {{user_request}}

Interview results:
{{interview_results}}

The document must contain the following sections:
1. Project overview (purpose, background, goals)
2. Key features (each with a short description)
3. Non-functional requirements (performance, security, availability and similar)
4. Constraints
5. Target users
6. Prioritization
7. Risks and mitigations

Requirements document:";

pub const PERSONA_PROMPT: ChatPrompt = ChatPrompt::new(PERSONA_SYSTEM, PERSONA_USER);
pub const QUESTION_PROMPT: ChatPrompt = ChatPrompt::new(QUESTION_SYSTEM, QUESTION_USER);
pub const ANSWER_PROMPT: ChatPrompt = ChatPrompt::new(ANSWER_SYSTEM, ANSWER_USER);
pub const EVALUATION_PROMPT: ChatPrompt = ChatPrompt::new(EVALUATION_SYSTEM, EVALUATION_USER);
pub const DOCUMENT_PROMPT: ChatPrompt = ChatPrompt::new(DOCUMENT_SYSTEM, DOCUMENT_USER);

pub fn persona_vars<'a>(persona: &'a Persona) -> [(&'static str, &'a str); 2] {
    [
        ("persona_name", persona.name.as_str()),
        ("persona_background", persona.background.as_str()),
    ]
}

/// Renders interviews as transcript blocks separated by blank lines.
pub fn format_interviews(interviews: &[Interview]) -> String {
    interviews
        .iter()
        .map(|interview| {
            format!(
                "Persona: {} - {}\nQuestion: {}\nAnswer: {}\n",
                interview.persona.name,
                interview.persona.background,
                interview.question,
                interview.answer
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_placeholders_with_optional_whitespace() {
        let template = PromptTemplate::new("Hello {{ name }}, you asked about {{topic}}.");
        let rendered = template
            .render(&[("name", "Aiko"), ("topic", "groceries")])
            .unwrap();
        assert_eq!(rendered, "Hello Aiko, you asked about groceries.");
    }

    #[test]
    fn missing_placeholders_render_empty() {
        let template = PromptTemplate::new("[{{missing}}]");
        assert_eq!(template.render(&[]).unwrap(), "[]");
    }

    #[test]
    fn values_are_not_rescanned_for_placeholders() {
        let template = PromptTemplate::new("Question: {{question}}");
        let rendered = template.render(&[("question", "what is {{k}}?")]).unwrap();
        assert_eq!(rendered, "Question: what is {{k}}?");
    }

    #[test]
    fn answer_prompt_speaks_as_the_persona() {
        let persona = Persona::new("Aiko", "a nurse working night shifts");
        let [name, background] = persona_vars(&persona);
        let prompt = ANSWER_PROMPT
            .render(&[name, background, ("question", "How do you shop?")])
            .unwrap();

        assert_eq!(
            prompt.system,
            "You are answering as the following persona: Aiko - a nurse working night shifts"
        );
        assert_eq!(prompt.user, "Question: How do you shop?");
    }

    #[test]
    fn document_prompt_lists_all_sections() {
        let prompt = DOCUMENT_PROMPT
            .render(&[("user_request", "app"), ("interview_results", "")])
            .unwrap();
        for section in [
            "Project overview",
            "Key features",
            "Non-functional requirements",
            "Constraints",
            "Target users",
            "Prioritization",
            "Risks and mitigations",
        ] {
            assert!(prompt.user.contains(section), "missing {section}");
        }
    }

    #[test]
    fn formats_interview_transcript() {
        let interviews = vec![
            Interview {
                persona: Persona::new("Aiko", "nurse"),
                question: "How do you plan meals?".to_string(),
                answer: "On Sundays.".to_string(),
            },
            Interview {
                persona: Persona::new("Ben", "student"),
                question: "Do you share lists?".to_string(),
                answer: "With roommates.".to_string(),
            },
        ];

        assert_eq!(
            format_interviews(&interviews),
            "Persona: Aiko - nurse\nQuestion: How do you plan meals?\nAnswer: On Sundays.\n\n\
             Persona: Ben - student\nQuestion: Do you share lists?\nAnswer: With roommates.\n"
        );
        assert_eq!(format_interviews(&[]), "");
    }
}
