use crate::protocol::{Response, Status};

pub const NO_ANSWER: &str = "(no answer provided)";
pub const DEFAULT_DIVE_PROMPT: &str = "Would you like me to dive deeper?";
pub const DEFAULT_CLARIFY: &str = "Could you clarify your question?";
pub const UNKNOWN_ERROR: &str = "Unknown error";
pub const UNEXPECTED_RESPONSE: &str = "(Unexpected response)";

/// What the UI should do with a backend response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Answer(String),
    /// Ask the user whether the backend should dig deeper
    ConfirmDive(String),
    Clarify(String),
    Error(String),
    Unexpected,
}

impl Outcome {
    /// Text for the output region. `ConfirmDive` returns the dialog prompt.
    pub fn display_text(&self) -> String {
        match self {
            Outcome::Answer(answer) => answer.clone(),
            Outcome::ConfirmDive(prompt) => prompt.clone(),
            Outcome::Clarify(question) => question.clone(),
            Outcome::Error(message) => format!("Error: {}", message),
            Outcome::Unexpected => UNEXPECTED_RESPONSE.to_string(),
        }
    }
}

pub fn interpret(response: &Response) -> Outcome {
    fn or_default(field: &Option<String>, default: &str) -> String {
        field.clone().unwrap_or_else(|| default.to_string())
    }

    match response.status {
        Status::Ok => Outcome::Answer(or_default(&response.answer, NO_ANSWER)),
        Status::NeedsDeeper => {
            Outcome::ConfirmDive(or_default(&response.prompt, DEFAULT_DIVE_PROMPT))
        }
        Status::Clarify => Outcome::Clarify(or_default(&response.question, DEFAULT_CLARIFY)),
        Status::Error => Outcome::Error(or_default(&response.message, UNKNOWN_ERROR)),
        Status::Unrecognized(_) => Outcome::Unexpected,
    }
}
