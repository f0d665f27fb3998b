use crate::llm::BackendError;

/// Substrings the AIML engine emits when it has nothing useful to say.
pub const INVALID_MARKERS: [&str; 7] = [
    "idk",
    "I have no answer",
    "<oob>",
    "Something is wrong",
    "AIML",
    "Index",
    "<html>",
];

pub fn is_invalid(text: &str) -> bool {
    INVALID_MARKERS.iter().any(|marker| text.contains(marker))
}

/// Result of asking the dialogue engine once.
#[derive(Debug)]
pub enum PrimaryOutcome {
    Valid(String),
    Invalid(String),
    Unavailable(BackendError),
}

impl PrimaryOutcome {
    pub fn classify(result: Result<String, BackendError>) -> Self {
        match result {
            Ok(text) if text.is_empty() || is_invalid(&text) => PrimaryOutcome::Invalid(text),
            Ok(text) => PrimaryOutcome::Valid(text),
            Err(e) => PrimaryOutcome::Unavailable(e),
        }
    }
}
