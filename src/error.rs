//! Error types for recap.

use thiserror::Error;

/// Library-level error type for recap operations.
#[derive(Error, Debug)]
pub enum RecapError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Video search failed: {0}")]
    Search(String),

    #[error("Transcript unavailable: {0}")]
    Transcript(String),

    #[error("Text generation failed: {0}")]
    Generation(String),

    #[error("Workflow exceeded its step budget of {limit} agent/tool steps")]
    StepBudgetExceeded { limit: usize },

    #[error("Workflow error: {0}")]
    Workflow(String),

    #[error("Speech synthesis failed: {0}")]
    Speech(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OpenAI API error: {0}")]
    OpenAI(String),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for recap operations.
pub type Result<T> = std::result::Result<T, RecapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_budget_message() {
        let err = RecapError::StepBudgetExceeded { limit: 7 };
        assert_eq!(
            err.to_string(),
            "Workflow exceeded its step budget of 7 agent/tool steps"
        );
    }
}
