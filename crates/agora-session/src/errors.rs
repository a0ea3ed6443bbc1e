//! Error types for the session layer.
//!
//! `SessionError` covers store plumbing; `ValidationError` covers per-step
//! wizard checks and names the offending field so the CLI can display it
//! inline next to the input that caused it.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    /// A store handle was requested before `SessionScope::install` ran.
    /// This is a programmer error and callers treat it as fatal.
    #[error("Session accessed outside an installed scope")]
    OutsideScope,
    #[error("Failed to access session file '{path}': {source}")]
    Storage {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Session file is not a valid session object: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("No session file location available on this platform")]
    NoStoragePath,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No template selected")]
    NoTemplateSelected,
    #[error("Event '{0}' has an empty description")]
    EmptyEventDescription(String),
    #[error("Experiment name is empty")]
    MissingSimCode,
    #[error("Experiment name '{0}' is already taken")]
    SimCodeTaken(String),
    #[error("Round count '{0}' is not a non-negative integer")]
    InvalidRounds(String),
    #[error("The agent roster is empty")]
    EmptyRoster,
    #[error("Agent '{0}' has an empty display name")]
    UnnamedAgent(String),
    #[error("Agent name '{0}' appears more than once")]
    DuplicateAgentName(String),
    #[error("No language model configured")]
    MissingLlmConfig,
    #[error("Language model field '{field}' is invalid: {message}")]
    InvalidLlmField {
        field: &'static str,
        message: String,
    },
}
