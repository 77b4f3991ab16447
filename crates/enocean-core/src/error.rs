use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Flow lifecycle errors
    #[error("Flow already finished")]
    FlowFinished,

    #[error("Unexpected step: expected {expected}, got {actual}")]
    UnexpectedStep { expected: String, actual: String },

    #[error("Unknown step: {0}")]
    UnknownStep(String),

    #[error("Invalid step transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Unique ID already set to {0}")]
    UniqueIdAlreadySet(String),

    // Input errors
    #[error("Invalid input for {field}: {message}")]
    InvalidInput { field: String, message: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid USB descriptor: {0}")]
    InvalidDescriptor(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create an invalid input error for a form field.
    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
