use thiserror::Error;

/// Errors raised by the assistant core
#[derive(Error, Debug)]
pub enum AssistantError {
    #[error("Configuration Error: {0}")]
    ConfigError(String),

    #[error("Request Error: {0}")]
    RequestError(String),

    #[error("Response Error: {0}")]
    ResponseError(String),

    #[error("Parsing Error: {0}")]
    ParsingError(String),

    #[error("HTTP Error: {status_code} - {message}")]
    HttpError { status_code: u16, message: String },

    /// Input rejected locally, before any network call
    #[error("{0}")]
    Validation(String),

    /// Feedback could not be delivered; carries the upstream detail when there is one
    #[error("Error sending feedback: {}", .0.as_deref().unwrap_or("Please try again later"))]
    Feedback(Option<String>),

    #[error(transparent)]
    ReqwestError(#[from] reqwest::Error),
}

/// Result type for assistant operations
pub type AssistantResult<T> = Result<T, AssistantError>;
