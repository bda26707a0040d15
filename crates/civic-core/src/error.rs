use thiserror::Error;

#[derive(Debug, Error)]
pub enum CivicError {
    #[error("configuration invalid: {0}")]
    ConfigurationInvalid(String),

    #[error("subtheme validation failed:\n{0}")]
    ValidationFailed(String),

    #[error("step {index} ({name}) failed: {message}")]
    StepExecutionFailed {
        index: usize,
        name: String,
        message: String,
    },

    #[error("schema generation failed: {0}")]
    Schema(String),

    #[error(transparent)]
    Transport(#[from] claude_client::ClaudeClientError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, CivicError>;
