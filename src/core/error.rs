use thiserror::Error;

#[derive(Error, Debug)]
pub enum HabitatError {
    #[error("Agent not found: {0:?}")]
    AgentNotFound(crate::core::types::AgentId),

    #[error("Agent already registered: {0:?}")]
    AgentAlreadyExists(crate::core::types::AgentId),

    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Rule definition error: {0}")]
    RuleDefinition(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, HabitatError>;
