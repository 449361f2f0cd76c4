use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("execution backend failed: {0}")]
    Backend(String),

    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    /// Message suitable for showing next to the query panel.
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::InvalidRequest(message) => message.clone(),
            other => other.to_string(),
        }
    }
}
