use analysis_core::ServiceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;

impl From<ClientError> for ServiceError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::RequestFailed(e) => ServiceError::Transport(e.to_string()),
            ClientError::ServiceUnavailable(msg) => ServiceError::Unavailable(msg),
            ClientError::JobNotFound(id) => ServiceError::NotFound(id),
            ClientError::InvalidResponse(msg) => ServiceError::InvalidResponse(msg),
            ClientError::Serialization(e) => ServiceError::InvalidResponse(e.to_string()),
        }
    }
}
