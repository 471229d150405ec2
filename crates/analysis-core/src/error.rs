use thiserror::Error;

/// Errors crossing the analysis-service boundary.
///
/// Carries plain strings so the core stays free of transport types; the
/// HTTP adapter maps its own errors into these variants.
#[derive(Error, Debug, Clone)]
pub enum ServiceError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("job not found: {0}")]
    NotFound(String),
}

/// Errors surfaced by the job tracker to its caller.
#[derive(Error, Debug, Clone)]
pub enum TrackerError {
    #[error("symbol must not be empty")]
    EmptySymbol,

    #[error("submission failed: {0}")]
    Submission(#[from] ServiceError),
}
