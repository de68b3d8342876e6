use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Content store unavailable: {0}")]
    Unavailable(String),

    #[error("Content store rejected state for {template_id}: {reason}")]
    Rejected { template_id: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Invalid template id: {0:?}")]
    InvalidId(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    #[error("No generation backend configured")]
    Unavailable,

    #[error("Generation backend failed: {0}")]
    Backend(String),

    #[error("Generation timed out after {0}ms")]
    TimedOut(u64),
}
