#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("batch analysis cancelled")]
    Cancelled,

    #[error("batch worker failed: {0}")]
    WorkerFailed(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ScanError>;
