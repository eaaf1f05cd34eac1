#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    /// A click, scroll or lookup did not take effect. Worth retrying.
    #[error("Interaction failed: {0}")]
    Interaction(String),

    /// The browser session itself is unusable.
    #[error("Session error: {0}")]
    Session(String),

    #[error("Database error")]
    DatabaseError(#[from] sqlx::error::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("No {0} given")]
    MissingInput(String),

    #[error("Target count must be greater than zero")]
    InvalidTarget,
}

impl CollectorError {
    pub fn is_transient(&self) -> bool {
        matches!(self, CollectorError::Interaction(_))
    }
}
