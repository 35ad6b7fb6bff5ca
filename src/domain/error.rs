use {std::time::Duration, thiserror::Error};

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store: {0}")]
    Store(String),

    #[error("audit write did not finish within {0:?}")]
    Timeout(Duration),

    #[error("audit write task aborted: {0}")]
    Aborted(String),

    #[error("config: {0}")]
    Config(String),
}

/// Failures of the demo record service. These are ordinary API errors and are
/// audited like any other response.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("validation: {0}")]
    Validation(String),

    #[error("{collection} record not found: {id}")]
    NotFound { collection: String, id: String },
}
