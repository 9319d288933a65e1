use crate::data::SessionId;

/// Failure reported by the data-access layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("data source unavailable: {0}")]
    Unavailable(String),
    #[error("unknown session {0}")]
    UnknownSession(SessionId),
    #[error("write rejected: {0}")]
    Write(String),
}

/// Fatal error aborting an assignment run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("no active session")]
    MissingSession,
    #[error("failed to load {dataset}: {source}")]
    Fetch {
        dataset: &'static str,
        #[source]
        source: StoreError,
    },
    #[error("failed to save assignments: {0}")]
    Persist(#[source] StoreError),
    #[error("run lock for session {0} is poisoned")]
    LockPoisoned(SessionId),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} must be a non-negative integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },
    #[error("invalid type quota entry {0:?}, expected type=quota")]
    InvalidQuota(String),
}
