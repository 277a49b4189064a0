use thiserror::Error;

#[derive(Error, Debug)]
pub enum LeaderboardError {
    /// No store was configured, or it is not ready to serve queries.
    #[error("contribution store is not configured")]
    DataSourceUnavailable,

    #[error("failed to fetch contributions: {0}")]
    FetchFailed(#[from] sqlx::Error),
}

impl LeaderboardError {
    /// Stable code sent to HTTP clients in the `error` field.
    pub fn code(&self) -> &'static str {
        match self {
            LeaderboardError::DataSourceUnavailable => "db_not_configured",
            LeaderboardError::FetchFailed(_) => "leaderboard_fetch_failed",
        }
    }
}

/// A single record that could not be read. Never fatal to the request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("record {index}: {reason}")]
pub struct RowDecodeError {
    pub index: usize,
    pub reason: String,
}

impl RowDecodeError {
    pub fn new(index: usize, reason: impl Into<String>) -> Self {
        Self {
            index,
            reason: reason.into(),
        }
    }
}
