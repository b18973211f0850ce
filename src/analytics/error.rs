// Error types for customer analytics

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Event Repository query failed; the whole analysis fails with it
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// No usable customer id, email or phone was supplied
    #[error("Invalid customer identity: {0}")]
    InvalidIdentity(String),
}

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;
