// Error types for insight generation and persistence

use thiserror::Error;

use crate::analytics::AnalyticsError;

#[derive(Debug, Error)]
pub enum InsightError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// A stored row could not be mapped back to an insight
    #[error("Corrupt insight row: {0}")]
    CorruptRow(String),

    /// Customer summaries could not be loaded
    #[error(transparent)]
    Source(#[from] AnalyticsError),
}

pub type InsightResult<T> = Result<T, InsightError>;
