use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::insights::error::InsightResult;
use crate::insights::models::{Insight, InsightRow, NewInsight};

/// Persistence for insights
///
/// At most one non-dismissed insight exists per (customer, type).
#[async_trait]
pub trait InsightStore: Send + Sync {
    /// Insert unless an active insight of the same type exists for the customer
    ///
    /// Returns `None` when the insert was skipped.
    async fn insert_if_absent(&self, insight: &NewInsight) -> InsightResult<Option<Insight>>;

    /// Non-dismissed insights of a restaurant, newest first
    async fn fetch_active(&self, restaurant_id: Uuid) -> InsightResult<Vec<Insight>>;

    /// Mark dismissed; unknown and already-dismissed ids are a no-op
    async fn dismiss(&self, insight_id: Uuid) -> InsightResult<()>;
}

/// Postgres-backed insight store
///
/// Dedup relies on the partial unique index
/// `customer_insights (customer_id, insight_type) WHERE dismissed = false`,
/// so concurrent passes cannot both insert.
#[derive(Clone)]
pub struct PgInsightRepository {
    pool: PgPool,
}

impl PgInsightRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InsightStore for PgInsightRepository {
    async fn insert_if_absent(&self, insight: &NewInsight) -> InsightResult<Option<Insight>> {
        let row = sqlx::query_as::<_, InsightRow>(
            r#"
            INSERT INTO customer_insights (customer_id, restaurant_id, insight_type, message, action_allowed)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (customer_id, insight_type) WHERE dismissed = false DO NOTHING
            RETURNING id, customer_id, restaurant_id, insight_type, message, action_allowed,
                      dismissed, created_at, dismissed_at
            "#,
        )
        .bind(insight.customer_id)
        .bind(insight.restaurant_id)
        .bind(insight.insight_type.as_str())
        .bind(&insight.message)
        .bind(insight.action_allowed)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Insight::try_from).transpose()
    }

    async fn fetch_active(&self, restaurant_id: Uuid) -> InsightResult<Vec<Insight>> {
        let rows = sqlx::query_as::<_, InsightRow>(
            r#"
            SELECT id, customer_id, restaurant_id, insight_type, message, action_allowed,
                   dismissed, created_at, dismissed_at
            FROM customer_insights
            WHERE restaurant_id = $1 AND dismissed = false
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;

        // a corrupt row is skipped, not fatal for the whole listing
        Ok(rows
            .into_iter()
            .filter_map(|row| match Insight::try_from(row) {
                Ok(insight) => Some(insight),
                Err(e) => {
                    tracing::warn!("Skipping insight row: {}", e);
                    None
                }
            })
            .collect())
    }

    async fn dismiss(&self, insight_id: Uuid) -> InsightResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE customer_insights
            SET dismissed = true, dismissed_at = COALESCE(dismissed_at, NOW())
            WHERE id = $1
            "#,
        )
        .bind(insight_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            tracing::debug!("Dismiss of unknown insight {} ignored", insight_id);
        }
        Ok(())
    }
}
