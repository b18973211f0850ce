use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::analytics::models::CustomerProfile;
use crate::analytics::repository::EventSource;
use crate::insights::error::InsightResult;
use crate::insights::models::Insight;
use crate::insights::repository::InsightStore;
use crate::insights::rules::InsightRuleEngine;
use crate::metrics::EngineMetrics;

/// Outcome of one generation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationReport {
    pub created: usize,
    /// Candidates skipped because an active insight already exists
    pub skipped: usize,
    pub failed: usize,
}

/// Service layer for insight generation, listing and dismissal
#[derive(Clone)]
pub struct InsightService {
    store: Arc<dyn InsightStore>,
    source: Arc<dyn EventSource>,
    metrics: EngineMetrics,
}

impl InsightService {
    pub fn new(store: Arc<dyn InsightStore>, source: Arc<dyn EventSource>, metrics: EngineMetrics) -> Self {
        Self {
            store,
            source,
            metrics,
        }
    }

    /// Generate and persist insights for every customer of a restaurant
    pub async fn generate_for_restaurant(&self, restaurant_id: Uuid) -> InsightResult<GenerationReport> {
        let customers = self.source.fetch_customer_profiles(restaurant_id).await?;
        tracing::info!(
            "Generating insights for {} customers of restaurant {}",
            customers.len(),
            restaurant_id
        );
        Ok(self.generate_and_persist(&customers, Utc::now()).await)
    }

    /// Run the rule engine over `customers` and persist each candidate
    ///
    /// Customers are processed sequentially. A failed write is logged and
    /// counted; it never aborts the rest of the pass.
    pub async fn generate_and_persist(
        &self,
        customers: &[CustomerProfile],
        now: DateTime<Utc>,
    ) -> GenerationReport {
        let _timer = self.metrics.start_insight_pass();
        let mut report = GenerationReport::default();

        for customer in customers {
            for candidate in InsightRuleEngine::evaluate(customer, now) {
                match self.store.insert_if_absent(&candidate).await {
                    Ok(Some(insight)) => {
                        tracing::debug!(
                            "Created {} insight {} for customer {}",
                            insight.insight_type,
                            insight.id,
                            insight.customer_id
                        );
                        report.created += 1;
                    }
                    Ok(None) => report.skipped += 1,
                    Err(e) => {
                        tracing::warn!(
                            "Failed to persist {} insight for customer {}: {}",
                            candidate.insight_type,
                            candidate.customer_id,
                            e
                        );
                        report.failed += 1;
                    }
                }
            }
        }

        self.metrics.record_insights_created(report.created as u64);
        self.metrics.record_insight_write_failures(report.failed as u64);
        report
    }

    pub async fn fetch_active(&self, restaurant_id: Uuid) -> InsightResult<Vec<Insight>> {
        self.store.fetch_active(restaurant_id).await
    }

    pub async fn dismiss(&self, insight_id: Uuid) -> InsightResult<()> {
        self.store.dismiss(insight_id).await?;
        tracing::info!("Dismissed insight {}", insight_id);
        Ok(())
    }
}
