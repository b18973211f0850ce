// Customer Analytics Engine - Orchestrator
//
// Fetches one customer's event streams, then runs the aggregator and the
// three consumers of its output plus the monthly rollup. Any repository
// failure fails the whole analysis; there is no partial result.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::analytics::aggregator::MetricsAggregator;
use crate::analytics::alerts::AlertGenerator;
use crate::analytics::error::{AnalyticsError, AnalyticsResult};
use crate::analytics::evolution::monthly_evolution;
use crate::analytics::identity::CustomerIdentity;
use crate::analytics::models::{CustomerAnalysis, CustomerProfile, PromotionEvent, VisitEvent};
use crate::analytics::repository::EventSource;
use crate::analytics::scoring::RelationshipScorer;
use crate::analytics::trend::TrendClassifier;
use crate::config::AnalyticsConfig;
use crate::metrics::EngineMetrics;

/// Everything fetched for one analysis
#[derive(Debug, Clone, Default)]
pub struct CustomerHistory {
    pub profile: Option<CustomerProfile>,
    pub visits: Vec<VisitEvent>,
    pub promotions: Vec<PromotionEvent>,
    pub baseline_wait_samples: Vec<f64>,
}

#[derive(Clone)]
pub struct CustomerAnalyticsEngine {
    source: Arc<dyn EventSource>,
    aggregator: MetricsAggregator,
    alerts: AlertGenerator,
    config: AnalyticsConfig,
    metrics: EngineMetrics,
}

impl CustomerAnalyticsEngine {
    pub fn new(source: Arc<dyn EventSource>, config: AnalyticsConfig, metrics: EngineMetrics) -> Self {
        Self {
            source,
            aggregator: MetricsAggregator::new(config.local_offset()),
            alerts: AlertGenerator::new(config.wait_alert_multiplier),
            config,
            metrics,
        }
    }

    pub async fn analyze(
        &self,
        restaurant_id: Uuid,
        identity: &CustomerIdentity,
    ) -> AnalyticsResult<CustomerAnalysis> {
        self.analyze_at(restaurant_id, identity, Utc::now()).await
    }

    /// Full analysis of one customer as of `now`
    pub async fn analyze_at(
        &self,
        restaurant_id: Uuid,
        identity: &CustomerIdentity,
        now: DateTime<Utc>,
    ) -> AnalyticsResult<CustomerAnalysis> {
        let _timer = self.metrics.start_analysis();

        let history = match self.fetch_history(restaurant_id, identity, now).await {
            Ok(history) => history,
            Err(e) => {
                self.metrics.record_failed_analysis();
                return Err(e);
            }
        };

        tracing::debug!(
            "Analyzing customer of restaurant {}: {} visits, {} promotions, {} baseline samples",
            restaurant_id,
            history.visits.len(),
            history.promotions.len(),
            history.baseline_wait_samples.len()
        );

        Ok(self.compose(&history, now))
    }

    async fn fetch_history(
        &self,
        restaurant_id: Uuid,
        identity: &CustomerIdentity,
        now: DateTime<Utc>,
    ) -> AnalyticsResult<CustomerHistory> {
        let identity = identity.resolve().ok_or_else(|| {
            AnalyticsError::InvalidIdentity(
                "one of customer_id, email or phone is required".to_string(),
            )
        })?;
        let since = now - Duration::days(self.config.baseline_window_days);

        let (profile, queue, reservations, promotions, baseline_wait_samples) = tokio::try_join!(
            self.source.fetch_customer_profile(restaurant_id, &identity),
            self.source.fetch_queue_visits(restaurant_id, &identity),
            self.source.fetch_reservations(restaurant_id, &identity),
            self.source.fetch_promotions(restaurant_id, &identity),
            self.source.fetch_wait_samples(restaurant_id, since),
        )?;

        let mut visits = queue;
        visits.extend(reservations);

        Ok(CustomerHistory {
            profile,
            visits,
            promotions,
            baseline_wait_samples,
        })
    }

    /// Pure part of the analysis
    pub fn compose(&self, history: &CustomerHistory, now: DateTime<Utc>) -> CustomerAnalysis {
        let metrics = self.aggregator.aggregate(
            &history.visits,
            &history.promotions,
            &history.baseline_wait_samples,
            now,
        );
        let trend = TrendClassifier::classify(metrics.visits_last_30d, metrics.visits_prev_30d);
        let score = RelationshipScorer::score(&metrics, history.profile.as_ref());
        let alerts = self.alerts.generate(&metrics);
        let monthly_evolution =
            monthly_evolution(&history.visits, now, self.config.local_offset());

        CustomerAnalysis {
            metrics,
            alerts,
            score,
            trend,
            monthly_evolution,
        }
    }
}
