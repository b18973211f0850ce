// Customer Behavioral Analytics
//
// Turns one customer's raw event history (queue visits, reservations,
// promotional emails) into windowed metrics, a bounded relationship score
// with tags, a trend direction, threshold alerts and a monthly rollup.
// Nothing here is persisted; every request recomputes from the events.

pub mod aggregator;
pub mod alerts;
pub mod error;
pub mod evolution;
pub mod handlers;
pub mod identity;
pub mod models;
pub mod repository;
pub mod scoring;
pub mod service;
pub mod trend;

pub use aggregator::MetricsAggregator;
pub use alerts::AlertGenerator;
pub use error::{AnalyticsError, AnalyticsResult};
pub use identity::{CustomerIdentity, IdentityMatch};
pub use models::{
    AggregatedMetrics, Alert, CustomerAnalysis, CustomerProfile, PromotionEvent, Score, Severity,
    SuggestedAction, Tag, Trend, TrendDirection, VisitEvent,
};
pub use repository::{EventSource, PgEventRepository};
pub use scoring::RelationshipScorer;
pub use service::CustomerAnalyticsEngine;
pub use trend::TrendClassifier;
