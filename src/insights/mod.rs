// Customer Insights
//
// Persisted, dismissible CRM follow-ups generated from customer summary
// records. At most one active insight exists per (customer, type).

pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod rules;
pub mod service;

pub use error::{InsightError, InsightResult};
pub use models::{Insight, InsightType, NewInsight};
pub use repository::{InsightStore, PgInsightRepository};
pub use rules::InsightRuleEngine;
pub use service::{GenerationReport, InsightService};
