// Restaurant CRM analytics service
//
// HTTP surface over the customer behavioral analytics engine and the
// persisted insight subsystem.

pub mod analytics;
pub mod config;
pub mod db;
pub mod error;
pub mod insights;
pub mod metrics;
pub mod validation;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use analytics::{CustomerAnalyticsEngine, EventSource};
use config::AnalyticsConfig;
use insights::{InsightService, InsightStore};
use metrics::EngineMetrics;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        analytics::handlers::get_customer_analysis,
        analytics::handlers::get_engine_metrics,
        insights::handlers::generate_insights,
        insights::handlers::list_active_insights,
        insights::handlers::dismiss_insight,
    ),
    components(
        schemas(
            analytics::models::CustomerAnalysis,
            analytics::models::AggregatedMetrics,
            analytics::models::Alert,
            analytics::models::Severity,
            analytics::models::SuggestedAction,
            analytics::models::Score,
            analytics::models::Tag,
            analytics::models::Trend,
            analytics::models::TrendDirection,
            analytics::models::MonthlyEvolution,
            analytics::models::Channel,
            insights::models::Insight,
            insights::models::InsightType,
            insights::models::GenerateInsightsResponse,
            metrics::MetricsSummary,
        )
    ),
    tags(
        (name = "analytics", description = "Per-customer behavioral analysis"),
        (name = "insights", description = "Persisted CRM insights"),
        (name = "engine", description = "Engine operational counters")
    ),
    info(
        title = "Restaurant CRM Analytics API",
        version = "0.1.0",
        description = "Customer scoring, alerts and insights from queue, reservation and email history"
    )
)]
pub struct ApiDoc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub analytics: CustomerAnalyticsEngine,
    pub insights: InsightService,
    pub metrics: EngineMetrics,
}

impl AppState {
    pub fn new(
        source: Arc<dyn EventSource>,
        store: Arc<dyn InsightStore>,
        config: AnalyticsConfig,
    ) -> Self {
        let metrics = EngineMetrics::new();
        Self {
            analytics: CustomerAnalyticsEngine::new(source.clone(), config, metrics.clone()),
            insights: InsightService::new(store, source, metrics.clone()),
            metrics,
        }
    }
}

/// Creates the application router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route(
            "/api/restaurants/:restaurant_id/customers/analysis",
            get(analytics::handlers::get_customer_analysis),
        )
        .route(
            "/api/restaurants/:restaurant_id/insights/generate",
            post(insights::handlers::generate_insights),
        )
        .route(
            "/api/restaurants/:restaurant_id/insights",
            get(insights::handlers::list_active_insights),
        )
        .route(
            "/api/insights/:insight_id/dismiss",
            post(insights::handlers::dismiss_insight),
        )
        .route("/api/engine/metrics", get(analytics::handlers::get_engine_metrics))
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests;
