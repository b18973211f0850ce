// HTTP handlers for insight endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::ApiError;
use crate::insights::models::{GenerateInsightsResponse, Insight};
use crate::AppState;

/// Handler for POST /api/restaurants/{restaurant_id}/insights/generate
/// Runs one insight generation pass over every customer of the restaurant
#[utoipa::path(
    post,
    path = "/api/restaurants/{restaurant_id}/insights/generate",
    params(
        ("restaurant_id" = Uuid, Path, description = "Restaurant ID")
    ),
    responses(
        (status = 200, description = "Number of insights created", body = GenerateInsightsResponse),
        (status = 500, description = "Customer summaries could not be loaded")
    ),
    tag = "insights"
)]
pub async fn generate_insights(
    State(state): State<AppState>,
    Path(restaurant_id): Path<Uuid>,
) -> Result<Json<GenerateInsightsResponse>, ApiError> {
    let report = state.insights.generate_for_restaurant(restaurant_id).await?;

    tracing::info!(
        "Insight pass for restaurant {}: {} created, {} already active, {} failed",
        restaurant_id,
        report.created,
        report.skipped,
        report.failed
    );
    Ok(Json(GenerateInsightsResponse {
        generated: report.created,
    }))
}

/// Handler for GET /api/restaurants/{restaurant_id}/insights
/// Lists active insights, newest first
#[utoipa::path(
    get,
    path = "/api/restaurants/{restaurant_id}/insights",
    params(
        ("restaurant_id" = Uuid, Path, description = "Restaurant ID")
    ),
    responses(
        (status = 200, description = "Active insights", body = Vec<Insight>),
        (status = 500, description = "Internal server error")
    ),
    tag = "insights"
)]
pub async fn list_active_insights(
    State(state): State<AppState>,
    Path(restaurant_id): Path<Uuid>,
) -> Result<Json<Vec<Insight>>, ApiError> {
    let insights = state.insights.fetch_active(restaurant_id).await?;
    tracing::debug!("Retrieved {} active insights", insights.len());
    Ok(Json(insights))
}

/// Handler for POST /api/insights/{insight_id}/dismiss
/// Idempotent; unknown ids also return 204
#[utoipa::path(
    post,
    path = "/api/insights/{insight_id}/dismiss",
    params(
        ("insight_id" = Uuid, Path, description = "Insight ID")
    ),
    responses(
        (status = 204, description = "Insight dismissed"),
        (status = 500, description = "Internal server error")
    ),
    tag = "insights"
)]
pub async fn dismiss_insight(
    State(state): State<AppState>,
    Path(insight_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.insights.dismiss(insight_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
