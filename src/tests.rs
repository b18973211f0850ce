// Handler tests for the analytics API
// The real router runs over in-memory event and insight stores

use super::*;
use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::{Duration, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::analytics::aggregator::test_support::{days_ago, visit};
use crate::analytics::models::{
    CancelActor, CustomerAnalysis, CustomerProfile, SuggestedAction, Tag, VisitKind, VisitStatus,
};
use crate::analytics::repository::test_support::InMemoryEventSource;
use crate::insights::models::{GenerateInsightsResponse, Insight, InsightType};
use crate::insights::repository::test_support::InMemoryInsightStore;

// ============================================================================
// Test Helpers
// ============================================================================

fn create_test_server(source: InMemoryEventSource, store: InMemoryInsightStore) -> TestServer {
    let state = AppState::new(Arc::new(source), Arc::new(store), AnalyticsConfig::default());
    TestServer::new(create_router(state)).unwrap()
}

fn profile(restaurant_id: Uuid, vip: bool, total_visits: i32, last_seen_days: i64) -> CustomerProfile {
    let now = Utc::now();
    CustomerProfile {
        id: Uuid::new_v4(),
        restaurant_id,
        name: "Fernanda".to_string(),
        marketing_opt_in: true,
        created_at: now - Duration::days(300),
        last_seen_at: Some(now - Duration::days(last_seen_days)),
        total_visits,
        vip,
    }
}

// ============================================================================
// Customer analysis
// ============================================================================

#[tokio::test]
async fn test_analysis_returns_full_bundle() {
    let now = Utc::now();
    let restaurant_id = Uuid::new_v4();
    let source = InMemoryEventSource::new()
        .with_profile(profile(restaurant_id, false, 3, 2))
        .with_visits(vec![
            visit(VisitKind::Queue, VisitStatus::Completed, Some(days_ago(now, 2))),
            visit(VisitKind::Reservation, VisitStatus::Completed, Some(days_ago(now, 12))),
        ]);
    let server = create_test_server(source, InMemoryInsightStore::new());

    let response = server
        .get(&format!("/api/restaurants/{}/customers/analysis", restaurant_id))
        .add_query_param("email", "fernanda@example.com")
        .await;

    response.assert_status_ok();
    let analysis: CustomerAnalysis = response.json();
    assert_eq!(analysis.metrics.completed_count, 2);
    assert_eq!(analysis.metrics.visits_last_30d, 2);
    assert!(analysis.score.has_tag(Tag::Frequent));
    assert_eq!(analysis.monthly_evolution.len(), 12);

    let json: Value = response.json();
    assert!(json["trend"]["last_30d"].is_number());
    assert!(json["score"]["tags"].is_array());
}

#[tokio::test]
async fn test_analysis_reports_restaurant_cancellation() {
    let now = Utc::now();
    let restaurant_id = Uuid::new_v4();
    let mut canceled = visit(VisitKind::Reservation, VisitStatus::Canceled, Some(days_ago(now, 4)));
    canceled.cancel_actor = Some(CancelActor::Restaurant);
    let source = InMemoryEventSource::new().with_visits(vec![
        visit(VisitKind::Queue, VisitStatus::Completed, Some(days_ago(now, 1))),
        canceled,
    ]);
    let server = create_test_server(source, InMemoryInsightStore::new());

    let response = server
        .get(&format!("/api/restaurants/{}/customers/analysis", restaurant_id))
        .add_query_param("customer_id", Uuid::new_v4())
        .await;

    response.assert_status_ok();
    let json: Value = response.json();
    let alerts = json["alerts"].as_array().unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["id"], "restaurant_cancellations");
    assert_eq!(alerts[0]["severity"], "critical");
    assert_eq!(alerts[0]["suggested_action"], "view_events");

    let analysis: CustomerAnalysis = response.json();
    assert_eq!(analysis.alerts[0].suggested_action, Some(SuggestedAction::ViewEvents));
}

#[tokio::test]
async fn test_analysis_without_identity_is_rejected() {
    let server = create_test_server(InMemoryEventSource::new(), InMemoryInsightStore::new());

    let response = server
        .get(&format!("/api/restaurants/{}/customers/analysis", Uuid::new_v4()))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let json: Value = response.json();
    assert_eq!(json["error_code"], "VALIDATION_ERROR");
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn test_analysis_rejects_malformed_phone() {
    let server = create_test_server(InMemoryEventSource::new(), InMemoryInsightStore::new());

    let response = server
        .get(&format!("/api/restaurants/{}/customers/analysis", Uuid::new_v4()))
        .add_query_param("phone", "12-34")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_blank_email_next_to_customer_id_is_accepted() {
    let server = create_test_server(InMemoryEventSource::new(), InMemoryInsightStore::new());
    let path = format!("/api/restaurants/{}/customers/analysis", Uuid::new_v4());

    server
        .get(&path)
        .add_query_param("customer_id", Uuid::new_v4())
        .add_query_param("email", "")
        .await
        .assert_status_ok();

    server
        .get(&path)
        .add_query_param("email", " ana@example.com")
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_repository_failure_is_single_server_error() {
    let source = InMemoryEventSource::new();
    source.set_should_fail(true);
    let server = create_test_server(source, InMemoryInsightStore::new());

    let response = server
        .get(&format!("/api/restaurants/{}/customers/analysis", Uuid::new_v4()))
        .add_query_param("phone", "+55 11 99999-0000")
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let json: Value = response.json();
    assert_eq!(json["error_code"], "DATABASE_ERROR");
    assert!(json.get("metrics").is_none());
}

// ============================================================================
// Insights
// ============================================================================

#[tokio::test]
async fn test_generate_list_and_dismiss_insights() {
    let restaurant_id = Uuid::new_v4();
    let source = InMemoryEventSource::new().with_profile(profile(restaurant_id, true, 15, 20));
    let server = create_test_server(source, InMemoryInsightStore::new());

    let generated: GenerateInsightsResponse = server
        .post(&format!("/api/restaurants/{}/insights/generate", restaurant_id))
        .await
        .json();
    assert_eq!(generated.generated, 1);

    // second pass is deduplicated
    let again: GenerateInsightsResponse = server
        .post(&format!("/api/restaurants/{}/insights/generate", restaurant_id))
        .await
        .json();
    assert_eq!(again.generated, 0);

    let active: Vec<Insight> = server
        .get(&format!("/api/restaurants/{}/insights", restaurant_id))
        .await
        .json();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].insight_type, InsightType::VipMissing);
    assert!(active[0].action_allowed);

    let dismiss_path = format!("/api/insights/{}/dismiss", active[0].id);
    server.post(&dismiss_path).await.assert_status(StatusCode::NO_CONTENT);
    server.post(&dismiss_path).await.assert_status(StatusCode::NO_CONTENT);

    let active: Vec<Insight> = server
        .get(&format!("/api/restaurants/{}/insights", restaurant_id))
        .await
        .json();
    assert!(active.is_empty());
}

#[tokio::test]
async fn test_dismiss_unknown_insight_is_no_content() {
    let server = create_test_server(InMemoryEventSource::new(), InMemoryInsightStore::new());
    server
        .post(&format!("/api/insights/{}/dismiss", Uuid::new_v4()))
        .await
        .assert_status(StatusCode::NO_CONTENT);
}

// ============================================================================
// Engine metrics
// ============================================================================

#[tokio::test]
async fn test_engine_metrics_count_analyses() {
    let server = create_test_server(InMemoryEventSource::new(), InMemoryInsightStore::new());

    server
        .get(&format!("/api/restaurants/{}/customers/analysis", Uuid::new_v4()))
        .add_query_param("email", "guest@example.com")
        .await
        .assert_status_ok();

    let json: Value = server.get("/api/engine/metrics").await.json();
    assert_eq!(json["analyses"], 1);
    assert_eq!(json["failed_analyses"], 0);
}
