// HTTP handlers for customer analytics endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::analytics::identity::CustomerIdentity;
use crate::analytics::models::{CustomerAnalysis, Tag};
use crate::error::ApiError;
use crate::metrics::MetricsSummary;
use crate::validation::validate_identity_fields;
use crate::AppState;

/// Customer lookup for an analysis; at least one field is required
#[derive(Debug, Clone, Default, Deserialize, Validate, IntoParams)]
#[validate(schema(function = "validate_analysis_identity", skip_on_field_errors = false))]
#[into_params(parameter_in = Query)]
pub struct AnalysisQuery {
    /// Known customer id; takes priority over email and phone
    pub customer_id: Option<Uuid>,
    /// Matched case-insensitively
    #[validate(email(message = "Email must be a valid address"))]
    pub email: Option<String>,
    /// Punctuation is ignored; matched as a digit substring
    #[validate(custom = "crate::validation::validate_phone")]
    pub phone: Option<String>,
}

fn validate_analysis_identity(query: &AnalysisQuery) -> Result<(), ValidationError> {
    validate_identity_fields(
        query.customer_id.is_some(),
        query.email.as_deref(),
        query.phone.as_deref(),
    )
}

impl AnalysisQuery {
    /// Trims email and phone; blank values count as absent
    pub fn normalized(self) -> Self {
        let clean = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            customer_id: self.customer_id,
            email: clean(self.email),
            phone: clean(self.phone),
        }
    }
}

impl From<AnalysisQuery> for CustomerIdentity {
    fn from(query: AnalysisQuery) -> Self {
        Self {
            customer_id: query.customer_id,
            email: query.email,
            phone: query.phone,
        }
    }
}

/// Handler for GET /api/restaurants/{restaurant_id}/customers/analysis
/// Computes metrics, alerts, score, trend and monthly evolution for one customer
#[utoipa::path(
    get,
    path = "/api/restaurants/{restaurant_id}/customers/analysis",
    params(
        ("restaurant_id" = Uuid, Path, description = "Restaurant ID"),
        AnalysisQuery
    ),
    responses(
        (status = 200, description = "Customer analysis", body = CustomerAnalysis),
        (status = 400, description = "Missing or invalid customer identity"),
        (status = 500, description = "Event repository failure")
    ),
    tag = "analytics"
)]
pub async fn get_customer_analysis(
    State(state): State<AppState>,
    Path(restaurant_id): Path<Uuid>,
    Query(query): Query<AnalysisQuery>,
) -> Result<Json<CustomerAnalysis>, ApiError> {
    let query = query.normalized();
    query.validate()?;

    let identity = CustomerIdentity::from(query);
    let analysis = state.analytics.analyze(restaurant_id, &identity).await?;

    let tags: Vec<String> = analysis.score.tags.iter().map(Tag::to_string).collect();
    tracing::debug!(
        "Analysis for restaurant {}: score {} [{}], {} alerts",
        restaurant_id,
        analysis.score.value,
        tags.join(", "),
        analysis.alerts.len()
    );
    Ok(Json(analysis))
}

/// Handler for GET /api/engine/metrics
#[utoipa::path(
    get,
    path = "/api/engine/metrics",
    responses(
        (status = 200, description = "Engine counters", body = MetricsSummary)
    ),
    tag = "engine"
)]
pub async fn get_engine_metrics(State(state): State<AppState>) -> Json<MetricsSummary> {
    Json(state.metrics.summary())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_requires_an_identity_field() {
        assert!(AnalysisQuery::default().validate().is_err());
        let query = AnalysisQuery {
            customer_id: Some(Uuid::new_v4()),
            ..AnalysisQuery::default()
        };
        assert!(query.validate().is_ok());
    }

    #[test]
    fn test_query_field_formats() {
        let bad_email = AnalysisQuery {
            email: Some("not-an-email".to_string()),
            ..AnalysisQuery::default()
        };
        assert!(bad_email.validate().is_err());

        let short_phone = AnalysisQuery {
            phone: Some("1234".to_string()),
            ..AnalysisQuery::default()
        };
        assert!(short_phone.validate().is_err());

        let ok = AnalysisQuery {
            email: Some("ana@example.com".to_string()),
            phone: Some("+55 11 99999-0000".to_string()),
            ..AnalysisQuery::default()
        };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_padded_email_is_trimmed_before_validation() {
        let query = AnalysisQuery {
            email: Some(" ana@example.com ".to_string()),
            ..AnalysisQuery::default()
        }
        .normalized();
        assert_eq!(query.email.as_deref(), Some("ana@example.com"));
        assert!(query.validate().is_ok());
    }

    #[test]
    fn test_blank_contact_fields_count_as_absent() {
        let query = AnalysisQuery {
            customer_id: Some(Uuid::new_v4()),
            email: Some(String::new()),
            phone: Some("   ".to_string()),
        }
        .normalized();
        assert_eq!(query.email, None);
        assert_eq!(query.phone, None);
        assert!(query.validate().is_ok());

        let blank_only = AnalysisQuery {
            email: Some(" ".to_string()),
            ..AnalysisQuery::default()
        }
        .normalized();
        assert!(blank_only.validate().is_err());
    }
}
