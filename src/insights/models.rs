use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::insights::error::InsightError;

/// Kind of persisted CRM follow-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    QueueDropout,
    ReservationCanceled,
    Inactive,
    Recurrent,
    VipMissing,
    NewCustomer,
}

impl InsightType {
    pub const ALL: [InsightType; 6] = [
        InsightType::QueueDropout,
        InsightType::ReservationCanceled,
        InsightType::Inactive,
        InsightType::Recurrent,
        InsightType::VipMissing,
        InsightType::NewCustomer,
    ];

    /// Stored representation
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightType::QueueDropout => "queue_dropout",
            InsightType::ReservationCanceled => "reservation_canceled",
            InsightType::Inactive => "inactive",
            InsightType::Recurrent => "recurrent",
            InsightType::VipMissing => "vip_missing",
            InsightType::NewCustomer => "new_customer",
        }
    }

    /// Human-readable message for a customer
    pub fn message(&self, customer_name: &str) -> String {
        let name = match customer_name.trim() {
            "" => "This customer",
            name => name,
        };
        match self {
            InsightType::QueueDropout => format!("{} left the queue before being seated", name),
            InsightType::ReservationCanceled => format!("{} canceled a reservation", name),
            InsightType::Inactive => format!("{} has not visited in over 30 days", name),
            InsightType::Recurrent => format!("{} is a recurring customer", name),
            InsightType::VipMissing => format!("VIP customer {} has not visited in over 14 days", name),
            InsightType::NewCustomer => format!("{} is a new customer", name),
        }
    }
}

impl fmt::Display for InsightType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InsightType {
    type Err = InsightError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        InsightType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| InsightError::CorruptRow(format!("unknown insight type '{}'", s)))
    }
}

/// A persisted, dismissible insight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Insight {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub restaurant_id: Uuid,
    pub insight_type: InsightType,
    #[schema(example = "Ana has not visited in over 30 days")]
    pub message: String,
    /// Mirrors the customer's marketing opt-in
    #[schema(example = true)]
    pub action_allowed: bool,
    #[schema(example = false)]
    pub dismissed: bool,
    pub created_at: DateTime<Utc>,
    pub dismissed_at: Option<DateTime<Utc>>,
}

/// Database row; `insight_type` is parsed on conversion
#[derive(Debug, FromRow)]
pub struct InsightRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub restaurant_id: Uuid,
    pub insight_type: String,
    pub message: String,
    pub action_allowed: bool,
    pub dismissed: bool,
    pub created_at: DateTime<Utc>,
    pub dismissed_at: Option<DateTime<Utc>>,
}

impl TryFrom<InsightRow> for Insight {
    type Error = InsightError;

    fn try_from(row: InsightRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            customer_id: row.customer_id,
            restaurant_id: row.restaurant_id,
            insight_type: row.insight_type.parse()?,
            message: row.message,
            action_allowed: row.action_allowed,
            dismissed: row.dismissed,
            created_at: row.created_at,
            dismissed_at: row.dismissed_at,
        })
    }
}

/// Candidate produced by the rule engine, not yet persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInsight {
    pub customer_id: Uuid,
    pub restaurant_id: Uuid,
    pub insight_type: InsightType,
    pub message: String,
    pub action_allowed: bool,
}

/// Response for POST /api/restaurants/{restaurant_id}/insights/generate
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GenerateInsightsResponse {
    /// Insights created in this pass
    #[schema(example = 4)]
    pub generated: usize,
}
