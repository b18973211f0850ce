use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

/// Source stream of a visit event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VisitKind {
    Queue,
    Reservation,
}

/// Lifecycle state of a visit, unified across queue entries and reservations
///
/// Queue entries use `waiting`, `called`, `seated`, `canceled`, `no_show`;
/// reservations use `pending`/`confirmed`, `completed`, `canceled`, `no_show`.
/// `seated` and `completed` both map to [`VisitStatus::Completed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VisitStatus {
    Waiting,
    Called,
    Booked,
    Completed,
    Canceled,
    NoShow,
}

impl VisitStatus {
    /// Parse a stored status for the given event kind
    ///
    /// Returns `None` for values that do not belong to the kind, so callers can
    /// skip the malformed row instead of failing.
    pub fn parse(kind: VisitKind, raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase();
        match (kind, normalized.as_str()) {
            (VisitKind::Queue, "waiting") => Some(VisitStatus::Waiting),
            (VisitKind::Queue, "called") => Some(VisitStatus::Called),
            (VisitKind::Queue, "seated") => Some(VisitStatus::Completed),
            (VisitKind::Reservation, "pending") | (VisitKind::Reservation, "confirmed") => {
                Some(VisitStatus::Booked)
            }
            (VisitKind::Reservation, "completed") => Some(VisitStatus::Completed),
            (_, "canceled") | (_, "cancelled") => Some(VisitStatus::Canceled),
            (_, "no_show") => Some(VisitStatus::NoShow),
            _ => None,
        }
    }
}

/// Who canceled a visit
///
/// Queue cancellations are always attributed to the customer; only
/// reservations record a restaurant-side actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CancelActor {
    Customer,
    Restaurant,
    Unknown,
}

impl CancelActor {
    /// Resolve the free-form `canceled_by` column of a reservation
    pub fn from_reservation_column(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_lowercase()).as_deref() {
            Some("customer") | Some("client") | Some("guest") => CancelActor::Customer,
            Some("restaurant") | Some("staff") | Some("owner") | Some("admin") => {
                CancelActor::Restaurant
            }
            _ => CancelActor::Unknown,
        }
    }
}

/// A queue visit or a reservation, normalized for aggregation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitEvent {
    pub id: Uuid,
    pub kind: VisitKind,
    /// Queue: seated time, else created time. Reservation: reserved-for time.
    pub occurred_at: Option<DateTime<Utc>>,
    pub party_size: i32,
    pub status: VisitStatus,
    pub created_at: DateTime<Utc>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub cancel_actor: Option<CancelActor>,
    /// Queue only: seated time minus created time
    pub wait_minutes: Option<f64>,
}

impl VisitEvent {
    pub fn is_completed(&self) -> bool {
        self.status == VisitStatus::Completed
    }

    /// Timestamp used to window a cancellation
    pub fn canceled_reference(&self) -> Option<DateTime<Utc>> {
        self.canceled_at.or(self.occurred_at)
    }
}

/// A promotional email sent to the customer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionEvent {
    pub id: Uuid,
    pub sent_at: Option<DateTime<Utc>>,
    pub coupon_code: Option<String>,
    pub status: String,
}

/// Lightweight customer summary record
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomerProfile {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub marketing_opt_in: bool,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub total_visits: i32,
    pub vip: bool,
}

impl CustomerProfile {
    /// Whole days since the last visit; a customer never seen counts from sign-up
    pub fn days_since_last_visit(&self, now: DateTime<Utc>) -> i64 {
        let reference = self.last_seen_at.unwrap_or(self.created_at);
        (now - reference).num_days().max(0)
    }

    pub fn days_since_created(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_days().max(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Queue,
    Reservation,
}

/// Windowed counts, rates and preferences derived from a customer's events
///
/// Recomputed on every request, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AggregatedMetrics {
    #[schema(example = 12)]
    pub total_events: u32,
    #[schema(example = 9)]
    pub completed_count: u32,
    #[schema(example = 2)]
    pub canceled_count: u32,
    #[schema(example = 1)]
    pub no_show_count: u32,
    #[schema(example = 5)]
    pub queue_completed_count: u32,
    #[schema(example = 4)]
    pub reservation_completed_count: u32,
    /// completed / (completed + canceled + no_show), percent; 100 without history
    #[schema(example = 75, minimum = 0.0, maximum = 100.0)]
    pub show_rate: u8,
    #[schema(example = 3.5)]
    pub average_party_size: Option<f64>,
    /// Local hour of day, 0-23
    #[schema(example = 20, minimum = 0.0, maximum = 23.0)]
    pub preferred_hour: Option<u32>,
    /// Local day of week, 0 = Sunday
    #[schema(example = 5, minimum = 0.0, maximum = 6.0)]
    pub preferred_day_of_week: Option<u32>,
    pub preferred_channel: Option<Channel>,
    #[schema(example = 18.0)]
    pub customer_avg_wait_minutes: Option<f64>,
    #[schema(example = 14.5)]
    pub restaurant_avg_wait_minutes: Option<f64>,
    #[schema(example = 22.0)]
    pub last_wait_minutes: Option<f64>,
    #[schema(example = 3)]
    pub visits_last_30d: u32,
    #[schema(example = 2)]
    pub visits_prev_30d: u32,
    #[schema(example = 7)]
    pub visits_last_90d: u32,
    #[schema(example = 0)]
    pub no_show_last_60d: u32,
    #[schema(example = 1)]
    pub no_show_last_90d: u32,
    #[schema(example = 0)]
    pub cancel_by_restaurant_last_30d: u32,
    #[schema(example = 1)]
    pub customer_cancels_last_90d: u32,
    pub last_visit_at: Option<DateTime<Utc>>,
    #[schema(example = 6)]
    pub days_since_last_visit: Option<i64>,
    #[schema(example = 4)]
    pub promotions_sent: u32,
    #[schema(example = 1)]
    pub promotions_last_30d: u32,
    #[schema(example = 2)]
    pub coupons_sent: u32,
    pub last_promotion_at: Option<DateTime<Utc>>,
}

impl Default for AggregatedMetrics {
    fn default() -> Self {
        Self {
            total_events: 0,
            completed_count: 0,
            canceled_count: 0,
            no_show_count: 0,
            queue_completed_count: 0,
            reservation_completed_count: 0,
            show_rate: 100,
            average_party_size: None,
            preferred_hour: None,
            preferred_day_of_week: None,
            preferred_channel: None,
            customer_avg_wait_minutes: None,
            restaurant_avg_wait_minutes: None,
            last_wait_minutes: None,
            visits_last_30d: 0,
            visits_prev_30d: 0,
            visits_last_90d: 0,
            no_show_last_60d: 0,
            no_show_last_90d: 0,
            cancel_by_restaurant_last_30d: 0,
            customer_cancels_last_90d: 0,
            last_visit_at: None,
            days_since_last_visit: None,
            promotions_sent: 0,
            promotions_last_30d: 0,
            coupons_sent: 0,
            last_promotion_at: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Critical,
}

/// Opaque action tag the presentation layer maps to a button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedAction {
    SendPromotion,
    ViewEvents,
}

/// Ephemeral finding recomputed on each request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Alert {
    /// Stable rule identifier
    #[schema(example = "wait_above_baseline")]
    pub id: String,
    pub severity: Severity,
    #[schema(example = "Wait time above average (32 min vs 20 min)")]
    pub title: String,
    pub suggested_action: Option<SuggestedAction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Trend {
    pub direction: TrendDirection,
    #[schema(example = 1)]
    pub diff: i64,
    #[schema(example = 3)]
    pub last_30d: u32,
    #[schema(example = 2)]
    pub prev_30d: u32,
}

/// Categorical relationship label
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
pub enum Tag {
    #[serde(rename = "VIP")]
    Vip,
    #[serde(rename = "Frequente")]
    Frequent,
    #[serde(rename = "Em risco")]
    AtRisk,
    #[serde(rename = "Instável")]
    Unstable,
}

impl Tag {
    pub fn label(&self) -> &'static str {
        match self {
            Tag::Vip => "VIP",
            Tag::Frequent => "Frequente",
            Tag::AtRisk => "Em risco",
            Tag::Unstable => "Instável",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Bounded relationship score with its tags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Score {
    /// 0-100
    #[schema(example = 80, minimum = 0.0, maximum = 100.0)]
    pub value: u8,
    pub tags: Vec<Tag>,
}

impl Score {
    pub fn has_tag(&self, tag: Tag) -> bool {
        self.tags.contains(&tag)
    }
}

/// One month of the completed-visit rollup used for charting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MonthlyEvolution {
    /// `YYYY-MM`
    #[schema(example = "2026-09")]
    pub month: String,
    #[schema(example = 2)]
    pub queue_completed_count: u32,
    #[schema(example = 1)]
    pub reservation_completed_count: u32,
}

/// Combined result returned to the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomerAnalysis {
    pub metrics: AggregatedMetrics,
    pub alerts: Vec<Alert>,
    pub score: Score,
    pub trend: Trend,
    pub monthly_evolution: Vec<MonthlyEvolution>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_queue_status_parsing() {
        assert_eq!(VisitStatus::parse(VisitKind::Queue, "seated"), Some(VisitStatus::Completed));
        assert_eq!(VisitStatus::parse(VisitKind::Queue, "WAITING"), Some(VisitStatus::Waiting));
        assert_eq!(VisitStatus::parse(VisitKind::Queue, "no_show"), Some(VisitStatus::NoShow));
        assert_eq!(VisitStatus::parse(VisitKind::Queue, "completed"), None);
        assert_eq!(VisitStatus::parse(VisitKind::Queue, "bogus"), None);
    }

    #[test]
    fn test_reservation_status_parsing() {
        assert_eq!(
            VisitStatus::parse(VisitKind::Reservation, "completed"),
            Some(VisitStatus::Completed)
        );
        assert_eq!(
            VisitStatus::parse(VisitKind::Reservation, "confirmed"),
            Some(VisitStatus::Booked)
        );
        assert_eq!(
            VisitStatus::parse(VisitKind::Reservation, "cancelled"),
            Some(VisitStatus::Canceled)
        );
        assert_eq!(VisitStatus::parse(VisitKind::Reservation, "seated"), None);
    }

    #[test]
    fn test_cancel_actor_resolution() {
        assert_eq!(CancelActor::from_reservation_column(Some("restaurant")), CancelActor::Restaurant);
        assert_eq!(CancelActor::from_reservation_column(Some(" Staff ")), CancelActor::Restaurant);
        assert_eq!(CancelActor::from_reservation_column(Some("customer")), CancelActor::Customer);
        assert_eq!(CancelActor::from_reservation_column(Some("system")), CancelActor::Unknown);
        assert_eq!(CancelActor::from_reservation_column(None), CancelActor::Unknown);
    }

    #[test]
    fn test_tag_serialization_uses_labels() {
        let json = serde_json::to_string(&vec![Tag::Vip, Tag::AtRisk, Tag::Unstable]).unwrap();
        assert_eq!(json, r#"["VIP","Em risco","Instável"]"#);
        assert_eq!(Tag::Frequent.to_string(), "Frequente");
    }

    #[test]
    fn test_profile_day_counters() {
        let now = Utc::now();
        let mut profile = CustomerProfile {
            id: Uuid::new_v4(),
            restaurant_id: Uuid::new_v4(),
            name: "Ana".to_string(),
            marketing_opt_in: false,
            created_at: now - Duration::days(40),
            last_seen_at: Some(now - Duration::days(3)),
            total_visits: 4,
            vip: false,
        };
        assert_eq!(profile.days_since_last_visit(now), 3);
        assert_eq!(profile.days_since_created(now), 40);

        profile.last_seen_at = None;
        assert_eq!(profile.days_since_last_visit(now), 40);
    }

    #[test]
    fn test_default_metrics_are_neutral() {
        let metrics = AggregatedMetrics::default();
        assert_eq!(metrics.show_rate, 100);
        assert_eq!(metrics.preferred_hour, None);
        assert_eq!(metrics.days_since_last_visit, None);
    }
}
