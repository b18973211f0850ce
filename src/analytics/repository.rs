// Event Repository
//
// Read-only access to the three event streams of one customer plus the
// restaurant-wide inputs (baseline waits, customer summaries). Row mapping
// is where malformed data is dropped; nothing here fails on a bad row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::{FromRow, PgPool, Postgres};
use uuid::Uuid;

use crate::analytics::error::AnalyticsResult;
use crate::analytics::identity::IdentityMatch;
use crate::analytics::models::{
    CancelActor, CustomerProfile, PromotionEvent, VisitEvent, VisitKind, VisitStatus,
};

/// Source of customer events and summaries
#[async_trait]
pub trait EventSource: Send + Sync {
    async fn fetch_customer_profile(
        &self,
        restaurant_id: Uuid,
        identity: &IdentityMatch,
    ) -> AnalyticsResult<Option<CustomerProfile>>;

    async fn fetch_queue_visits(
        &self,
        restaurant_id: Uuid,
        identity: &IdentityMatch,
    ) -> AnalyticsResult<Vec<VisitEvent>>;

    async fn fetch_reservations(
        &self,
        restaurant_id: Uuid,
        identity: &IdentityMatch,
    ) -> AnalyticsResult<Vec<VisitEvent>>;

    async fn fetch_promotions(
        &self,
        restaurant_id: Uuid,
        identity: &IdentityMatch,
    ) -> AnalyticsResult<Vec<PromotionEvent>>;

    /// Wait minutes of every seated queue entry of the restaurant since `since`
    async fn fetch_wait_samples(
        &self,
        restaurant_id: Uuid,
        since: DateTime<Utc>,
    ) -> AnalyticsResult<Vec<f64>>;

    /// Every customer summary of the restaurant
    async fn fetch_customer_profiles(
        &self,
        restaurant_id: Uuid,
    ) -> AnalyticsResult<Vec<CustomerProfile>>;
}

#[derive(Debug, FromRow)]
pub(crate) struct CustomerRow {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub name: Option<String>,
    pub marketing_opt_in: bool,
    pub created_at: DateTime<Utc>,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub total_visits: i32,
    pub vip: bool,
}

impl From<CustomerRow> for CustomerProfile {
    fn from(row: CustomerRow) -> Self {
        Self {
            id: row.id,
            restaurant_id: row.restaurant_id,
            name: row.name.unwrap_or_default(),
            marketing_opt_in: row.marketing_opt_in,
            created_at: row.created_at,
            last_seen_at: row.last_seen_at,
            total_visits: row.total_visits.max(0),
            vip: row.vip,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct QueueEntryRow {
    pub id: Uuid,
    pub party_size: Option<i32>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub seated_at: Option<DateTime<Utc>>,
    pub canceled_at: Option<DateTime<Utc>>,
}

impl QueueEntryRow {
    /// Map to a visit; `None` when the status is not a known queue status
    pub(crate) fn into_event(self) -> Option<VisitEvent> {
        let Some(status) = VisitStatus::parse(VisitKind::Queue, &self.status) else {
            tracing::debug!(id = %self.id, status = %self.status, "skipping queue entry with unknown status");
            return None;
        };
        let wait_minutes = match (status, self.seated_at) {
            (VisitStatus::Completed, Some(seated_at)) => {
                Some((seated_at - self.created_at).num_seconds() as f64 / 60.0)
            }
            _ => None,
        };
        Some(VisitEvent {
            id: self.id,
            kind: VisitKind::Queue,
            occurred_at: Some(self.seated_at.unwrap_or(self.created_at)),
            party_size: self.party_size.unwrap_or(0),
            status,
            created_at: self.created_at,
            canceled_at: self.canceled_at,
            // the queue has no restaurant-side cancel
            cancel_actor: (status == VisitStatus::Canceled).then_some(CancelActor::Customer),
            wait_minutes,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ReservationRow {
    pub id: Uuid,
    pub party_size: Option<i32>,
    pub status: String,
    pub reserved_for: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub canceled_by: Option<String>,
}

impl ReservationRow {
    pub(crate) fn into_event(self) -> Option<VisitEvent> {
        let Some(status) = VisitStatus::parse(VisitKind::Reservation, &self.status) else {
            tracing::debug!(id = %self.id, status = %self.status, "skipping reservation with unknown status");
            return None;
        };
        let cancel_actor = (status == VisitStatus::Canceled)
            .then(|| CancelActor::from_reservation_column(self.canceled_by.as_deref()));
        Some(VisitEvent {
            id: self.id,
            kind: VisitKind::Reservation,
            occurred_at: self.reserved_for,
            party_size: self.party_size.unwrap_or(0),
            status,
            created_at: self.created_at,
            canceled_at: self.canceled_at,
            cancel_actor,
            wait_minutes: None,
        })
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct EmailLogRow {
    pub id: Uuid,
    pub sent_at: Option<DateTime<Utc>>,
    pub coupon_code: Option<String>,
    pub status: String,
}

impl From<EmailLogRow> for PromotionEvent {
    fn from(row: EmailLogRow) -> Self {
        Self {
            id: row.id,
            sent_at: row.sent_at,
            coupon_code: row.coupon_code,
            status: row.status,
        }
    }
}

const EMAIL_MATCH: &str = "lower(trim(email))";
const PHONE_DIGITS: &str = r"regexp_replace(coalesce(phone, ''), '\D', '', 'g')";

/// SQL predicate for an identity, bound from `$2` on
///
/// `id_column` is the column holding the customer id in the queried table.
/// A contact match ORs the email and phone predicates that are present;
/// `bind_identity` binds their values in the same order.
fn identity_clause(identity: &IdentityMatch, id_column: &str) -> String {
    match identity {
        IdentityMatch::CustomerId(_) => format!("{} = $2", id_column),
        IdentityMatch::Contact { email, phone } => {
            let mut predicates = Vec::with_capacity(2);
            let mut param = 2;
            if email.is_some() {
                predicates.push(format!("{} = ${}", EMAIL_MATCH, param));
                param += 1;
            }
            if phone.is_some() {
                predicates.push(format!("{} LIKE '%' || ${} || '%'", PHONE_DIGITS, param));
            }
            match predicates.len() {
                0 => "false".to_string(),
                1 => predicates.remove(0),
                _ => format!("({})", predicates.join(" OR ")),
            }
        }
    }
}

fn bind_identity<'q, O>(
    query: QueryAs<'q, Postgres, O, PgArguments>,
    identity: &'q IdentityMatch,
) -> QueryAs<'q, Postgres, O, PgArguments> {
    match identity {
        IdentityMatch::CustomerId(id) => query.bind(*id),
        IdentityMatch::Contact { email, phone } => {
            let mut query = query;
            if let Some(email) = email {
                query = query.bind(email.as_str());
            }
            if let Some(phone) = phone {
                query = query.bind(phone.as_str());
            }
            query
        }
    }
}

/// Postgres-backed Event Repository
#[derive(Clone)]
pub struct PgEventRepository {
    pool: PgPool,
}

impl PgEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventSource for PgEventRepository {
    async fn fetch_customer_profile(
        &self,
        restaurant_id: Uuid,
        identity: &IdentityMatch,
    ) -> AnalyticsResult<Option<CustomerProfile>> {
        let sql = format!(
            r#"
            SELECT id, restaurant_id, name, marketing_opt_in, created_at, last_seen_at, total_visits, vip
            FROM customers
            WHERE restaurant_id = $1 AND {}
            ORDER BY last_seen_at DESC NULLS LAST
            LIMIT 1
            "#,
            identity_clause(identity, "id")
        );
        let row = bind_identity(sqlx::query_as::<_, CustomerRow>(&sql).bind(restaurant_id), identity)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(CustomerProfile::from))
    }

    async fn fetch_queue_visits(
        &self,
        restaurant_id: Uuid,
        identity: &IdentityMatch,
    ) -> AnalyticsResult<Vec<VisitEvent>> {
        let sql = format!(
            r#"
            SELECT id, party_size, status, created_at, seated_at, canceled_at
            FROM queue_entries
            WHERE restaurant_id = $1 AND {}
            ORDER BY created_at DESC
            "#,
            identity_clause(identity, "customer_id")
        );
        let rows = bind_identity(sqlx::query_as::<_, QueueEntryRow>(&sql).bind(restaurant_id), identity)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!("Fetched {} queue entries for restaurant {}", rows.len(), restaurant_id);
        Ok(rows.into_iter().filter_map(QueueEntryRow::into_event).collect())
    }

    async fn fetch_reservations(
        &self,
        restaurant_id: Uuid,
        identity: &IdentityMatch,
    ) -> AnalyticsResult<Vec<VisitEvent>> {
        let sql = format!(
            r#"
            SELECT id, party_size, status, reserved_for, created_at, canceled_at, canceled_by
            FROM reservations
            WHERE restaurant_id = $1 AND {}
            ORDER BY reserved_for DESC NULLS LAST
            "#,
            identity_clause(identity, "customer_id")
        );
        let rows = bind_identity(sqlx::query_as::<_, ReservationRow>(&sql).bind(restaurant_id), identity)
            .fetch_all(&self.pool)
            .await?;

        tracing::debug!("Fetched {} reservations for restaurant {}", rows.len(), restaurant_id);
        Ok(rows.into_iter().filter_map(ReservationRow::into_event).collect())
    }

    async fn fetch_promotions(
        &self,
        restaurant_id: Uuid,
        identity: &IdentityMatch,
    ) -> AnalyticsResult<Vec<PromotionEvent>> {
        // email logs carry no phone column
        let identity = match identity {
            IdentityMatch::CustomerId(_) => identity.clone(),
            IdentityMatch::Contact { .. } => match identity.email() {
                Some(email) => IdentityMatch::Contact {
                    email: Some(email.to_string()),
                    phone: None,
                },
                None => return Ok(Vec::new()),
            },
        };
        let sql = format!(
            r#"
            SELECT id, sent_at, coupon_code, status
            FROM email_logs
            WHERE restaurant_id = $1 AND {}
            ORDER BY sent_at DESC NULLS LAST
            "#,
            identity_clause(&identity, "customer_id")
        );
        let rows = bind_identity(sqlx::query_as::<_, EmailLogRow>(&sql).bind(restaurant_id), &identity)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(PromotionEvent::from).collect())
    }

    async fn fetch_wait_samples(
        &self,
        restaurant_id: Uuid,
        since: DateTime<Utc>,
    ) -> AnalyticsResult<Vec<f64>> {
        let samples: Vec<Option<f64>> = sqlx::query_scalar(
            r#"
            SELECT (EXTRACT(EPOCH FROM (seated_at - created_at)) / 60.0)::float8
            FROM queue_entries
            WHERE restaurant_id = $1
              AND status = 'seated'
              AND seated_at IS NOT NULL
              AND created_at >= $2
            "#,
        )
        .bind(restaurant_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(samples.into_iter().flatten().collect())
    }

    async fn fetch_customer_profiles(
        &self,
        restaurant_id: Uuid,
    ) -> AnalyticsResult<Vec<CustomerProfile>> {
        let rows = sqlx::query_as::<_, CustomerRow>(
            r#"
            SELECT id, restaurant_id, name, marketing_opt_in, created_at, last_seen_at, total_visits, vip
            FROM customers
            WHERE restaurant_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CustomerProfile::from).collect())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::analytics::error::AnalyticsError;
    use std::sync::{Arc, Mutex};

    /// In-memory event source for a single customer
    ///
    /// The identity is ignored; every lookup returns the seeded data.
    #[derive(Clone, Default)]
    pub struct InMemoryEventSource {
        pub profile: Arc<Mutex<Option<CustomerProfile>>>,
        pub profiles: Arc<Mutex<Vec<CustomerProfile>>>,
        pub queue: Arc<Mutex<Vec<VisitEvent>>>,
        pub reservations: Arc<Mutex<Vec<VisitEvent>>>,
        pub promotions: Arc<Mutex<Vec<PromotionEvent>>>,
        pub wait_samples: Arc<Mutex<Vec<f64>>>,
        should_fail: Arc<Mutex<bool>>,
    }

    impl InMemoryEventSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_profile(self, profile: CustomerProfile) -> Self {
            *self.profile.lock().unwrap() = Some(profile.clone());
            self.profiles.lock().unwrap().push(profile);
            self
        }

        pub fn with_visits(self, visits: Vec<VisitEvent>) -> Self {
            for visit in visits {
                let kind = visit.kind;
                match kind {
                    VisitKind::Queue => self.queue.lock().unwrap().push(visit),
                    VisitKind::Reservation => self.reservations.lock().unwrap().push(visit),
                }
            }
            self
        }

        pub fn with_wait_samples(self, samples: Vec<f64>) -> Self {
            *self.wait_samples.lock().unwrap() = samples;
            self
        }

        pub fn set_should_fail(&self, fail: bool) {
            *self.should_fail.lock().unwrap() = fail;
        }

        fn check(&self) -> AnalyticsResult<()> {
            if *self.should_fail.lock().unwrap() {
                return Err(AnalyticsError::DatabaseError(sqlx::Error::PoolTimedOut));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl EventSource for InMemoryEventSource {
        async fn fetch_customer_profile(
            &self,
            _restaurant_id: Uuid,
            _identity: &IdentityMatch,
        ) -> AnalyticsResult<Option<CustomerProfile>> {
            self.check()?;
            Ok(self.profile.lock().unwrap().clone())
        }

        async fn fetch_queue_visits(
            &self,
            _restaurant_id: Uuid,
            _identity: &IdentityMatch,
        ) -> AnalyticsResult<Vec<VisitEvent>> {
            self.check()?;
            Ok(self.queue.lock().unwrap().clone())
        }

        async fn fetch_reservations(
            &self,
            _restaurant_id: Uuid,
            _identity: &IdentityMatch,
        ) -> AnalyticsResult<Vec<VisitEvent>> {
            self.check()?;
            Ok(self.reservations.lock().unwrap().clone())
        }

        async fn fetch_promotions(
            &self,
            _restaurant_id: Uuid,
            _identity: &IdentityMatch,
        ) -> AnalyticsResult<Vec<PromotionEvent>> {
            self.check()?;
            Ok(self.promotions.lock().unwrap().clone())
        }

        async fn fetch_wait_samples(
            &self,
            _restaurant_id: Uuid,
            _since: DateTime<Utc>,
        ) -> AnalyticsResult<Vec<f64>> {
            self.check()?;
            Ok(self.wait_samples.lock().unwrap().clone())
        }

        async fn fetch_customer_profiles(
            &self,
            restaurant_id: Uuid,
        ) -> AnalyticsResult<Vec<CustomerProfile>> {
            self.check()?;
            Ok(self
                .profiles
                .lock()
                .unwrap()
                .iter()
                .filter(|p| p.restaurant_id == restaurant_id)
                .cloned()
                .collect())
        }
    }
}


#[cfg(test)]
mod pg_tests {
    use super::*;
    use crate::db::test_support::{create_test_pool, insert_customer};
    use chrono::Duration;

    async fn insert_queue_entry(
        pool: &PgPool,
        restaurant_id: Uuid,
        email: Option<&str>,
        phone: Option<&str>,
        waited: Duration,
    ) {
        let created_at = Utc::now() - Duration::hours(1);
        sqlx::query(
            r#"
            INSERT INTO queue_entries (restaurant_id, email, phone, party_size, status, created_at, seated_at)
            VALUES ($1, $2, $3, 2, 'seated', $4, $5)
            "#,
        )
        .bind(restaurant_id)
        .bind(email)
        .bind(phone)
        .bind(created_at)
        .bind(created_at + waited)
        .execute(pool)
        .await
        .expect("Failed to create queue entry");
    }

    async fn insert_reservation(pool: &PgPool, restaurant_id: Uuid, email: Option<&str>, phone: Option<&str>) {
        sqlx::query(
            r#"
            INSERT INTO reservations (restaurant_id, email, phone, party_size, status, reserved_for)
            VALUES ($1, $2, $3, 4, 'completed', NOW() - INTERVAL '2 days')
            "#,
        )
        .bind(restaurant_id)
        .bind(email)
        .bind(phone)
        .execute(pool)
        .await
        .expect("Failed to create reservation");
    }

    fn contact(email: Option<&str>, phone: Option<&str>) -> IdentityMatch {
        IdentityMatch::Contact {
            email: email.map(str::to_string),
            phone: phone.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_phone_only_event_joins_email_and_phone_lookup() {
        let Some(pool) = create_test_pool().await else { return };
        let repo = PgEventRepository::new(pool.clone());
        let restaurant_id = Uuid::new_v4();

        // walk-in recorded only the phone, the booking only the email
        insert_queue_entry(&pool, restaurant_id, None, Some("+55 (11) 99999-0000"), Duration::minutes(20)).await;
        insert_reservation(&pool, restaurant_id, Some(" Ana@Example.com"), None).await;
        insert_queue_entry(&pool, restaurant_id, None, Some("+55 21 98888-1111"), Duration::minutes(5)).await;

        let identity = contact(Some("ana@example.com"), Some("11999990000"));
        let queue = repo.fetch_queue_visits(restaurant_id, &identity).await.unwrap();
        let reservations = repo.fetch_reservations(restaurant_id, &identity).await.unwrap();

        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].status, VisitStatus::Completed);
        assert_eq!(reservations.len(), 1);
    }

    #[tokio::test]
    async fn test_email_lookup_is_case_insensitive() {
        let Some(pool) = create_test_pool().await else { return };
        let repo = PgEventRepository::new(pool.clone());
        let restaurant_id = Uuid::new_v4();
        let customer_id = insert_customer(&pool, restaurant_id, Some("  MARIA@Example.COM "), None).await;
        sqlx::query(
            "INSERT INTO email_logs (restaurant_id, customer_id, email, coupon_code, sent_at) VALUES ($1, $2, $3, 'WELCOME10', NOW())",
        )
        .bind(restaurant_id)
        .bind(customer_id)
        .bind("Maria@example.com")
        .execute(&pool)
        .await
        .unwrap();

        let identity = contact(Some("maria@example.com"), None);
        let profile = repo.fetch_customer_profile(restaurant_id, &identity).await.unwrap();
        assert_eq!(profile.map(|p| p.id), Some(customer_id));

        let promotions = repo.fetch_promotions(restaurant_id, &identity).await.unwrap();
        assert_eq!(promotions.len(), 1);
        assert_eq!(promotions[0].coupon_code.as_deref(), Some("WELCOME10"));

        // email logs have no phone column
        let phone_only = contact(None, Some("11999990000"));
        assert!(repo.fetch_promotions(restaurant_id, &phone_only).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_phone_lookup_matches_digit_substring() {
        let Some(pool) = create_test_pool().await else { return };
        let repo = PgEventRepository::new(pool.clone());
        let restaurant_id = Uuid::new_v4();
        let customer_id = insert_customer(&pool, restaurant_id, None, Some("+55 (11) 99999-0000")).await;

        let profile = repo
            .fetch_customer_profile(restaurant_id, &contact(None, Some("999990000")))
            .await
            .unwrap();
        assert_eq!(profile.map(|p| p.id), Some(customer_id));

        let missing = repo
            .fetch_customer_profile(restaurant_id, &contact(None, Some("21988881111")))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_wait_samples_are_minutes_of_seated_entries() {
        let Some(pool) = create_test_pool().await else { return };
        let repo = PgEventRepository::new(pool.clone());
        let restaurant_id = Uuid::new_v4();
        insert_queue_entry(&pool, restaurant_id, None, Some("11911112222"), Duration::minutes(30)).await;

        let samples = repo
            .fetch_wait_samples(restaurant_id, Utc::now() - Duration::days(90))
            .await
            .unwrap();
        assert_eq!(samples.len(), 1);
        assert!((samples[0] - 30.0).abs() < 0.01);
    }
}
