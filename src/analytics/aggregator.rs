// Metrics Aggregator
//
// Folds a customer's queue visits, reservations and promotional emails into
// windowed counts, rates and preferences. Pure: no I/O, `now` is explicit.

use chrono::{DateTime, Datelike, Duration, FixedOffset, Timelike, Utc};

use crate::analytics::models::{
    AggregatedMetrics, CancelActor, Channel, PromotionEvent, VisitEvent, VisitKind, VisitStatus,
};

/// Metrics Aggregator
///
/// Buckets preferred hour/day in the restaurant's local time.
#[derive(Debug, Clone, Copy)]
pub struct MetricsAggregator {
    local_offset: FixedOffset,
}

/// Half-open window `(now - from_days, now - to_days]`
#[derive(Debug, Clone, Copy)]
struct Window {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Window {
    fn days_ago(now: DateTime<Utc>, from_days: i64, to_days: i64) -> Self {
        Self {
            start: now - Duration::days(from_days),
            end: now - Duration::days(to_days),
        }
    }

    fn contains(&self, at: Option<DateTime<Utc>>) -> bool {
        matches!(at, Some(t) if t > self.start && t <= self.end)
    }
}

impl MetricsAggregator {
    pub fn new(local_offset: FixedOffset) -> Self {
        Self { local_offset }
    }

    /// Aggregate one customer's event history
    ///
    /// `baseline_wait_samples` are the restaurant-wide queue waits (minutes)
    /// of the trailing baseline window, independent of the customer.
    pub fn aggregate(
        &self,
        visits: &[VisitEvent],
        promotions: &[PromotionEvent],
        baseline_wait_samples: &[f64],
        now: DateTime<Utc>,
    ) -> AggregatedMetrics {
        let completed: Vec<&VisitEvent> = visits.iter().filter(|v| v.is_completed()).collect();
        let canceled_count = count(visits, |v| v.status == VisitStatus::Canceled);
        let no_show_count = count(visits, |v| v.status == VisitStatus::NoShow);
        let queue_completed_count = count_refs(&completed, |v| v.kind == VisitKind::Queue);
        let reservation_completed_count =
            count_refs(&completed, |v| v.kind == VisitKind::Reservation);

        let last_30d = Window::days_ago(now, 30, 0);
        let prev_30d = Window::days_ago(now, 60, 30);
        let last_60d = Window::days_ago(now, 60, 0);
        let last_90d = Window::days_ago(now, 90, 0);

        let last_visit_at = completed
            .iter()
            .filter_map(|v| v.occurred_at)
            .filter(|t| *t <= now)
            .max();

        let (preferred_hour, preferred_day_of_week) = self.preferred_time(&completed);

        AggregatedMetrics {
            total_events: visits.len() as u32,
            completed_count: completed.len() as u32,
            canceled_count,
            no_show_count,
            queue_completed_count,
            reservation_completed_count,
            show_rate: show_rate(completed.len() as u32, canceled_count, no_show_count),
            average_party_size: average_party_size(visits),
            preferred_hour,
            preferred_day_of_week,
            preferred_channel: preferred_channel(queue_completed_count, reservation_completed_count),
            customer_avg_wait_minutes: average_wait(
                visits
                    .iter()
                    .filter(|v| v.kind == VisitKind::Queue && v.is_completed())
                    .filter_map(|v| v.wait_minutes),
            ),
            restaurant_avg_wait_minutes: average_wait(baseline_wait_samples.iter().copied()),
            last_wait_minutes: last_wait_minutes(visits),
            visits_last_30d: count_refs(&completed, |v| last_30d.contains(v.occurred_at)),
            visits_prev_30d: count_refs(&completed, |v| prev_30d.contains(v.occurred_at)),
            visits_last_90d: count_refs(&completed, |v| last_90d.contains(v.occurred_at)),
            no_show_last_60d: count(visits, |v| {
                v.status == VisitStatus::NoShow && last_60d.contains(v.occurred_at)
            }),
            no_show_last_90d: count(visits, |v| {
                v.status == VisitStatus::NoShow && last_90d.contains(v.occurred_at)
            }),
            cancel_by_restaurant_last_30d: count(visits, |v| {
                v.kind == VisitKind::Reservation
                    && v.status == VisitStatus::Canceled
                    && v.cancel_actor == Some(CancelActor::Restaurant)
                    && last_30d.contains(v.canceled_reference())
            }),
            customer_cancels_last_90d: count(visits, |v| {
                v.status == VisitStatus::Canceled
                    && v.cancel_actor == Some(CancelActor::Customer)
                    && last_90d.contains(v.canceled_reference())
            }),
            last_visit_at,
            days_since_last_visit: last_visit_at.map(|t| (now - t).num_days().max(0)),
            promotions_sent: promotions.len() as u32,
            promotions_last_30d: promotions
                .iter()
                .filter(|p| last_30d.contains(p.sent_at))
                .count() as u32,
            coupons_sent: promotions
                .iter()
                .filter(|p| p.coupon_code.as_deref().is_some_and(|c| !c.trim().is_empty()))
                .count() as u32,
            last_promotion_at: promotions.iter().filter_map(|p| p.sent_at).max(),
        }
    }

    /// Mode of local hour and day of week over completed visits
    ///
    /// Buckets are scanned in ascending key order and only a strictly larger
    /// count replaces the current pick, so ties resolve to the lowest key
    /// regardless of input order.
    fn preferred_time(&self, completed: &[&VisitEvent]) -> (Option<u32>, Option<u32>) {
        let mut hours = [0u32; 24];
        let mut days = [0u32; 7];

        for visit in completed {
            let Some(at) = visit.occurred_at else {
                continue;
            };
            let local = at.with_timezone(&self.local_offset);
            hours[local.hour() as usize] += 1;
            days[local.weekday().num_days_from_sunday() as usize] += 1;
        }

        (mode_bucket(&hours), mode_bucket(&days))
    }
}

/// Percent of completed among completed + canceled + no-show, 100 without history
pub fn show_rate(completed: u32, canceled: u32, no_show: u32) -> u8 {
    let denominator = completed + canceled + no_show;
    if denominator == 0 {
        return 100;
    }
    let rate = (completed as f64 / denominator as f64 * 100.0).round();
    rate.clamp(0.0, 100.0) as u8
}

/// Mean of strictly positive samples
pub fn average_wait<I>(samples: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, n) = samples
        .into_iter()
        .filter(|w| w.is_finite() && *w > 0.0)
        .fold((0.0, 0u32), |(sum, n), w| (sum + w, n + 1));
    if n == 0 {
        None
    } else {
        Some(sum / n as f64)
    }
}

fn preferred_channel(queue_completed: u32, reservation_completed: u32) -> Option<Channel> {
    if queue_completed == 0 && reservation_completed == 0 {
        None
    } else if queue_completed >= reservation_completed {
        Some(Channel::Queue)
    } else {
        Some(Channel::Reservation)
    }
}

fn average_party_size(visits: &[VisitEvent]) -> Option<f64> {
    let sizes: Vec<i32> = visits.iter().map(|v| v.party_size).filter(|s| *s > 0).collect();
    if sizes.is_empty() {
        return None;
    }
    let mean = sizes.iter().map(|s| *s as f64).sum::<f64>() / sizes.len() as f64;
    Some((mean * 10.0).round() / 10.0)
}

fn last_wait_minutes(visits: &[VisitEvent]) -> Option<f64> {
    visits
        .iter()
        .filter(|v| v.kind == VisitKind::Queue && v.is_completed())
        .filter_map(|v| match (v.occurred_at, v.wait_minutes) {
            (Some(at), Some(wait)) if wait > 0.0 => Some((at, wait)),
            _ => None,
        })
        .max_by_key(|(at, _)| *at)
        .map(|(_, wait)| wait)
}

fn mode_bucket(buckets: &[u32]) -> Option<u32> {
    let mut best: Option<(usize, u32)> = None;
    for (key, &n) in buckets.iter().enumerate() {
        if n == 0 {
            continue;
        }
        match best {
            Some((_, best_n)) if n <= best_n => {}
            _ => best = Some((key, n)),
        }
    }
    best.map(|(key, _)| key as u32)
}

fn count<F>(visits: &[VisitEvent], predicate: F) -> u32
where
    F: Fn(&VisitEvent) -> bool,
{
    visits.iter().filter(|v| predicate(*v)).count() as u32
}

fn count_refs<F>(visits: &[&VisitEvent], predicate: F) -> u32
where
    F: Fn(&VisitEvent) -> bool,
{
    visits.iter().filter(|v| predicate(**v)).count() as u32
}
