use chrono::{DateTime, Datelike, FixedOffset, Utc};

use crate::analytics::models::{MonthlyEvolution, VisitEvent, VisitKind};

/// Number of trailing months in the chart series
pub const EVOLUTION_MONTHS: usize = 12;

/// Month-bucketed rollup of completed visits, oldest month first
///
/// The current month is the last entry. Visits outside the series or without
/// a timestamp are ignored.
pub fn monthly_evolution(
    visits: &[VisitEvent],
    now: DateTime<Utc>,
    local_offset: FixedOffset,
) -> Vec<MonthlyEvolution> {
    let local_now = now.with_timezone(&local_offset);
    let current = month_index(local_now.year(), local_now.month());
    let first = current - (EVOLUTION_MONTHS as i32 - 1);

    let mut series: Vec<MonthlyEvolution> = (first..=current)
        .map(|index| MonthlyEvolution {
            month: month_label(index),
            queue_completed_count: 0,
            reservation_completed_count: 0,
        })
        .collect();

    for visit in visits.iter().filter(|v| v.is_completed()) {
        let Some(at) = visit.occurred_at else {
            continue;
        };
        let local = at.with_timezone(&local_offset);
        let index = month_index(local.year(), local.month());
        if index < first || index > current {
            continue;
        }
        let bucket = &mut series[(index - first) as usize];
        match visit.kind {
            VisitKind::Queue => bucket.queue_completed_count += 1,
            VisitKind::Reservation => bucket.reservation_completed_count += 1,
        }
    }

    series
}

fn month_index(year: i32, month: u32) -> i32 {
    year * 12 + (month as i32 - 1)
}

fn month_label(index: i32) -> String {
    format!("{:04}-{:02}", index.div_euclid(12), index.rem_euclid(12) + 1)
}
