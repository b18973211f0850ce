// Alert Generator
//
// Evaluates a fixed list of threshold rules against aggregated metrics.
// Every rule is independent; emission order is rule order. No
// deduplication happens here, callers key on the stable alert id.

use crate::analytics::models::{AggregatedMetrics, Alert, Severity, SuggestedAction};

pub const RESTAURANT_CANCELLATIONS_ALERT: &str = "restaurant_cancellations";
pub const WAIT_ABOVE_BASELINE_ALERT: &str = "wait_above_baseline";
pub const REPEATED_NO_SHOW_ALERT: &str = "repeated_no_show";
pub const CHURN_RISK_ALERT: &str = "churn_risk";

const CHURN_CRITICAL_DAYS: i64 = 60;
const CHURN_WARNING_DAYS: i64 = 30;

/// Alert Generator
#[derive(Debug, Clone, Copy)]
pub struct AlertGenerator {
    wait_alert_multiplier: f64,
}

impl AlertGenerator {
    pub fn new(wait_alert_multiplier: f64) -> Self {
        Self {
            wait_alert_multiplier,
        }
    }

    pub fn generate(&self, metrics: &AggregatedMetrics) -> Vec<Alert> {
        [
            restaurant_cancellations(metrics),
            self.wait_above_baseline(metrics),
            repeated_no_show(metrics),
            churn_risk(metrics),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn wait_above_baseline(&self, metrics: &AggregatedMetrics) -> Option<Alert> {
        let last = metrics.last_wait_minutes?;
        let baseline = metrics.restaurant_avg_wait_minutes.filter(|b| *b > 0.0)?;
        if last <= baseline * self.wait_alert_multiplier {
            return None;
        }
        Some(Alert {
            id: WAIT_ABOVE_BASELINE_ALERT.to_string(),
            severity: Severity::Warning,
            title: format!(
                "Wait time above average ({:.0} min vs {:.0} min)",
                last, baseline
            ),
            suggested_action: None,
        })
    }
}

fn restaurant_cancellations(metrics: &AggregatedMetrics) -> Option<Alert> {
    let n = metrics.cancel_by_restaurant_last_30d;
    if n == 0 {
        return None;
    }
    Some(Alert {
        id: RESTAURANT_CANCELLATIONS_ALERT.to_string(),
        severity: Severity::Critical,
        title: format!(
            "Restaurant canceled {} reservation{} in the last 30 days",
            n,
            if n == 1 { "" } else { "s" }
        ),
        suggested_action: Some(SuggestedAction::ViewEvents),
    })
}

fn repeated_no_show(metrics: &AggregatedMetrics) -> Option<Alert> {
    let n = metrics.no_show_last_60d;
    let severity = match n {
        n if n >= 3 => Severity::Critical,
        2 => Severity::Warning,
        _ => return None,
    };
    Some(Alert {
        id: REPEATED_NO_SHOW_ALERT.to_string(),
        severity,
        title: format!("{} no-shows in the last 60 days", n),
        suggested_action: None,
    })
}

fn churn_risk(metrics: &AggregatedMetrics) -> Option<Alert> {
    let days = metrics.days_since_last_visit?;
    let (severity, title) = if days > CHURN_CRITICAL_DAYS {
        (Severity::Critical, format!("Possible churn: no visits in {} days", days))
    } else if days > CHURN_WARNING_DAYS {
        (Severity::Warning, format!("Churn risk: no visits in {} days", days))
    } else {
        return None;
    };
    Some(Alert {
        id: CHURN_RISK_ALERT.to_string(),
        severity,
        title,
        suggested_action: Some(SuggestedAction::SendPromotion),
    })
}
