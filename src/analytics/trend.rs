use crate::analytics::models::{Trend, TrendDirection};

/// Minimum visit difference between adjacent windows that counts as movement
pub const TREND_THRESHOLD: i64 = 2;

/// Service for classifying engagement direction across adjacent 30-day windows
pub struct TrendClassifier;

impl TrendClassifier {
    /// Classify visits in the last 30 days against the 30 days before
    ///
    /// # Rules
    /// - diff >= 2 → Up
    /// - diff <= -2 → Down
    /// - otherwise → Stable (single-visit variance is treated as noise)
    pub fn classify(last_30d: u32, prev_30d: u32) -> Trend {
        let diff = last_30d as i64 - prev_30d as i64;
        Trend {
            direction: Self::direction(diff),
            diff,
            last_30d,
            prev_30d,
        }
    }

    pub fn direction(diff: i64) -> TrendDirection {
        if diff >= TREND_THRESHOLD {
            TrendDirection::Up
        } else if diff <= -TREND_THRESHOLD {
            TrendDirection::Down
        } else {
            TrendDirection::Stable
        }
    }
}
