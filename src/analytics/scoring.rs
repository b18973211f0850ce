// Relationship Scorer
//
// Additive heuristic over aggregated metrics. Each rule is a named
// (predicate, weight) pair evaluated in a fixed order, so rules can be
// tested in isolation and new ones appended without touching the rest.

use crate::analytics::models::{AggregatedMetrics, CustomerProfile, Score, Tag};

pub const BASE_SCORE: i32 = 50;
pub const MIN_SCORE: i32 = 0;
pub const MAX_SCORE: i32 = 100;

/// Inputs a scoring rule may look at
#[derive(Debug, Clone, Copy)]
pub struct ScoreInput<'a> {
    pub metrics: &'a AggregatedMetrics,
    pub marketing_opt_in: bool,
}

impl<'a> ScoreInput<'a> {
    pub fn new(metrics: &'a AggregatedMetrics, profile: Option<&CustomerProfile>) -> Self {
        Self {
            metrics,
            marketing_opt_in: profile.map(|p| p.marketing_opt_in).unwrap_or(false),
        }
    }

    fn days_since_last_visit_over(&self, days: i64) -> bool {
        self.metrics.days_since_last_visit.is_some_and(|d| d > days)
    }
}

/// A single additive scoring rule
#[derive(Clone, Copy)]
pub struct ScoreRule {
    pub name: &'static str,
    pub weight: i32,
    pub applies: fn(&ScoreInput<'_>) -> bool,
}

/// Scoring rules in evaluation order
pub static SCORE_RULES: [ScoreRule; 7] = [
    ScoreRule {
        name: "frequent_last_30d",
        weight: 10,
        applies: |input| input.metrics.visits_last_30d >= 2,
    },
    ScoreRule {
        name: "regular_last_90d",
        weight: 10,
        applies: |input| input.metrics.visits_last_90d >= 5,
    },
    ScoreRule {
        name: "no_no_shows_90d",
        weight: 10,
        applies: |input| input.metrics.no_show_last_90d == 0,
    },
    ScoreRule {
        name: "repeated_no_shows_90d",
        weight: -15,
        applies: |input| input.metrics.no_show_last_90d >= 2,
    },
    ScoreRule {
        name: "customer_cancellations_90d",
        weight: -10,
        applies: |input| input.metrics.customer_cancels_last_90d >= 2,
    },
    ScoreRule {
        name: "absent_over_45d",
        weight: -10,
        applies: |input| input.days_since_last_visit_over(45),
    },
    ScoreRule {
        name: "marketing_opt_in",
        weight: 10,
        applies: |input| input.marketing_opt_in,
    },
];

/// Relationship Scorer
pub struct RelationshipScorer;

impl RelationshipScorer {
    /// Compute the bounded score and its tags
    pub fn score(metrics: &AggregatedMetrics, profile: Option<&CustomerProfile>) -> Score {
        let input = ScoreInput::new(metrics, profile);
        let value = Self::score_value(&input);
        Score {
            value,
            tags: Self::tags(metrics, value),
        }
    }

    /// Sum the weights of every rule that applies, clamped to [0, 100]
    pub fn score_value(input: &ScoreInput<'_>) -> u8 {
        let raw = SCORE_RULES
            .iter()
            .filter(|rule| (rule.applies)(input))
            .fold(BASE_SCORE, |acc, rule| {
                tracing::trace!(rule = rule.name, weight = rule.weight, "score rule applied");
                acc + rule.weight
            });
        raw.clamp(MIN_SCORE, MAX_SCORE) as u8
    }

    /// Tags are independent thresholds; a customer may carry several
    pub fn tags(metrics: &AggregatedMetrics, score: u8) -> Vec<Tag> {
        let mut tags = Vec::new();
        if score >= 80 || metrics.completed_count >= 10 {
            tags.push(Tag::Vip);
        }
        if metrics.visits_last_30d >= 2 {
            tags.push(Tag::Frequent);
        }
        if metrics.days_since_last_visit.is_some_and(|d| d > 60) || score <= 40 {
            tags.push(Tag::AtRisk);
        }
        if metrics.no_show_last_90d >= 2 {
            tags.push(Tag::Unstable);
        }
        tags
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Score stays within [0, 100] for any metric combination
        #[test]
        fn prop_score_bounded(
            visits_last_30d in 0u32..50,
            visits_last_90d in 0u32..150,
            no_show_last_90d in 0u32..20,
            customer_cancels_last_90d in 0u32..20,
            completed_count in 0u32..500,
            days_since_last_visit in prop::option::of(0i64..1000),
            marketing_opt_in in any::<bool>(),
        ) {
            let metrics = AggregatedMetrics {
                visits_last_30d,
                visits_last_90d,
                no_show_last_90d,
                customer_cancels_last_90d,
                completed_count,
                days_since_last_visit,
                ..AggregatedMetrics::default()
            };
            let input = ScoreInput { metrics: &metrics, marketing_opt_in };
            let value = RelationshipScorer::score_value(&input);
            prop_assert!(value <= 100);

            let tags = RelationshipScorer::tags(&metrics, value);
            if value <= 40 {
                prop_assert!(tags.contains(&Tag::AtRisk));
            }
            if value >= 80 {
                prop_assert!(tags.contains(&Tag::Vip));
            }
        }
    }
}
