// Insight Rule Engine
//
// Works from the customer summary record alone, no event history, so it can
// run over every customer of a restaurant in one pass.

use chrono::{DateTime, Utc};

use crate::analytics::models::CustomerProfile;
use crate::insights::models::{InsightType, NewInsight};

pub const VIP_MISSING_DAYS: i64 = 14;
pub const INACTIVE_DAYS: i64 = 30;
pub const RECURRENT_MIN_VISITS: i32 = 3;
pub const NEW_CUSTOMER_MAX_DAYS: i64 = 7;
pub const NEW_CUSTOMER_MAX_VISITS: i32 = 1;

pub struct InsightRuleEngine;

impl InsightRuleEngine {
    /// Candidate insights for one customer, in rule order
    ///
    /// `vip_missing` and `inactive` are exclusive: a VIP never yields `inactive`.
    pub fn evaluate(profile: &CustomerProfile, now: DateTime<Utc>) -> Vec<NewInsight> {
        Self::matching_types(profile, now)
            .into_iter()
            .map(|insight_type| NewInsight {
                customer_id: profile.id,
                restaurant_id: profile.restaurant_id,
                insight_type,
                message: insight_type.message(&profile.name),
                action_allowed: profile.marketing_opt_in,
            })
            .collect()
    }

    pub fn matching_types(profile: &CustomerProfile, now: DateTime<Utc>) -> Vec<InsightType> {
        let days_since_last_visit = profile.days_since_last_visit(now);
        let mut types = Vec::new();

        if profile.vip {
            if days_since_last_visit > VIP_MISSING_DAYS {
                types.push(InsightType::VipMissing);
            }
        } else if days_since_last_visit > INACTIVE_DAYS {
            types.push(InsightType::Inactive);
        }

        if profile.total_visits >= RECURRENT_MIN_VISITS && !profile.vip {
            types.push(InsightType::Recurrent);
        }

        if profile.days_since_created(now) <= NEW_CUSTOMER_MAX_DAYS
            && profile.total_visits <= NEW_CUSTOMER_MAX_VISITS
        {
            types.push(InsightType::NewCustomer);
        }

        types
    }
}
