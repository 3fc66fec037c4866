//! Badge derivation from an ad's persisted promotion state.
//!
//! Badges are never stored: they are recomputed from the promotion map and
//! the current time whenever an ad is read, so the only staleness possible
//! is clock skew.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::types::{Badge, PromotionCategory};

const SECONDS_PER_DAY: i64 = 86_400;

/// One activated category: the option chosen at publish time plus the expiry
/// computed then (`activated_at + option.days`), not re-derived from "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivePromotion {
    pub option_id: u32,
    #[serde(with = "time::serde::rfc3339")]
    pub activated_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    /// Re-boost cadence, recorded for `autorenew` only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub every_hours: Option<u32>,
}

/// Persisted promotion map for one ad (JSONB column), keyed by category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PromotionState {
    pub categories: BTreeMap<PromotionCategory, ActivePromotion>,
}

impl PromotionState {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn get(&self, category: PromotionCategory) -> Option<&ActivePromotion> {
        self.categories.get(&category)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeInfo {
    /// Active badges in fixed display-priority order:
    /// PREMIUM, TOP, URGENT, PROLONGATION.
    pub badges: Vec<Badge>,
    /// Earliest expiry across active categories, when any is active.
    pub expires_at: Option<OffsetDateTime>,
    pub remaining_days: Option<i64>,
}

/// Display-priority order of the badge set. The presentation layer may
/// elevate URGENT when rendering; set membership is the contract.
const BADGE_ORDER: [PromotionCategory; 4] = [
    PromotionCategory::Featured,
    PromotionCategory::Autorenew,
    PromotionCategory::Urgent,
    PromotionCategory::Extended,
];

/// Derive the badge set for an ad. A category contributes its badge only
/// while `now < expires_at`; expired entries are inert until the next
/// republish rewrites the promotion map.
pub fn derive(state: &PromotionState, now: OffsetDateTime) -> BadgeInfo {
    let mut badges = Vec::new();
    let mut earliest: Option<OffsetDateTime> = None;

    for category in BADGE_ORDER {
        let Some(active) = state.get(category) else {
            continue;
        };
        if now >= active.expires_at {
            continue;
        }

        badges.push(category.badge());
        earliest = match earliest {
            Some(current) if current <= active.expires_at => Some(current),
            _ => Some(active.expires_at),
        };
    }

    let remaining_days = earliest.map(|expires_at| {
        let seconds = (expires_at - now).whole_seconds().max(0);
        (seconds + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY
    });

    BadgeInfo {
        badges,
        expires_at: earliest,
        remaining_days,
    }
}
