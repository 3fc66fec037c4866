//! Shared domain enumerations for the promotion engine.

use serde::{Deserialize, Serialize};

/// Promotion categories a selection may reference, mirroring the price table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionCategory {
    Extended,
    Featured,
    Autorenew,
    Urgent,
}

impl PromotionCategory {
    pub const ALL: [PromotionCategory; 4] = [
        PromotionCategory::Extended,
        PromotionCategory::Featured,
        PromotionCategory::Autorenew,
        PromotionCategory::Urgent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PromotionCategory::Extended => "extended",
            PromotionCategory::Featured => "featured",
            PromotionCategory::Autorenew => "autorenew",
            PromotionCategory::Urgent => "urgent",
        }
    }

    /// Badge this category contributes while its promotion is unexpired.
    pub fn badge(self) -> Badge {
        match self {
            PromotionCategory::Extended => Badge::Prolongation,
            PromotionCategory::Featured => Badge::Premium,
            PromotionCategory::Autorenew => Badge::Top,
            PromotionCategory::Urgent => Badge::Urgent,
        }
    }
}

impl std::fmt::Display for PromotionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-visible promotion labels rendered on listed ads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Badge {
    Premium,
    Top,
    Urgent,
    Prolongation,
}

impl Badge {
    pub fn as_str(self) -> &'static str {
        match self {
            Badge::Premium => "PREMIUM",
            Badge::Top => "TOP",
            Badge::Urgent => "URGENT",
            Badge::Prolongation => "PROLONGATION",
        }
    }
}
