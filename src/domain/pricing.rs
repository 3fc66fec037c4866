//! Quote computation for publishing and promoting an ad.
//!
//! [`quote`] is deterministic and side-effect-free: the same config,
//! selection, balance and VIP flag always produce the same [`Quote`]. The
//! server runs it as the source of truth at submit time; any client-side
//! rendition of the same numbers is advisory only.

use serde::Serialize;

use crate::domain::error::DomainError;
use crate::domain::promotion::{PromotionConfig, PromotionSelection};
use crate::domain::types::PromotionCategory;

/// Token cost contributed by each category of the selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryTokens {
    pub extended: i64,
    pub featured: i64,
    pub autorenew: i64,
    pub urgent: i64,
}

impl CategoryTokens {
    fn set(&mut self, category: PromotionCategory, tokens: i64) {
        match category {
            PromotionCategory::Extended => self.extended = tokens,
            PromotionCategory::Featured => self.featured = tokens,
            PromotionCategory::Autorenew => self.autorenew = tokens,
            PromotionCategory::Urgent => self.urgent = tokens,
        }
    }

    fn sum(&self) -> i64 {
        self.extended + self.featured + self.autorenew + self.urgent
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub publication_tokens: i64,
    pub category_tokens: CategoryTokens,
    pub subtotal: i64,
    pub vip_discount: i64,
    pub total_tokens: i64,
    pub remaining_tokens: i64,
    pub allowed: bool,
}

/// Price a candidate selection against the table.
///
/// The VIP discount is all-or-nothing: it applies only when the caller is
/// VIP and every category in `rules.vip.definition` carries a selection.
/// Balances are never assumed non-negative; outputs are clamped at zero.
pub fn quote(
    config: &PromotionConfig,
    selection: &PromotionSelection,
    balance: i64,
    is_vip: bool,
) -> Result<Quote, DomainError> {
    let publication_tokens = if config.publication.enabled {
        config.publication.token_required
    } else {
        0
    };

    let mut category_tokens = CategoryTokens::default();
    for category in PromotionCategory::ALL {
        if let Some(option_id) = selection.get(category) {
            let option = config.resolve(category, option_id)?;
            category_tokens.set(category, option.tokens);
        }
    }

    let subtotal = publication_tokens + category_tokens.sum();

    let bundle_complete = config
        .rules
        .vip
        .definition
        .iter()
        .all(|category| selection.get(*category).is_some());
    let vip_discount = if is_vip && bundle_complete {
        config.rules.vip.discount_tokens
    } else {
        0
    };

    let total_tokens = (subtotal - vip_discount).max(0);
    let remaining_tokens = (balance - total_tokens).max(0);
    let allowed = balance >= total_tokens;

    Ok(Quote {
        publication_tokens,
        category_tokens,
        subtotal,
        vip_discount,
        total_tokens,
        remaining_tokens,
        allowed,
    })
}
