//! Promotion price table and selection resolution.
//!
//! The table is deployment data: it is deserialized into [`PromotionConfig`]
//! by the configuration layer and injected into the services that need it,
//! never read from a module global. Option ids are unique within their own
//! category only.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;
use crate::domain::types::PromotionCategory;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublicationRule {
    pub enabled: bool,
    pub token_required: i64,
    pub label: String,
}

/// One priced option inside a category. `price_cents` is only meaningful for
/// `extended` (money alternative to tokens); `every_hours` only for
/// `autorenew` (re-boost cadence).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PromotionOption {
    pub id: u32,
    pub days: u32,
    pub tokens: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_cents: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub every_hours: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryOptions {
    #[serde(default)]
    pub options: Vec<PromotionOption>,
}

impl CategoryOptions {
    pub fn find(&self, option_id: u32) -> Option<&PromotionOption> {
        self.options.iter().find(|option| option.id == option_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VipRule {
    /// Categories that must all carry a selection for the bundle discount.
    pub definition: BTreeSet<PromotionCategory>,
    pub discount_tokens: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PromotionRules {
    pub vip: VipRule,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PromotionConfig {
    pub publication: PublicationRule,
    pub extended: CategoryOptions,
    pub featured: CategoryOptions,
    pub autorenew: CategoryOptions,
    pub urgent: CategoryOptions,
    pub rules: PromotionRules,
}

impl PromotionConfig {
    pub fn category(&self, category: PromotionCategory) -> &CategoryOptions {
        match category {
            PromotionCategory::Extended => &self.extended,
            PromotionCategory::Featured => &self.featured,
            PromotionCategory::Autorenew => &self.autorenew,
            PromotionCategory::Urgent => &self.urgent,
        }
    }

    /// Resolve an option id against a category. An unknown id is an explicit
    /// error, never a silent zero-cost contribution.
    pub fn resolve(
        &self,
        category: PromotionCategory,
        option_id: u32,
    ) -> Result<&PromotionOption, DomainError> {
        self.category(category)
            .find(option_id)
            .ok_or(DomainError::unknown_option(category, option_id))
    }

    /// Structural validation applied once at configuration load.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.publication.token_required < 0 {
            return Err(DomainError::invariant(
                "publication.token_required must not be negative",
            ));
        }

        for category in PromotionCategory::ALL {
            let options = &self.category(category).options;
            let mut seen = BTreeSet::new();
            for option in options {
                if !seen.insert(option.id) {
                    return Err(DomainError::invariant(format!(
                        "duplicate option id `{}` in category `{category}`",
                        option.id
                    )));
                }
                if option.days == 0 {
                    return Err(DomainError::invariant(format!(
                        "option `{}` in category `{category}` has zero days",
                        option.id
                    )));
                }
                if option.tokens < 0 {
                    return Err(DomainError::invariant(format!(
                        "option `{}` in category `{category}` has negative tokens",
                        option.id
                    )));
                }
                if option.price_cents.is_some_and(|cents| cents < 0) {
                    return Err(DomainError::invariant(format!(
                        "option `{}` in category `{category}` has a negative price",
                        option.id
                    )));
                }
                if category == PromotionCategory::Autorenew
                    && option.every_hours.is_none_or(|hours| hours == 0)
                {
                    return Err(DomainError::invariant(format!(
                        "autorenew option `{}` requires a positive every_hours cadence",
                        option.id
                    )));
                }
            }
        }

        if self.rules.vip.definition.is_empty() {
            return Err(DomainError::invariant(
                "rules.vip.definition must name at least one category",
            ));
        }
        if self.rules.vip.discount_tokens < 0 {
            return Err(DomainError::invariant(
                "rules.vip.discount_tokens must not be negative",
            ));
        }

        Ok(())
    }
}

impl Default for PromotionConfig {
    fn default() -> Self {
        Self {
            publication: PublicationRule {
                enabled: true,
                token_required: 2,
                label: "Publication d'annonce".to_string(),
            },
            extended: CategoryOptions {
                options: vec![
                    PromotionOption {
                        id: 1,
                        days: 7,
                        tokens: 2,
                        price_cents: Some(500),
                        every_hours: None,
                    },
                    PromotionOption {
                        id: 2,
                        days: 30,
                        tokens: 6,
                        price_cents: Some(1500),
                        every_hours: None,
                    },
                ],
            },
            featured: CategoryOptions {
                options: vec![
                    PromotionOption {
                        id: 1,
                        days: 3,
                        tokens: 3,
                        price_cents: None,
                        every_hours: None,
                    },
                    PromotionOption {
                        id: 2,
                        days: 7,
                        tokens: 5,
                        price_cents: None,
                        every_hours: None,
                    },
                ],
            },
            autorenew: CategoryOptions {
                options: vec![
                    PromotionOption {
                        id: 1,
                        days: 3,
                        tokens: 4,
                        price_cents: None,
                        every_hours: Some(24),
                    },
                    PromotionOption {
                        id: 2,
                        days: 7,
                        tokens: 8,
                        price_cents: None,
                        every_hours: Some(12),
                    },
                ],
            },
            urgent: CategoryOptions {
                options: vec![
                    PromotionOption {
                        id: 1,
                        days: 3,
                        tokens: 2,
                        price_cents: None,
                        every_hours: None,
                    },
                    PromotionOption {
                        id: 2,
                        days: 7,
                        tokens: 4,
                        price_cents: None,
                        every_hours: None,
                    },
                ],
            },
            rules: PromotionRules {
                vip: VipRule {
                    definition: BTreeSet::from([
                        PromotionCategory::Featured,
                        PromotionCategory::Autorenew,
                    ]),
                    discount_tokens: 2,
                },
            },
        }
    }
}

/// At most one option id per category; `None` means the category is skipped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PromotionSelection {
    pub extended: Option<u32>,
    pub featured: Option<u32>,
    pub autorenew: Option<u32>,
    pub urgent: Option<u32>,
}

impl PromotionSelection {
    pub fn get(&self, category: PromotionCategory) -> Option<u32> {
        match category {
            PromotionCategory::Extended => self.extended,
            PromotionCategory::Featured => self.featured,
            PromotionCategory::Autorenew => self.autorenew,
            PromotionCategory::Urgent => self.urgent,
        }
    }

    pub fn is_empty(&self) -> bool {
        PromotionCategory::ALL
            .iter()
            .all(|category| self.get(*category).is_none())
    }
}
