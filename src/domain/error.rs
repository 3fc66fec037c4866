use thiserror::Error;

use crate::domain::types::PromotionCategory;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("domain entity `{entity}` not found")]
    NotFound { entity: &'static str },
    #[error("domain validation failed: {message}")]
    Validation { message: String },
    #[error("domain invariant violated: {message}")]
    Invariant { message: String },
    #[error("unknown option `{option_id}` for promotion category `{category}`")]
    UnknownOption {
        category: PromotionCategory,
        option_id: u32,
    },
}

impl DomainError {
    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant {
            message: message.into(),
        }
    }

    pub fn unknown_option(category: PromotionCategory, option_id: u32) -> Self {
        Self::UnknownOption {
            category,
            option_id,
        }
    }
}
