//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::badges::PromotionState;
use crate::domain::entities::{AccountRecord, AdRecord, MediaRecord, ProfileRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity {
            message: message.into(),
        }
    }
}

#[async_trait]
pub trait AccountsRepo: Send + Sync {
    async fn find_by_session_token(
        &self,
        token: &str,
    ) -> Result<Option<(AccountRecord, Uuid)>, RepoError>;

    async fn find_by_profile(&self, profile_id: Uuid) -> Result<Option<AccountRecord>, RepoError>;
}

#[async_trait]
pub trait ProfilesRepo: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ProfileRecord>, RepoError>;

    async fn list_media(&self, profile_id: Uuid) -> Result<Vec<MediaRecord>, RepoError>;
}

#[async_trait]
pub trait AdsRepo: Send + Sync {
    async fn list_active(&self, limit: u32) -> Result<Vec<AdRecord>, RepoError>;

    async fn find_active_by_profile(
        &self,
        profile_id: Uuid,
    ) -> Result<Option<AdRecord>, RepoError>;
}

#[derive(Debug, Clone)]
pub struct NewMedia {
    pub url: String,
    pub position: i32,
}

/// Everything the publish transaction writes, resolved and priced upfront.
#[derive(Debug, Clone)]
pub struct PublishAdParams {
    pub profile_id: Uuid,
    pub account_id: Uuid,
    pub title: String,
    pub body: String,
    pub tarif: String,
    pub lieu: String,
    pub services: Vec<String>,
    pub description: String,
    pub disponibilite: String,
    /// Replace-all semantics when present; `None` leaves existing media alone.
    pub media: Option<Vec<NewMedia>>,
    pub tokens_to_deduct: i64,
    pub promotion: PromotionState,
}

/// Transactional port for the publish workflow. Implementations must apply
/// all writes atomically: ad upsert, profile denormalization, media
/// replacement and token deduction commit together or not at all.
#[async_trait]
pub trait PublishStore: Send + Sync {
    async fn publish_ad(&self, params: PublishAdParams) -> Result<AdRecord, RepoError>;

    async fn unpublish_ad(&self, profile_id: Uuid) -> Result<(), RepoError>;
}
