//! Persisted records as the application layer sees them.

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::domain::badges::PromotionState;

#[derive(Debug, Clone, Serialize)]
pub struct AccountRecord {
    pub id: Uuid,
    pub email: Option<String>,
    pub email_verified: bool,
    pub tokens_balance: i64,
    pub is_vip: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileRecord {
    pub id: Uuid,
    pub account_id: Uuid,
    pub display_name: String,
    pub is_pro: bool,
    pub tarif: String,
    pub lieu: String,
    pub services: Vec<String>,
    pub description: String,
    pub disponibilite: String,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdRecord {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub title: String,
    pub body: String,
    pub active: bool,
    pub promotion: PromotionState,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize)]
pub struct MediaRecord {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub url: String,
    pub position: i32,
}
