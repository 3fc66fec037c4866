//! Wire models for the public API. The external contract is camelCase;
//! conversions from domain records live here so handlers stay thin.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::listing::{AdWithMeta, ProfileView};
use crate::application::publish::PublishedAd;
use crate::domain::ads::{AdDraft, MediaDraft};
use crate::domain::badges::BadgeInfo;
use crate::domain::entities::MediaRecord;
use crate::domain::pricing::Quote;
use crate::domain::promotion::{PromotionConfig, PromotionSelection};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    pub profile_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tarif: String,
    #[serde(default)]
    pub lieu: String,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub disponibilite: String,
    #[serde(default)]
    pub media: Option<Vec<MediaInput>>,
    #[serde(default)]
    pub promote: Option<PromoteMap>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaInput {
    pub url: String,
    #[serde(default)]
    pub position: i32,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoteMap {
    #[serde(default)]
    pub extended: Option<OptionRef>,
    #[serde(default)]
    pub featured: Option<OptionRef>,
    #[serde(default)]
    pub autorenew: Option<OptionRef>,
    #[serde(default)]
    pub urgent: Option<OptionRef>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionRef {
    pub option_id: u32,
}

impl From<PromoteMap> for PromotionSelection {
    fn from(map: PromoteMap) -> Self {
        Self {
            extended: map.extended.map(|r| r.option_id),
            featured: map.featured.map(|r| r.option_id),
            autorenew: map.autorenew.map(|r| r.option_id),
            urgent: map.urgent.map(|r| r.option_id),
        }
    }
}

impl PublishRequest {
    pub fn into_draft_and_selection(self) -> (Uuid, AdDraft, PromotionSelection) {
        let selection = self.promote.map(PromotionSelection::from).unwrap_or_default();
        let draft = AdDraft {
            title: self.title,
            description: self.description,
            tarif: self.tarif,
            lieu: self.lieu,
            services: self.services,
            disponibilite: self.disponibilite,
            media: self.media.map(|items| {
                items
                    .into_iter()
                    .map(|item| MediaDraft {
                        url: item.url,
                        position: item.position,
                    })
                    .collect()
            }),
        };
        (self.profile_id, draft, selection)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdCreatedResponse {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub quote: Quote,
}

impl From<PublishedAd> for AdCreatedResponse {
    fn from(published: PublishedAd) -> Self {
        Self {
            id: published.ad.id,
            title: published.ad.title,
            body: published.ad.body,
            created_at: published.ad.created_at,
            quote: published.quote,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionMeta {
    pub badges: Vec<&'static str>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub expires_at: Option<OffsetDateTime>,
    pub remaining_days: Option<i64>,
}

impl From<BadgeInfo> for PromotionMeta {
    fn from(info: BadgeInfo) -> Self {
        Self {
            badges: info.badges.iter().map(|badge| badge.as_str()).collect(),
            expires_at: info.expires_at,
            remaining_days: info.remaining_days,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdResponse {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub title: String,
    pub body: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub promotion_meta: PromotionMeta,
}

impl From<AdWithMeta> for AdResponse {
    fn from(item: AdWithMeta) -> Self {
        Self {
            id: item.ad.id,
            profile_id: item.ad.profile_id,
            title: item.ad.title,
            body: item.ad.body,
            created_at: item.ad.created_at,
            promotion_meta: PromotionMeta::from(item.meta),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaResponse {
    pub url: String,
    pub position: i32,
}

impl From<MediaRecord> for MediaResponse {
    fn from(record: MediaRecord) -> Self {
        Self {
            url: record.url,
            position: record.position,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: Uuid,
    pub display_name: String,
    pub is_pro: bool,
    pub tarif: String,
    pub lieu: String,
    pub services: Vec<String>,
    pub description: String,
    pub disponibilite: String,
    pub media: Vec<MediaResponse>,
    pub ad: Option<AdResponse>,
}

impl From<ProfileView> for ProfileResponse {
    fn from(view: ProfileView) -> Self {
        Self {
            id: view.profile.id,
            display_name: view.profile.display_name,
            is_pro: view.profile.is_pro,
            tarif: view.profile.tarif,
            lieu: view.profile.lieu,
            services: view.profile.services,
            description: view.profile.description,
            disponibilite: view.profile.disponibilite,
            media: view.media.into_iter().map(MediaResponse::from).collect(),
            ad: view.ad.map(AdResponse::from),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AdListQuery {
    #[serde(default)]
    pub limit: Option<u32>,
}

// Read-only view of the promotion price table: enough for a client to
// render an advisory quote; the server re-validates on submit.

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishingConfigResponse {
    pub publication: PublicationView,
    pub extended: Vec<OptionView>,
    pub featured: Vec<OptionView>,
    pub autorenew: Vec<OptionView>,
    pub urgent: Vec<OptionView>,
    pub vip: VipView,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicationView {
    pub enabled: bool,
    pub token_required: i64,
    pub label: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionView {
    pub id: u32,
    pub days: u32,
    pub tokens: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_cents: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub every_hours: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VipView {
    pub definition: Vec<&'static str>,
    pub discount_tokens: i64,
}

impl From<&PromotionConfig> for PublishingConfigResponse {
    fn from(config: &PromotionConfig) -> Self {
        let options = |list: &[crate::domain::promotion::PromotionOption]| {
            list.iter()
                .map(|option| OptionView {
                    id: option.id,
                    days: option.days,
                    tokens: option.tokens,
                    price_cents: option.price_cents,
                    every_hours: option.every_hours,
                })
                .collect()
        };

        Self {
            publication: PublicationView {
                enabled: config.publication.enabled,
                token_required: config.publication.token_required,
                label: config.publication.label.clone(),
            },
            extended: options(&config.extended.options),
            featured: options(&config.featured.options),
            autorenew: options(&config.autorenew.options),
            urgent: options(&config.urgent.options),
            vip: VipView {
                definition: config
                    .rules
                    .vip
                    .definition
                    .iter()
                    .map(|category| category.as_str())
                    .collect(),
                discount_tokens: config.rules.vip.discount_tokens,
            },
        }
    }
}
