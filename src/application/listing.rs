//! Public read side: active ads and profile views with derived badges.

use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{AdsRepo, ProfilesRepo, RepoError};
use crate::domain::badges::{self, BadgeInfo};
use crate::domain::entities::{AdRecord, MediaRecord, ProfileRecord};

const DEFAULT_PAGE_SIZE: u32 = 24;
const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Error)]
pub enum ListingError {
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct AdWithMeta {
    pub ad: AdRecord,
    pub meta: BadgeInfo,
}

#[derive(Debug, Clone)]
pub struct ProfileView {
    pub profile: ProfileRecord,
    pub media: Vec<MediaRecord>,
    pub ad: Option<AdWithMeta>,
}

#[derive(Clone)]
pub struct ListingService {
    ads: Arc<dyn AdsRepo>,
    profiles: Arc<dyn ProfilesRepo>,
}

impl ListingService {
    pub fn new(ads: Arc<dyn AdsRepo>, profiles: Arc<dyn ProfilesRepo>) -> Self {
        Self { ads, profiles }
    }

    /// Active ads, newest first, with badges derived at read time.
    pub async fn list_ads(&self, limit: Option<u32>) -> Result<Vec<AdWithMeta>, ListingError> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let now = OffsetDateTime::now_utc();

        let ads = self.ads.list_active(limit).await?;
        Ok(ads
            .into_iter()
            .map(|ad| {
                let meta = badges::derive(&ad.promotion, now);
                AdWithMeta { ad, meta }
            })
            .collect())
    }

    pub async fn profile_view(&self, id: Uuid) -> Result<Option<ProfileView>, ListingError> {
        let Some(profile) = self.profiles.find_by_id(id).await? else {
            return Ok(None);
        };

        let media = self.profiles.list_media(id).await?;
        let ad = self.ads.find_active_by_profile(id).await?.map(|ad| {
            let meta = badges::derive(&ad.promotion, OffsetDateTime::now_utc());
            AdWithMeta { ad, meta }
        });

        Ok(Some(ProfileView { profile, media, ad }))
    }
}
