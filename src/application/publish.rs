//! Publish/republish workflow: ordered validation, pricing, then a single
//! atomic store transaction.

use std::sync::Arc;

use metrics::{counter, histogram};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::info;
use uuid::Uuid;

use crate::application::repos::{NewMedia, PublishAdParams, PublishStore, RepoError};
use crate::application::sessions::Principal;
use crate::domain::ads::AdDraft;
use crate::domain::badges::{ActivePromotion, PromotionState};
use crate::domain::entities::AdRecord;
use crate::domain::error::DomainError;
use crate::domain::pricing::{self, Quote};
use crate::domain::promotion::{PromotionConfig, PromotionSelection};
use crate::domain::types::PromotionCategory;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("caller does not own the target profile")]
    Forbidden,
    #[error("a verified email is required before publishing")]
    EmailUnverified,
    #[error("publishing is disabled for this deployment")]
    PublishingDisabled,
    #[error("insufficient tokens: {required} required, {balance} available")]
    InsufficientTokens { required: i64, balance: i64 },
    #[error("selection references unknown option `{option_id}` in category `{category}`")]
    InvalidSelection {
        category: PromotionCategory,
        option_id: u32,
    },
    #[error("validation failed: {0}")]
    Validation(String),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Error)]
pub enum UnpublishError {
    #[error("caller does not own the target profile")]
    Forbidden,
    #[error("no active ad to unpublish")]
    NotFound,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct PublishCommand {
    pub profile_id: Uuid,
    pub draft: AdDraft,
    pub selection: PromotionSelection,
}

#[derive(Debug, Clone)]
pub struct PublishedAd {
    pub ad: AdRecord,
    pub quote: Quote,
}

#[derive(Clone)]
pub struct PublishService {
    store: Arc<dyn PublishStore>,
    promotions: Arc<PromotionConfig>,
    require_verified_email: bool,
}

impl PublishService {
    pub fn new(
        store: Arc<dyn PublishStore>,
        promotions: Arc<PromotionConfig>,
        require_verified_email: bool,
    ) -> Self {
        Self {
            store,
            promotions,
            require_verified_email,
        }
    }

    pub fn promotions(&self) -> &PromotionConfig {
        &self.promotions
    }

    /// Validate and persist a publish/republish request. Preconditions are
    /// checked in a fixed order and the first failure wins; nothing is
    /// written unless every check passes.
    pub async fn publish(
        &self,
        principal: &Principal,
        command: PublishCommand,
    ) -> Result<PublishedAd, PublishError> {
        if principal.profile_id != command.profile_id {
            counter!("vitrine_publish_rejected_total", "reason" => "forbidden").increment(1);
            return Err(PublishError::Forbidden);
        }

        let account = &principal.account;
        if self.require_verified_email && !(account.email.is_some() && account.email_verified) {
            counter!("vitrine_publish_rejected_total", "reason" => "email_unverified")
                .increment(1);
            return Err(PublishError::EmailUnverified);
        }

        if !self.promotions.publication.enabled {
            counter!("vitrine_publish_rejected_total", "reason" => "publishing_disabled")
                .increment(1);
            return Err(PublishError::PublishingDisabled);
        }

        command.draft.validate().map_err(|err| {
            counter!("vitrine_publish_rejected_total", "reason" => "validation").increment(1);
            PublishError::Validation(err.to_string())
        })?;

        let quote = pricing::quote(
            &self.promotions,
            &command.selection,
            account.tokens_balance,
            account.is_vip,
        )
        .map_err(|err| {
            counter!("vitrine_publish_rejected_total", "reason" => "invalid_selection")
                .increment(1);
            match err {
                DomainError::UnknownOption {
                    category,
                    option_id,
                } => PublishError::InvalidSelection {
                    category,
                    option_id,
                },
                other => PublishError::Validation(other.to_string()),
            }
        })?;

        if !quote.allowed {
            counter!("vitrine_publish_rejected_total", "reason" => "insufficient_tokens")
                .increment(1);
            return Err(PublishError::InsufficientTokens {
                required: quote.total_tokens,
                balance: account.tokens_balance,
            });
        }

        let now = OffsetDateTime::now_utc();
        let promotion = resolve_promotion(&self.promotions, &command.selection, now)
            .map_err(|err| PublishError::Validation(err.to_string()))?;

        let PublishCommand {
            profile_id, draft, ..
        } = command;

        let media = draft.media.map(|items| {
            items
                .into_iter()
                .map(|item| NewMedia {
                    url: item.url,
                    position: item.position,
                })
                .collect()
        });

        let ad = self
            .store
            .publish_ad(PublishAdParams {
                profile_id,
                account_id: account.id,
                title: draft.title,
                body: draft.description.clone(),
                tarif: draft.tarif,
                lieu: draft.lieu,
                services: draft.services,
                description: draft.description,
                disponibilite: draft.disponibilite,
                media,
                tokens_to_deduct: quote.total_tokens,
                promotion,
            })
            .await?;

        counter!("vitrine_publish_accepted_total").increment(1);
        histogram!("vitrine_publish_quote_tokens").record(quote.total_tokens as f64);
        info!(
            target = "vitrine::publish",
            ad_id = %ad.id,
            profile_id = %profile_id,
            tokens = quote.total_tokens,
            "ad published"
        );

        Ok(PublishedAd { ad, quote })
    }

    pub async fn unpublish(
        &self,
        principal: &Principal,
        profile_id: Uuid,
    ) -> Result<(), UnpublishError> {
        if principal.profile_id != profile_id {
            return Err(UnpublishError::Forbidden);
        }

        match self.store.unpublish_ad(profile_id).await {
            Ok(()) => {
                counter!("vitrine_unpublish_total").increment(1);
                info!(
                    target = "vitrine::publish",
                    profile_id = %profile_id,
                    "ad unpublished"
                );
                Ok(())
            }
            Err(RepoError::NotFound) => Err(UnpublishError::NotFound),
            Err(err) => Err(UnpublishError::Repo(err)),
        }
    }
}

/// Resolve a priced selection into the promotion map persisted with the ad:
/// per category the chosen option id, the activation instant and the expiry
/// computed from the option's day count. For `autorenew` the re-boost
/// cadence is recorded alongside.
pub(crate) fn resolve_promotion(
    config: &PromotionConfig,
    selection: &PromotionSelection,
    now: OffsetDateTime,
) -> Result<PromotionState, DomainError> {
    let mut state = PromotionState::default();

    for category in PromotionCategory::ALL {
        let Some(option_id) = selection.get(category) else {
            continue;
        };
        let option = config.resolve(category, option_id)?;
        state.categories.insert(
            category,
            ActivePromotion {
                option_id: option.id,
                activated_at: now,
                expires_at: now + Duration::days(i64::from(option.days)),
                every_hours: if category == PromotionCategory::Autorenew {
                    option.every_hours
                } else {
                    None
                },
            },
        );
    }

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::domain::entities::AccountRecord;

    #[derive(Default)]
    struct RecordingStore {
        published: Mutex<Vec<PublishAdParams>>,
        unpublished: Mutex<Vec<Uuid>>,
        fail_publish: bool,
    }

    #[async_trait]
    impl PublishStore for RecordingStore {
        async fn publish_ad(&self, params: PublishAdParams) -> Result<AdRecord, RepoError> {
            if self.fail_publish {
                return Err(RepoError::from_persistence("connection reset"));
            }

            let ad = AdRecord {
                id: Uuid::new_v4(),
                profile_id: params.profile_id,
                title: params.title.clone(),
                body: params.body.clone(),
                active: true,
                promotion: params.promotion.clone(),
                created_at: OffsetDateTime::now_utc(),
                updated_at: OffsetDateTime::now_utc(),
            };
            self.published.lock().unwrap().push(params);
            Ok(ad)
        }

        async fn unpublish_ad(&self, profile_id: Uuid) -> Result<(), RepoError> {
            self.unpublished.lock().unwrap().push(profile_id);
            Ok(())
        }
    }

    fn account(balance: i64, is_vip: bool, email_verified: bool) -> AccountRecord {
        AccountRecord {
            id: Uuid::new_v4(),
            email: Some("user@example.net".to_string()),
            email_verified,
            tokens_balance: balance,
            is_vip,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn principal(profile_id: Uuid, balance: i64, is_vip: bool) -> Principal {
        Principal {
            account: account(balance, is_vip, true),
            profile_id,
        }
    }

    fn draft() -> AdDraft {
        AdDraft {
            title: "Massage relaxant centre-ville".to_string(),
            description: "Disponible en semaine.".to_string(),
            tarif: "80".to_string(),
            lieu: "Lyon".to_string(),
            services: vec!["massage".to_string()],
            disponibilite: "9h-19h".to_string(),
            media: None,
        }
    }

    fn command(profile_id: Uuid, selection: PromotionSelection) -> PublishCommand {
        PublishCommand {
            profile_id,
            draft: draft(),
            selection,
        }
    }

    fn service(store: Arc<RecordingStore>) -> PublishService {
        PublishService::new(store, Arc::new(PromotionConfig::default()), true)
    }

    #[tokio::test]
    async fn publish_deducts_the_quoted_total() {
        let store = Arc::new(RecordingStore::default());
        let service = service(store.clone());
        let profile_id = Uuid::new_v4();

        let selection = PromotionSelection {
            featured: Some(1),
            ..Default::default()
        };
        let published = service
            .publish(&principal(profile_id, 10, false), command(profile_id, selection))
            .await
            .expect("published");

        // default table: publication 2 + featured option 1 at 3 tokens
        assert_eq!(published.quote.total_tokens, 5);
        assert_eq!(published.quote.remaining_tokens, 5);

        let recorded = store.published.lock().unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].tokens_to_deduct, 5);
        assert!(recorded[0].promotion.get(PromotionCategory::Featured).is_some());
    }

    #[tokio::test]
    async fn mismatched_profile_is_forbidden_before_anything_else() {
        let store = Arc::new(RecordingStore::default());
        // also unverified and broke: ownership must still be the first failure
        let mut caller = principal(Uuid::new_v4(), 0, false);
        caller.account.email_verified = false;
        let service = service(store.clone());

        let err = service
            .publish(&caller, command(Uuid::new_v4(), PromotionSelection::default()))
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::Forbidden));
        assert!(store.published.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unverified_email_blocks_before_pricing() {
        let store = Arc::new(RecordingStore::default());
        let service = service(store.clone());
        let profile_id = Uuid::new_v4();
        let mut caller = principal(profile_id, 100, false);
        caller.account.email_verified = false;

        let err = service
            .publish(&caller, command(profile_id, PromotionSelection::default()))
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::EmailUnverified));
        assert!(store.published.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_email_counts_as_unverified() {
        let store = Arc::new(RecordingStore::default());
        let service = service(store.clone());
        let profile_id = Uuid::new_v4();
        let mut caller = principal(profile_id, 100, false);
        caller.account.email = None;
        caller.account.email_verified = true;

        let err = service
            .publish(&caller, command(profile_id, PromotionSelection::default()))
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::EmailUnverified));
    }

    #[tokio::test]
    async fn email_check_can_be_disabled_per_deployment() {
        let store = Arc::new(RecordingStore::default());
        let service =
            PublishService::new(store.clone(), Arc::new(PromotionConfig::default()), false);
        let profile_id = Uuid::new_v4();
        let mut caller = principal(profile_id, 100, false);
        caller.account.email = None;
        caller.account.email_verified = false;

        service
            .publish(&caller, command(profile_id, PromotionSelection::default()))
            .await
            .expect("published without email verification");
    }

    #[tokio::test]
    async fn kill_switch_rejects_regardless_of_balance() {
        let store = Arc::new(RecordingStore::default());
        let mut config = PromotionConfig::default();
        config.publication.enabled = false;
        let service = PublishService::new(store.clone(), Arc::new(config), true);
        let profile_id = Uuid::new_v4();

        let err = service
            .publish(
                &principal(profile_id, 1_000, true),
                command(profile_id, PromotionSelection::default()),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::PublishingDisabled));
        assert!(store.published.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_draft_is_rejected_before_pricing() {
        let store = Arc::new(RecordingStore::default());
        let service = service(store.clone());
        let profile_id = Uuid::new_v4();

        let mut cmd = command(profile_id, PromotionSelection::default());
        cmd.draft.title = "ab".to_string();

        let err = service
            .publish(&principal(profile_id, 100, false), cmd)
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::Validation(_)));
    }

    #[tokio::test]
    async fn unknown_option_is_a_hard_rejection() {
        let store = Arc::new(RecordingStore::default());
        let service = service(store.clone());
        let profile_id = Uuid::new_v4();

        let selection = PromotionSelection {
            urgent: Some(77),
            ..Default::default()
        };
        let err = service
            .publish(&principal(profile_id, 100, false), command(profile_id, selection))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PublishError::InvalidSelection {
                category: PromotionCategory::Urgent,
                option_id: 77
            }
        ));
        assert!(store.published.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn insufficient_tokens_reports_the_shortfall() {
        let store = Arc::new(RecordingStore::default());
        let service = service(store.clone());
        let profile_id = Uuid::new_v4();

        let selection = PromotionSelection {
            autorenew: Some(1),
            ..Default::default()
        };
        let err = service
            .publish(&principal(profile_id, 1, false), command(profile_id, selection))
            .await
            .unwrap_err();

        // default table: publication 2 + autorenew option 1 at 4 tokens
        match err {
            PublishError::InsufficientTokens { required, balance } => {
                assert_eq!(required, 6);
                assert_eq!(balance, 1);
            }
            other => panic!("expected InsufficientTokens, got {other:?}"),
        }
        assert!(store.published.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn store_failure_surfaces_without_partial_effects() {
        let store = Arc::new(RecordingStore {
            fail_publish: true,
            ..Default::default()
        });
        let service = service(store.clone());
        let profile_id = Uuid::new_v4();

        let err = service
            .publish(
                &principal(profile_id, 100, false),
                command(profile_id, PromotionSelection::default()),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::Repo(_)));
        assert!(store.published.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unpublish_checks_ownership() {
        let store = Arc::new(RecordingStore::default());
        let service = service(store.clone());

        let err = service
            .unpublish(&principal(Uuid::new_v4(), 0, false), Uuid::new_v4())
            .await
            .unwrap_err();

        assert!(matches!(err, UnpublishError::Forbidden));
        assert!(store.unpublished.lock().unwrap().is_empty());
    }

    #[test]
    fn resolved_promotion_carries_expiry_and_cadence() {
        let config = PromotionConfig::default();
        let now = OffsetDateTime::from_unix_timestamp(1_000).unwrap();
        let selection = PromotionSelection {
            featured: Some(1),
            autorenew: Some(2),
            ..Default::default()
        };

        let state = resolve_promotion(&config, &selection, now).expect("resolves");

        let featured = state.get(PromotionCategory::Featured).expect("featured");
        assert_eq!(featured.activated_at, now);
        assert_eq!(featured.expires_at, now + Duration::days(3));
        assert_eq!(featured.every_hours, None);

        let autorenew = state.get(PromotionCategory::Autorenew).expect("autorenew");
        assert_eq!(autorenew.expires_at, now + Duration::days(7));
        assert_eq!(autorenew.every_hours, Some(12));

        assert!(state.get(PromotionCategory::Urgent).is_none());
    }
}
