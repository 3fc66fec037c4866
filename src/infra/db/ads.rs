use std::time::Instant;

use async_trait::async_trait;
use metrics::histogram;
use sqlx::types::Json;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{AdsRepo, PublishAdParams, PublishStore, RepoError},
    domain::badges::PromotionState,
    domain::entities::AdRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct AdRow {
    id: Uuid,
    profile_id: Uuid,
    title: String,
    body: String,
    active: bool,
    promotion: Json<PromotionState>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<AdRow> for AdRecord {
    fn from(row: AdRow) -> Self {
        Self {
            id: row.id,
            profile_id: row.profile_id,
            title: row.title,
            body: row.body,
            active: row.active,
            promotion: row.promotion.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const AD_COLUMNS: &str = "id, profile_id, title, body, active, promotion, created_at, updated_at";

#[async_trait]
impl AdsRepo for PostgresRepositories {
    async fn list_active(&self, limit: u32) -> Result<Vec<AdRecord>, RepoError> {
        let rows = sqlx::query_as::<_, AdRow>(&format!(
            "SELECT {AD_COLUMNS} FROM ads WHERE active ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(i64::from(limit))
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(AdRecord::from).collect())
    }

    async fn find_active_by_profile(
        &self,
        profile_id: Uuid,
    ) -> Result<Option<AdRecord>, RepoError> {
        let row = sqlx::query_as::<_, AdRow>(&format!(
            "SELECT {AD_COLUMNS} FROM ads WHERE profile_id = $1 AND active"
        ))
        .bind(profile_id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(AdRecord::from))
    }
}

#[async_trait]
impl PublishStore for PostgresRepositories {
    /// Single transaction covering the whole publish effect. The profile row
    /// lock serializes racing publishes for the same profile; the unique
    /// partial index on active ads is the backstop. Any early return drops
    /// the transaction and rolls everything back.
    async fn publish_ad(&self, params: PublishAdParams) -> Result<AdRecord, RepoError> {
        let started = Instant::now();
        let mut tx = self.begin().await.map_err(map_sqlx_error)?;

        let locked = sqlx::query_as::<_, (Uuid,)>(
            "SELECT account_id FROM profiles WHERE id = $1 FOR UPDATE",
        )
        .bind(params.profile_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let (account_id,) = locked.ok_or(RepoError::NotFound)?;
        if account_id != params.account_id {
            return Err(RepoError::integrity("profile does not belong to account"));
        }

        if params.tokens_to_deduct > 0 {
            let deducted = sqlx::query(
                "UPDATE accounts SET tokens_balance = tokens_balance - $1 \
                 WHERE id = $2 AND tokens_balance >= $1",
            )
            .bind(params.tokens_to_deduct)
            .bind(account_id)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

            if deducted.rows_affected() == 0 {
                return Err(RepoError::integrity(
                    "token balance changed before the transaction committed",
                ));
            }
        }

        let promotion = Json(params.promotion.clone());
        let updated = sqlx::query_as::<_, AdRow>(&format!(
            "UPDATE ads SET title = $2, body = $3, promotion = $4, active = TRUE, \
             updated_at = now() \
             WHERE profile_id = $1 AND active \
             RETURNING {AD_COLUMNS}"
        ))
        .bind(params.profile_id)
        .bind(&params.title)
        .bind(&params.body)
        .bind(&promotion)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        let ad_row = match updated {
            Some(row) => row,
            None => sqlx::query_as::<_, AdRow>(&format!(
                "INSERT INTO ads (profile_id, title, body, promotion) \
                 VALUES ($1, $2, $3, $4) \
                 RETURNING {AD_COLUMNS}"
            ))
            .bind(params.profile_id)
            .bind(&params.title)
            .bind(&params.body)
            .bind(&promotion)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_sqlx_error)?,
        };

        sqlx::query(
            "UPDATE profiles SET is_pro = TRUE, tarif = $2, lieu = $3, services = $4, \
             description = $5, disponibilite = $6, updated_at = now() \
             WHERE id = $1",
        )
        .bind(params.profile_id)
        .bind(&params.tarif)
        .bind(&params.lieu)
        .bind(&params.services)
        .bind(&params.description)
        .bind(&params.disponibilite)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        if let Some(media) = &params.media {
            sqlx::query("DELETE FROM media WHERE profile_id = $1")
                .bind(params.profile_id)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;

            for item in media {
                sqlx::query("INSERT INTO media (profile_id, url, position) VALUES ($1, $2, $3)")
                    .bind(params.profile_id)
                    .bind(&item.url)
                    .bind(item.position)
                    .execute(&mut *tx)
                    .await
                    .map_err(map_sqlx_error)?;
            }
        }

        tx.commit().await.map_err(map_sqlx_error)?;
        histogram!("vitrine_publish_tx_ms").record(started.elapsed().as_millis() as f64);

        Ok(AdRecord::from(ad_row))
    }

    async fn unpublish_ad(&self, profile_id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query(
            "UPDATE ads SET active = FALSE, updated_at = now() \
             WHERE profile_id = $1 AND active",
        )
        .bind(profile_id)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
