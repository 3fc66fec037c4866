use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{ProfilesRepo, RepoError},
    domain::entities::{MediaRecord, ProfileRecord},
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: Uuid,
    account_id: Uuid,
    display_name: String,
    is_pro: bool,
    tarif: String,
    lieu: String,
    services: Vec<String>,
    description: String,
    disponibilite: String,
    updated_at: OffsetDateTime,
}

impl From<ProfileRow> for ProfileRecord {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: row.id,
            account_id: row.account_id,
            display_name: row.display_name,
            is_pro: row.is_pro,
            tarif: row.tarif,
            lieu: row.lieu,
            services: row.services,
            description: row.description,
            disponibilite: row.disponibilite,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct MediaRow {
    id: Uuid,
    profile_id: Uuid,
    url: String,
    position: i32,
}

#[async_trait]
impl ProfilesRepo for PostgresRepositories {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ProfileRecord>, RepoError> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT id,
                   account_id,
                   display_name,
                   is_pro,
                   tarif,
                   lieu,
                   services,
                   description,
                   disponibilite,
                   updated_at
            FROM profiles
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(ProfileRecord::from))
    }

    async fn list_media(&self, profile_id: Uuid) -> Result<Vec<MediaRecord>, RepoError> {
        let rows = sqlx::query_as::<_, MediaRow>(
            r#"
            SELECT id, profile_id, url, position
            FROM media
            WHERE profile_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(profile_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| MediaRecord {
                id: row.id,
                profile_id: row.profile_id,
                url: row.url,
                position: row.position,
            })
            .collect())
    }
}
