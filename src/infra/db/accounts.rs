use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{AccountsRepo, RepoError},
    domain::entities::AccountRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    email: Option<String>,
    email_verified: bool,
    tokens_balance: i64,
    is_vip: bool,
    created_at: OffsetDateTime,
}

impl From<AccountRow> for AccountRecord {
    fn from(row: AccountRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            email_verified: row.email_verified,
            tokens_balance: row.tokens_balance,
            is_vip: row.is_vip,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: Uuid,
    email: Option<String>,
    email_verified: bool,
    tokens_balance: i64,
    is_vip: bool,
    created_at: OffsetDateTime,
    profile_id: Uuid,
}

#[async_trait]
impl AccountsRepo for PostgresRepositories {
    async fn find_by_session_token(
        &self,
        token: &str,
    ) -> Result<Option<(AccountRecord, Uuid)>, RepoError> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT a.id,
                   a.email,
                   a.email_verified,
                   a.tokens_balance,
                   a.is_vip,
                   a.created_at,
                   p.id AS profile_id
            FROM accounts a
            INNER JOIN profiles p ON p.account_id = a.id
            WHERE a.session_token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(|row| {
            let profile_id = row.profile_id;
            let account = AccountRecord {
                id: row.id,
                email: row.email,
                email_verified: row.email_verified,
                tokens_balance: row.tokens_balance,
                is_vip: row.is_vip,
                created_at: row.created_at,
            };
            (account, profile_id)
        }))
    }

    async fn find_by_profile(&self, profile_id: Uuid) -> Result<Option<AccountRecord>, RepoError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT a.id,
                   a.email,
                   a.email_verified,
                   a.tokens_balance,
                   a.is_vip,
                   a.created_at
            FROM accounts a
            INNER JOIN profiles p ON p.account_id = a.id
            WHERE p.id = $1
            "#,
        )
        .bind(profile_id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(AccountRecord::from))
    }
}
