//! Session-token authentication for mutating routes.
//!
//! Session issuance (login, cookies, password hashing) lives outside this
//! service; the store already holds an opaque token per account and this
//! layer only resolves it to a principal.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::application::repos::{AccountsRepo, RepoError};
use crate::domain::entities::AccountRecord;

#[derive(Debug, Error)]
pub enum SessionAuthError {
    #[error("missing session token")]
    Missing,
    #[error("invalid session token")]
    Invalid,
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Authenticated caller: the account and the profile it owns.
#[derive(Debug, Clone)]
pub struct Principal {
    pub account: AccountRecord,
    pub profile_id: Uuid,
}

#[derive(Clone)]
pub struct SessionService {
    accounts: Arc<dyn AccountsRepo>,
}

impl SessionService {
    pub fn new(accounts: Arc<dyn AccountsRepo>) -> Self {
        Self { accounts }
    }

    pub async fn authenticate(&self, token: &str) -> Result<Principal, SessionAuthError> {
        if token.trim().is_empty() {
            return Err(SessionAuthError::Missing);
        }

        match self.accounts.find_by_session_token(token).await? {
            Some((account, profile_id)) => Ok(Principal {
                account,
                profile_id,
            }),
            None => Err(SessionAuthError::Invalid),
        }
    }
}
