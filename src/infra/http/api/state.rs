use std::sync::Arc;

use crate::application::listing::ListingService;
use crate::application::publish::PublishService;
use crate::application::sessions::SessionService;
use crate::infra::db::PostgresRepositories;

use super::rate_limit::ApiRateLimiter;

#[derive(Clone)]
pub struct ApiState {
    pub sessions: SessionService,
    pub publish: Arc<PublishService>,
    pub listing: Arc<ListingService>,
    pub rate_limiter: Arc<ApiRateLimiter>,
    pub db: Arc<PostgresRepositories>,
}
