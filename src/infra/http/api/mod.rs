pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod rate_limit;
pub mod state;

pub use state::ApiState;

use axum::{Router, middleware as axum_middleware, routing::get};

use crate::infra::http::middleware::{log_responses, set_request_context};

pub fn build_api_router(state: ApiState) -> Router {
    let rate_state = state.clone();

    Router::new()
        .route(
            "/annonces",
            get(handlers::list_annonces)
                .post(handlers::publish_annonce)
                .delete(handlers::unpublish_annonce),
        )
        .route("/profiles/{id}", get(handlers::get_profile))
        .route("/publishing/config", get(handlers::get_publishing_config))
        .route("/healthz", get(handlers::healthz))
        .with_state(state)
        .layer(axum_middleware::from_fn_with_state(
            rate_state,
            middleware::api_rate_limit,
        ))
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
