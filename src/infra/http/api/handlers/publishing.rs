use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;

use crate::infra::http::api::models::PublishingConfigResponse;
use crate::infra::http::api::state::ApiState;

/// Read-only promotion price table for client-side advisory quotes. The
/// server re-runs the pricing engine on submit; these values only let the
/// UI display an accurate preview.
pub async fn get_publishing_config(State(state): State<ApiState>) -> impl IntoResponse {
    Json(PublishingConfigResponse::from(state.publish.promotions()))
}
