use axum::Json;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use uuid::Uuid;

use crate::application::listing::ListingError;
use crate::infra::http::api::error::{ApiError, repo_to_api};
use crate::infra::http::api::models::ProfileResponse;
use crate::infra::http::api::state::ApiState;

pub async fn get_profile(
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let view = state
        .listing
        .profile_view(id)
        .await
        .map_err(|err| match err {
            ListingError::Repo(inner) => repo_to_api(inner),
        })?;

    match view {
        Some(view) => Ok(Json(ProfileResponse::from(view))),
        None => Err(ApiError::not_found("Profile not found")),
    }
}
