//! Annonce handlers: publish, unpublish, public listing.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::listing::ListingError;
use crate::application::publish::PublishCommand;
use crate::infra::http::api::error::{ApiError, publish_to_api, repo_to_api, unpublish_to_api};
use crate::infra::http::api::middleware::AuthenticatedPrincipal;
use crate::infra::http::api::models::{AdCreatedResponse, AdListQuery, AdResponse, PublishRequest};
use crate::infra::http::api::state::ApiState;

pub async fn publish_annonce(
    State(state): State<ApiState>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
    Json(payload): Json<PublishRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (profile_id, draft, selection) = payload.into_draft_and_selection();

    let published = state
        .publish
        .publish(
            &principal,
            PublishCommand {
                profile_id,
                draft,
                selection,
            },
        )
        .await
        .map_err(publish_to_api)?;

    Ok((
        StatusCode::CREATED,
        Json(AdCreatedResponse::from(published)),
    ))
}

pub async fn unpublish_annonce(
    State(state): State<ApiState>,
    AuthenticatedPrincipal(principal): AuthenticatedPrincipal,
) -> Result<impl IntoResponse, ApiError> {
    state
        .publish
        .unpublish(&principal, principal.profile_id)
        .await
        .map_err(unpublish_to_api)?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_annonces(
    State(state): State<ApiState>,
    Query(query): Query<AdListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let ads = state
        .listing
        .list_ads(query.limit)
        .await
        .map_err(|err| match err {
            ListingError::Repo(inner) => repo_to_api(inner),
        })?;

    let body: Vec<AdResponse> = ads.into_iter().map(AdResponse::from).collect();
    Ok(Json(body))
}
