use axum::body::Body;
use axum::extract::{FromRequestParts, State};
use axum::http::{Request, header, request::Parts};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::application::sessions::{Principal, SessionAuthError};

use super::error::{ApiError, repo_to_api};
use super::state::ApiState;

/// Authenticated caller extractor for mutating routes: resolves the bearer
/// session token against the store. Public routes simply do not ask for it.
pub struct AuthenticatedPrincipal(pub Principal);

impl FromRequestParts<ApiState> for AuthenticatedPrincipal {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ApiState,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_token(parts.headers.get(header::AUTHORIZATION))
            .ok_or_else(|| ApiError::unauthorized().into_response())?;

        match state.sessions.authenticate(&token).await {
            Ok(principal) => Ok(Self(principal)),
            Err(SessionAuthError::Missing) | Err(SessionAuthError::Invalid) => {
                Err(ApiError::unauthorized().into_response())
            }
            Err(SessionAuthError::Repo(err)) => Err(repo_to_api(err).into_response()),
        }
    }
}

/// Fixed-window rate limit across the whole API surface. Authenticated
/// callers are keyed by their bearer token, anonymous reads share a bucket.
pub async fn api_rate_limit(
    State(state): State<ApiState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let key = extract_token(request.headers().get(header::AUTHORIZATION))
        .unwrap_or_else(|| "public".to_string());

    if !state.rate_limiter.allow(&key, &path) {
        return ApiError::rate_limited(state.rate_limiter.retry_after_secs());
    }

    next.run(request).await
}

fn extract_token(header: Option<&axum::http::HeaderValue>) -> Option<String> {
    let value = header?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
