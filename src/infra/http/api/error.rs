use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;

use crate::application::error::ErrorReport;
use crate::application::publish::{PublishError, UnpublishError};
use crate::application::repos::RepoError;

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const FORBIDDEN: &str = "forbidden";
    pub const NOT_FOUND: &str = "not_found";
    pub const RATE_LIMITED: &str = "rate_limited";
    pub const CONFLICT: &str = "conflict";
    pub const DB_TIMEOUT: &str = "db_timeout";
    pub const REPO: &str = "repo_error";
    pub const EMAIL_UNVERIFIED: &str = "email_unverified";
    pub const PUBLISHING_DISABLED: &str = "publishing_disabled";
    pub const INSUFFICIENT_TOKENS: &str = "insufficient_tokens";
    pub const INVALID_SELECTION: &str = "invalid_selection";
    pub const VALIDATION_ERROR: &str = "validation_error";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    hint: Option<String>,
    details: Option<Value>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: &'static str,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message,
            hint,
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn bad_request(message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, message, hint)
    }

    pub fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            codes::UNAUTHORIZED,
            "Session token required",
            None,
        )
    }

    pub fn forbidden() -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            codes::FORBIDDEN,
            "Caller does not own the target profile",
            None,
        )
    }

    pub fn not_found(message: &'static str) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, None)
    }

    pub fn rate_limited(retry_after: u64) -> Response {
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: codes::RATE_LIMITED.to_string(),
                message: "Rate limit exceeded".to_string(),
                hint: Some(format!("Retry after {retry_after} seconds")),
                details: None,
            },
        };
        let mut response = (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
        if let Ok(value) = axum::http::HeaderValue::from_str(&retry_after.to_string()) {
            response
                .headers_mut()
                .insert(axum::http::header::RETRY_AFTER, value);
        }
        ErrorReport::from_message(
            "infra::http::api::rate_limit",
            StatusCode::TOO_MANY_REQUESTS,
            format!("rate_limited: retry_after={retry_after}"),
        )
        .attach(&mut response);
        response
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let detail = self
            .hint
            .clone()
            .unwrap_or_else(|| self.message.to_string());
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.to_string(),
                hint: self.hint,
                details: self.details,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        ErrorReport::from_message("infra::http::api::error", self.status, detail)
            .attach(&mut response);
        response
    }
}

/// Map a repository error to a consistent HTTP error response.
pub fn repo_to_api(err: RepoError) -> ApiError {
    match err {
        RepoError::Duplicate { constraint } => ApiError::new(
            StatusCode::CONFLICT,
            codes::CONFLICT,
            "Duplicate record",
            Some(constraint),
        ),
        RepoError::NotFound => ApiError::not_found("Resource not found"),
        RepoError::InvalidInput { message } => {
            ApiError::bad_request("Invalid input", Some(message))
        }
        RepoError::Integrity { message } => ApiError::new(
            StatusCode::CONFLICT,
            codes::CONFLICT,
            "Integrity constraint violated",
            Some(message),
        ),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "Database timeout",
            None,
        ),
        RepoError::Persistence(message) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Persistence error",
            Some(message),
        ),
    }
}

/// Publish failures map to the machine-distinguishable reasons of the
/// publishing contract; clients route the user on `error.code`.
pub fn publish_to_api(err: PublishError) -> ApiError {
    match err {
        PublishError::Forbidden => ApiError::forbidden(),
        PublishError::EmailUnverified => ApiError::new(
            StatusCode::FORBIDDEN,
            codes::EMAIL_UNVERIFIED,
            "A verified email is required before publishing",
            None,
        ),
        PublishError::PublishingDisabled => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::PUBLISHING_DISABLED,
            "Publishing is currently unavailable",
            None,
        ),
        PublishError::InsufficientTokens { required, balance } => ApiError::new(
            StatusCode::PAYMENT_REQUIRED,
            codes::INSUFFICIENT_TOKENS,
            "Insufficient tokens",
            Some(format!("{required} required, {balance} available")),
        )
        .with_details(serde_json::json!({
            "required": required,
            "balance": balance,
        })),
        PublishError::InvalidSelection {
            category,
            option_id,
        } => ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            codes::INVALID_SELECTION,
            "Selection references an unknown promotion option",
            Some(format!("category `{category}`, option `{option_id}`")),
        ),
        PublishError::Validation(message) => ApiError::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            codes::VALIDATION_ERROR,
            "Ad fields failed validation",
            Some(message),
        ),
        PublishError::Repo(err) => repo_to_api(err),
    }
}

pub fn unpublish_to_api(err: UnpublishError) -> ApiError {
    match err {
        UnpublishError::Forbidden => ApiError::forbidden(),
        UnpublishError::NotFound => ApiError::not_found("No active ad for this profile"),
        UnpublishError::Repo(err) => repo_to_api(err),
    }
}
