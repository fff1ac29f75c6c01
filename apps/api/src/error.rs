use axum::Json;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use promptloom_core::AppError;
use serde::Serialize;
use ts_rs::TS;

const RATE_LIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";
const RATE_LIMIT_RESET_HEADER: &str = "x-ratelimit-reset";

/// API error payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/error-response.ts"
)]
pub struct ErrorResponse {
    message: String,
}

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::QuotaExceeded(_) => StatusCode::PAYMENT_REQUIRED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = match &self.0 {
            AppError::RateLimited { message, .. } => message.clone(),
            other => other.to_string(),
        };

        let mut response = (status, Json(ErrorResponse { message })).into_response();

        if let AppError::RateLimited { reset_time_ms, .. } = self.0 {
            let headers = response.headers_mut();
            headers.insert(RATE_LIMIT_REMAINING_HEADER, HeaderValue::from_static("0"));
            headers.insert(RATE_LIMIT_RESET_HEADER, HeaderValue::from(reset_time_ms));
        }

        response
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use promptloom_core::AppError;

    use super::ApiError;

    #[test]
    fn rate_limited_maps_to_429_with_headers() {
        let response = ApiError(AppError::RateLimited {
            message: "too many workflowExecution requests".to_owned(),
            reset_time_ms: 1_700_000_000_000,
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response
                .headers()
                .get("x-ratelimit-remaining")
                .and_then(|value| value.to_str().ok()),
            Some("0")
        );
        assert_eq!(
            response
                .headers()
                .get("x-ratelimit-reset")
                .and_then(|value| value.to_str().ok()),
            Some("1700000000000")
        );
    }

    #[test]
    fn quota_and_validation_statuses() {
        let quota = ApiError(AppError::QuotaExceeded("monthly".to_owned())).into_response();
        assert_eq!(quota.status(), StatusCode::PAYMENT_REQUIRED);

        let invalid = ApiError(AppError::Validation("bad".to_owned())).into_response();
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
        assert!(invalid.headers().get("x-ratelimit-reset").is_none());
    }
}
