use axum::extract::{Request, State};
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::Response;
use promptloom_core::{AppError, AppResult, SubscriptionTier, UserId, UserIdentity};

use crate::error::ApiResult;
use crate::state::AppState;

pub const USER_ID_HEADER: &str = "x-promptloom-user-id";
pub const TIER_HEADER: &str = "x-promptloom-tier";

/// Trusts identity headers only from the upstream gateway holding the shared secret.
pub async fn require_gateway_identity(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let identity = identity_from_headers(request.headers(), &state.gateway_shared_secret)?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

pub fn identity_from_headers(headers: &HeaderMap, shared_secret: &str) -> AppResult<UserIdentity> {
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("gateway credentials required".to_owned()))?;

    if !secrets_match(presented.trim(), shared_secret) {
        return Err(AppError::Unauthorized(
            "invalid gateway credentials".to_owned(),
        ));
    }

    let user_id = header_text(headers, USER_ID_HEADER)
        .ok_or_else(|| AppError::Unauthorized(format!("{USER_ID_HEADER} header is required")))
        .and_then(UserId::parse)?;

    let tier = match header_text(headers, TIER_HEADER) {
        Some(tier) => tier.parse::<SubscriptionTier>()?,
        None => SubscriptionTier::Free,
    };

    Ok(UserIdentity::new(user_id, tier))
}

fn header_text<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn secrets_match(presented: &str, expected: &str) -> bool {
    presented.len() == expected.len()
        && presented
            .bytes()
            .zip(expected.bytes())
            .fold(0_u8, |diff, (left, right)| diff | (left ^ right))
            == 0
}
