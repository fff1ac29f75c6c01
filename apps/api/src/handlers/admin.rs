use axum::Json;
use axum::extract::{Extension, State};
use promptloom_core::{AppError, UserIdentity};

use crate::dto::RateLimitSettingsDto;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn get_rate_limits_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<RateLimitSettingsDto>> {
    if !user.is_admin() {
        return Err(AppError::Forbidden("only administrators may view rate limits".to_owned()).into());
    }

    Ok(Json(state.rate_limit_service.settings().into()))
}

pub async fn update_rate_limits_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<RateLimitSettingsDto>,
) -> ApiResult<Json<RateLimitSettingsDto>> {
    let settings = state
        .rate_limit_service
        .replace_settings(&user, payload.try_into()?)
        .await?;

    Ok(Json(settings.into()))
}
