use axum::Json;
use axum::extract::{Extension, State};
use promptloom_core::UserIdentity;

use crate::dto::QuotaStatusResponse;
use crate::error::ApiResult;
use crate::state::AppState;

pub async fn usage_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<QuotaStatusResponse>>> {
    let statuses = state
        .quota_service
        .list_quota_status(&user)
        .await?
        .into_iter()
        .map(QuotaStatusResponse::from)
        .collect();

    Ok(Json(statuses))
}
