use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use promptloom_application::WorkflowExecutionListQuery;
use promptloom_core::UserIdentity;
use promptloom_domain::WorkflowStep;

use crate::dto::{
    ExecuteWorkflowRequest, RunWorkflowRequest, SaveWorkflowRequest, WorkflowExecutionResponse,
    WorkflowResponse, WorkflowRunResultResponse, parse_workflow_id,
};
use crate::error::ApiResult;
use crate::state::AppState;

const DEFAULT_EXECUTION_PAGE: usize = 50;
const MAX_EXECUTION_PAGE: usize = 200;

#[derive(Debug, Default, serde::Deserialize)]
pub struct ExecutionListQueryRequest {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

pub async fn list_workflows_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<WorkflowResponse>>> {
    let workflows = state
        .workflow_service
        .list_workflows(&user)
        .await?
        .into_iter()
        .map(WorkflowResponse::from)
        .collect();

    Ok(Json(workflows))
}

pub async fn save_workflow_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<SaveWorkflowRequest>,
) -> ApiResult<(StatusCode, Json<WorkflowResponse>)> {
    let workflow = state
        .workflow_service
        .save_workflow(&user, payload.try_into()?)
        .await?;

    Ok((StatusCode::CREATED, Json(WorkflowResponse::from(workflow))))
}

pub async fn get_workflow_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(workflow_id): Path<String>,
) -> ApiResult<Json<WorkflowResponse>> {
    let workflow = state
        .workflow_service
        .get_workflow(&user, parse_workflow_id(workflow_id.as_str())?)
        .await?;

    Ok(Json(WorkflowResponse::from(workflow)))
}

pub async fn execute_workflow_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(workflow_id): Path<String>,
    Json(payload): Json<ExecuteWorkflowRequest>,
) -> ApiResult<Json<WorkflowExecutionResponse>> {
    let execution = state
        .workflow_service
        .execute_saved_workflow(
            &user,
            parse_workflow_id(workflow_id.as_str())?,
            payload.input,
            payload.variables,
        )
        .await?;

    Ok(Json(WorkflowExecutionResponse::from(execution)))
}

pub async fn run_workflow_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<RunWorkflowRequest>,
) -> ApiResult<Json<WorkflowRunResultResponse>> {
    let result = state
        .workflow_service
        .execute_steps(
            &user,
            payload.steps.into_iter().map(WorkflowStep::from).collect(),
            payload.input,
            payload.variables,
        )
        .await?;

    Ok(Json(WorkflowRunResultResponse::from(result)))
}

pub async fn list_executions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(workflow_id): Path<String>,
    Query(query): Query<ExecutionListQueryRequest>,
) -> ApiResult<Json<Vec<WorkflowExecutionResponse>>> {
    let executions = state
        .workflow_service
        .list_executions(
            &user,
            WorkflowExecutionListQuery {
                workflow_id: parse_workflow_id(workflow_id.as_str())?,
                limit: query
                    .limit
                    .unwrap_or(DEFAULT_EXECUTION_PAGE)
                    .clamp(1, MAX_EXECUTION_PAGE),
                offset: query.offset.unwrap_or(0),
            },
        )
        .await?
        .into_iter()
        .map(WorkflowExecutionResponse::from)
        .collect();

    Ok(Json(executions))
}
