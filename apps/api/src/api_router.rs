mod cors;

use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use promptloom_core::AppError;
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, middleware};

pub fn build_router(app_state: AppState, frontend_url: &str) -> Result<Router, AppError> {
    let protected_routes = Router::new()
        .route(
            "/api/workflows",
            get(handlers::workflows::list_workflows_handler)
                .post(handlers::workflows::save_workflow_handler),
        )
        .route(
            "/api/workflows/run",
            post(handlers::workflows::run_workflow_handler),
        )
        .route(
            "/api/workflows/{workflow_id}",
            get(handlers::workflows::get_workflow_handler),
        )
        .route(
            "/api/workflows/{workflow_id}/execute",
            post(handlers::workflows::execute_workflow_handler),
        )
        .route(
            "/api/workflows/{workflow_id}/executions",
            get(handlers::workflows::list_executions_handler),
        )
        .route("/api/usage", get(handlers::usage::usage_handler))
        .route(
            "/api/admin/rate-limits",
            get(handlers::admin::get_rate_limits_handler)
                .put(handlers::admin::update_rate_limits_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_gateway_identity,
        ));

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors::build_cors_layer(frontend_url)?)
        .with_state(app_state))
}
