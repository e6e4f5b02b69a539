//! HTTP route definitions.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers::{
    analyze_provider, clear_tasks, list_providers, list_tasks, root, send_email, task_status,
};
use crate::state::AppState;
use crate::websocket::task_updates;

/// Create the router.
///
/// ```text
/// GET    /                      - Health banner
/// GET    /providers             - Supported providers
/// POST   /email/send            - Submit a send task (202)
/// GET    /email/status/{id}     - Task record
/// GET    /email/tasks           - All task records
/// DELETE /email/tasks           - Evict finished tasks
/// POST   /email/analyze         - Sample a provider's DOM (?provider=)
/// GET    /ws/task/{id}          - WebSocket task updates
/// ```
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let email_routes = Router::new()
        .route("/send", post(send_email))
        .route("/status/{task_id}", get(task_status))
        .route("/tasks", get(list_tasks).delete(clear_tasks))
        .route("/analyze", post(analyze_provider));

    Router::new()
        .route("/", get(root))
        .route("/providers", get(list_providers))
        .route("/ws/task/{task_id}", get(task_updates))
        .nest("/email", email_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;
