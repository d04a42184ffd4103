use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/message", post(handlers::message))
        .route("/api/data", get(handlers::get_data))
        .route("/api/tab-data", get(handlers::get_tab_data))
        .route("/api/daily", get(handlers::get_daily))
        .route("/api/events", post(handlers::post_event))
        .route("/api/startup", post(handlers::startup))
        .route("/api/windows", put(handlers::put_windows))
        .route("/api/reset", post(handlers::reset))
        .route(
            "/api/settings",
            get(handlers::get_settings).post(handlers::post_settings),
        )
        .route("/api/badge", get(handlers::get_badge))
        .route("/api/export", get(handlers::export))
        .route("/api/import", post(handlers::import))
        .with_state(state)
}
