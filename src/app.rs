use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/entries", post(handlers::form_create_entry))
        .route("/entries/:id/delete", post(handlers::form_delete_entry))
        .route(
            "/api/entries",
            get(handlers::list_entries).post(handlers::create_entry),
        )
        .route("/api/entries/bulk", post(handlers::bulk_import))
        .route(
            "/api/entries/:id",
            put(handlers::update_entry).delete(handlers::delete_entry),
        )
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/series/profit", get(handlers::profit_series))
        .route("/api/series/cumulative", get(handlers::cumulative_series))
        .route("/api/series/recovery", get(handlers::recovery_series))
        .route("/api/recovery-rate", get(handlers::recovery_rate))
        .route("/api/predict", post(handlers::predict))
        .with_state(state)
}
