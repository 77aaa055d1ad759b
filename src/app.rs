use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/dashboard", get(handlers::get_dashboard))
        .route("/api/panels/:kind", get(handlers::get_panel))
        .route("/api/select/city", post(handlers::select_city))
        .route("/api/select/year", post(handlers::select_year))
        .with_state(state)
}
