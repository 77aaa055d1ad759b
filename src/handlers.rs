use crate::errors::{AppError, DashboardError};
use crate::models::{CityCode, Year};
use crate::orchestrator::{DashboardSnapshot, Event, Outcome};
use crate::render::{PanelKind, PanelView};
use crate::state::AppState;
use crate::ui::render_index;
use axum::{
    extract::{Path, State},
    response::Html,
    Json,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CitySelection {
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct YearSelection {
    pub year: Year,
}

pub async fn index() -> Html<String> {
    Html(render_index())
}

pub async fn get_dashboard(State(state): State<AppState>) -> Json<DashboardSnapshot> {
    Json(state.dashboard.snapshot().await)
}

pub async fn get_panel(
    State(state): State<AppState>,
    Path(kind): Path<PanelKind>,
) -> Result<Json<PanelView>, AppError> {
    state
        .dashboard
        .panel(kind)
        .await
        .map(Json)
        .ok_or_else(|| AppError::not_found("panel has not been rendered yet"))
}

pub async fn select_city(
    State(state): State<AppState>,
    Json(payload): Json<CitySelection>,
) -> Result<Json<DashboardSnapshot>, AppError> {
    let code = CityCode::new(payload.code.trim());
    let outcome = state.dashboard.handle(Event::CityChanged(code.clone())).await;
    reject_ignored(outcome, || format!("unknown city code {code}"))?;
    Ok(Json(state.dashboard.snapshot().await))
}

pub async fn select_year(
    State(state): State<AppState>,
    Json(payload): Json<YearSelection>,
) -> Result<Json<DashboardSnapshot>, AppError> {
    let outcome = state.dashboard.handle(Event::YearChanged(payload.year)).await;
    reject_ignored(outcome, || format!("year {} is not selectable", payload.year))?;
    Ok(Json(state.dashboard.snapshot().await))
}

fn reject_ignored(outcome: Outcome, describe: impl FnOnce() -> String) -> Result<(), DashboardError> {
    match outcome {
        Outcome::Ignored => Err(DashboardError::InvalidSelection(describe())),
        _ => Ok(()),
    }
}
