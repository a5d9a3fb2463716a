use crate::errors::AppError;
use crate::models::{
    CalendarView, DayRequest, GenerateResponse, MonthId, MonthRequest, PageParams,
    PressEndResponse, PressMoveRequest, PressRequest, PressStartResponse, SaveResponse,
    ToggleRequest,
};
use crate::state::AppState;
use crate::tracker;
use crate::ui::{Prefill, render_index};
use axum::{
    Json,
    extract::{Path, Query, State},
    response::Html,
};
use tracing::info;

pub async fn index(Query(params): Query<PageParams>) -> Html<String> {
    let name = params.name.unwrap_or_default();
    let month = params.month.unwrap_or_default();
    let auto_generate = !name.trim().is_empty() && month.trim().parse::<MonthId>().is_ok();
    let month = if month.trim().is_empty() {
        MonthId::current().to_string()
    } else {
        month
    };

    if auto_generate {
        info!(name = %name.trim(), month = %month.trim(), "page opened with member and month");
    }

    Html(render_index(&Prefill {
        name,
        month,
        auto_generate,
    }))
}

pub async fn get_calendar(State(state): State<AppState>) -> Json<CalendarView> {
    Json(state.tracker.lock().await.view())
}

pub async fn generate(
    State(state): State<AppState>,
    Json(payload): Json<MonthRequest>,
) -> Result<Json<GenerateResponse>, AppError> {
    let notice =
        tracker::generate(&state.tracker, state.remote.as_ref(), &payload.name, &payload.month)
            .await?;
    let calendar = state.tracker.lock().await.view();
    Ok(Json(GenerateResponse { calendar, notice }))
}

pub async fn save(
    State(state): State<AppState>,
    Json(payload): Json<MonthRequest>,
) -> Result<Json<SaveResponse>, AppError> {
    let notice =
        tracker::submit(&state.tracker, state.remote.as_ref(), &payload.name, &payload.month)
            .await?;
    Ok(Json(SaveResponse { notice }))
}

pub async fn tap(
    State(state): State<AppState>,
    Path(day): Path<u32>,
) -> Result<Json<CalendarView>, AppError> {
    let mut tracker = state.tracker.lock().await;
    tracker.tap(day)?;
    Ok(Json(tracker.view()))
}

pub async fn open_editor(
    State(state): State<AppState>,
    Json(payload): Json<DayRequest>,
) -> Result<Json<CalendarView>, AppError> {
    let mut tracker = state.tracker.lock().await;
    tracker.open_editor(payload.day)?;
    Ok(Json(tracker.view()))
}

pub async fn toggle_editor(
    State(state): State<AppState>,
    Json(payload): Json<ToggleRequest>,
) -> Result<Json<CalendarView>, AppError> {
    let mut tracker = state.tracker.lock().await;
    tracker.toggle_editor(payload.status.trim())?;
    Ok(Json(tracker.view()))
}

pub async fn save_editor(State(state): State<AppState>) -> Result<Json<CalendarView>, AppError> {
    let mut tracker = state.tracker.lock().await;
    tracker.save_editor()?;
    Ok(Json(tracker.view()))
}

pub async fn cancel_editor(State(state): State<AppState>) -> Json<CalendarView> {
    let mut tracker = state.tracker.lock().await;
    tracker.cancel_editor();
    Json(tracker.view())
}

/// Answers once the long-press delay has passed, reporting whether the editor opened.
pub async fn press_start(
    State(state): State<AppState>,
    Json(payload): Json<PressRequest>,
) -> Result<Json<PressStartResponse>, AppError> {
    let long_press = tracker::hold(&state.tracker, payload.press, payload.day).await?;
    let calendar = state.tracker.lock().await.view();
    Ok(Json(PressStartResponse {
        long_press,
        calendar,
    }))
}

pub async fn press_move(
    State(state): State<AppState>,
    Json(payload): Json<PressMoveRequest>,
) -> Json<CalendarView> {
    let mut tracker = state.tracker.lock().await;
    tracker.press_move(payload.press);
    Json(tracker.view())
}

pub async fn press_end(
    State(state): State<AppState>,
    Json(payload): Json<PressRequest>,
) -> Result<Json<PressEndResponse>, AppError> {
    let mut tracker = state.tracker.lock().await;
    let end = tracker.press_end(payload.press, payload.day)?;
    Ok(Json(PressEndResponse {
        gesture: end.as_str().to_string(),
        calendar: tracker.view(),
    }))
}
