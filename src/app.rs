use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/api/calendar", get(handlers::get_calendar))
        .route("/api/calendar/generate", post(handlers::generate))
        .route("/api/calendar/save", post(handlers::save))
        .route("/api/days/:day/tap", post(handlers::tap))
        .route("/api/editor/open", post(handlers::open_editor))
        .route("/api/editor/toggle", post(handlers::toggle_editor))
        .route("/api/editor/save", post(handlers::save_editor))
        .route("/api/editor/cancel", post(handlers::cancel_editor))
        .route("/api/press/start", post(handlers::press_start))
        .route("/api/press/move", post(handlers::press_move))
        .route("/api/press/end", post(handlers::press_end))
        .with_state(state)
}
