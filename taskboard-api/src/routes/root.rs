/// `GET /`: sends signed-in users to their task list, everyone else to
/// the login page

use crate::app::AppState;
use axum::{extract::State, http::HeaderMap, response::Redirect};
use taskboard_shared::auth::middleware::authenticate;

pub const MY_TASKS_PATH: &str = "/v1/tasks";

pub async fn index(State(state): State<AppState>, headers: HeaderMap) -> Redirect {
    match authenticate(&state.db, &headers, state.session_secret()).await {
        Ok(_) => Redirect::to(MY_TASKS_PATH),
        Err(_) => Redirect::to(state.login_path()),
    }
}
