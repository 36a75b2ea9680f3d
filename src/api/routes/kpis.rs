use axum::extract::State;

use crate::api::state::AppState;
use crate::api::{ok, ApiResult};
use crate::models::Leaderboard;

pub async fn get_kpis(State(state): State<AppState>) -> ApiResult<Leaderboard> {
    ok(state.service.leaderboard().await?)
}
