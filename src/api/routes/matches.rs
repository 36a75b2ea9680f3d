use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use crate::api::state::AppState;
use crate::api::{ok, parse_id, ApiError, ApiResult, Deleted};
use crate::calculate::{PageRequest, Paged};
use crate::models::{Match, MatchInput, PlayerId, RoundInput};
use crate::service::{MatchDetail, MatchRounds, MatchView, PlayedMatch, DEFAULT_PLAYED_LIMIT};

pub async fn list_matches(State(state): State<AppState>) -> ApiResult<Vec<MatchView>> {
    ok(state.service.list_matches().await?)
}

pub async fn get_match(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<MatchDetail> {
    ok(state.service.get_match(parse_id(&id)?).await?)
}

pub async fn create_match(
    State(state): State<AppState>,
    payload: Result<Json<MatchInput>, JsonRejection>,
) -> ApiResult<Match> {
    let Json(input) = payload?;
    ok(state.service.create_match(&input).await?)
}

pub async fn update_match(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<MatchInput>, JsonRejection>,
) -> ApiResult<Match> {
    let id = parse_id(&id)?;
    let Json(input) = payload?;
    ok(state.service.update_match(id, &input).await?)
}

pub async fn delete_match(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Deleted> {
    let id = parse_id(&id)?;
    state.service.delete_match(id).await?;
    ok(Deleted { id })
}

#[derive(Debug, Deserialize)]
pub struct PlayedParams {
    pub limit: Option<String>,
    pub offset: Option<String>,
    pub player_id: Option<String>,
}

/// Leading integer of a query value: optional sign then digits, anything
/// after them ignored (`"12abc"` is 12, `"1.5"` is 1).
fn parse_int(raw: Option<&str>) -> Option<i64> {
    let s = raw?.trim_start();
    let sign_len = usize::from(s.starts_with(['-', '+']));
    let digits = s[sign_len..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(s.len(), |end| sign_len + end);
    if digits == sign_len {
        return None;
    }
    s[..digits].parse::<i64>().ok()
}

impl PlayedParams {
    /// Missing, unparsable or zero limit means the default page size; a
    /// negative limit or offset is an error.
    pub fn page(&self) -> Result<PageRequest, ApiError> {
        let limit = match parse_int(self.limit.as_deref()) {
            None | Some(0) => DEFAULT_PLAYED_LIMIT,
            Some(l) if l < 0 => {
                return Err(ApiError::BadRequest(
                    "limit must be a positive integer".to_string(),
                ))
            }
            Some(l) => l as usize,
        };
        let offset = match parse_int(self.offset.as_deref()) {
            None => 0,
            Some(o) if o < 0 => {
                return Err(ApiError::BadRequest(
                    "offset must be a non-negative integer".to_string(),
                ))
            }
            Some(o) => o as usize,
        };
        Ok(PageRequest::new(Some(limit), offset))
    }

    pub fn player(&self) -> Result<Option<PlayerId>, ApiError> {
        match self.player_id.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse::<i64>()
                .map(Some)
                .map_err(|_| ApiError::BadRequest("player_id must be an integer".to_string())),
        }
    }
}

pub async fn played_matches(
    State(state): State<AppState>,
    params: Result<Query<PlayedParams>, QueryRejection>,
) -> ApiResult<Paged<PlayedMatch>> {
    let Query(params) = params?;
    let page = params.page()?;
    let player = params.player()?;
    ok(state.service.played_matches(player, page).await?)
}

/// Pull the round list out of a `{"rounds": [...]}` body.
///
/// A missing or non-array `rounds` reads as an empty batch; an entry that
/// is not an object reads as a round with no fields.
pub fn rounds_from_body(body: &Value) -> Vec<RoundInput> {
    body.get("rounds")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| serde_json::from_value(item.clone()).unwrap_or_default())
                .collect()
        })
        .unwrap_or_default()
}

pub async fn replace_rounds(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<MatchRounds> {
    let id = parse_id(&id)?;
    let Json(body) = payload?;
    ok(state.service.replace_rounds(id, &rounds_from_body(&body)).await?)
}

pub async fn clear_rounds(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<MatchRounds> {
    ok(state.service.clear_rounds(parse_id(&id)?).await?)
}
