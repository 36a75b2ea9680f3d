use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use serde::Deserialize;

use crate::api::state::AppState;
use crate::api::{ok, parse_id, ApiResult};
use crate::calculate::{PageRequest, Paged};
use crate::models::PlayerStatsEntry;
use crate::service::StatsQuery;

#[derive(Debug, Default, Deserialize)]
pub struct StatsParams {
    pub search: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl StatsParams {
    /// Unknown sort keys, directions and bad paging values fall back to
    /// their defaults instead of failing.
    pub fn to_query(&self) -> StatsQuery {
        StatsQuery {
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            sort: self
                .sort
                .as_deref()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            order: self
                .order
                .as_deref()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            page: PageRequest::from_raw(self.limit.as_deref(), self.offset.as_deref()),
        }
    }
}

pub async fn stats_table(
    State(state): State<AppState>,
    params: Result<Query<StatsParams>, QueryRejection>,
) -> ApiResult<Paged<PlayerStatsEntry>> {
    let Query(params) = params?;
    ok(state.service.stats_table(&params.to_query()).await?)
}

pub async fn player_stats(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<PlayerStatsEntry> {
    ok(state.service.player_stats(parse_id(&id)?).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::routes::test_support::*;
    use crate::calculate::{SortKey, SortOrder};
    use axum::http::StatusCode;
    use serde_json::json;

    #[test]
    fn test_params_fall_back_to_defaults() {
        let query = StatsParams {
            sort: Some("shoeSize".to_string()),
            order: Some("sideways".to_string()),
            limit: Some("-4".to_string()),
            offset: Some("abc".to_string()),
            search: Some("   ".to_string()),
        }
        .to_query();

        assert_eq!(query.sort, SortKey::LastName);
        assert_eq!(query.order, SortOrder::Desc);
        assert_eq!(query.page, PageRequest::new(None, 0));
        assert_eq!(query.search, None);
    }

    #[test]
    fn test_params_parse() {
        let query = StatsParams {
            sort: Some("winRate".to_string()),
            order: Some("ASC".to_string()),
            limit: Some("2".to_string()),
            offset: Some("1".to_string()),
            search: Some("mor".to_string()),
        }
        .to_query();

        assert_eq!(query.sort, SortKey::WinRate);
        assert_eq!(query.order, SortOrder::Asc);
        assert_eq!(query.page, PageRequest::new(Some(2), 1));
        assert_eq!(query.search.as_deref(), Some("mor"));
    }

    #[tokio::test]
    async fn test_player_stats_endpoint() {
        let app = seeded_app().await;
        let first = seed_match(&app, "2024-03-01T20:00", [1, 2, 3, 4]).await;
        let second = seed_match(&app, "2024-03-08T20:00", [3, 4, 1, 2]).await;
        record_rounds(&app, first, &[(100, 62), (90, 72)]).await;
        record_rounds(&app, second, &[(81, 81)]).await;

        let (status, json) = get_json(app.clone(), "/api/players/1/stats").await;
        assert_eq!(status, StatusCode::OK);
        let stats = &json["data"]["stats"];
        assert_eq!(stats["playedMatches"], 2);
        assert_eq!(stats["wins"], 1);
        assert_eq!(stats["ties"], 1);
        assert_eq!(stats["winRate"], 50);
        assert_eq!(stats["totalPoints"], 271);
        assert_eq!(stats["avgRoundPoints"], 90.3);
        assert_eq!(stats["recentForm"], json!(["W"]));
        assert_eq!(json["data"]["player"]["last_name"], "Moreau");

        let (status, _) = get_json(app.clone(), "/api/players/42/stats").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = get_json(app, "/api/players/x/stats").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_stats_table_endpoint() {
        let app = seeded_app().await;
        seed_player(&app, "Emma", "Garnier").await;
        let id = seed_match(&app, "2024-03-01T20:00", [1, 2, 3, 4]).await;
        record_rounds(&app, id, &[(100, 62)]).await;

        let (status, json) =
            get_json(app.clone(), "/api/players/stats?sort=wins&order=desc&limit=2").await;
        assert_eq!(status, StatusCode::OK);
        let data = &json["data"];
        assert_eq!(data["pagination"], json!({"limit": 2, "offset": 0, "total": 5}));
        let names: Vec<&str> = data["items"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["player"]["last_name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Moreau", "Petit"]);

        // Players without rounds sort last on average, whatever the direction
        let (_, json) = get_json(app.clone(), "/api/players/stats?sort=avgRoundPoints&order=asc").await;
        let items = json["data"]["items"].as_array().unwrap();
        assert_eq!(items.len(), 5);
        assert_eq!(items[4]["player"]["last_name"], "Garnier");
        assert!(items[4]["stats"]["avgRoundPoints"].is_null());

        let (_, json) = get_json(app.clone(), "/api/players/stats?search=EMMA").await;
        assert_eq!(json["data"]["pagination"]["total"], 1);

        let (status, json) = get_json(app, "/api/players/stats?limit=oops&sort=bogus").await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["data"]["pagination"]["limit"].is_null());
        assert_eq!(json["data"]["items"][0]["player"]["last_name"], "Roux");
    }
}
