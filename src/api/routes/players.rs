use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::api::state::AppState;
use crate::api::{ok, parse_id, ApiResult, Deleted};
use crate::models::{Player, PlayerInput};

#[derive(Debug, Deserialize)]
pub struct ListPlayersParams {
    pub search: Option<String>,
}

pub async fn list_players(
    State(state): State<AppState>,
    params: Result<Query<ListPlayersParams>, QueryRejection>,
) -> ApiResult<Vec<Player>> {
    let Query(params) = params?;
    ok(state.service.list_players(params.search.as_deref()).await?)
}

pub async fn get_player(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Player> {
    ok(state.service.get_player(parse_id(&id)?).await?)
}

pub async fn create_player(
    State(state): State<AppState>,
    payload: Result<Json<PlayerInput>, JsonRejection>,
) -> ApiResult<Player> {
    let Json(input) = payload?;
    ok(state.service.create_player(&input).await?)
}

pub async fn update_player(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<PlayerInput>, JsonRejection>,
) -> ApiResult<Player> {
    let id = parse_id(&id)?;
    let Json(input) = payload?;
    ok(state.service.update_player(id, &input).await?)
}

pub async fn delete_player(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Deleted> {
    let id = parse_id(&id)?;
    state.service.delete_player(id).await?;
    ok(Deleted { id })
}

#[cfg(test)]
mod tests {
    use crate::api::routes::test_support::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_create_and_get_player() {
        let app = test_app();
        let (status, json) = post_json(
            app.clone(),
            "/api/players",
            r#"{"first_name":"  Jeanne ","last_name":"Martin","email":"jeanne@club.fr"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["first_name"], "Jeanne");
        let id = json["data"]["id"].as_i64().unwrap();

        let (status, json) = get_json(app, &format!("/api/players/{}", id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["email"], "jeanne@club.fr");
        assert!(json["data"]["phone"].is_null());
    }

    #[tokio::test]
    async fn test_create_player_validation() {
        let app = test_app();
        let (status, json) = post_json(
            app.clone(),
            "/api/players",
            r#"{"first_name":"Jeanne","last_name":""}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");

        let (status, _) = post_json(
            app.clone(),
            "/api/players",
            r#"{"first_name":"A","last_name":"B","email":"nope"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, json) = post_json(app, "/api/players", "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn test_list_players_search() {
        let app = seeded_app().await;

        let (status, json) = get_json(app.clone(), "/api/players").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"].as_array().unwrap().len(), 4);

        let (_, json) = get_json(app, "/api/players?search=pet").await;
        let found = json["data"].as_array().unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["last_name"], "Petit");
    }

    #[tokio::test]
    async fn test_update_player() {
        let app = seeded_app().await;
        let (status, json) = send_json(
            app.clone(),
            "PUT",
            "/api/players/2",
            Some(r#"{"first_name":"Bruno","last_name":"Grand","phone":"0601020304"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["last_name"], "Grand");
        assert_eq!(json["data"]["phone"], "0601020304");

        let (status, _) = send_json(
            app,
            "PUT",
            "/api/players/99",
            Some(r#"{"first_name":"X","last_name":"Y"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_player_id_must_be_integer() {
        let app = test_app();
        let (status, json) = get_json(app, "/api/players/abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["message"], "Bad request: id must be an integer");
    }

    #[tokio::test]
    async fn test_delete_player() {
        let app = seeded_app().await;
        seed_match(&app, "2024-03-01T20:00", [1, 2, 3, 4]).await;
        seed_player(&app, "Emma", "Garnier").await;

        let (status, json) = send_json(app.clone(), "DELETE", "/api/players/1", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["error"]["code"], "CONFLICT");

        let (status, json) = send_json(app.clone(), "DELETE", "/api/players/5", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["data"]["id"], 5);

        let (status, _) = send_json(app, "DELETE", "/api/players/5", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
