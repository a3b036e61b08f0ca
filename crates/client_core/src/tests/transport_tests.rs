use super::*;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use shared::protocol::UpdatedPaths;
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct BackendState {
    geocode_queries: Arc<Mutex<Vec<String>>>,
    route_requests: Arc<Mutex<Vec<Value>>>,
    obstacles: Arc<Mutex<Vec<AddObstacleRequest>>>,
    clear_calls: Arc<Mutex<u32>>,
}

async fn handle_geocode(
    State(state): State<BackendState>,
    Json(request): Json<GeocodeRequest>,
) -> Response {
    state
        .geocode_queries
        .lock()
        .await
        .push(request.location.clone());
    if request.location == "Chennai Central" {
        Json(GeocodeResponse {
            lat: 13.0827,
            lng: 80.2707,
        })
        .into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(ApiError::new("Location not found")),
        )
            .into_response()
    }
}

async fn handle_find_path(
    State(state): State<BackendState>,
    Json(request): Json<Value>,
) -> Json<Value> {
    state.route_requests.lock().await.push(request);
    Json(json!({
        "paths": {
            "parallel_dijkstra": {
                "distance": 3.4,
                "time": 0.002,
                "travel_time": {"hours": 0, "minutes": 5},
                "path": [[13.0827, 80.2707], [13.0604, 80.2496]]
            },
            "sequential_astar": {"error": "No path found or timeout"}
        }
    }))
}

async fn handle_add_obstacle(
    State(state): State<BackendState>,
    Json(request): Json<AddObstacleRequest>,
) -> Json<Value> {
    state.obstacles.lock().await.push(request);
    Json(json!({
        "success": true,
        "obstacle_placed": true,
        "recalculate": true,
        "updated_paths": {"error": "Could not find path"}
    }))
}

async fn handle_clear_obstacles(State(state): State<BackendState>) -> Json<Value> {
    *state.clear_calls.lock().await += 1;
    Json(json!({"success": true, "updated_paths": {}}))
}

async fn handle_broken() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded")
}

async fn start_backend(prefix: &str) -> anyhow::Result<(String, BackendState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = BackendState::default();
    let routes = Router::new()
        .route("/geocode", post(handle_geocode))
        .route("/find_path", post(handle_find_path))
        .route("/add_obstacle", post(handle_add_obstacle))
        .route("/clear_obstacles", post(handle_clear_obstacles))
        .route("/broken", post(handle_broken))
        .with_state(state.clone());
    let app = if prefix.is_empty() {
        routes
    } else {
        Router::new().nest(prefix, routes)
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}{prefix}"), state))
}

fn client_for(base_url: String) -> HttpPathfinderApi {
    HttpPathfinderApi::new(HttpApiConfig {
        base_url,
        ..HttpApiConfig::default()
    })
    .expect("build client")
}

#[tokio::test]
async fn geocode_posts_query_and_decodes_coordinate() {
    let (base_url, state) = start_backend("").await.expect("backend");
    let api = client_for(base_url);

    let coordinate = api.geocode("Chennai Central").await.expect("geocode");

    assert_eq!(coordinate, Coordinate::new(13.0827, 80.2707));
    assert_eq!(
        state.geocode_queries.lock().await.as_slice(),
        &["Chennai Central".to_string()]
    );
}

#[tokio::test]
async fn error_detail_is_surfaced_from_json_body() {
    let (base_url, _state) = start_backend("").await.expect("backend");
    let api = client_for(base_url);

    let err = api.geocode("Atlantis").await.expect_err("not found");

    let exception = err.downcast_ref::<ApiException>().expect("api exception");
    assert_eq!(exception.status, 404);
    assert_eq!(exception.detail, "Location not found");
}

#[tokio::test]
async fn plain_text_error_body_is_kept_as_detail() {
    let (base_url, _state) = start_backend("").await.expect("backend");
    let api = client_for(base_url);

    let err = api
        .post_json::<(), Value>("broken", None)
        .await
        .expect_err("server error");

    let exception = err.downcast_ref::<ApiException>().expect("api exception");
    assert_eq!(exception.status, 500);
    assert_eq!(exception.detail, "upstream exploded");
}

#[tokio::test]
async fn find_path_sends_both_points_and_keeps_error_entries() {
    let (base_url, state) = start_backend("").await.expect("backend");
    let api = client_for(base_url);
    let start = Coordinate::new(13.0827, 80.2707);
    let end = Coordinate::new(13.0604, 80.2496);

    let response = api.find_path(start, end).await.expect("find path");

    assert_eq!(response.paths.len(), 2);
    let failed = &response.paths["sequential_astar"];
    assert_eq!(failed.error.as_deref(), Some("No path found or timeout"));
    let ok = &response.paths["parallel_dijkstra"];
    assert_eq!(ok.path.len(), 2);
    assert_eq!(ok.travel_time.minutes, 5);

    let requests = state.route_requests.lock().await;
    assert_eq!(
        requests.as_slice(),
        &[json!({
            "start": {"lat": 13.0827, "lng": 80.2707},
            "end": {"lat": 13.0604, "lng": 80.2496}
        })]
    );
}

#[tokio::test]
async fn add_obstacle_decodes_whole_table_failure() {
    let (base_url, state) = start_backend("").await.expect("backend");
    let api = client_for(base_url);

    let response = api
        .add_obstacle(Coordinate::new(13.07, 80.26))
        .await
        .expect("add obstacle");

    assert!(response.success);
    match response.updated_paths {
        Some(UpdatedPaths::Failed(failure)) => assert_eq!(failure.error, "Could not find path"),
        other => panic!("unexpected updated paths: {other:?}"),
    }
    let obstacles = state.obstacles.lock().await;
    assert_eq!(obstacles.len(), 1);
    assert_eq!(obstacles[0].lat, 13.07);
}

#[tokio::test]
async fn clear_obstacles_posts_without_body_under_path_prefix() {
    let (base_url, state) = start_backend("/api").await.expect("backend");
    let api = client_for(base_url);

    let response = api.clear_obstacles().await.expect("clear");

    assert!(response.success);
    assert_eq!(*state.clear_calls.lock().await, 1);
}

#[test]
fn base_url_gains_trailing_slash_and_keeps_prefix() {
    let url = normalize_base_url(" http://localhost:9000/api ").expect("valid url");
    assert_eq!(url.as_str(), "http://localhost:9000/api/");
    assert_eq!(
        url.join("find_path").expect("join").as_str(),
        "http://localhost:9000/api/find_path"
    );
}

#[test]
fn base_url_rejects_non_http_schemes() {
    assert!(normalize_base_url("ftp://localhost:9000").is_err());
    assert!(normalize_base_url("not a url").is_err());
}
