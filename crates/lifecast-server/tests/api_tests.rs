//! Integration tests for the HTTP API and for listener churn against a
//! live run loop.
//!
//! Router tests drive Axum's `Router` directly via `tower::ServiceExt`
//! without starting a TCP server.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use lifecast_core::Directory;
use lifecast_core::config::{ListenerSettings, SimulationSettings};
use lifecast_core::frame::decode_world_state;
use lifecast_core::seed::encode_seed;
use lifecast_server::{AppState, build_router};
use lifecast_types::InstanceId;
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

/// A blinker that never settles, kept away from a still-life block.
const OSCILLATOR: [(u32, u32); 7] = [(1, 0), (1, 1), (1, 2), (4, 4), (4, 5), (5, 4), (5, 5)];

fn make_state(generation_interval_ms: u64) -> Arc<AppState> {
    let settings = SimulationSettings {
        generation_interval_ms,
        ..SimulationSettings::default()
    };
    Arc::new(AppState::new(
        Arc::new(Directory::new(settings)),
        ListenerSettings::default(),
    ))
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, json: &Value) -> Request<Body> {
    Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .unwrap()
}

// =========================================================================
// Status page
// =========================================================================

#[tokio::test]
async fn test_index_returns_html() {
    let state = make_state(0);
    state
        .directory
        .create("a", lifecast_types::Dimensions::new(3, 3), false)
        .unwrap();
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.contains("text/html"));
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains(r#"<span class="count">1</span>"#));
    assert!(html.contains("protocol v1"));
}

// =========================================================================
// Creation
// =========================================================================

#[tokio::test]
async fn test_create_world_then_get() {
    let state = make_state(0);
    let router = build_router(Arc::clone(&state));

    let req = serde_json::json!({ "name": "glider-box", "x": 8, "y": 6, "start": false });
    let response = router
        .clone()
        .oneshot(post_json("/world", &req))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["ok"], true);
    let id = json["id"].as_str().unwrap().to_owned();
    assert!(id.parse::<InstanceId>().is_ok());

    let response = router
        .oneshot(
            Request::get(format!("/world/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["name"], "glider-box");
    assert_eq!(json["x"], 8);
    assert_eq!(json["y"], 6);
    assert_eq!(json["isRunning"], false);
    assert_eq!(json["epoch"], 0);
    assert_eq!(json["liveCells"], 0);
}

#[tokio::test]
async fn test_create_world_degenerate_is_rejected() {
    let state = make_state(0);
    let router = build_router(Arc::clone(&state));

    let req = serde_json::json!({ "name": "flat", "x": 0, "y": 5 });
    let response = router.oneshot(post_json("/world", &req)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["ok"], false);
    assert!(json["error"].as_str().unwrap().contains("degenerate"));
    assert!(state.directory.is_empty());
}

#[tokio::test]
async fn test_create_world_oversized_is_rejected() {
    let router = build_router(make_state(0));

    let req = serde_json::json!({ "name": "huge", "x": 5, "y": 1_000_000 });
    let response = router.oneshot(post_json("/world", &req)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["ok"], false);
}

#[tokio::test]
async fn test_create_world_malformed_body() {
    let router = build_router(make_state(0));

    let response = router
        .oneshot(
            Request::post("/world")
                .header("content-type", "application/json")
                .body(Body::from("{\"x\": \"wide\"}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["ok"], false);
}

#[tokio::test]
async fn test_create_world_from_seed() {
    let state = make_state(0);
    let router = build_router(Arc::clone(&state));

    let seed = encode_seed(&[(0, 0), (1, 1)]);
    let response = router
        .oneshot(
            Request::post("/world/seed?name=diag")
                .body(Body::from(seed))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    let id: InstanceId = json["id"].as_str().unwrap().parse().unwrap();

    let sim = state.directory.get(id).unwrap();
    assert_eq!(sim.name(), "diag");
    let grid = sim.grid();
    assert!(grid.rows() >= 2 && grid.cols() >= 2);
    assert_eq!(grid.live_cells().collect::<Vec<_>>(), vec![(0, 0), (1, 1)]);
}

#[tokio::test]
async fn test_create_world_from_bad_seed() {
    let state = make_state(0);
    let router = build_router(Arc::clone(&state));

    let response = router
        .oneshot(
            Request::post("/world/seed")
                .body(Body::from(vec![0u8; 7]))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["ok"], false);
    assert!(json["error"].as_str().unwrap().contains("multiple of 8"));
    assert!(state.directory.is_empty());
}

#[tokio::test]
async fn test_create_world_from_seed_with_start() {
    let state = make_state(2);
    let router = build_router(Arc::clone(&state));

    let response = router
        .oneshot(
            Request::post("/world/seed?name=osc&start=true")
                .body(Body::from(encode_seed(&OSCILLATOR)))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_to_json(response.into_body()).await;
    let id: InstanceId = json["id"].as_str().unwrap().parse().unwrap();
    let sim = state.directory.get(id).unwrap();
    assert!(sim.is_running());

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(sim.epoch() > 0);
    assert_eq!(state.directory.stop_all(), 1);
}

// =========================================================================
// Listing and lookup
// =========================================================================

#[tokio::test]
async fn test_list_worlds_in_creation_order() {
    let state = make_state(0);
    for name in ["first", "second", "third"] {
        state
            .directory
            .create(name, lifecast_types::Dimensions::new(4, 4), false)
            .unwrap();
    }
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/world").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["ok"], true);
    let names: Vec<&str> = json["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["first", "second", "third"]);
}

#[tokio::test]
async fn test_list_worlds_empty() {
    let router = build_router(make_state(0));

    let response = router
        .oneshot(Request::get("/world").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["items"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_get_world_not_found() {
    let router = build_router(make_state(0));

    let path = format!("/world/{}", InstanceId::new());
    let response = router
        .oneshot(Request::get(&path).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["ok"], false);
}

#[tokio::test]
async fn test_get_world_invalid_id() {
    let router = build_router(make_state(0));

    let response = router
        .oneshot(Request::get("/world/not-a-uuid").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stopped_world_stays_queryable() {
    let state = make_state(0);
    let sim = state
        .directory
        .create_from_seed("lonely", &encode_seed(&[(1, 1), (2, 2)]), true)
        .unwrap();

    // Two isolated cells die in one step.
    for _ in 0..100 {
        if !sim.is_running() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let router = build_router(Arc::clone(&state));
    let response = router
        .oneshot(
            Request::get(format!("/world/{}", sim.id()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["isRunning"], false);
    assert_eq!(json["reason"], "extinct");
}

// =========================================================================
// Listener churn
// =========================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_listener_churn_during_active_loop() {
    let state = make_state(0);
    let sim = state
        .directory
        .create_from_seed("churn", &encode_seed(&OSCILLATOR), true)
        .unwrap();

    // One steady listener watches the whole run.
    let (steady_tx, mut steady_rx) = mpsc::channel(16);
    let steady = sim.add_listener(steady_tx);

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let sim = Arc::clone(&sim);
        tasks.push(tokio::spawn(async move {
            for _ in 0..200 {
                let (tx, mut rx) = mpsc::channel(2);
                let id = sim.add_listener(tx);
                tokio::task::yield_now().await;
                assert!(sim.remove_listener(id));
                while rx.try_recv().is_ok() {}
            }
        }));
    }

    let mut last_epoch = None;
    let mut received = 0_usize;
    while received < 50 {
        let frame = steady_rx.recv().await.unwrap();
        let epoch = decode_world_state(&frame).unwrap().epoch;
        if let Some(last) = last_epoch {
            assert!(epoch > last, "epochs must strictly increase");
        }
        last_epoch = Some(epoch);
        received = received.saturating_add(1);
    }

    for task in tasks {
        task.await.unwrap();
    }

    assert!(sim.is_running());
    assert_eq!(sim.listener_count(), 1);
    assert!(sim.remove_listener(steady));
    assert_eq!(sim.listener_count(), 0);
    assert!(sim.stop());
}
