//! REST endpoint handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `POST` | `/world` | Create an instance from dimensions |
//! | `POST` | `/world/seed` | Create an instance from a sparse-seed body |
//! | `GET` | `/world` | List every instance |
//! | `GET` | `/world/{id}` | Summary of one instance |

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse};
use lifecast_core::Simulation;
use lifecast_core::frame::PROTOCOL_VERSION;
use lifecast_types::{Dimensions, InstanceId};
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

/// Body of `POST /world`.
#[derive(Debug, Deserialize)]
pub struct CreateWorldRequest {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Width (number of columns).
    pub x: u32,
    /// Height (number of rows).
    pub y: u32,
    /// Start the run loop immediately.
    #[serde(default)]
    pub start: bool,
}

/// Query string of `POST /world/seed`.
#[derive(Debug, Deserialize)]
pub struct SeedQuery {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Start the run loop immediately.
    #[serde(default)]
    pub start: bool,
}

// ---------------------------------------------------------------------------
// GET /
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page with instance counts and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let instances = state.directory.instances();
    let total = instances.len();
    let running = instances.iter().filter(|sim| sim.is_running()).count();

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Lifecast</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 720px;
            margin: 0 auto;
        }}
        h1 {{ color: #7ee787; }}
        .count {{ color: #58a6ff; font-size: 1.5rem; font-weight: bold; }}
        code {{ color: #d2a8ff; }}
        a {{ color: #58a6ff; }}
    </style>
</head>
<body>
    <h1>Lifecast</h1>
    <p>Instances: <span class="count">{total}</span> ({running} running)</p>
    <ul>
        <li><a href="/world">GET /world</a> -- list instances</li>
        <li><code>POST /world</code> -- create from <code>{{name, x, y, start}}</code></li>
        <li><code>POST /world/seed?name=&amp;start=</code> -- create from a seed buffer</li>
        <li><code>GET /ws/world/{{id}}</code> -- binary frame stream (protocol v{PROTOCOL_VERSION})</li>
    </ul>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// POST /world
// ---------------------------------------------------------------------------

/// Create an instance with an all-dead grid of the requested size.
pub async fn create_world(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CreateWorldRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = body.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
    let sim = state
        .directory
        .create(&req.name, Dimensions::new(req.x, req.y), req.start)?;
    Ok(created(&sim))
}

// ---------------------------------------------------------------------------
// POST /world/seed
// ---------------------------------------------------------------------------

/// Create an instance from a raw sparse-seed request body. The grid is
/// sized to fit the largest coordinate.
pub async fn create_world_from_seed(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SeedQuery>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let sim = state
        .directory
        .create_from_seed(&params.name, &body, params.start)?;
    Ok(created(&sim))
}

fn created(sim: &Simulation) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "id": sim.id(),
        "ok": true,
    }))
}

// ---------------------------------------------------------------------------
// GET /world, GET /world/{id}
// ---------------------------------------------------------------------------

/// List every instance in creation order.
pub async fn list_worlds(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "items": state.directory.list(),
        "ok": true,
    }))
}

/// Summary of a single instance.
pub async fn get_world(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let sim = lookup(&state, &id)?;
    Ok(Json(sim.summary()))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Resolve a path segment to a registered instance.
pub(crate) fn lookup(state: &AppState, id: &str) -> Result<Arc<Simulation>, ApiError> {
    let parsed: InstanceId = id
        .parse()
        .map_err(|e| ApiError::InvalidId(format!("{id}: {e}")))?;
    state
        .directory
        .get(parsed)
        .ok_or_else(|| ApiError::NotFound(format!("world {parsed}")))
}
