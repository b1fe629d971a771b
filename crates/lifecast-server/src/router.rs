//! Axum router construction.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete router:
///
/// - `GET /` -- HTML status page
/// - `GET /world`, `POST /world` -- list, create
/// - `POST /world/seed` -- create from a seed buffer
/// - `GET /world/{id}` -- single instance
/// - `GET /ws/world/{id}` -- `WebSocket` subscription
///
/// CORS allows any origin so browser clients served from elsewhere can
/// connect.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/world", get(handlers::list_worlds).post(handlers::create_world))
        .route("/world/seed", post(handlers::create_world_from_seed))
        .route("/world/{id}", get(handlers::get_world))
        .route("/ws/world/{id}", get(ws::ws_world))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
