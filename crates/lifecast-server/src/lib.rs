//! HTTP and `WebSocket` front end for the Lifecast simulation server.
//!
//! This crate exposes a [`Directory`](lifecast_core::Directory) of Game of
//! Life instances over Axum:
//!
//! - **REST endpoints** to create instances (from dimensions or from a
//!   sparse-seed buffer) and to list or inspect them
//! - **`WebSocket` endpoint** (`/ws/world/{id}`) that streams binary
//!   world-state frames for one instance and accepts binary control
//!   frames (stop, start, reseed)
//! - **Minimal HTML status page** (`GET /`)
//!
//! Handlers never hold an instance lock across an `.await`; every
//! interaction with a simulation is a short synchronous call.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, spawn_server};
pub use state::AppState;
