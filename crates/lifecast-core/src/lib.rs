//! Simulation state machine, step engine, and wire encoding for Lifecast.
//!
//! Each simulation instance evolves a Conway's Game of Life grid on its
//! own background task and pushes every committed generation to its
//! subscribers as a compact binary frame.
//!
//! # Modules
//!
//! - [`grid`] -- Rectangular boolean matrix with bounds-checked access.
//! - [`step`] -- Pure next-generation computation and transition
//!   classification.
//! - [`seed`] -- Sparse-seed buffer decoding.
//! - [`frame`] -- Wire protocol: world-state frames and control messages.
//! - [`listener`] -- Per-instance registry of subscriber sinks.
//! - [`simulation`] -- One instance's lock-guarded state.
//! - [`run_loop`] -- Background task that drives an instance.
//! - [`directory`] -- Process-wide instance collection.
//! - [`config`] -- Configuration loading from `lifecast-config.yaml`.
//! - [`error`] -- Error types shared by the modules above.

pub mod config;
pub mod directory;
pub mod error;
pub mod frame;
pub mod grid;
pub mod listener;
pub mod run_loop;
pub mod seed;
pub mod simulation;
pub mod step;

pub use directory::Directory;
pub use error::{ControlError, CreationError, DeliveryError, SeedError};
pub use grid::Grid;
pub use simulation::Simulation;
pub use step::{Classification, compute_next_generation};
