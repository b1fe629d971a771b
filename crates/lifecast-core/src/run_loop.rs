//! Background task that drives one instance through successive
//! generations.
//!
//! A loop is spawned by [`Simulation::start`] and lives until the first
//! terminal classification or an external stop. Each iteration is one
//! call to [`Simulation::advance`], which takes the instance lock, steps
//! the grid and either commits (and broadcasts) the new generation or
//! halts the instance.
//!
//! ```text
//! Idle --start--> Running --+--> Stopped(unchanged)
//!                           +--> Stopped(extinct)
//!                           +--> Stopped(external)
//! ```
//!
//! A stopped loop never resumes. Starting again spawns a new loop with a
//! new run token; an old loop that wakes up afterwards sees its token is
//! stale and exits without touching the state.
//!
//! Between generations the loop yields to the scheduler, or sleeps for
//! the configured generation interval when that is non-zero. Stop latency
//! is therefore at most one generation.
//!
//! [`Simulation::start`]: crate::simulation::Simulation::start
//! [`Simulation::advance`]: crate::simulation::Simulation::advance

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::simulation::{Advance, Simulation};
use crate::step::Classification;

/// How a run loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The instance reached a terminal configuration.
    Halted(Classification),
    /// The loop observed a stop request (or was superseded by a newer
    /// loop).
    Stopped,
}

/// Spawn a run loop for `sim` on `runtime`.
pub fn spawn(runtime: &Handle, sim: Arc<Simulation>, token: u64) -> JoinHandle<RunOutcome> {
    runtime.spawn(run(sim, token))
}

/// Drive `sim` until it halts or is stopped.
pub async fn run(sim: Arc<Simulation>, token: u64) -> RunOutcome {
    let interval = sim.generation_interval();
    debug!(instance = %sim.id(), token, "run loop entered");

    loop {
        match sim.advance(token) {
            Advance::Committed { .. } => {
                if interval.is_zero() {
                    tokio::task::yield_now().await;
                } else {
                    tokio::time::sleep(interval).await;
                }
            }
            Advance::Halted(classification) => {
                info!(
                    instance = %sim.id(),
                    epoch = sim.epoch(),
                    reason = %classification,
                    "simulation halted"
                );
                return RunOutcome::Halted(classification);
            }
            Advance::Cancelled => {
                debug!(instance = %sim.id(), token, "run loop exited on stop");
                return RunOutcome::Stopped;
            }
        }
    }
}
