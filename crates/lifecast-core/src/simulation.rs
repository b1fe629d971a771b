//! One simulation instance and the lock that guards it.
//!
//! [`Simulation`] is shared as `Arc<Simulation>` between the directory,
//! request handlers, listener transports and the instance's own run loop.
//! Its immutable identity (id, name, declared size) sits outside the lock.
//! Everything that changes (grid, epoch, running flag, halt reason and the
//! listener set) lives in one `SimulationState` behind a single
//! [`parking_lot::Mutex`].
//!
//! # Locking
//!
//! - Every read or write of the mutable state goes through the one lock.
//! - A committed generation is broadcast while the lock is still held, so
//!   no listener ever sees a frame that disagrees with the epoch it is
//!   labelled with, and listener add/remove can never interleave with an
//!   iteration over the listener set.
//! - The lock is never held across an `.await`. Broadcasting only does
//!   non-blocking `try_send`s, so holding it is bounded by one step plus
//!   one encode.
//! - Different instances never share a lock.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use lifecast_types::{Dimensions, InstanceId, InstanceSummary};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::SimulationSettings;
use crate::error::{ControlError, CreationError, SeedError};
use crate::frame::encode_world_state;
use crate::grid::Grid;
use crate::listener::{BroadcastReport, FrameSink, ListenerId, ListenerRegistry};
use crate::run_loop::{self, RunOutcome};
use crate::seed;
use crate::step::{Classification, compute_next_generation};

/// Halt reason recorded when a stop request ends the run loop.
pub const REASON_STOPPED: &str = "stopped";

/// Halt reason recorded when a stopped instance receives a new seed.
pub const REASON_RESEEDED: &str = "reseeded";

/// Mutable state of one instance. Only reachable through the lock.
#[derive(Debug)]
struct SimulationState {
    grid: Grid,
    epoch: u64,
    running: bool,
    run_token: u64,
    reason: Option<String>,
    listeners: ListenerRegistry,
}

/// Result of one attempt by a run loop to advance the instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// A new generation was committed and broadcast.
    Committed {
        /// Epoch of the committed generation.
        epoch: u64,
    },
    /// The transition was terminal; the instance is now stopped.
    Halted(Classification),
    /// The loop was stopped (or superseded by a newer loop) and made no
    /// change.
    Cancelled,
}

/// One Game of Life instance.
#[derive(Debug)]
pub struct Simulation {
    id: InstanceId,
    name: String,
    dimensions: Dimensions,
    created_at: DateTime<Utc>,
    max_dimension: u32,
    generation_interval: Duration,
    state: Mutex<SimulationState>,
}

impl Simulation {
    /// Create a stopped instance with an all-dead grid.
    ///
    /// Fails if either axis is zero or larger than the configured maximum.
    pub fn new(
        name: impl Into<String>,
        dimensions: Dimensions,
        settings: &SimulationSettings,
    ) -> Result<Self, CreationError> {
        let limit = settings.effective_max_dimension();
        if dimensions.is_degenerate() {
            return Err(CreationError::Degenerate(dimensions));
        }
        if dimensions.width > limit || dimensions.height > limit {
            return Err(CreationError::TooLarge { dimensions, limit });
        }
        let grid = Grid::new(dimensions.height as usize, dimensions.width as usize);
        Ok(Self::with_grid(name.into(), dimensions, grid, settings))
    }

    /// Create a stopped instance from a sparse-seed buffer.
    ///
    /// The declared size is inferred from the largest coordinate in the
    /// buffer. An empty buffer is rejected as degenerate.
    pub fn from_seed(
        name: impl Into<String>,
        data: &[u8],
        settings: &SimulationSettings,
    ) -> Result<Self, CreationError> {
        let grid = seed::decode_seed(data, settings.effective_max_dimension())?;
        let (Ok(width), Ok(height)) = (u32::try_from(grid.cols()), u32::try_from(grid.rows()))
        else {
            return Err(CreationError::TooLarge {
                dimensions: Dimensions::new(u32::MAX, u32::MAX),
                limit: settings.effective_max_dimension(),
            });
        };
        let dimensions = Dimensions::new(width, height);
        if dimensions.is_degenerate() {
            return Err(CreationError::Degenerate(dimensions));
        }
        Ok(Self::with_grid(name.into(), dimensions, grid, settings))
    }

    fn with_grid(
        name: String,
        dimensions: Dimensions,
        grid: Grid,
        settings: &SimulationSettings,
    ) -> Self {
        Self {
            id: InstanceId::new(),
            name,
            dimensions,
            created_at: Utc::now(),
            max_dimension: settings.effective_max_dimension(),
            generation_interval: Duration::from_millis(settings.generation_interval_ms),
            state: Mutex::new(SimulationState {
                grid,
                epoch: 0,
                running: false,
                run_token: 0,
                reason: None,
                listeners: ListenerRegistry::new(),
            }),
        }
    }

    // -----------------------------------------------------------------------
    // Identity
    // -----------------------------------------------------------------------

    /// Instance identifier.
    pub const fn id(&self) -> InstanceId {
        self.id
    }

    /// Name given at creation.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared size.
    pub const fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// Pause the run loop takes between generations.
    pub const fn generation_interval(&self) -> Duration {
        self.generation_interval
    }

    // -----------------------------------------------------------------------
    // Read accessors
    // -----------------------------------------------------------------------

    /// Whether a run loop is driving the instance. May be one generation
    /// stale by the time the caller acts on it.
    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }

    /// Number of committed generations.
    pub fn epoch(&self) -> u64 {
        self.state.lock().epoch
    }

    /// Why the instance last halted, if it has.
    pub fn reason(&self) -> Option<String> {
        self.state.lock().reason.clone()
    }

    /// Copy of the current generation.
    pub fn grid(&self) -> Grid {
        self.state.lock().grid.clone()
    }

    /// Number of live cells in the current generation.
    pub fn live_cells(&self) -> usize {
        self.state.lock().grid.live_count()
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.state.lock().listeners.len()
    }

    /// Consistent read-only view for listing.
    pub fn summary(&self) -> InstanceSummary {
        let state = self.state.lock();
        InstanceSummary {
            id: self.id,
            name: self.name.clone(),
            x: self.dimensions.width,
            y: self.dimensions.height,
            is_running: state.running,
            epoch: state.epoch,
            reason: state.reason.clone(),
            live_cells: u64::try_from(state.grid.live_count()).unwrap_or(u64::MAX),
            created_at: self.created_at,
        }
    }

    // -----------------------------------------------------------------------
    // Mutation
    // -----------------------------------------------------------------------

    /// Commit `next` as the new generation, bump the epoch and broadcast,
    /// all under the instance lock.
    pub fn set_generation(&self, next: Grid) -> BroadcastReport {
        let mut state = self.state.lock();
        self.commit_locked(&mut state, next)
    }

    fn commit_locked(&self, state: &mut SimulationState, next: Grid) -> BroadcastReport {
        state.grid = next;
        state.epoch = state.epoch.saturating_add(1);
        Self::broadcast_locked(self.id, state)
    }

    fn broadcast_locked(id: InstanceId, state: &SimulationState) -> BroadcastReport {
        if state.listeners.is_empty() {
            return BroadcastReport::default();
        }
        let frame = encode_world_state(state.epoch, &state.grid);
        state.listeners.broadcast(id, &frame)
    }

    /// Start a fresh run loop on the Tokio runtime the caller is running
    /// in.
    ///
    /// Fails if the instance is already running, or with
    /// [`ControlError::NoRuntime`] when called outside a runtime (the
    /// instance then stays stopped). A loop that was stopped but has not
    /// yet observed the stop is superseded: it carries an older run token
    /// and exits without touching the state.
    pub fn start(self: &Arc<Self>) -> Result<JoinHandle<RunOutcome>, ControlError> {
        let runtime =
            Handle::try_current().map_err(|e| ControlError::NoRuntime(e.to_string()))?;
        let token = {
            let mut state = self.state.lock();
            if state.running {
                return Err(ControlError::AlreadyRunning(self.id));
            }
            state.running = true;
            state.reason = None;
            state.run_token = state.run_token.wrapping_add(1);
            state.run_token
        };
        info!(instance = %self.id, "simulation started");
        Ok(run_loop::spawn(&runtime, Arc::clone(self), token))
    }

    /// Request that the run loop stop. Takes effect at the loop's next
    /// generation boundary. Returns whether the instance was running.
    pub fn stop(&self) -> bool {
        let mut state = self.state.lock();
        if !state.running {
            return false;
        }
        state.running = false;
        state.reason = Some(String::from(REASON_STOPPED));
        drop(state);
        info!(instance = %self.id, "simulation stop requested");
        true
    }

    /// One run-loop iteration: step, then commit or halt.
    ///
    /// `token` identifies the calling loop; a loop whose token is stale, or
    /// whose instance has been stopped, gets [`Advance::Cancelled`] and no
    /// state is touched.
    pub fn advance(&self, token: u64) -> Advance {
        let mut state = self.state.lock();
        if !state.running || state.run_token != token {
            return Advance::Cancelled;
        }

        let (next, classification) = compute_next_generation(&state.grid);
        if classification.is_terminal() {
            state.running = false;
            state.reason = Some(classification.as_str().to_owned());
            return Advance::Halted(classification);
        }

        let report = self.commit_locked(&mut state, next);
        if !report.failures.is_empty() {
            debug!(
                instance = %self.id,
                epoch = state.epoch,
                failed = report.failures.len(),
                delivered = report.delivered,
                "broadcast round had delivery failures"
            );
        }
        Advance::Committed { epoch: state.epoch }
    }

    /// Replace the live cells of a stopped instance.
    ///
    /// The buffer is fully decoded and checked against the declared size
    /// before the lock is taken, so a bad seed never leaves a partial grid.
    /// Reseeding cannot grow the grid. The epoch is left as is and a
    /// snapshot of the new grid is broadcast.
    pub fn reseed(&self, data: &[u8]) -> Result<BroadcastReport, ControlError> {
        let cells = seed::decode_coordinates(data, self.max_dimension)?;
        let rows = self.dimensions.height as usize;
        let cols = self.dimensions.width as usize;
        let mut grid = Grid::new(rows, cols);
        for (row, col) in cells {
            if !grid.set(row as usize, col as usize, true) {
                return Err(SeedError::OutsideGrid {
                    row,
                    col,
                    dimensions: self.dimensions,
                }
                .into());
            }
        }

        let mut state = self.state.lock();
        if state.running {
            return Err(ControlError::ReseedWhileRunning(self.id));
        }
        state.grid = grid;
        state.reason = Some(String::from(REASON_RESEEDED));
        Ok(Self::broadcast_locked(self.id, &state))
    }

    // -----------------------------------------------------------------------
    // Listeners
    // -----------------------------------------------------------------------

    /// Register a sink and immediately offer it a snapshot of the current
    /// generation.
    ///
    /// The snapshot is sent under the same lock as registration, so the
    /// listener's first frame is never older than a generation it could
    /// otherwise have missed.
    pub fn add_listener(&self, sink: FrameSink) -> ListenerId {
        let id = ListenerId::next();
        let mut state = self.state.lock();
        state.listeners.insert(id, sink);
        let frame = encode_world_state(state.epoch, &state.grid);
        if let Err(e) = state.listeners.deliver_to(self.id, id, frame) {
            debug!(error = %e, "initial snapshot not delivered");
        }
        drop(state);
        debug!(instance = %self.id, listener = %id, "listener added");
        id
    }

    /// Unregister a sink by identity. Returns whether it was registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let removed = self.state.lock().listeners.remove(id);
        if removed {
            debug!(instance = %self.id, listener = %id, "listener removed");
        }
        removed
    }
}
