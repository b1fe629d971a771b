//! Process-wide collection of simulation instances.
//!
//! The directory's own [`RwLock`] only protects the id-to-instance map. It
//! is never held while an instance lock is taken: lookups and scans clone
//! the `Arc`s they need and release the directory lock before touching any
//! instance, so unrelated instances never block each other.

use std::collections::BTreeMap;
use std::sync::Arc;

use lifecast_types::{Dimensions, InstanceId, InstanceSummary};
use parking_lot::RwLock;
use tracing::{info, warn};

use crate::config::SimulationSettings;
use crate::error::CreationError;
use crate::simulation::Simulation;

/// All instances known to this process, ordered by creation.
#[derive(Debug)]
pub struct Directory {
    settings: SimulationSettings,
    instances: RwLock<BTreeMap<InstanceId, Arc<Simulation>>>,
}

impl Directory {
    /// Create an empty directory. `settings` apply to every instance it
    /// creates.
    pub fn new(settings: SimulationSettings) -> Self {
        Self {
            settings,
            instances: RwLock::new(BTreeMap::new()),
        }
    }

    /// Create an instance with an all-dead grid, register it, and start it
    /// if `start` is set.
    ///
    /// Starting needs a Tokio runtime on the calling thread. Without one
    /// the instance is still registered, but stays stopped.
    pub fn create(
        &self,
        name: &str,
        dimensions: Dimensions,
        start: bool,
    ) -> Result<Arc<Simulation>, CreationError> {
        let sim = Simulation::new(name, dimensions, &self.settings)?;
        Ok(self.register(sim, start))
    }

    /// Create an instance from a sparse-seed buffer, register it, and start
    /// it if `start` is set.
    pub fn create_from_seed(
        &self,
        name: &str,
        seed: &[u8],
        start: bool,
    ) -> Result<Arc<Simulation>, CreationError> {
        let sim = Simulation::from_seed(name, seed, &self.settings)?;
        Ok(self.register(sim, start))
    }

    fn register(&self, sim: Simulation, start: bool) -> Arc<Simulation> {
        let sim = Arc::new(sim);
        self.instances.write().insert(sim.id(), Arc::clone(&sim));
        info!(
            instance = %sim.id(),
            name = sim.name(),
            dimensions = %sim.dimensions(),
            start,
            "instance created"
        );
        if start {
            if let Err(e) = sim.start() {
                warn!(error = %e, "new instance could not be started");
            }
        }
        sim
    }

    /// Look up an instance by id.
    pub fn get(&self, id: InstanceId) -> Option<Arc<Simulation>> {
        self.instances.read().get(&id).cloned()
    }

    /// Every instance, in creation order.
    pub fn instances(&self) -> Vec<Arc<Simulation>> {
        self.instances.read().values().cloned().collect()
    }

    /// Summaries of every instance, in creation order.
    pub fn list(&self) -> Vec<InstanceSummary> {
        self.instances().iter().map(|sim| sim.summary()).collect()
    }

    /// Number of registered instances.
    pub fn len(&self) -> usize {
        self.instances.read().len()
    }

    /// Whether no instances are registered.
    pub fn is_empty(&self) -> bool {
        self.instances.read().is_empty()
    }

    /// Ask every running instance to stop. Returns how many were running.
    pub fn stop_all(&self) -> usize {
        self.instances().iter().filter(|sim| sim.stop()).count()
    }
}

impl Default for Directory {
    fn default() -> Self {
        Self::new(SimulationSettings::default())
    }
}
