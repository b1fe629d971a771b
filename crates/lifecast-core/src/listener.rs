//! Per-instance registry of subscriber sinks.
//!
//! A sink is the sending half of a bounded [`mpsc`] queue owned by one
//! transport (a `WebSocket` task). Broadcasting never waits: each frame is
//! offered with `try_send`, so a slow or stalled transport only loses its
//! own frames and cannot hold up the others or the run loop.
//!
//! The registry itself is not synchronized. It lives inside
//! [`Simulation`](crate::simulation::Simulation)'s state and is only ever
//! touched under that instance's lock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use lifecast_types::InstanceId;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

use crate::error::DeliveryError;

static NEXT_LISTENER: AtomicU64 = AtomicU64::new(1);

/// Identity of one registered sink. Removal is by identity, never by
/// position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    /// Allocate a process-unique listener identity.
    pub fn next() -> Self {
        Self(NEXT_LISTENER.fetch_add(1, Ordering::Relaxed))
    }
}

impl core::fmt::Display for ListenerId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sending half of a listener's frame queue.
pub type FrameSink = mpsc::Sender<Bytes>;

/// Outcome of one broadcast round.
#[derive(Debug, Default)]
pub struct BroadcastReport {
    /// Number of sinks that accepted the frame.
    pub delivered: usize,
    /// Per-sink failures. Failing sinks remain registered.
    pub failures: Vec<DeliveryError>,
}

/// Set of sinks subscribed to one instance.
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    sinks: HashMap<ListenerId, FrameSink>,
}

impl ListenerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sink. Returns `false` if the identity was already present
    /// (the existing sink is replaced).
    pub fn insert(&mut self, id: ListenerId, sink: FrameSink) -> bool {
        self.sinks.insert(id, sink).is_none()
    }

    /// Remove a sink by identity. Returns whether it was registered.
    pub fn remove(&mut self, id: ListenerId) -> bool {
        self.sinks.remove(&id).is_some()
    }

    /// Whether a sink with this identity is registered.
    pub fn contains(&self, id: ListenerId) -> bool {
        self.sinks.contains_key(&id)
    }

    /// Number of registered sinks.
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Whether no sinks are registered.
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    /// Offer `frame` to one sink.
    pub fn deliver_to(
        &self,
        instance: InstanceId,
        id: ListenerId,
        frame: Bytes,
    ) -> Result<(), DeliveryError> {
        let Some(sink) = self.sinks.get(&id) else {
            return Err(DeliveryError::Closed {
                instance,
                listener: id,
            });
        };
        offer(instance, id, sink, frame)
    }

    /// Offer `frame` to every sink.
    ///
    /// A failure on one sink is logged and recorded in the report; the
    /// remaining sinks still receive the frame.
    pub fn broadcast(&self, instance: InstanceId, frame: &Bytes) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        for (id, sink) in &self.sinks {
            match offer(instance, *id, sink, frame.clone()) {
                Ok(()) => report.delivered = report.delivered.saturating_add(1),
                Err(e @ DeliveryError::Lagging { .. }) => {
                    debug!(error = %e, "frame dropped for slow listener");
                    report.failures.push(e);
                }
                Err(e) => {
                    warn!(error = %e, "frame delivery failed");
                    report.failures.push(e);
                }
            }
        }
        report
    }
}

fn offer(
    instance: InstanceId,
    listener: ListenerId,
    sink: &FrameSink,
    frame: Bytes,
) -> Result<(), DeliveryError> {
    sink.try_send(frame).map_err(|e| match e {
        TrySendError::Full(_) => DeliveryError::Lagging { instance, listener },
        TrySendError::Closed(_) => DeliveryError::Closed { instance, listener },
    })
}
