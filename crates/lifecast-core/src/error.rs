//! Error types for the `lifecast-core` crate.
//!
//! Decode and creation failures are returned synchronously and never leave
//! an instance partially mutated. Terminal simulation outcomes are not
//! errors; they are recorded on the instance as a
//! [`Classification`](crate::step::Classification) and a reason string.

use lifecast_types::{Dimensions, InstanceId};

use crate::listener::ListenerId;

/// A sparse-seed buffer could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeedError {
    /// The buffer length is not a whole number of 8-byte coordinate units.
    #[error("invalid seed length {len}, must be a multiple of 8")]
    Length {
        /// Length of the rejected buffer.
        len: usize,
    },

    /// A coordinate lies at or beyond the largest permitted dimension.
    #[error("seed coordinate ({row}, {col}) exceeds the limit of {limit}")]
    CoordinateOutOfRange {
        /// Row of the offending cell.
        row: u32,
        /// Column of the offending cell.
        col: u32,
        /// Exclusive upper bound on either coordinate.
        limit: u32,
    },

    /// A reseed coordinate falls outside an instance's declared grid.
    #[error("seed coordinate ({row}, {col}) is outside the {dimensions} grid")]
    OutsideGrid {
        /// Row of the offending cell.
        row: u32,
        /// Column of the offending cell.
        col: u32,
        /// Declared dimensions of the target instance.
        dimensions: Dimensions,
    },
}

/// An instance could not be created.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CreationError {
    /// Width or height is zero.
    #[error("degenerate dimensions {0}")]
    Degenerate(Dimensions),

    /// Width or height exceeds the configured maximum.
    #[error("dimensions {dimensions} exceed the maximum of {limit}")]
    TooLarge {
        /// Requested dimensions.
        dimensions: Dimensions,
        /// Largest permitted value on either axis.
        limit: u32,
    },

    /// The seed buffer was malformed.
    #[error("invalid seed: {0}")]
    Seed(#[from] SeedError),
}

/// A frame could not be handed to one listener.
///
/// Delivery failures are isolated: the broadcast continues with the
/// remaining listeners and the failing listener stays registered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// The listener's queue is full (the transport is not keeping up).
    #[error("listener {listener} on {instance} is lagging, frame dropped")]
    Lagging {
        /// Instance being broadcast.
        instance: InstanceId,
        /// Listener that missed the frame.
        listener: ListenerId,
    },

    /// The listener's receiving side has gone away.
    #[error("listener {listener} on {instance} is closed")]
    Closed {
        /// Instance being broadcast.
        instance: InstanceId,
        /// Listener whose transport is gone.
        listener: ListenerId,
    },
}

/// An operation was refused because of the instance's current state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControlError {
    /// The instance is already being driven by a run loop.
    #[error("instance {0} is already running")]
    AlreadyRunning(InstanceId),

    /// Reseeding is only permitted while the instance is stopped.
    #[error("instance {0} is running, unable to reseed")]
    ReseedWhileRunning(InstanceId),

    /// No Tokio runtime was available to host the run loop.
    #[error("no async runtime to run on: {0}")]
    NoRuntime(String),

    /// The reseed buffer was malformed or did not fit the grid.
    #[error("invalid seed: {0}")]
    Seed(#[from] SeedError),
}
