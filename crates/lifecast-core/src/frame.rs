//! Binary wire protocol spoken over each instance's live subscription
//! channel.
//!
//! Every message starts with a `u16` tag. All fixed-width fields in the
//! protocol, the tag included, are big-endian; the sparse-seed format in
//! [`crate::seed`] uses the same byte order.
//!
//! # Wire Format (protocol version 1)
//!
//! ```text
//! 0x0000  in   stop
//! 0x0001  in   start
//! 0x0002  in   reseed       [flags: u8][seed buffer: n * (u32 row, u32 col)]
//! 0x8000  out  stopped ack
//! 0x8001  out  started ack
//! 0x8002  out  world state  [epoch: u64][flags: u8 = 0][n * (u16 row, u16 col)]
//! 0x88FF  out  error        [UTF-8 message]
//! ```
//!
//! A world-state frame is a full snapshot of the live cells in row-major
//! order, not a diff, and carries no dimension header: receivers already
//! know the instance's size from creation. One frame is one transport
//! message.

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;

use crate::grid::Grid;

/// Version of the tag layout documented above.
pub const PROTOCOL_VERSION: u8 = 1;

/// Inbound: stop the instance.
pub const TAG_STOP: u16 = 0x0000;
/// Inbound: start the instance.
pub const TAG_START: u16 = 0x0001;
/// Inbound: replace the live cells of a stopped instance.
pub const TAG_RESEED: u16 = 0x0002;
/// Outbound: a stop request was applied.
pub const TAG_STOPPED: u16 = 0x8000;
/// Outbound: a start request was applied.
pub const TAG_STARTED: u16 = 0x8001;
/// Outbound: world-state snapshot.
pub const TAG_WORLD_STATE: u16 = 0x8002;
/// Outbound: a control request was refused.
pub const TAG_ERROR: u16 = 0x88FF;

/// Length of the fixed part of a world-state frame (tag, epoch, flags).
pub const WORLD_STATE_HEADER_LEN: usize = 2 + 8 + 1;

/// Errors from decoding a frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// The frame is shorter than its fixed header.
    #[error("frame of {len} bytes is truncated")]
    Truncated {
        /// Length of the rejected frame.
        len: usize,
    },

    /// The tag is not part of the protocol (or not valid in this
    /// direction).
    #[error("unknown tag 0x{0:04x}")]
    UnknownTag(u16),

    /// The variable-length body does not divide into whole coordinate
    /// pairs.
    #[error("world-state body of {len} bytes is not a whole number of cells")]
    RaggedBody {
        /// Length of the body after the fixed header.
        len: usize,
    },
}

/// A control request received from a listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlMessage {
    /// Stop the run loop.
    Stop,
    /// Start a fresh run loop.
    Start,
    /// Replace the grid's live cells.
    Reseed {
        /// Reserved flag byte.
        flags: u8,
        /// Sparse-seed buffer (see [`crate::seed`]).
        seed: Bytes,
    },
}

impl ControlMessage {
    /// Parse an inbound control frame.
    pub fn decode(frame: &[u8]) -> Result<Self, FrameError> {
        let (tag, body) = split_tag(frame)?;
        match tag {
            TAG_STOP => Ok(Self::Stop),
            TAG_START => Ok(Self::Start),
            TAG_RESEED => {
                let Some((&flags, seed)) = body.split_first() else {
                    return Err(FrameError::Truncated { len: frame.len() });
                };
                Ok(Self::Reseed {
                    flags,
                    seed: Bytes::copy_from_slice(seed),
                })
            }
            other => Err(FrameError::UnknownTag(other)),
        }
    }

    /// Encode this request the way a client sends it.
    pub fn encode(&self) -> Bytes {
        match self {
            Self::Stop => encode_tag(TAG_STOP),
            Self::Start => encode_tag(TAG_START),
            Self::Reseed { flags, seed } => {
                let mut buf = BytesMut::with_capacity(seed.len().saturating_add(3));
                buf.put_u16(TAG_RESEED);
                buf.put_u8(*flags);
                buf.put_slice(seed);
                buf.freeze()
            }
        }
    }
}

/// A decoded world-state frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorldState {
    /// Epoch the snapshot belongs to.
    pub epoch: u64,
    /// Reserved flag byte.
    pub flags: u8,
    /// Live cells as `(row, col)` in row-major order.
    pub cells: Vec<(u16, u16)>,
}

fn split_tag(frame: &[u8]) -> Result<(u16, &[u8]), FrameError> {
    let Some((tag, body)) = frame.split_first_chunk::<2>() else {
        return Err(FrameError::Truncated { len: frame.len() });
    };
    Ok((u16::from_be_bytes(*tag), body))
}

/// Encode a bare tag (used for acknowledgements).
pub fn encode_tag(tag: u16) -> Bytes {
    Bytes::copy_from_slice(&tag.to_be_bytes())
}

/// Encode an error frame carrying a human-readable message.
pub fn encode_error(message: &str) -> Bytes {
    let mut buf = BytesMut::with_capacity(message.len().saturating_add(2));
    buf.put_u16(TAG_ERROR);
    buf.put_slice(message.as_bytes());
    buf.freeze()
}

/// Encode a world-state frame for `grid` at `epoch`.
///
/// Coordinates are written as `u16`; instance dimensions are capped so
/// every in-bounds cell fits.
pub fn encode_world_state(epoch: u64, grid: &Grid) -> Bytes {
    let cells = grid.live_count();
    let mut buf =
        BytesMut::with_capacity(WORLD_STATE_HEADER_LEN.saturating_add(cells.saturating_mul(4)));
    buf.put_u16(TAG_WORLD_STATE);
    buf.put_u64(epoch);
    buf.put_u8(0);
    for (row, col) in grid.live_cells() {
        let (Ok(row), Ok(col)) = (u16::try_from(row), u16::try_from(col)) else {
            continue;
        };
        buf.put_u16(row);
        buf.put_u16(col);
    }
    buf.freeze()
}

/// Decode a world-state frame.
pub fn decode_world_state(frame: &[u8]) -> Result<WorldState, FrameError> {
    let (tag, body) = split_tag(frame)?;
    if tag != TAG_WORLD_STATE {
        return Err(FrameError::UnknownTag(tag));
    }
    let Some((epoch, rest)) = body.split_first_chunk::<8>() else {
        return Err(FrameError::Truncated { len: frame.len() });
    };
    let Some((&flags, points)) = rest.split_first() else {
        return Err(FrameError::Truncated { len: frame.len() });
    };
    if points.len() % 4 != 0 {
        return Err(FrameError::RaggedBody { len: points.len() });
    }
    let cells = points
        .chunks_exact(4)
        .filter_map(|p| {
            let (row, col) = p.split_first_chunk::<2>()?;
            let col = <[u8; 2]>::try_from(col).ok()?;
            Some((u16::from_be_bytes(*row), u16::from_be_bytes(col)))
        })
        .collect();
    Ok(WorldState {
        epoch: u64::from_be_bytes(*epoch),
        flags,
        cells,
    })
}
