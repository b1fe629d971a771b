//! Sparse-seed buffer decoding.
//!
//! A seed buffer lists live cells without transmitting the whole grid.
//! Each cell occupies one 8-byte unit: a big-endian `u32` row followed by
//! a big-endian `u32` column. Any length that is not a multiple of 8 is a
//! structural failure.
//!
//! Seeds are used two ways. [`decode_seed`] builds a fresh grid whose
//! dimensions grow to fit the largest coordinate seen, which is how an
//! instance is created from a seed. [`decode_coordinates`] only parses,
//! leaving it to [`Simulation::reseed`](crate::simulation::Simulation::reseed)
//! to check the cells against an existing instance's declared size.

use crate::error::SeedError;
use crate::grid::Grid;

/// Size in bytes of one `(row, col)` unit.
pub const SEED_UNIT_LEN: usize = 8;

/// Parse a seed buffer into `(row, col)` pairs in buffer order.
///
/// Coordinates at or beyond `limit` are rejected so that a hostile buffer
/// cannot force an enormous allocation.
pub fn decode_coordinates(data: &[u8], limit: u32) -> Result<Vec<(u32, u32)>, SeedError> {
    if data.len() % SEED_UNIT_LEN != 0 {
        return Err(SeedError::Length { len: data.len() });
    }

    let mut cells = Vec::with_capacity(data.len() / SEED_UNIT_LEN);
    for unit in data.chunks_exact(SEED_UNIT_LEN) {
        let (row_bytes, col_bytes) = unit.split_at(4);
        let (Ok(row_bytes), Ok(col_bytes)) =
            (<[u8; 4]>::try_from(row_bytes), <[u8; 4]>::try_from(col_bytes))
        else {
            return Err(SeedError::Length { len: data.len() });
        };
        let row = u32::from_be_bytes(row_bytes);
        let col = u32::from_be_bytes(col_bytes);
        if row >= limit || col >= limit {
            return Err(SeedError::CoordinateOutOfRange { row, col, limit });
        }
        cells.push((row, col));
    }
    Ok(cells)
}

/// Decode a seed buffer into a grid just large enough to hold every cell.
///
/// An empty buffer yields a degenerate (0x0) grid; rejecting that is the
/// caller's decision.
pub fn decode_seed(data: &[u8], limit: u32) -> Result<Grid, SeedError> {
    let cells = decode_coordinates(data, limit)?;

    let rows = cells.iter().map(|(r, _)| r.saturating_add(1)).max().unwrap_or(0);
    let cols = cells.iter().map(|(_, c)| c.saturating_add(1)).max().unwrap_or(0);

    let mut grid = Grid::default();
    grid.extend_to(rows as usize, cols as usize);
    for (row, col) in cells {
        grid.set(row as usize, col as usize, true);
    }
    Ok(grid)
}

/// Encode `(row, col)` pairs as a seed buffer.
pub fn encode_seed(cells: &[(u32, u32)]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(cells.len().saturating_mul(SEED_UNIT_LEN));
    for (row, col) in cells {
        buf.extend_from_slice(&row.to_be_bytes());
        buf.extend_from_slice(&col.to_be_bytes());
    }
    buf
}
