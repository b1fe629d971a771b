//! Shared type definitions for the Lifecast simulation server.
//!
//! Types here cross crate boundaries: the core simulation produces them
//! and the HTTP layer serializes them. Nothing in this crate has behavior
//! beyond construction and formatting.

pub mod ids;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use ids::InstanceId;

/// Declared size of an instance's grid.
///
/// `width` counts columns and `height` counts rows. Both are fixed at
/// creation; receivers of world-state frames rely on them to size their
/// canvas because frames carry no dimension header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    /// Number of columns.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
}

impl Dimensions {
    /// Create a new dimension pair.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether either axis is zero.
    pub const fn is_degenerate(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl core::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Read-only view of one instance, as served by the listing endpoints.
///
/// Field names follow the JSON shape the browser client expects (`x` is
/// the width, `y` the height).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceSummary {
    /// Instance identifier.
    pub id: InstanceId,
    /// Human-readable name given at creation.
    pub name: String,
    /// Declared width (columns).
    pub x: u32,
    /// Declared height (rows).
    pub y: u32,
    /// Whether a run loop is currently driving the instance.
    pub is_running: bool,
    /// Number of generations committed so far.
    pub epoch: u64,
    /// Why the instance last halted, if it has.
    pub reason: Option<String>,
    /// Number of live cells in the current generation.
    pub live_cells: u64,
    /// Wall-clock creation time.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_dimensions() {
        assert!(Dimensions::new(0, 5).is_degenerate());
        assert!(Dimensions::new(5, 0).is_degenerate());
        assert!(!Dimensions::new(1, 1).is_degenerate());
    }

    #[test]
    fn dimensions_display() {
        assert_eq!(Dimensions::new(40, 30).to_string(), "40x30");
    }

    #[test]
    fn summary_uses_camel_case() {
        let summary = InstanceSummary {
            id: InstanceId::new(),
            name: String::from("glider"),
            x: 10,
            y: 8,
            is_running: true,
            epoch: 3,
            reason: None,
            live_cells: 5,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&summary).ok();
        let json = json.as_ref();
        assert_eq!(json.and_then(|v| v.get("isRunning")), Some(&serde_json::json!(true)));
        assert_eq!(json.and_then(|v| v.get("liveCells")), Some(&serde_json::json!(5)));
    }
}
