//! Rotation Moves
//!
//! The puzzle's entire move vocabulary: a single move cyclically shifts one
//! row or one column of the grid. Solve results arrive as ordered sequences
//! of these moves, and a serialized form of the sequence is stored alongside
//! each hiscore entry.

use serde::{Deserialize, Serialize};

/// Which line of the grid a rotation shifts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// A horizontal line, shifted left/right.
    Row,
    /// A vertical line, shifted up/down.
    Col,
}

/// A single rotation move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rotation {
    /// Row or column.
    pub axis: Axis,
    /// Zero-based index of the shifted line.
    pub index: u8,
    /// Signed shift amount; positive shifts right (rows) or down (columns).
    pub turns: i8,
}

impl Rotation {
    /// Shift row `index` by `turns`.
    pub fn row(index: u8, turns: i8) -> Self {
        Self { axis: Axis::Row, index, turns }
    }

    /// Shift column `index` by `turns`.
    pub fn col(index: u8, turns: i8) -> Self {
        Self { axis: Axis::Col, index, turns }
    }

    /// The move that undoes this one.
    pub fn inverse(&self) -> Self {
        Self { axis: self.axis, index: self.index, turns: -self.turns }
    }
}

/// Serialize a move sequence to the JSON string stored with a hiscore entry.
pub fn serialize_sequence(rotations: &[Rotation]) -> Result<String, serde_json::Error> {
    serde_json::to_string(rotations)
}
