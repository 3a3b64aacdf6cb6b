//! Reference Board
//!
//! An N×N grid of tiles scrambled by a fixed rotation sequence. A submitted
//! sequence solves the board when replaying it against the scrambled
//! position restores ascending tile order. This is the board used by the
//! demo binary and the test suite; production boards live in the panel
//! layer and only need to satisfy [`Board`].

use crate::board::Board;
use crate::core::rotation::{Axis, Rotation};

/// A scrambled loop-grid puzzle board.
///
/// Grid sizes 2..=15 are supported (tiles are stored as `u8`).
#[derive(Debug, Clone)]
pub struct LoopGridBoard {
    name: String,
    size: u8,
    scramble: Vec<Rotation>,
}

impl LoopGridBoard {
    /// Create a board of `size` × `size` tiles scrambled by `scramble`.
    pub fn new(name: impl Into<String>, size: u8, scramble: Vec<Rotation>) -> Self {
        debug_assert!((2..=15).contains(&size));
        Self {
            name: name.into(),
            size,
            scramble,
        }
    }

    /// Grid side length.
    pub fn size(&self) -> u8 {
        self.size
    }

    /// The sequence that undoes the scramble (useful for demos and tests).
    pub fn solution(&self) -> Vec<Rotation> {
        self.scramble.iter().rev().map(Rotation::inverse).collect()
    }

    /// Tile layout after the scramble has been applied to a sorted grid.
    fn scrambled_tiles(&self) -> Vec<u8> {
        let n = self.size as usize;
        let mut tiles: Vec<u8> = (0..(n * n) as u8).collect();
        for rotation in &self.scramble {
            // The scramble is trusted; out-of-range lines are a bug.
            let applied = apply(&mut tiles, n, rotation);
            debug_assert!(applied);
        }
        tiles
    }
}

impl Board for LoopGridBoard {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_solved_by(&self, rotations: &[Rotation]) -> bool {
        let n = self.size as usize;
        let mut tiles = self.scrambled_tiles();
        for rotation in rotations {
            if !apply(&mut tiles, n, rotation) {
                // A move referencing a line outside the grid solves nothing.
                return false;
            }
        }
        tiles.windows(2).all(|pair| pair[0] <= pair[1])
    }
}

/// Apply one rotation in place. Returns false if `rotation.index` is
/// outside the grid.
fn apply(tiles: &mut [u8], size: usize, rotation: &Rotation) -> bool {
    let index = rotation.index as usize;
    if index >= size {
        return false;
    }
    let shift = (rotation.turns as isize).rem_euclid(size as isize) as usize;

    match rotation.axis {
        Axis::Row => {
            tiles[index * size..(index + 1) * size].rotate_right(shift);
        }
        Axis::Col => {
            let mut column: Vec<u8> = (0..size).map(|row| tiles[row * size + index]).collect();
            column.rotate_right(shift);
            for (row, tile) in column.into_iter().enumerate() {
                tiles[row * size + index] = tile;
            }
        }
    }
    true
}
