//! Piece module - the active tetromino and its pure geometry
//!
//! An [`ActivePiece`] stores absolute cells rather than an origin: `cells[0]` is
//! the pivot and the other three are always the pattern for `(kind, rotation)`
//! translated by it. Every operation here is pure; the session validates a
//! candidate against the board before committing it.

use crate::board::Board;
use crate::shape::get_shape;
use crate::types::{PieceKind, Pos, Rotation};

/// Pivot position for a freshly spawned LINE.
pub const LINE_SPAWN: Pos = Pos::new(4, 0);

/// Pivot position for every other freshly spawned kind.
pub const SPAWN: Pos = Pos::new(5, 1);

/// Active falling piece
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActivePiece {
    pub kind: PieceKind,
    pub rotation: Rotation,
    pub cells: [Pos; 4],
}

impl ActivePiece {
    /// Create a new piece at its spawn position, rotation 0
    ///
    /// ```
    /// use blockfall_core::ActivePiece;
    /// use blockfall_core::types::{PieceKind, Pos};
    ///
    /// let line = ActivePiece::spawn(PieceKind::Line);
    /// assert_eq!(line.pivot(), Pos::new(4, 0));
    /// assert!(line.cells.iter().all(|c| c.y == 0));
    /// ```
    pub fn spawn(kind: PieceKind) -> Self {
        let pivot = match kind {
            PieceKind::Line => LINE_SPAWN,
            _ => SPAWN,
        };
        Self::at(kind, Rotation::North, pivot)
    }

    /// Build a piece with its pivot at `pivot`.
    pub fn at(kind: PieceKind, rotation: Rotation, pivot: Pos) -> Self {
        Self {
            kind,
            rotation,
            cells: cells_at(kind, rotation, pivot),
        }
    }

    pub fn pivot(&self) -> Pos {
        self.cells[0]
    }

    /// Candidate cells after a translation. Does not mutate.
    pub fn translated(&self, dx: i8, dy: i8) -> [Pos; 4] {
        self.cells.map(|p| p.offset(dx, dy))
    }

    /// Commit a translation.
    pub fn shift_by(&mut self, dx: i8, dy: i8) {
        self.cells = self.translated(dx, dy);
    }

    /// Check if all minos are at valid positions on the board
    pub fn fits(&self, board: &Board) -> bool {
        board.fits(&self.cells)
    }

    /// Moving down one row keeps every cell in bounds and unoccupied.
    pub fn can_drop(&self, board: &Board) -> bool {
        board.fits(&self.translated(0, 1))
    }

    /// Any cell sits in the top row.
    pub fn touches_top(&self) -> bool {
        self.cells.iter().any(|p| p.y == 0)
    }
}

/// Absolute cells of `(kind, rotation)` with the pivot at `pivot`.
pub fn cells_at(kind: PieceKind, rotation: Rotation, pivot: Pos) -> [Pos; 4] {
    get_shape(kind, rotation).map(|(dx, dy)| pivot.offset(dx, dy))
}

/// Largest `n` such that the piece moved down `n` rows still fits
///
/// Probes one row at a time until blocked.
pub fn max_drop(piece: &ActivePiece, board: &Board) -> u8 {
    let mut drop_distance: u8 = 0;
    while board.fits(&piece.translated(0, drop_distance as i8 + 1)) {
        drop_distance += 1;
    }
    drop_distance
}
