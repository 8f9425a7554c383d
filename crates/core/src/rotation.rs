//! Rotation resolver - SRS kick search
//!
//! Given the active piece, a spin direction and the board, compute the accepted
//! post-rotation cells or report rejection. Nothing here mutates the session;
//! the caller commits a [`RotationResult::Rotated`] piece.

use crate::board::Board;
use crate::piece::ActivePiece;
use crate::shape::{base_shape, kick_shift, kick_table, rotate_offset};
use crate::types::{PieceKind, Pos, Spin};

/// Number of kick candidates tried per rotation.
pub const KICK_CANDIDATES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationResult {
    /// SQUARE: accepted, nothing moves.
    Unchanged,
    /// Accepted with the candidate at `kick_index`.
    Rotated {
        piece: ActivePiece,
        kick_index: usize,
    },
    /// No candidate fits.
    Rejected,
}

/// Cells after rotating about the unchanged pivot, before any kick.
pub fn unkicked_cells(piece: &ActivePiece, spin: Spin) -> [Pos; 4] {
    let to = piece.rotation.rotate(spin);
    let pivot = piece.pivot();
    base_shape(piece.kind).map(|(dx, dy)| {
        let (rx, ry) = rotate_offset(dx, dy, to);
        pivot.offset(rx, ry)
    })
}

/// Try to rotate a piece with wall kicks
///
/// Candidates are tried in table order and the first one that fits wins.
pub fn try_rotate(piece: &ActivePiece, spin: Spin, board: &Board) -> RotationResult {
    let Some(table) = kick_table(piece.kind) else {
        debug_assert_eq!(piece.kind, PieceKind::Square);
        return RotationResult::Unchanged;
    };

    let from = piece.rotation;
    let to = from.rotate(spin);
    let unkicked = unkicked_cells(piece, spin);

    for kick_index in 0..KICK_CANDIDATES {
        let (dx, dy) = kick_shift(table, from, to, kick_index);
        let candidate = unkicked.map(|p| p.offset(dx, dy));
        if board.fits(&candidate) {
            return RotationResult::Rotated {
                piece: ActivePiece {
                    kind: piece.kind,
                    rotation: to,
                    cells: candidate,
                },
                kick_index,
            };
        }
    }

    RotationResult::Rejected
}
