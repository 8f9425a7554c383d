//! Shape module - tetromino patterns and SRS offset tables
//!
//! Every pattern is four `(dx, dy)` offsets from a pivot cell. Index 0 is the
//! pivot itself and never moves under rotation; the other three cells are
//! rotated about it in 90° steps with [`rotate_offset`].
//!
//! The kick tables are SRS offset tables (https://tetris.wiki/SRS, "how
//! guideline SRS really works") re-expressed for this crate's pivot cells and
//! y-down rows. A transition `from -> to` tries, for each index `i`, the shift
//! `table[from][i] - table[to][i]`.

use crate::types::{PieceKind, Rotation};

/// Offset of a single mino relative to the pivot
pub type MinoOffset = (i8, i8);

/// Shape of a piece - 4 mino offsets, pivot first
pub type PieceShape = [MinoOffset; 4];

/// Offset table: 5 candidate offsets for each of the 4 rotation states
pub type KickTable = [[MinoOffset; 5]; 4];

/// Spawn-orientation patterns, indexed by [`PieceKind::index`].
///
/// ```text
/// SQUARE  |2|3 |      LINE  |1|2|0*|3|      J  |1|
///         |1|0*|                                |2|0*|3|
///
/// L      |3|          S   |2 |1|            Z  |1|2 |
///  |1|0*|2|             |3|0*|                    |0*|3|
///
/// T   |3 |
///   |1|0*|2|
/// ```
const SHAPES: [PieceShape; 7] = [
    // SQUARE
    [(0, 0), (-1, 0), (-1, -1), (0, -1)],
    // LINE
    [(0, 0), (-2, 0), (-1, 0), (1, 0)],
    // J
    [(0, 0), (-1, -1), (-1, 0), (1, 0)],
    // L
    [(0, 0), (-1, 0), (1, 0), (1, -1)],
    // S
    [(0, 0), (1, -1), (0, -1), (-1, 0)],
    // Z
    [(0, 0), (-1, -1), (0, -1), (1, 0)],
    // T
    [(0, 0), (-1, 0), (1, 0), (0, -1)],
];

/// J, L, S, T, Z offsets.
pub const JLSTZ_OFFSETS: KickTable = [
    [(0, 0), (0, 0), (0, 0), (0, 0), (0, 0)],
    [(0, 0), (1, 0), (1, 1), (0, -2), (1, -2)],
    [(0, 0), (0, 0), (0, 0), (0, 0), (0, 0)],
    [(0, 0), (-1, 0), (-1, 1), (0, -2), (-1, -2)],
];

/// LINE offsets.
///
/// The guideline I table minus the drift `rotate_offset(1, 0, r)` caused by the
/// pivot sitting one cell right of the guideline rotation centre.
pub const LINE_OFFSETS: KickTable = [
    [(-1, 0), (-2, 0), (1, 0), (-2, 0), (1, 0)],
    [(-1, -1), (0, -1), (0, -1), (0, -2), (0, 1)],
    [(0, -1), (2, -1), (-1, -1), (2, 0), (-1, 0)],
    [(0, 0), (0, 0), (0, 0), (0, 2), (0, -1)],
];

/// Rotate an offset by `rotation` quarter turns clockwise (y grows downward).
///
/// ```
/// use blockfall_core::shape::rotate_offset;
/// use blockfall_core::types::Rotation;
///
/// assert_eq!(rotate_offset(1, 0, Rotation::East), (0, 1));
/// assert_eq!(rotate_offset(1, 0, Rotation::South), (-1, 0));
/// assert_eq!(rotate_offset(1, 0, Rotation::West), (0, -1));
/// ```
pub fn rotate_offset(dx: i8, dy: i8, rotation: Rotation) -> MinoOffset {
    match rotation {
        Rotation::North => (dx, dy),
        Rotation::East => (-dy, dx),
        Rotation::South => (-dx, -dy),
        Rotation::West => (dy, -dx),
    }
}

/// Spawn-orientation pattern for a kind.
pub fn base_shape(kind: PieceKind) -> &'static PieceShape {
    &SHAPES[kind.index() as usize]
}

/// Get the shape (mino offsets) for a piece kind and rotation
///
/// SQUARE ignores the rotation.
pub fn get_shape(kind: PieceKind, rotation: Rotation) -> PieceShape {
    let base = base_shape(kind);
    if kind == PieceKind::Square {
        return *base;
    }
    let mut out = *base;
    for (slot, &(dx, dy)) in out.iter_mut().zip(base.iter()) {
        *slot = rotate_offset(dx, dy, rotation);
    }
    out
}

/// Kick table for a kind, or `None` for SQUARE which never kicks.
pub fn kick_table(kind: PieceKind) -> Option<&'static KickTable> {
    match kind {
        PieceKind::Square => None,
        PieceKind::Line => Some(&LINE_OFFSETS),
        _ => Some(&JLSTZ_OFFSETS),
    }
}

/// Shift to apply for candidate `index` of the `from -> to` transition.
pub fn kick_shift(table: &KickTable, from: Rotation, to: Rotation, index: usize) -> MinoOffset {
    let (fx, fy) = table[from.index() as usize][index];
    let (tx, ty) = table[to.index() as usize][index];
    (fx - tx, fy - ty)
}
