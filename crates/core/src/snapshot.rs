//! Snapshot - an owned, copyable view of a session for presentation
//!
//! The renderer never borrows the session; it reads one of these, filled with
//! [`GameSession::snapshot_into`](crate::session::GameSession::snapshot_into).

use crate::piece::ActivePiece;
use crate::types::{Cell, GameStatus, PieceKind, Pos, Rotation, BOARD_HEIGHT, BOARD_WIDTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActiveSnapshot {
    pub kind: PieceKind,
    pub rotation: Rotation,
    pub cells: [Pos; 4],
}

impl From<ActivePiece> for ActiveSnapshot {
    fn from(value: ActivePiece) -> Self {
        Self {
            kind: value.kind,
            rotation: value.rotation,
            cells: value.cells,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GameSnapshot {
    /// Locked cells, `board[y][x]`.
    pub board: [[Cell; BOARD_WIDTH as usize]; BOARD_HEIGHT as usize],
    pub active: Option<ActiveSnapshot>,
    /// Landing cells of the active piece; `None` when the drop shadow is off.
    pub ghost: Option<[Pos; 4]>,
    pub next_kind: PieceKind,
    pub score: u32,
    pub level: u8,
    pub lines_cleared: u16,
    pub status: GameStatus,
}

impl GameSnapshot {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn playable(&self) -> bool {
        self.status == GameStatus::Playing
    }

    pub fn paused(&self) -> bool {
        self.status == GameStatus::Paused
    }

    pub fn game_over(&self) -> bool {
        self.status == GameStatus::Lost
    }

    /// Locked cell at `(x, y)`, `None` when empty or out of range.
    pub fn cell(&self, x: usize, y: usize) -> Cell {
        self.board.get(y).and_then(|row| row.get(x)).copied().flatten()
    }
}

impl Default for GameSnapshot {
    fn default() -> Self {
        Self {
            board: [[None; BOARD_WIDTH as usize]; BOARD_HEIGHT as usize],
            active: None,
            ghost: None,
            next_kind: PieceKind::Square,
            score: 0,
            level: 1,
            lines_cleared: 0,
            status: GameStatus::Playing,
        }
    }
}
