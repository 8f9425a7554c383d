//! Persistence - saved game records and their codecs
//!
//! A saved game is two parts, kept apart so each fits a small storage slot:
//!
//! - [`SaveRecord`]: piece, counters and next kind (12 bytes in binary form).
//! - [`SavedGrid`]: occupancy and colour per cell, column-major, each a
//!   200-byte blob. Empty cells carry colour [`EMPTY_COLOR`].
//!
//! Both are serde types, so the runner can also store the pair as JSON.
//! Restoring validates everything; a corrupt save never produces a session
//! that breaks the board invariants.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::board::Board;
use crate::config::EngineConfig;
use crate::piece::ActivePiece;
use crate::session::{Changed, GameSession, Outcome};
use crate::types::{
    GameStatus, PieceKind, Pos, Rotation, BOARD_HEIGHT, BOARD_WIDTH, MAX_LEVEL, MIN_LEVEL,
    SCORE_CAP,
};

const W: usize = BOARD_WIDTH as usize;
const H: usize = BOARD_HEIGHT as usize;

/// Colour value of an empty cell.
pub const EMPTY_COLOR: u8 = 255;

/// `block_type` value meaning no active piece.
pub const NO_PIECE: i8 = -1;

/// Size of [`SaveRecord::to_bytes`].
pub const RECORD_LEN: usize = 12;

/// Size of each grid blob.
pub const GRID_BLOB_LEN: usize = W * H;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("{what}: expected {expected} bytes, found {found}")]
    WrongLength {
        what: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("invalid piece kind {0}")]
    InvalidKind(i8),
    #[error("invalid rotation {0}")]
    InvalidRotation(u8),
    #[error("invalid level {0}")]
    InvalidLevel(u8),
    #[error("invalid colour {color} at ({x}, {y})")]
    InvalidColor { x: usize, y: usize, color: u8 },
    #[error("occupancy and colour disagree at ({x}, {y})")]
    GridMismatch { x: usize, y: usize },
    #[error("active piece is outside the board")]
    PieceOutOfBounds,
    #[error("active piece overlaps locked cells")]
    PieceOverlaps,
    #[error("malformed save: {0}")]
    Json(#[from] serde_json::Error),
}

/// Piece and counters of a saved game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveRecord {
    pub rotation: u8,
    /// Kind index of the active piece, or [`NO_PIECE`].
    pub block_type: i8,
    pub next_block_type: i8,
    /// Pivot cell of the active piece.
    pub anchor: (i8, i8),
    pub lines_cleared: u16,
    pub level: u8,
    pub score: u32,
}

impl SaveRecord {
    /// Little-endian layout:
    /// `[rotation, block_type, next_block_type, anchor.x, anchor.y, level, lines(2), score(4)]`.
    pub fn to_bytes(&self) -> [u8; RECORD_LEN] {
        let mut out = [0u8; RECORD_LEN];
        out[0] = self.rotation;
        out[1] = self.block_type as u8;
        out[2] = self.next_block_type as u8;
        out[3] = self.anchor.0 as u8;
        out[4] = self.anchor.1 as u8;
        out[5] = self.level;
        out[6..8].copy_from_slice(&self.lines_cleared.to_le_bytes());
        out[8..12].copy_from_slice(&self.score.to_le_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PersistError> {
        let bytes: &[u8; RECORD_LEN] = bytes.try_into().map_err(|_| PersistError::WrongLength {
            what: "save record",
            expected: RECORD_LEN,
            found: bytes.len(),
        })?;
        Ok(Self {
            rotation: bytes[0],
            block_type: bytes[1] as i8,
            next_block_type: bytes[2] as i8,
            anchor: (bytes[3] as i8, bytes[4] as i8),
            level: bytes[5],
            lines_cleared: u16::from_le_bytes([bytes[6], bytes[7]]),
            score: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
        })
    }
}

/// Locked cells of a saved game, indexed `[x][y]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedGrid {
    pub blocks: [[bool; H]; W],
    pub colors: [[u8; H]; W],
}

impl SavedGrid {
    pub fn empty() -> Self {
        Self {
            blocks: [[false; H]; W],
            colors: [[EMPTY_COLOR; H]; W],
        }
    }

    pub fn from_board(board: &Board) -> Self {
        let mut grid = Self::empty();
        for (y, row) in board.rows().enumerate() {
            for (x, cell) in row.iter().enumerate() {
                if let Some(kind) = cell {
                    grid.blocks[x][y] = true;
                    grid.colors[x][y] = kind.index();
                }
            }
        }
        grid
    }

    /// Occupancy flags, column-major, one byte per cell.
    pub fn blocks_blob(&self) -> [u8; GRID_BLOB_LEN] {
        let mut out = [0u8; GRID_BLOB_LEN];
        for (x, column) in self.blocks.iter().enumerate() {
            for (y, &filled) in column.iter().enumerate() {
                out[x * H + y] = filled as u8;
            }
        }
        out
    }

    /// Colour indices, column-major, one byte per cell.
    pub fn colors_blob(&self) -> [u8; GRID_BLOB_LEN] {
        let mut out = [0u8; GRID_BLOB_LEN];
        for (x, column) in self.colors.iter().enumerate() {
            out[x * H..(x + 1) * H].copy_from_slice(column);
        }
        out
    }

    pub fn from_blobs(blocks: &[u8], colors: &[u8]) -> Result<Self, PersistError> {
        for (what, blob) in [("block grid", blocks), ("colour grid", colors)] {
            if blob.len() != GRID_BLOB_LEN {
                return Err(PersistError::WrongLength {
                    what,
                    expected: GRID_BLOB_LEN,
                    found: blob.len(),
                });
            }
        }
        let mut grid = Self::empty();
        for x in 0..W {
            for y in 0..H {
                grid.blocks[x][y] = blocks[x * H + y] != 0;
                grid.colors[x][y] = colors[x * H + y];
            }
        }
        Ok(grid)
    }

    /// Validate and convert to a board.
    pub fn to_board(&self) -> Result<Board, PersistError> {
        let mut board = Board::new();
        for x in 0..W {
            for y in 0..H {
                let color = self.colors[x][y];
                let cell = match (self.blocks[x][y], color) {
                    (false, EMPTY_COLOR) => None,
                    (true, EMPTY_COLOR) | (false, _) => {
                        return Err(PersistError::GridMismatch { x, y })
                    }
                    (true, c) => Some(
                        PieceKind::from_index(c)
                            .ok_or(PersistError::InvalidColor { x, y, color })?,
                    ),
                };
                board.set(Pos::new(x as i8, y as i8), cell);
            }
        }
        Ok(board)
    }
}

impl Default for SavedGrid {
    fn default() -> Self {
        Self::empty()
    }
}

/// Everything needed to continue a game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedGame {
    pub record: SaveRecord,
    pub grid: SavedGrid,
}

impl SavedGame {
    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(s: &str) -> Result<Self, PersistError> {
        Ok(serde_json::from_str(s)?)
    }
}

fn kind_from_record(value: i8) -> Result<PieceKind, PersistError> {
    u8::try_from(value)
        .ok()
        .and_then(PieceKind::from_index)
        .ok_or(PersistError::InvalidKind(value))
}

impl GameSession {
    /// State worth saving; a lost game has none.
    pub fn saved_state(&self) -> Option<SavedGame> {
        if self.status == GameStatus::Lost {
            return None;
        }
        let (block_type, rotation, anchor) = match self.active {
            Some(piece) => {
                let pivot = piece.pivot();
                (piece.kind.index() as i8, piece.rotation.index(), (pivot.x, pivot.y))
            }
            None => (NO_PIECE, 0, (0, 0)),
        };
        Some(SavedGame {
            record: SaveRecord {
                rotation,
                block_type,
                next_block_type: self.next_kind.index() as i8,
                anchor,
                lines_cleared: self.lines_cleared,
                level: self.level,
                score: self.score,
            },
            grid: SavedGrid::from_board(&self.board),
        })
    }

    /// Rebuild a session from a save without arming anything
    ///
    /// The session is Playing; no lock delay is pending. `seed` drives the
    /// kinds drawn after the saved next kind.
    pub fn from_saved(
        saved: &SavedGame,
        seed: u32,
        config: EngineConfig,
    ) -> Result<Self, PersistError> {
        let record = &saved.record;
        if !(MIN_LEVEL..=MAX_LEVEL).contains(&record.level) {
            return Err(PersistError::InvalidLevel(record.level));
        }
        let next_kind = kind_from_record(record.next_block_type)?;
        let board = saved.grid.to_board()?;

        let active = if record.block_type == NO_PIECE {
            None
        } else {
            let kind = kind_from_record(record.block_type)?;
            if record.rotation > 3 {
                return Err(PersistError::InvalidRotation(record.rotation));
            }
            let pivot = Pos::new(record.anchor.0, record.anchor.1);
            // Pattern offsets are at most 2, so an in-bounds pivot cannot overflow.
            if !Board::in_bounds(pivot) {
                return Err(PersistError::PieceOutOfBounds);
            }
            let piece = ActivePiece::at(kind, Rotation::from_index(record.rotation), pivot);
            if !piece.cells.iter().all(|&p| Board::in_bounds(p)) {
                return Err(PersistError::PieceOutOfBounds);
            }
            if !piece.fits(&board) {
                return Err(PersistError::PieceOverlaps);
            }
            Some(piece)
        };

        Ok(Self::restored(
            board,
            active,
            next_kind,
            (record.score.min(SCORE_CAP), record.lines_cleared, record.level),
            seed,
            config,
        ))
    }

    /// Restore a saved game and set it running
    ///
    /// Gravity is armed at the saved level's interval. A save taken between a
    /// lock and the next spawn gets its piece immediately.
    pub fn continue_game(
        saved: &SavedGame,
        seed: u32,
        config: EngineConfig,
    ) -> Result<(Self, Outcome), PersistError> {
        let mut session = Self::from_saved(saved, seed, config)?;
        let mut out = Outcome::default();
        if session.active.is_none() {
            session.spawn_next(&mut out);
        }
        if session.status == GameStatus::Playing {
            session.arm_gravity(&mut out);
        }
        out.changed = Changed {
            board: true,
            piece: true,
            stats: true,
            status: true,
        };
        info!(
            score = session.score,
            level = session.level,
            lines = session.lines_cleared,
            "continued saved game"
        );
        Ok((session, out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> SaveRecord {
        SaveRecord {
            rotation: 1,
            block_type: PieceKind::T.index() as i8,
            next_block_type: PieceKind::Line.index() as i8,
            anchor: (4, 7),
            lines_cleared: 513,
            level: 7,
            score: 123_456,
        }
    }

    #[test]
    fn record_byte_layout() {
        let bytes = record().to_bytes();
        assert_eq!(bytes, [1, 6, 1, 4, 7, 7, 0x01, 0x02, 0x40, 0xE2, 0x01, 0x00]);
        assert_eq!(SaveRecord::from_bytes(&bytes).expect("decode"), record());
    }

    #[test]
    fn no_piece_survives_byte_codec() {
        let mut r = record();
        r.block_type = NO_PIECE;
        let decoded = SaveRecord::from_bytes(&r.to_bytes()).expect("decode");
        assert_eq!(decoded.block_type, NO_PIECE);
    }

    #[test]
    fn short_record_is_rejected() {
        let err = SaveRecord::from_bytes(&[0u8; 5]).unwrap_err();
        assert!(matches!(
            err,
            PersistError::WrongLength {
                expected: 12,
                found: 5,
                ..
            }
        ));
    }

    #[test]
    fn grid_blobs_are_column_major() {
        let mut grid = SavedGrid::empty();
        grid.blocks[1][0] = true;
        grid.colors[1][0] = PieceKind::Z.index();

        let blocks = grid.blocks_blob();
        let colors = grid.colors_blob();
        assert_eq!(blocks[H], 1);
        assert_eq!(colors[H], 5);
        assert_eq!(colors[0], EMPTY_COLOR);
        assert_eq!(SavedGrid::from_blobs(&blocks, &colors).expect("decode"), grid);
    }

    #[test]
    fn grid_validation() {
        let mut grid = SavedGrid::empty();
        grid.blocks[2][3] = true;
        assert!(matches!(
            grid.to_board(),
            Err(PersistError::GridMismatch { x: 2, y: 3 })
        ));

        grid.colors[2][3] = 9;
        assert!(matches!(
            grid.to_board(),
            Err(PersistError::InvalidColor { color: 9, .. })
        ));

        grid.colors[2][3] = PieceKind::L.index();
        let board = grid.to_board().expect("valid");
        assert_eq!(board.get(Pos::new(2, 3)), Some(Some(PieceKind::L)));
    }

    #[test]
    fn restore_rejects_bad_records() {
        let grid = SavedGrid::empty();
        let cases = [
            (SaveRecord { level: 0, ..record() }, "level"),
            (SaveRecord { level: 11, ..record() }, "level"),
            (SaveRecord { block_type: 7, ..record() }, "kind"),
            (SaveRecord { next_block_type: -1, ..record() }, "kind"),
            (SaveRecord { rotation: 4, ..record() }, "rotation"),
            (SaveRecord { anchor: (9, 7), ..record() }, "bounds"),
        ];
        for (record, label) in cases {
            let saved = SavedGame {
                record,
                grid: grid.clone(),
            };
            let result = GameSession::from_saved(&saved, 1, EngineConfig::default());
            assert!(result.is_err(), "{label} case accepted: {record:?}");
        }
    }

    #[test]
    fn restore_rejects_overlap() {
        let mut grid = SavedGrid::empty();
        grid.blocks[4][7] = true;
        grid.colors[4][7] = 0;
        let saved = SavedGame {
            record: record(),
            grid,
        };
        assert!(matches!(
            GameSession::from_saved(&saved, 1, EngineConfig::default()),
            Err(PersistError::PieceOverlaps)
        ));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(matches!(
            SavedGame::from_json("{\"record\": 3}"),
            Err(PersistError::Json(_))
        ));
    }
}
