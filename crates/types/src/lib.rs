//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the workspace.
//! All types are plain data with no I/O, so they can be used by the engine,
//! the scheduler, the terminal renderer and the persistence layer alike.
//!
//! # Board Dimensions
//!
//! - **Width**: 10 columns (indexed 0-9)
//! - **Height**: 20 rows (indexed 0-19, row 0 is the top)
//!
//! # Timing Constants
//!
//! Timing values are in milliseconds:
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `GRAVITY_BASE_MS` | 600 | Gravity interval at level 1 |
//! | `GRAVITY_STEP_MS` | 40 | Interval shrink per level |
//! | `LOCK_DELAY_MS` | 500 | Grace period before a resting piece locks |
//! | `LOCK_RESET_LIMIT` | 15 | Max lock delay resets while resting |
//! | `AUTO_REPEAT_MS` | 200 | Repeat rate while a direction is held |
//!
//! # Examples
//!
//! ```
//! use blockfall_types::{PieceKind, Rotation, Command, BOARD_WIDTH, BOARD_HEIGHT};
//!
//! let piece = PieceKind::T;
//! assert_eq!(piece.index(), 6);
//! assert_eq!(PieceKind::from_index(6), Some(piece));
//!
//! assert_eq!(Rotation::North.rotate_cw(), Rotation::East);
//! assert_eq!(Rotation::North.rotate_ccw(), Rotation::West);
//!
//! assert_eq!(Command::HardDrop.as_str(), "hardDrop");
//!
//! assert_eq!(BOARD_WIDTH, 10);
//! assert_eq!(BOARD_HEIGHT, 20);
//! ```

/// Board width in cells (10 columns)
pub const BOARD_WIDTH: u8 = 10;

/// Board height in cells (20 rows)
pub const BOARD_HEIGHT: u8 = 20;

/// Gravity interval at level 1.
pub const GRAVITY_BASE_MS: u32 = 600;

/// Gravity interval reduction per level gained.
pub const GRAVITY_STEP_MS: u32 = 40;

/// Lock delay when the active piece is resting on an obstruction.
pub const LOCK_DELAY_MS: u32 = 500;

/// Maximum number of lock delay resets while a piece is resting.
pub const LOCK_RESET_LIMIT: u8 = 15;

/// Interval between repeated moves while a direction is held.
pub const AUTO_REPEAT_MS: u32 = 200;

/// Starting level of a fresh game.
pub const MIN_LEVEL: u8 = 1;

/// Highest reachable level.
pub const MAX_LEVEL: u8 = 10;

/// Lines needed per level step.
pub const LINES_PER_LEVEL: u16 = 10;

/// Score ceiling; the score saturates here.
pub const SCORE_CAP: u32 = 999_999;

/// Line clear scoring table (classic scoring)
///
/// Base points for clearing N lines at once, multiplied by the current level:
/// - 1 line: 40 points
/// - 2 lines: 100 points
/// - 3 lines: 300 points
/// - 4 lines: 1200 points
pub const LINE_SCORES: [u32; 5] = [0, 40, 100, 300, 1200];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_timing_defaults() {
        assert_eq!(GRAVITY_BASE_MS, 600);
        assert_eq!(GRAVITY_STEP_MS, 40);
        assert_eq!(LOCK_DELAY_MS, 500);
        assert_eq!(LOCK_RESET_LIMIT, 15);
        assert_eq!(AUTO_REPEAT_MS, 200);
        // The fastest level must still leave a positive interval.
        assert!(GRAVITY_BASE_MS > GRAVITY_STEP_MS * (MAX_LEVEL - MIN_LEVEL) as u32);
    }

    #[test]
    fn piece_kind_index_roundtrip() {
        for kind in PieceKind::ALL {
            assert_eq!(PieceKind::from_index(kind.index()), Some(kind));
        }
        assert_eq!(PieceKind::from_index(7), None);
    }

    #[test]
    fn rotation_index_wraps() {
        assert_eq!(Rotation::from_index(5), Rotation::East);
        assert_eq!(Rotation::West.index(), 3);
    }
}

/// The seven tetromino piece kinds
///
/// The declaration order is also the colour/persistence index:
/// SQUARE=0, LINE=1, J=2, L=3, S=4, Z=5, T=6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PieceKind {
    Square,
    Line,
    J,
    L,
    S,
    Z,
    T,
}

impl PieceKind {
    /// All kinds in index order.
    pub const ALL: [PieceKind; 7] = [
        PieceKind::Square,
        PieceKind::Line,
        PieceKind::J,
        PieceKind::L,
        PieceKind::S,
        PieceKind::Z,
        PieceKind::T,
    ];

    /// Colour / persistence index in `0..=6`.
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Inverse of [`PieceKind::index`].
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Single-letter display name.
    pub fn letter(self) -> &'static str {
        match self {
            PieceKind::Square => "O",
            PieceKind::Line => "I",
            PieceKind::J => "J",
            PieceKind::L => "L",
            PieceKind::S => "S",
            PieceKind::Z => "Z",
            PieceKind::T => "T",
        }
    }
}

/// Rotation states, clockwise from the spawn orientation
///
/// - **North**: index 0, spawn orientation
/// - **East**: index 1, 90° clockwise
/// - **South**: index 2, 180°
/// - **West**: index 3, 270° clockwise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub enum Rotation {
    #[default]
    North,
    East,
    South,
    West,
}

impl Rotation {
    /// Rotation index in `0..=3`.
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Build from an index, wrapping modulo 4.
    pub fn from_index(index: u8) -> Self {
        match index % 4 {
            0 => Rotation::North,
            1 => Rotation::East,
            2 => Rotation::South,
            _ => Rotation::West,
        }
    }

    /// Rotate clockwise (90°)
    ///
    /// ```
    /// use blockfall_types::Rotation;
    ///
    /// assert_eq!(Rotation::West.rotate_cw(), Rotation::North);
    /// ```
    pub fn rotate_cw(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    /// Rotate counter-clockwise (-90°)
    ///
    /// ```
    /// use blockfall_types::Rotation;
    ///
    /// assert_eq!(Rotation::North.rotate_ccw(), Rotation::West);
    /// ```
    pub fn rotate_ccw(self) -> Self {
        Self::from_index(self.index() + 3)
    }

    pub fn rotate(self, spin: Spin) -> Self {
        match spin {
            Spin::Cw => self.rotate_cw(),
            Spin::Ccw => self.rotate_ccw(),
        }
    }
}

/// A board coordinate. `x` is the column, `y` the row (row 0 is the top).
///
/// Signed so that candidate positions just outside the grid can be expressed
/// and rejected by bounds checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct Pos {
    pub x: i8,
    pub y: i8,
}

impl Pos {
    pub const fn new(x: i8, y: i8) -> Self {
        Self { x, y }
    }

    pub const fn offset(self, dx: i8, dy: i8) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// A cell on the game board
///
/// - `None`: Empty cell
/// - `Some(PieceKind)`: Locked cell coloured by the kind that produced it
pub type Cell = Option<PieceKind>;

/// Rotation direction requested by the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Spin {
    Cw,
    Ccw,
}

/// Horizontal movement direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shift {
    Left,
    Right,
}

impl Shift {
    pub fn dx(self) -> i8 {
        match self {
            Shift::Left => -1,
            Shift::Right => 1,
        }
    }
}

/// Direction that can be held down for auto-repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    Down,
}

/// Session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GameStatus {
    #[default]
    Playing,
    Paused,
    Lost,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Playing => "playing",
            GameStatus::Paused => "paused",
            GameStatus::Lost => "lost",
        }
    }
}

/// Commands that can be applied to a game session
///
/// These are what the input layer produces. Each maps to one engine call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Move piece one cell left
    MoveLeft,
    /// Move piece one cell right
    MoveRight,
    /// Rotate piece 90° clockwise
    RotateCw,
    /// Rotate piece 90° counter-clockwise
    RotateCcw,
    /// Physical rotate button; direction comes from the engine config
    Rotate,
    /// Start repeating a move while the direction is held
    HoldStart(Direction),
    /// Stop repeating a held direction
    HoldStop(Direction),
    /// Instantly drop piece to lowest valid position and lock it
    HardDrop,
    Pause,
    Resume,
    /// Pause when playing, resume when paused
    TogglePause,
    FocusLost,
    FocusGained,
    /// Leave the lost state and start over
    AcknowledgeLoss,
    NewGame,
}

impl Command {
    /// Convert to camelCase string
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::MoveLeft => "moveLeft",
            Command::MoveRight => "moveRight",
            Command::RotateCw => "rotateCw",
            Command::RotateCcw => "rotateCcw",
            Command::Rotate => "rotate",
            Command::HoldStart(_) => "holdStart",
            Command::HoldStop(_) => "holdStop",
            Command::HardDrop => "hardDrop",
            Command::Pause => "pause",
            Command::Resume => "resume",
            Command::TogglePause => "togglePause",
            Command::FocusLost => "focusLost",
            Command::FocusGained => "focusGained",
            Command::AcknowledgeLoss => "acknowledgeLoss",
            Command::NewGame => "newGame",
        }
    }
}
