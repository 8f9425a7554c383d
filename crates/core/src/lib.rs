//! Core game logic - pure, deterministic, and testable
//!
//! This crate contains the rules of the game and nothing else. It has no
//! clock, no terminal and no file access:
//!
//! - **Deterministic**: the same seed and the same calls produce the same game
//! - **Timer-agnostic**: the session asks for wakeups through [`Outcome`] and
//!   the caller decides how to deliver them
//! - **Allocation-free** on every game call
//!
//! # Module Structure
//!
//! - [`shape`]: tetromino patterns and the SRS offset tables
//! - [`board`]: 10x20 grid with collision queries and row clearing
//! - [`piece`]: the active piece and its pure geometry
//! - [`rotation`]: kick search for rotations
//! - [`scoring`]: line scores, leveling, gravity intervals
//! - [`rng`]: seeded uniform piece selection
//! - [`session`]: [`GameSession`], the gravity/lock state machine
//! - [`snapshot`]: copyable view for renderers
//! - [`persist`]: saved game records and their codecs
//! - [`config`]: engine settings
//!
//! # Example
//!
//! ```
//! use blockfall_core::{EngineConfig, GameSession, TimerKind, TimerRequest};
//! use blockfall_core::types::{Command, GameStatus};
//!
//! let (mut game, out) = GameSession::start(12345, EngineConfig::default());
//! assert!(matches!(
//!     out.timer(TimerKind::Gravity),
//!     Some(TimerRequest::Arm { after_ms: 600, .. })
//! ));
//!
//! game.apply(Command::MoveRight);
//! game.apply(Command::RotateCw);
//! let out = game.apply(Command::HardDrop);
//!
//! assert!(out.event.is_some());
//! assert!(game.active().is_none());
//! assert_eq!(game.status(), GameStatus::Playing);
//! ```

pub mod board;
pub mod config;
pub mod persist;
pub mod piece;
pub mod rng;
pub mod rotation;
pub mod scoring;
pub mod session;
pub mod shape;
pub mod snapshot;

pub use blockfall_types as types;

// Re-export commonly used types for convenience
pub use board::Board;
pub use config::EngineConfig;
pub use persist::{PersistError, SaveRecord, SavedGame, SavedGrid};
pub use piece::{max_drop, ActivePiece};
pub use rng::SimpleRng;
pub use rotation::{try_rotate, RotationResult};
pub use scoring::{calculate_line_score, gravity_interval_ms};
pub use session::{
    Changed, GameSession, LockDelayState, LockEvent, Outcome, Timer, TimerKind, TimerRequest,
    TimerToken,
};
pub use snapshot::{ActiveSnapshot, GameSnapshot};
