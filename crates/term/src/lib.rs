//! Terminal front end for the game.
//!
//! A small, game-oriented rendering layer: a [`GameView`] draws a
//! [`GameSnapshot`](crate::core::GameSnapshot) into a plain framebuffer, and
//! the [`TerminalRenderer`] flushes that framebuffer to the terminal, writing
//! only what changed since the last frame.

pub mod fb;
pub mod game_view;
pub mod renderer;

pub use blockfall_core as core;
pub use blockfall_types as types;

pub use fb::{Cell, CellStyle, FrameBuffer, Rgb};
pub use game_view::{piece_color, AnchorY, GameView, Viewport};
pub use renderer::{encode_diff_into, encode_full_into, TerminalRenderer};
