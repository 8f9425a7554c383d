//! blockfall (workspace facade crate).
//!
//! Re-exports the workspace crates under one roof so the runner, the
//! integration tests and the benches can use `blockfall::{core, engine, ..}`,
//! and hosts the runner-side settings and save file handling.

pub use blockfall_core as core;
pub use blockfall_engine as engine;
pub use blockfall_input as input;
pub use blockfall_term as term;
pub use blockfall_types as types;

pub mod savefile;
pub mod settings;
