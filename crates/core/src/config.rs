//! Engine configuration
//!
//! Only two settings reach the engine. Everything else the runner reads from
//! its settings file (key bindings, save location) stays outside the core.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// The rotate button turns the piece counter-clockwise instead of clockwise.
    pub rotate_counterclockwise: bool,
    /// Expose ghost cells in snapshots.
    pub drop_shadow: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rotate_counterclockwise: false,
            drop_shadow: true,
        }
    }
}
