//! Viewport: transient camera state, exempt from entity invariants and
//! never written to the entity tables.

use serde::{Deserialize, Serialize};

/// Pan + zoom state of the canvas camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
        }
    }
}
