use glam::Vec2;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::viewport::ViewportSize;

/// Normalized pointer position relative to the tracked surface.
///
/// Both axes live in `[-0.5, 0.5]`: `(0, 0)` is the surface center,
/// `(-0.5, -0.5)` the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointerState {
    pub x: f32,
    pub y: f32,
}

/// Position of the drawable surface inside the host window, in the same
/// coordinate space as incoming pointer events.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SurfaceBounds {
    pub left: f32,
    pub top: f32,
}

impl SurfaceBounds {
    pub const fn new(left: f32, top: f32) -> Self {
        Self { left, top }
    }
}

/// Tracks the pointer in normalized surface coordinates.
///
/// An update whose computed value falls outside `[-0.5, 0.5]` is dropped
/// for that axis and the previous value retained; the other axis is still
/// applied. Freezing instead of clamping keeps a derived camera angle
/// steady once the cursor leaves the tracked region.
#[derive(Debug, Default)]
pub struct PointerTracker {
    state: RwLock<PointerState>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the most recently accepted pointer state.
    pub fn current(&self) -> PointerState {
        *self.state.read()
    }

    /// Applies a pointer-move event and returns the resulting state.
    pub fn update(
        &self,
        event: Vec2,
        bounds: SurfaceBounds,
        viewport: ViewportSize,
    ) -> PointerState {
        let nx = (event.x - bounds.left) / viewport.width as f32 - 0.5;
        let ny = (event.y - bounds.top) / viewport.height as f32 - 0.5;

        let mut state = self.state.write();
        if (-0.5..=0.5).contains(&nx) {
            state.x = nx;
        }
        if (-0.5..=0.5).contains(&ny) {
            state.y = ny;
        }
        *state
    }
}
