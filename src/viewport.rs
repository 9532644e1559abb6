use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Upper bound for the stored pixel ratio. High-density displays report
/// ratios of 3 and above; rendering that many backing pixels buys nothing
/// visible, so the ratio is capped.
pub const MAX_PIXEL_RATIO: f32 = 2.0;

/// Logical viewport dimensions plus the capped device pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f32,
}

impl ViewportSize {
    /// Builds a size, flooring degenerate dimensions at 1x1 and clamping
    /// the platform-reported ratio into `[1, MAX_PIXEL_RATIO]`.
    pub fn new(width: u32, height: u32, platform_ratio: f64) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            pixel_ratio: (platform_ratio as f32).clamp(1.0, MAX_PIXEL_RATIO),
        }
    }

    /// Width-over-height ratio for camera projection.
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    /// Backing-buffer dimensions: logical size scaled by the pixel ratio.
    pub fn physical(&self) -> (u32, u32) {
        (
            ((self.width as f32 * self.pixel_ratio) as u32).max(1),
            ((self.height as f32 * self.pixel_ratio) as u32).max(1),
        )
    }
}

impl Default for ViewportSize {
    fn default() -> Self {
        Self::new(800, 600, 1.0)
    }
}

/// Read-only access to the current viewport dimensions.
pub trait ViewportProvider {
    fn viewport_size(&self) -> ViewportSize;
}

/// Tracks the logical viewport across external resize notifications.
///
/// `on_external_resize` recomputes everything in one call so collaborators
/// (camera aspect, renderer backing buffer) can react to a single combined
/// notification and are never observed out of sync.
#[derive(Debug)]
pub struct ViewportSizer {
    size: RwLock<ViewportSize>,
}

impl ViewportSizer {
    pub fn new(initial: ViewportSize) -> Self {
        Self {
            size: RwLock::new(initial),
        }
    }

    /// Returns the current size snapshot.
    pub fn current(&self) -> ViewportSize {
        *self.size.read()
    }

    /// Overwrites the stored dimensions and re-derives the capped pixel
    /// ratio, returning the new size.
    pub fn on_external_resize(&self, width: u32, height: u32, platform_ratio: f64) -> ViewportSize {
        let next = ViewportSize::new(width, height, platform_ratio);
        *self.size.write() = next;
        next
    }
}

impl ViewportProvider for ViewportSizer {
    fn viewport_size(&self) -> ViewportSize {
        self.current()
    }
}

/// Viewport that always reports the same dimensions; useful for headless
/// collaborators and tests.
#[derive(Debug, Clone, Copy)]
pub struct StaticViewport {
    size: ViewportSize,
}

impl StaticViewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: ViewportSize::new(width, height, 1.0),
        }
    }
}

impl ViewportProvider for StaticViewport {
    fn viewport_size(&self) -> ViewportSize {
        self.size
    }
}

impl<T> ViewportProvider for Arc<T>
where
    T: ViewportProvider + ?Sized,
{
    fn viewport_size(&self) -> ViewportSize {
        (**self).viewport_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_overwrites_dimensions_and_caps_ratio() {
        let sizer = ViewportSizer::new(ViewportSize::default());
        let size = sizer.on_external_resize(1920, 1080, 3.0);
        assert_eq!(size.width, 1920);
        assert_eq!(size.height, 1080);
        assert_eq!(size.pixel_ratio, 2.0);
        assert_eq!(sizer.current(), size);
    }

    #[test]
    fn ratio_below_one_is_floored() {
        let size = ViewportSize::new(800, 600, 0.5);
        assert_eq!(size.pixel_ratio, 1.0);
    }

    #[test]
    fn ratio_at_or_under_cap_is_kept() {
        assert_eq!(ViewportSize::new(800, 600, 1.5).pixel_ratio, 1.5);
        assert_eq!(ViewportSize::new(800, 600, 2.0).pixel_ratio, 2.0);
    }

    #[test]
    fn degenerate_dimensions_are_floored() {
        let size = ViewportSize::new(0, 0, 1.0);
        assert_eq!((size.width, size.height), (1, 1));
    }

    #[test]
    fn aspect_matches_dimensions() {
        let size = ViewportSize::new(800, 600, 1.0);
        assert!((size.aspect() - 800.0 / 600.0).abs() < 1e-6);
    }

    #[test]
    fn physical_size_scales_by_ratio() {
        let size = ViewportSize::new(800, 600, 2.0);
        assert_eq!(size.physical(), (1600, 1200));
    }

    #[test]
    fn static_viewport_reports_fixed_size() {
        let viewport = StaticViewport::new(1280, 720);
        assert_eq!(viewport.viewport_size().width, 1280);
        assert_eq!(viewport.viewport_size().height, 720);
    }
}
