use std::sync::Arc;

use log::debug;
use winit::window::{Fullscreen, Window};

/// Platform entry points for fullscreen control.
///
/// Implementations collapse whatever vendor-specific entry points the
/// platform offers into one capability check: each method returns `true`
/// when an entry point existed and was invoked, `false` when the platform
/// has none. Callers treat `false` as a silent no-op.
pub trait FullscreenApi {
    /// Whether some element currently holds fullscreen. Queried fresh on
    /// every call; the answer is never cached, so an out-of-band exit
    /// (e.g. the user pressing Escape) cannot leave stale state behind.
    fn fullscreen_element(&self) -> bool;

    fn request_fullscreen(&self) -> bool;

    fn exit_fullscreen(&self) -> bool;
}

/// Flips the surface in and out of fullscreen on demand.
pub struct FullscreenToggle {
    api: Box<dyn FullscreenApi>,
}

impl FullscreenToggle {
    pub fn new(api: Box<dyn FullscreenApi>) -> Self {
        Self { api }
    }

    /// Current state, straight from the platform.
    pub fn is_fullscreen(&self) -> bool {
        self.api.fullscreen_element()
    }

    /// Enters fullscreen if nothing holds it, exits otherwise. Platforms
    /// without any fullscreen entry point degrade to a no-op.
    pub fn toggle(&self) {
        if self.api.fullscreen_element() {
            if !self.api.exit_fullscreen() {
                debug!("platform offers no fullscreen exit; ignoring toggle");
            }
        } else if !self.api.request_fullscreen() {
            debug!("platform offers no fullscreen entry; ignoring toggle");
        }
    }
}

/// Fullscreen control for a winit window.
pub struct WindowFullscreen {
    window: Arc<Window>,
}

impl WindowFullscreen {
    pub fn new(window: Arc<Window>) -> Self {
        Self { window }
    }
}

impl FullscreenApi for WindowFullscreen {
    fn fullscreen_element(&self) -> bool {
        self.window.fullscreen().is_some()
    }

    fn request_fullscreen(&self) -> bool {
        self.window
            .set_fullscreen(Some(Fullscreen::Borderless(None)));
        true
    }

    fn exit_fullscreen(&self) -> bool {
        self.window.set_fullscreen(None);
        true
    }
}

/// Platform stand-in for hosts with no fullscreen capability at all
/// (headless runs); every call degrades silently.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedFullscreen;

impl FullscreenApi for UnsupportedFullscreen {
    fn fullscreen_element(&self) -> bool {
        false
    }

    fn request_fullscreen(&self) -> bool {
        false
    }

    fn exit_fullscreen(&self) -> bool {
        false
    }
}

/// Turns discrete click timestamps into double-activation notifications.
///
/// Browsers fire a dedicated `dblclick` event; window systems only hand us
/// single presses, so pairs closer together than the activation window are
/// detected here.
#[derive(Debug)]
pub struct DoubleActivation {
    window_seconds: f64,
    last_click: Option<f64>,
}

impl DoubleActivation {
    /// Interval matching typical desktop double-click settings.
    pub const DEFAULT_WINDOW: f64 = 0.4;

    pub fn new(window_seconds: f64) -> Self {
        Self {
            window_seconds,
            last_click: None,
        }
    }

    /// Records one click; returns `true` when it completes a pair inside
    /// the activation window. A completed pair resets the detector, so a
    /// triple click yields exactly one activation.
    pub fn register_click(&mut self, now_seconds: f64) -> bool {
        match self.last_click {
            Some(last) if now_seconds >= last && now_seconds - last <= self.window_seconds => {
                self.last_click = None;
                true
            }
            _ => {
                self.last_click = Some(now_seconds);
                false
            }
        }
    }
}

impl Default for DoubleActivation {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::RwLock;
    use std::sync::Arc;

    /// Fake platform with adjustable capability flags.
    struct FakeApi {
        state: Arc<RwLock<bool>>,
        can_enter: bool,
        can_exit: bool,
    }

    impl FakeApi {
        fn supported() -> (Self, Arc<RwLock<bool>>) {
            let state = Arc::new(RwLock::new(false));
            (
                Self {
                    state: Arc::clone(&state),
                    can_enter: true,
                    can_exit: true,
                },
                state,
            )
        }
    }

    impl FullscreenApi for FakeApi {
        fn fullscreen_element(&self) -> bool {
            *self.state.read()
        }

        fn request_fullscreen(&self) -> bool {
            if self.can_enter {
                *self.state.write() = true;
            }
            self.can_enter
        }

        fn exit_fullscreen(&self) -> bool {
            if self.can_exit {
                *self.state.write() = false;
            }
            self.can_exit
        }
    }

    #[test]
    fn double_toggle_round_trips() {
        let (api, state) = FakeApi::supported();
        let toggle = FullscreenToggle::new(Box::new(api));
        toggle.toggle();
        assert!(*state.read());
        toggle.toggle();
        assert!(!*state.read());
    }

    #[test]
    fn unsupported_platform_degrades_silently() {
        let toggle = FullscreenToggle::new(Box::new(UnsupportedFullscreen));
        toggle.toggle();
        toggle.toggle();
        assert!(!toggle.is_fullscreen());
    }

    #[test]
    fn out_of_band_exit_is_observed_on_the_next_toggle() {
        let (api, state) = FakeApi::supported();
        let toggle = FullscreenToggle::new(Box::new(api));
        toggle.toggle();
        assert!(*state.read());

        // Something else (say, an Escape press) dropped fullscreen.
        *state.write() = false;

        // The state is queried fresh, so the toggle re-enters instead of
        // trying to exit a mode it no longer holds.
        toggle.toggle();
        assert!(*state.read());
    }

    #[test]
    fn click_pairs_inside_the_window_activate() {
        let mut detector = DoubleActivation::default();
        assert!(!detector.register_click(1.0));
        assert!(detector.register_click(1.2));
    }

    #[test]
    fn slow_clicks_do_not_activate() {
        let mut detector = DoubleActivation::default();
        assert!(!detector.register_click(1.0));
        assert!(!detector.register_click(2.0));
        // The late click starts a fresh pair.
        assert!(detector.register_click(2.1));
    }

    #[test]
    fn triple_click_activates_once() {
        let mut detector = DoubleActivation::default();
        assert!(!detector.register_click(0.0));
        assert!(detector.register_click(0.1));
        assert!(!detector.register_click(0.2));
    }
}
