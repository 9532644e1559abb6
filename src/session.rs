use std::sync::Arc;

use glam::Vec2;
use log::error;
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::camera::{CameraProjection, PerspectiveCamera};
use crate::clock::{FrameClock, FrameTiming};
use crate::controls::PointerOrbit;
use crate::frame::{FrameHandle, FrameScheduler};
use crate::fullscreen::{FullscreenApi, FullscreenToggle};
use crate::pointer::{PointerState, PointerTracker, SurfaceBounds};
use crate::viewport::{ViewportSize, ViewportSizer};

/// Drawable-surface operations the session drives when the viewport
/// changes. The renderer behind it owns the actual backing buffer.
pub trait RenderSurface {
    fn set_size(&mut self, width: u32, height: u32);
    fn set_pixel_ratio(&mut self, ratio: f32);
}

/// Everything a render callback may need for one tick.
pub struct TickContext<'a> {
    pub timing: FrameTiming,
    pub pointer: PointerState,
    pub viewport: ViewportSize,
    pub camera: &'a PerspectiveCamera,
}

/// Per-tick render callback. An `Err` halts the frame loop for good; the
/// session never retries or masks render failures.
pub type RenderFn<S> = Box<dyn FnMut(&mut S, &TickContext<'_>) -> anyhow::Result<()>>;

/// Precondition failures that abort session creation.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no drawable surface is available")]
    MissingSurface,
    #[error("initial viewport {width}x{height} has zero area")]
    EmptyViewport { width: u32, height: u32 },
}

/// Initial viewport parameters for a session.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub width: u32,
    pub height: u32,
    pub platform_pixel_ratio: f64,
    pub fov_y_degrees: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            platform_pixel_ratio: 1.0,
            fov_y_degrees: 75.0,
        }
    }
}

struct FrameState<S> {
    clock: FrameClock,
    camera: PerspectiveCamera,
    orbit: PointerOrbit,
    surface: S,
    render: RenderFn<S>,
}

struct SessionCore<S> {
    sizer: ViewportSizer,
    pointer: PointerTracker,
    fullscreen: FullscreenToggle,
    frame: Mutex<FrameState<S>>,
    handle: Mutex<Option<FrameHandle>>,
    error: Mutex<Option<anyhow::Error>>,
}

/// One demo page's worth of viewport state: size, pointer, fullscreen, and
/// the running frame loop, kept consistent as the surrounding window
/// changes.
///
/// The session is single-threaded and host-driven: the platform driver
/// forwards pointer/resize/activation notifications through the
/// `notify_*` methods and calls [`ViewportSession::run_frame`] once per
/// display-refresh signal. Creation arms the first tick; each tick re-arms
/// the next one at its own tail until the session is closed or the render
/// callback fails.
pub struct ViewportSession<S: RenderSurface> {
    core: Arc<SessionCore<S>>,
    scheduler: Arc<FrameScheduler>,
}

impl<S: RenderSurface + 'static> ViewportSession<S> {
    /// Builds a session around `surface` and begins the frame loop.
    ///
    /// The initial size and pixel ratio are pushed to the surface before
    /// the first tick so the backing buffer never renders at a stale size.
    /// A zero-area initial viewport is a precondition failure: no session
    /// is created and nothing is retried.
    pub fn create(
        mut surface: S,
        fullscreen: Box<dyn FullscreenApi>,
        config: SessionConfig,
        render: RenderFn<S>,
    ) -> Result<Self, SessionError> {
        if config.width == 0 || config.height == 0 {
            let err = SessionError::EmptyViewport {
                width: config.width,
                height: config.height,
            };
            error!("refusing to create viewport session: {err}");
            return Err(err);
        }

        let size = ViewportSize::new(config.width, config.height, config.platform_pixel_ratio);
        surface.set_size(size.width, size.height);
        surface.set_pixel_ratio(size.pixel_ratio);

        let camera = PerspectiveCamera::new(config.fov_y_degrees, size.aspect(), 0.1, 100.0);

        let core = Arc::new(SessionCore {
            sizer: ViewportSizer::new(size),
            pointer: PointerTracker::new(),
            fullscreen: FullscreenToggle::new(fullscreen),
            frame: Mutex::new(FrameState {
                clock: FrameClock::new(),
                camera,
                orbit: PointerOrbit::default(),
                surface,
                render,
            }),
            handle: Mutex::new(None),
            error: Mutex::new(None),
        });

        let scheduler = Arc::new(FrameScheduler::new());
        let first = schedule_tick(&scheduler, &core);
        *core.handle.lock() = Some(first);

        Ok(Self { core, scheduler })
    }

    /// Feeds a pointer-move notification through the tracker.
    pub fn notify_pointer_moved(&self, position: Vec2, bounds: SurfaceBounds) -> PointerState {
        self.core
            .pointer
            .update(position, bounds, self.core.sizer.current())
    }

    /// Applies an external resize as one combined reaction: viewport
    /// bookkeeping, camera aspect + projection recompute, and the surface's
    /// backing-buffer size and pixel ratio all change within this call, so
    /// collaborators are never observed out of sync.
    pub fn notify_resized(&self, width: u32, height: u32, platform_ratio: f64) -> ViewportSize {
        let size = self.core.sizer.on_external_resize(width, height, platform_ratio);
        let mut frame = self.core.frame.lock();
        frame.camera.set_aspect(size.aspect());
        frame.camera.update_projection();
        frame.surface.set_size(size.width, size.height);
        frame.surface.set_pixel_ratio(size.pixel_ratio);
        size
    }

    /// Double-activation notification: flips fullscreen.
    pub fn notify_double_activation(&self) {
        self.core.fullscreen.toggle();
    }

    /// Fires the pending tick, if any. Called by the host once per
    /// display-refresh signal with the signal timestamp in seconds.
    pub fn run_frame(&self, now_seconds: f64) {
        self.scheduler.run_due(now_seconds);
    }

    /// True while the loop has a tick scheduled or in flight.
    pub fn is_running(&self) -> bool {
        self.core.handle.lock().is_some()
    }

    /// Takes the error that halted the loop, if any. The host is expected
    /// to surface it and exit; the session will not restart itself.
    pub fn take_error(&self) -> Option<anyhow::Error> {
        self.core.error.lock().take()
    }

    pub fn viewport(&self) -> ViewportSize {
        self.core.sizer.current()
    }

    pub fn pointer(&self) -> PointerState {
        self.core.pointer.current()
    }

    pub fn is_fullscreen(&self) -> bool {
        self.core.fullscreen.is_fullscreen()
    }

    /// Read access to the session camera.
    pub fn with_camera<R>(&self, reader: impl FnOnce(&PerspectiveCamera) -> R) -> R {
        reader(&self.core.frame.lock().camera)
    }

    /// Mutable access to the orbit parameters (radius, damping, target).
    pub fn with_orbit<R>(&self, updater: impl FnOnce(&mut PointerOrbit) -> R) -> R {
        updater(&mut self.core.frame.lock().orbit)
    }

    /// Stops the loop: the pending tick is invalidated and will never
    /// fire. Notifications received afterwards still update state but no
    /// further rendering happens.
    pub fn close(&self) {
        if let Some(handle) = self.core.handle.lock().take() {
            self.scheduler.cancel(handle);
        }
    }
}

impl<S: RenderSurface> Drop for ViewportSession<S> {
    fn drop(&mut self) {
        if let Some(handle) = self.core.handle.lock().take() {
            self.scheduler.cancel(handle);
        }
    }
}

fn schedule_tick<S: RenderSurface + 'static>(
    scheduler: &FrameScheduler,
    core: &Arc<SessionCore<S>>,
) -> FrameHandle {
    let core = Arc::clone(core);
    scheduler.start(Box::new(move |sched, now| run_tick(sched, core, now)))
}

fn run_tick<S: RenderSurface + 'static>(
    scheduler: &FrameScheduler,
    core: Arc<SessionCore<S>>,
    now_seconds: f64,
) {
    let pointer = core.pointer.current();
    let viewport = core.sizer.current();

    let result = {
        let mut frame = core.frame.lock();
        let FrameState {
            clock,
            camera,
            orbit,
            surface,
            render,
        } = &mut *frame;

        let timing = clock.advance(now_seconds);
        orbit.update(pointer, timing.delta);
        orbit.apply(camera);

        let ctx = TickContext {
            timing,
            pointer,
            viewport,
            camera: &*camera,
        };
        (render)(surface, &ctx)
    };

    match result {
        Ok(()) => {
            let next = schedule_tick(scheduler, &core);
            *core.handle.lock() = Some(next);
        }
        Err(err) => {
            error!("render callback failed; halting frame loop: {err:?}");
            *core.error.lock() = Some(err);
            *core.handle.lock() = None;
        }
    }
}

/// Surface double that records what the session pushed to it; backs the
/// headless mode and the tests.
#[derive(Debug, Default, Clone)]
pub struct HeadlessSurface {
    state: Arc<RwLock<SurfaceRecord>>,
}

/// Last values a [`HeadlessSurface`] received.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct SurfaceRecord {
    pub width: u32,
    pub height: u32,
    pub pixel_ratio: f32,
    pub updates: u32,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self) -> SurfaceRecord {
        *self.state.read()
    }
}

impl RenderSurface for HeadlessSurface {
    fn set_size(&mut self, width: u32, height: u32) {
        let mut state = self.state.write();
        state.width = width;
        state.height = height;
        state.updates += 1;
    }

    fn set_pixel_ratio(&mut self, ratio: f32) {
        let mut state = self.state.write();
        state.pixel_ratio = ratio;
        state.updates += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fullscreen::UnsupportedFullscreen;
    use anyhow::anyhow;
    use std::cell::Cell;
    use std::rc::Rc;

    struct FakeFullscreen {
        state: Arc<RwLock<bool>>,
    }

    impl FullscreenApi for FakeFullscreen {
        fn fullscreen_element(&self) -> bool {
            *self.state.read()
        }

        fn request_fullscreen(&self) -> bool {
            *self.state.write() = true;
            true
        }

        fn exit_fullscreen(&self) -> bool {
            *self.state.write() = false;
            true
        }
    }

    fn noop_render() -> RenderFn<HeadlessSurface> {
        Box::new(|_, _| Ok(()))
    }

    fn create_session(render: RenderFn<HeadlessSurface>) -> (ViewportSession<HeadlessSurface>, HeadlessSurface) {
        let surface = HeadlessSurface::new();
        let probe = surface.clone();
        let session = ViewportSession::create(
            surface,
            Box::new(UnsupportedFullscreen),
            SessionConfig::default(),
            render,
        )
        .unwrap();
        (session, probe)
    }

    #[test]
    fn zero_area_viewport_aborts_creation() {
        let result = ViewportSession::create(
            HeadlessSurface::new(),
            Box::new(UnsupportedFullscreen),
            SessionConfig {
                width: 0,
                height: 600,
                ..SessionConfig::default()
            },
            noop_render(),
        );
        assert!(matches!(
            result.err(),
            Some(SessionError::EmptyViewport { width: 0, height: 600 })
        ));
    }

    #[test]
    fn creation_pushes_the_initial_size_to_the_surface() {
        let (session, probe) = create_session(noop_render());
        let record = probe.record();
        assert_eq!((record.width, record.height), (800, 600));
        assert_eq!(record.pixel_ratio, 1.0);
        assert!(session.is_running());
    }

    #[test]
    fn resize_updates_camera_and_surface_in_one_call() {
        let (session, probe) = create_session(noop_render());
        let before = probe.record().updates;

        let size = session.notify_resized(1920, 1080, 3.0);
        assert_eq!((size.width, size.height), (1920, 1080));
        assert_eq!(size.pixel_ratio, 2.0);

        let record = probe.record();
        assert_eq!((record.width, record.height), (1920, 1080));
        assert_eq!(record.pixel_ratio, 2.0);
        assert_eq!(record.updates, before + 2);
        session.with_camera(|camera| {
            assert!((camera.aspect() - 1920.0 / 1080.0).abs() < 1e-6);
        });
    }

    #[test]
    fn pointer_rejection_applies_through_the_session() {
        let (session, _probe) = create_session(noop_render());
        session.notify_pointer_moved(Vec2::new(450.0, 200.0), SurfaceBounds::default());
        let state = session.notify_pointer_moved(Vec2::new(1600.0, 300.0), SurfaceBounds::default());
        assert!((state.x - 0.0625).abs() < 1e-6);
        assert!((state.y - 0.0).abs() < 1e-6);
    }

    #[test]
    fn frames_drive_the_render_callback() {
        let ticks = Rc::new(Cell::new(0u32));
        let probe = Rc::clone(&ticks);
        let last_elapsed = Rc::new(Cell::new(-1.0f64));
        let elapsed_probe = Rc::clone(&last_elapsed);
        let (session, _surface) = create_session(Box::new(move |_, ctx| {
            probe.set(probe.get() + 1);
            elapsed_probe.set(ctx.timing.elapsed);
            Ok(())
        }));

        for frame in 0..3 {
            session.run_frame(frame as f64 / 60.0);
        }
        assert_eq!(ticks.get(), 3);
        assert!((last_elapsed.get() - 2.0 / 60.0).abs() < 1e-9);
        assert!(session.is_running());
    }

    #[test]
    fn render_failure_halts_the_loop_without_retry() {
        let ticks = Rc::new(Cell::new(0u32));
        let probe = Rc::clone(&ticks);
        let (session, _surface) = create_session(Box::new(move |_, _| {
            probe.set(probe.get() + 1);
            if probe.get() == 2 {
                Err(anyhow!("surface exploded"))
            } else {
                Ok(())
            }
        }));

        for frame in 0..5 {
            session.run_frame(frame as f64 / 60.0);
        }
        assert_eq!(ticks.get(), 2);
        assert!(!session.is_running());
        let err = session.take_error().expect("halt reason is surfaced");
        assert!(err.to_string().contains("surface exploded"));
    }

    #[test]
    fn close_before_the_first_tick_suppresses_rendering() {
        let ticks = Rc::new(Cell::new(0u32));
        let probe = Rc::clone(&ticks);
        let (session, _surface) = create_session(Box::new(move |_, _| {
            probe.set(probe.get() + 1);
            Ok(())
        }));

        session.close();
        session.run_frame(0.0);
        assert_eq!(ticks.get(), 0);
        assert!(!session.is_running());
    }

    #[test]
    fn double_activation_round_trips_fullscreen() {
        let state = Arc::new(RwLock::new(false));
        let api = FakeFullscreen {
            state: Arc::clone(&state),
        };
        let session = ViewportSession::create(
            HeadlessSurface::new(),
            Box::new(api),
            SessionConfig::default(),
            noop_render(),
        )
        .unwrap();

        session.notify_double_activation();
        assert!(session.is_fullscreen());
        session.notify_double_activation();
        assert!(!session.is_fullscreen());
    }

    #[test]
    fn orbit_follows_the_pointer_across_frames() {
        let (session, _surface) = create_session(noop_render());
        session.notify_pointer_moved(Vec2::new(600.0, 300.0), SurfaceBounds::default());
        for frame in 0..240 {
            session.run_frame(frame as f64 / 60.0);
        }
        // pointer x = 0.25 -> quarter turn -> camera on the +X side.
        session.with_camera(|camera| {
            assert!(camera.position.x > 2.9);
            assert!(camera.position.z.abs() < 0.1);
        });
    }
}
