//! Viewport-session building blocks for renderer demo pages.
//!
//! Each demo page owns one [`ViewportSession`]: it tracks the pointer in
//! normalized surface coordinates, keeps the logical viewport and the
//! renderer's backing buffer in step across resizes, flips fullscreen on
//! double activation, and drives a continuously re-scheduling frame loop.
//! The page supplies only its scene content and a render callback; the
//! platform drivers (the native binary, the wasm entry) translate window
//! events into session notifications.

pub mod camera;
pub mod clock;
pub mod controls;
pub mod frame;
pub mod fullscreen;
pub mod pointer;
pub mod render;
pub mod session;
pub mod viewport;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use camera::{CameraProjection, PerspectiveCamera};
pub use clock::{FrameClock, FrameTiming};
pub use controls::PointerOrbit;
pub use frame::{FrameHandle, FrameScheduler, TickFn};
pub use fullscreen::{
    DoubleActivation, FullscreenApi, FullscreenToggle, UnsupportedFullscreen, WindowFullscreen,
};
pub use pointer::{PointerState, PointerTracker, SurfaceBounds};
pub use render::Renderer;
pub use session::{
    HeadlessSurface, RenderFn, RenderSurface, SessionConfig, SessionError, SurfaceRecord,
    TickContext, ViewportSession,
};
pub use viewport::{
    StaticViewport, ViewportProvider, ViewportSize, ViewportSizer, MAX_PIXEL_RATIO,
};
