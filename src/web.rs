#![cfg(target_arch = "wasm32")]

use std::sync::Arc;

use anyhow::anyhow;
use glam::{Mat4, Vec2, Vec4};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::{ElementState, Event, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::platform::web::{EventLoopExtWebSys, WindowBuilderExtWebSys};
use winit::window::{Window, WindowBuilder};

use crate::fullscreen::FullscreenApi;
use crate::pointer::SurfaceBounds;
use crate::session::{RenderFn, SessionConfig, SessionError, ViewportSession};
use crate::viewport::ViewportSize;
use crate::{DoubleActivation, Renderer};

/// Builds a session against the canvas with the given element id and
/// spawns the event loop. The browser drives ticks through winit's
/// redraw-request cycle, which sits on `requestAnimationFrame`.
#[wasm_bindgen]
pub async fn run(canvas_id: String) -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let web_window = web_sys::window().ok_or_else(|| JsValue::from_str("missing window"))?;
    let document = web_window
        .document()
        .ok_or_else(|| JsValue::from_str("missing document"))?;
    let element = document
        .get_element_by_id(&canvas_id)
        .ok_or_else(|| JsValue::from_str(&SessionError::MissingSurface.to_string()))?;
    let canvas: web_sys::HtmlCanvasElement = element
        .dyn_into()
        .map_err(|_| JsValue::from_str("element is not a canvas"))?;

    let event_loop = EventLoop::new();
    let window = Arc::new(
        WindowBuilder::new()
            .with_canvas(Some(canvas.clone()))
            .with_title("Stagekit Demo")
            .with_inner_size(LogicalSize::new(800.0, 600.0))
            .build(&event_loop)
            .map_err(|err| JsValue::from_str(&format!("window error: {err}")))?,
    );

    let ratio = web_window.device_pixel_ratio();
    let initial = ViewportSize::new(800, 600, ratio);
    let renderer = Renderer::new(Arc::clone(&window), initial)
        .await
        .map_err(|err| JsValue::from_str(&format!("renderer error: {err}")))?;

    let session = ViewportSession::create(
        renderer,
        Box::new(CanvasFullscreen { canvas, document }),
        SessionConfig {
            width: 800,
            height: 600,
            platform_pixel_ratio: ratio,
            fov_y_degrees: 75.0,
        },
        spinning_cube(),
    )
    .map_err(|err| JsValue::from_str(&format!("session error: {err}")))?;

    let mut app = WebApp {
        session,
        window,
        activation: DoubleActivation::default(),
        performance: web_window.performance(),
    };

    event_loop.spawn(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;
        app.process_event(&event, control_flow);
    });

    Ok(())
}

fn spinning_cube() -> RenderFn<Renderer> {
    Box::new(|renderer, ctx| {
        let model = Mat4::from_rotation_y(ctx.timing.elapsed as f32 * 0.8);
        match renderer.render(ctx.camera, model, Vec4::new(1.0, 0.0, 0.0, 1.0)) {
            Ok(()) => Ok(()),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                use crate::session::RenderSurface;
                renderer.set_size(ctx.viewport.width, ctx.viewport.height);
                Ok(())
            }
            Err(wgpu::SurfaceError::OutOfMemory) => Err(anyhow!("GPU is out of memory")),
            Err(wgpu::SurfaceError::Timeout) => {
                log_to_console("Surface timeout; retrying next frame");
                Ok(())
            }
        }
    })
}

struct WebApp {
    session: ViewportSession<Renderer>,
    window: Arc<Window>,
    activation: DoubleActivation,
    performance: Option<web_sys::Performance>,
}

impl WebApp {
    fn now(&self) -> f64 {
        self.performance
            .as_ref()
            .map(|performance| performance.now() / 1000.0)
            .unwrap_or(0.0)
    }

    fn process_event(&mut self, event: &Event<()>, control_flow: &mut ControlFlow) {
        match event {
            Event::WindowEvent { event, window_id } if *window_id == self.window.id() => {
                match event {
                    WindowEvent::CloseRequested => control_flow.set_exit(),
                    WindowEvent::Resized(size) => self.handle_resize(*size),
                    WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                        self.handle_resize(**new_inner_size);
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        self.session.notify_pointer_moved(
                            Vec2::new(position.x as f32, position.y as f32),
                            SurfaceBounds::default(),
                        );
                    }
                    WindowEvent::MouseInput {
                        state: ElementState::Pressed,
                        button: MouseButton::Left,
                        ..
                    } => {
                        if self.activation.register_click(self.now()) {
                            self.session.notify_double_activation();
                        }
                    }
                    _ => {}
                }
            }
            Event::RedrawRequested(window_id) if *window_id == self.window.id() => {
                self.session.run_frame(self.now());
            }
            Event::MainEventsCleared => {
                if self.session.is_running() {
                    self.window.request_redraw();
                } else {
                    if let Some(err) = self.session.take_error() {
                        log_to_console(&format!("Error: {err:?}"));
                    }
                    control_flow.set_exit();
                }
            }
            _ => {}
        }
    }

    fn handle_resize(&self, physical: PhysicalSize<u32>) {
        let scale_factor = self.window.scale_factor();
        let logical: LogicalSize<f64> = physical.to_logical(scale_factor);
        self.session.notify_resized(
            logical.width.round() as u32,
            logical.height.round() as u32,
            scale_factor,
        );
    }
}

/// DOM fullscreen control for a canvas, collapsing the standard and
/// `webkit`-prefixed entry points into one capability check. Browsers
/// with neither make every call a silent no-op.
struct CanvasFullscreen {
    canvas: web_sys::HtmlCanvasElement,
    document: web_sys::Document,
}

impl FullscreenApi for CanvasFullscreen {
    fn fullscreen_element(&self) -> bool {
        read_property(self.document.as_ref(), "fullscreenElement")
            .or_else(|| read_property(self.document.as_ref(), "webkitFullscreenElement"))
            .is_some()
    }

    fn request_fullscreen(&self) -> bool {
        call_method(self.canvas.as_ref(), "requestFullscreen")
            || call_method(self.canvas.as_ref(), "webkitRequestFullscreen")
    }

    fn exit_fullscreen(&self) -> bool {
        call_method(self.document.as_ref(), "exitFullscreen")
            || call_method(self.document.as_ref(), "webkitExitFullscreen")
    }
}

/// Reads a property, treating `null`/`undefined` as absent.
fn read_property(target: &JsValue, name: &str) -> Option<JsValue> {
    let value = js_sys::Reflect::get(target, &JsValue::from_str(name)).ok()?;
    if value.is_null() || value.is_undefined() {
        None
    } else {
        Some(value)
    }
}

/// Invokes a zero-argument method if the platform exposes it.
fn call_method(target: &JsValue, name: &str) -> bool {
    let Some(value) = read_property(target, name) else {
        return false;
    };
    let Some(function) = value.dyn_ref::<js_sys::Function>() else {
        return false;
    };
    function.call0(target).is_ok()
}

fn log_to_console(message: &str) {
    web_sys::console::log_1(&JsValue::from_str(message));
}
