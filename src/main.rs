use std::any::Any;
use std::env;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Result};
use glam::{Mat4, Vec2, Vec4};
use log::info;
use pollster::block_on;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::{ElementState, Event, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::platform::run_return::EventLoopExtRunReturn;
use winit::window::{Window, WindowBuilder};

use stagekit::{
    DoubleActivation, HeadlessSurface, RenderFn, RenderSurface, Renderer, SessionConfig,
    SurfaceBounds, UnsupportedFullscreen, ViewportSession, ViewportSize, WindowFullscreen,
};

const CUBE_COLOR: Vec4 = Vec4::new(1.0, 0.0, 0.0, 1.0);
const CUBE_SPIN_RATE: f32 = 0.8;

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;
    if options.headless {
        return run_headless(&options);
    }

    match run_interactive(&options) {
        Ok(()) => Ok(()),
        Err(err) => {
            if err.downcast_ref::<WindowInitError>().is_some() {
                eprintln!(
                    "{err}. Falling back to --headless mode (set DISPLAY or install X11 libs to enable rendering)."
                );
                run_headless(&options)
            } else {
                Err(err)
            }
        }
    }
}

fn run_interactive(options: &CliOptions) -> Result<()> {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let event_loop = panic::catch_unwind(AssertUnwindSafe(EventLoop::new));
    panic::set_hook(default_hook);
    let event_loop =
        event_loop.map_err(|panic| WindowInitError::from_panic("event loop", panic))?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title("Stagekit Demo")
            .with_inner_size(LogicalSize::new(options.width as f64, options.height as f64))
            .build(&event_loop)
            .map_err(|err| WindowInitError::from_error("window", err))?,
    );

    let scale_factor = window.scale_factor();
    let initial = ViewportSize::new(options.width, options.height, scale_factor);
    let renderer = block_on(Renderer::new(Arc::clone(&window), initial))?;

    let session = ViewportSession::create(
        renderer,
        Box::new(WindowFullscreen::new(Arc::clone(&window))),
        SessionConfig {
            width: options.width,
            height: options.height,
            platform_pixel_ratio: scale_factor,
            fov_y_degrees: 75.0,
        },
        spinning_cube(),
    )?;

    let mut app = DemoApp {
        session,
        window: Arc::clone(&window),
        activation: DoubleActivation::default(),
        started: Instant::now(),
    };

    let mut event_loop = event_loop;
    event_loop.run_return(|event, _, control_flow| {
        *control_flow = ControlFlow::Poll;
        app.process_event(&event, control_flow);
    });

    app.session.close();
    if let Some(err) = app.session.take_error() {
        return Err(err);
    }

    Ok(())
}

/// Render callback for the demo page: one red cube spinning in place,
/// with the usual swapchain-error policy around the draw.
fn spinning_cube() -> RenderFn<Renderer> {
    Box::new(|renderer, ctx| {
        let model = Mat4::from_rotation_y(ctx.timing.elapsed as f32 * CUBE_SPIN_RATE);
        match renderer.render(ctx.camera, model, CUBE_COLOR) {
            Ok(()) => Ok(()),
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                // Reapplying the current size reconfigures the swapchain.
                renderer.set_size(ctx.viewport.width, ctx.viewport.height);
                Ok(())
            }
            Err(wgpu::SurfaceError::OutOfMemory) => Err(anyhow!("GPU is out of memory")),
            Err(wgpu::SurfaceError::Timeout) => {
                info!("Surface timeout; retrying next frame");
                Ok(())
            }
        }
    })
}

struct DemoApp {
    session: ViewportSession<Renderer>,
    window: Arc<Window>,
    activation: DoubleActivation,
    started: Instant,
}

impl DemoApp {
    fn now(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    fn process_event(&mut self, event: &Event<()>, control_flow: &mut ControlFlow) {
        match event {
            Event::WindowEvent { event, window_id } if *window_id == self.window.id() => {
                match event {
                    WindowEvent::CloseRequested => {
                        control_flow.set_exit();
                    }
                    WindowEvent::Resized(size) => {
                        self.handle_resize(*size);
                    }
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

/// Drives the session against a recording surface with synthetic refresh
/// timestamps, then prints the final state. This is what the interactive
/// mode degrades to on machines without a display.
fn run_headless(options: &CliOptions) -> Result<()> {
    use std::cell::Cell;
    use std::rc::Rc;

    println!(
        "Starting headless session {}x{} for {} ticks",
        options.width, options.height, options.ticks
    );

    let surface = HeadlessSurface::new();
    let surface_probe = surface.clone();
    let frames = Rc::new(Cell::new(0u64));
    let frames_probe = Rc::clone(&frames);

    let session = ViewportSession::create(
        surface,
        Box::new(UnsupportedFullscreen),
        SessionConfig {
            width: options.width,
            height: options.height,
            platform_pixel_ratio: 1.0,
            fov_y_degrees: 75.0,
        },
        Box::new(move |_, _| {
            frames_probe.set(frames_probe.get() + 1);
            Ok(())
        }),
    )?;

    for tick in 0..options.ticks {
        match tick {
            // In-range pointer sample against the initial viewport.
            10 => {
                session
                    .notify_pointer_moved(Vec2::new(450.0, 200.0), SurfaceBounds::default());
            }
            // Out-of-range x: rejected, y lands on the centerline.
            20 => {
                session
                    .notify_pointer_moved(Vec2::new(1600.0, 300.0), SurfaceBounds::default());
            }
            // Fullscreen is unsupported headless; the toggle must be silent.
            30 => session.notify_double_activation(),
            // A resize with an inflated platform pixel ratio.
            40 => {
                session.notify_resized(1920, 1080, 3.0);
            }
            _ => {}
        }
        session.run_frame(tick as f64 / 60.0);
    }

    session.close();
    if let Some(err) = session.take_error() {
        return Err(err);
    }

    let viewport = session.viewport();
    let pointer = session.pointer();
    let record = surface_probe.record();
    println!("Final session state:");
    println!(" - frames rendered: {}", frames.get());
    println!(
        " - viewport: {}x{} @{}x",
        viewport.width, viewport.height, viewport.pixel_ratio
    );
    println!(
        " - surface: {}x{} @{}x",
        record.width, record.height, record.pixel_ratio
    );
    println!(" - pointer: ({:.4}, {:.4})", pointer.x, pointer.y);
    println!(" - fullscreen: {}", session.is_fullscreen());
    Ok(())
}

#[derive(Debug)]
struct WindowInitError {
    message: String,
}

impl WindowInitError {
    fn from_panic(stage: &str, panic: Box<dyn Any + Send>) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {}", panic_message(panic)),
        }
    }

    fn from_error(stage: &str, err: impl fmt::Display) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {err}"),
        }
    }
}

impl fmt::Display for WindowInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for WindowInitError {}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(msg) => *msg,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(msg) => (*msg).to_string(),
            Err(_) => "unknown panic".into(),
        },
    }
}

struct CliOptions {
    headless: bool,
    ticks: u64,
    width: u32,
    height: u32,
}

impl CliOptions {
    fn parse() -> Result<Self> {
        let mut options = Self {
            headless: false,
            ticks: 240,
            width: 800,
            height: 600,
        };
        let mut args = env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--headless" => options.headless = true,
                "--ticks" => options.ticks = parse_value(&arg, args.next())?,
                "--width" => options.width = parse_value(&arg, args.next())?,
                "--height" => options.height = parse_value(&arg, args.next())?,
                other => {
                    return Err(anyhow!(
                        "Unknown argument: {other}. Usage: stagekit [--headless] [--ticks N] [--width W] [--height H]"
                    ));
                }
            }
        }
        Ok(options)
    }
}

fn parse_value<T: std::str::FromStr>(flag: &str, value: Option<String>) -> Result<T> {
    let value = value.ok_or_else(|| anyhow!("{flag} expects a value"))?;
    value
        .parse()
        .map_err(|_| anyhow!("{flag} expects a number, got {value}"))
}
