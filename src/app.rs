//! Application event loop.
//!
//! [`App`] implements winit's [`ApplicationHandler`]. Window and device
//! callbacks only translate events into the [`InputQueue`]; a close request
//! exits at once and a resize asks for a redraw. All other state changes
//! happen once per frame on `RedrawRequested`:
//!
//! 1. advance the frame clock and scale the camera speed by the delta
//! 2. drain the input queue into the camera and projection
//! 3. handle close and resize requests
//! 4. upload uniforms, compose the frame plan and render it

use std::sync::Arc;

use cgmath::Deg;
use winit::{
    application::ApplicationHandler,
    event::{DeviceEvent, DeviceId, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::{CursorGrabMode, Window, WindowId},
};

use crate::{
    camera::{Camera, Projection},
    config::Config,
    context::Context,
    input::{InputQueue, InputState, Urgency, translate_device_event, translate_window_event},
    render::FramePlan,
    timing::FrameTiming,
};

/// Everything that exists once the window and GPU are up.
#[derive(Debug)]
pub struct AppState {
    pub ctx: Context,
    pub camera: Camera,
    pub projection: Projection,
    pub input: InputState,
    pub queue: InputQueue,
    pub timing: FrameTiming,
    base_speed: f32,
    plan: FramePlan,
}

impl AppState {
    pub fn new(ctx: Context, config: &Config) -> Self {
        let size = ctx.window().inner_size();
        let camera = Camera::new(config.camera.position, config.camera.front, config.camera.up)
            .with_sensitivity(config.camera.sensitivity);
        let projection = Projection::new(
            size.width,
            size.height,
            Deg(config.projection.fovy),
            config.projection.znear,
            config.projection.zfar,
        );
        Self {
            ctx,
            camera,
            projection,
            input: InputState::new(),
            queue: InputQueue::new(),
            timing: FrameTiming::new(),
            base_speed: config.camera.base_speed,
            // the scene never changes after start-up, so the plan is composed once
            plan: FramePlan::compose(&config.scene),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.projection.resize(width, height);
        self.ctx.resize(width, height);
    }

    /// Runs one frame. Returns `false` once the application should exit.
    pub fn frame(&mut self) -> bool {
        let dt = self.timing.tick();
        self.camera.set_speed(self.base_speed * dt);

        let requests = self
            .input
            .drain(&mut self.queue, &mut self.camera, &mut self.projection);
        if requests.close {
            return false;
        }
        if let Some((width, height)) = requests.resize {
            self.resize(width, height);
        }

        self.ctx.update_uniforms(&self.camera, &self.projection);
        self.ctx.render(&self.plan);
        true
    }
}

pub struct App {
    async_runtime: tokio::runtime::Runtime,
    config: Config,
    state: Option<AppState>,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(config: Config, async_runtime: tokio::runtime::Runtime) -> Self {
        Self {
            async_runtime,
            config,
            state: None,
            error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<AppState> {
        let window_attributes = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(winit::dpi::PhysicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));
        let window = Arc::new(event_loop.create_window(window_attributes)?);
        capture_cursor(&window);

        let ctx = self
            .async_runtime
            .block_on(Context::new(window, &self.config))?;
        Ok(AppState::new(ctx, &self.config))
    }
}

/// Hides the cursor and locks it in place; mouse-look reads raw device
/// motion. Platforms that cannot lock it get it confined instead.
fn capture_cursor(window: &Window) {
    let grabbed = window
        .set_cursor_grab(CursorGrabMode::Locked)
        .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
    if let Err(e) = grabbed {
        log::warn!("Could not capture the cursor: {e}");
    }
    window.set_cursor_visible(false);
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        match self.init(event_loop) {
            Ok(state) => {
                state.ctx.window().request_redraw();
                self.state = Some(state);
            }
            Err(e) => {
                log::error!("Initialisation failed: {e:#}");
                self.error = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        let Some(state) = &mut self.state else {
            return;
        };

        if let Some(input) = translate_window_event(&event) {
            match input.urgency() {
                Urgency::Exit => {
                    log::info!("Close requested");
                    event_loop.exit();
                    return;
                }
                Urgency::Redraw => state.ctx.window().request_redraw(),
                Urgency::Deferred => {}
            }
            state.queue.push(input);
        }

        if let WindowEvent::RedrawRequested = event {
            if state.frame() {
                state.ctx.window().request_redraw();
            } else {
                log::info!("Exiting");
                event_loop.exit();
            }
        }
    }

    fn device_event(&mut self, _event_loop: &ActiveEventLoop, _device_id: DeviceId, event: DeviceEvent) {
        let Some(state) = &mut self.state else {
            return;
        };
        if let Some(input) = translate_device_event(&event) {
            state.queue.push(input);
        }
    }
}

/// Opens the window and runs the demo until it is closed.
pub fn run(config: Config) -> anyhow::Result<()> {
    if let Err(e) = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).try_init() {
        println!("Warning: Could not initialize logger: {}", e);
    }

    let event_loop = EventLoop::new()?;
    let mut app = App::new(config, tokio::runtime::Runtime::new()?);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
