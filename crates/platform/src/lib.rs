//! Platform layer: windowing & the per-frame loop.
//!
//! One redraw is requested per presented frame while the [`FrameLoop`] is
//! live. Closing the window, pressing Escape or hitting the frame limit
//! cancels it and the event loop exits.

use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use asset::ShaderSources;
use corelib::{FrameClock, FrameLoop, RenderSession};
use renderer::{Backends, GpuState, SurfaceError};
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

/// Window settings for [`run_session`].
#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub backends: Backends,
    pub show_fps: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            title: "shaderbox".to_string(),
            width: 1280,
            height: 720,
            backends: Backends::all(),
            show_fps: false,
        }
    }
}

/// Open a window and render `session` with the loaded shader pair until the
/// frame loop is cancelled.
pub fn run_session(
    config: SessionConfig,
    sources: ShaderSources,
    session: RenderSession,
    frame_loop: FrameLoop,
) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = SessionApp {
        config,
        sources,
        session,
        frame_loop,
        clock: FrameClock::new(),
        fps: FpsCounter::default(),
        window: None,
        gpu: None,
        failure: None,
    };

    event_loop
        .run_app(&mut app)
        .map_err(|e| anyhow!("Event loop error: {e:?}"))?;

    log::info!("Rendered {} frames", app.frame_loop.frames());
    match app.failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct SessionApp {
    config: SessionConfig,
    sources: ShaderSources,
    session: RenderSession,
    frame_loop: FrameLoop,
    clock: FrameClock,
    fps: FpsCounter,

    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    failure: Option<anyhow::Error>,
}

impl SessionApp {
    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.failure = Some(err);
        self.frame_loop.cancel();
        event_loop.exit();
    }

    fn create_window(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(PhysicalSize::new(self.config.width, self.config.height));
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let size = window.inner_size();
        log::info!("Window created: {}x{}", size.width, size.height);
        self.session.set_viewport(size.width, size.height);

        let gpu = pollster::block_on(GpuState::new(
            window.clone(),
            self.config.backends,
            &self.sources,
            &self.session,
        ))
        .context("GPU initialization failed")?;

        window.request_redraw();
        self.window = Some(window);
        self.gpu = Some(gpu);
        self.clock.restart();
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        if self.frame_loop.is_cancelled() {
            event_loop.exit();
            return;
        }
        let (Some(window), Some(gpu)) = (self.window.as_ref(), self.gpu.as_mut()) else {
            return;
        };

        let frame_index = self.frame_loop.frames();
        self.session.update();

        let presented = match gpu.render(&self.session) {
            Ok(()) => true,
            Err(e) if GpuState::is_surface_lost(&e) => {
                log::warn!("Surface lost/outdated ({e:?}), reconfiguring");
                gpu.recreate_surface();
                false
            }
            Err(SurfaceError::OutOfMemory) => {
                self.fail(event_loop, anyhow!("GPU out of memory"));
                return;
            }
            Err(e) => {
                log::warn!("Frame {frame_index} skipped: {e:?}");
                false
            }
        };

        if presented && self.config.show_fps {
            if let Some(fps) = self.fps.record(self.clock.lap()) {
                window.set_title(&format!("{} | {fps:.0} fps", self.config.title));
                log::debug!("{fps:.1} fps");
            }
        }

        if schedule_next(&self.frame_loop, presented) {
            window.request_redraw();
        } else {
            event_loop.exit();
        }
    }
}

/// Count the frame if it reached the screen and report whether another
/// redraw should be requested. A skipped frame is retried without counting.
fn schedule_next(frame_loop: &FrameLoop, presented: bool) -> bool {
    if presented {
        frame_loop.tick()
    } else {
        !frame_loop.is_cancelled()
    }
}

impl ApplicationHandler for SessionApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.create_window(event_loop) {
            self.fail(event_loop, err);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.frame_loop.is_cancelled() {
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested. Exiting event loop.");
                self.frame_loop.cancel();
                event_loop.exit();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                log::info!("Escape pressed. Stopping frame loop.");
                self.frame_loop.cancel();
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                log::debug!("Resized: {}x{}", new_size.width, new_size.height);
                if new_size.width == 0 || new_size.height == 0 {
                    return;
                }
                self.session.set_viewport(new_size.width, new_size.height);
                if let Some(gpu) = self.gpu.as_mut() {
                    gpu.resize(new_size.width, new_size.height);
                }
                if let Some(window) = self.window.as_ref() {
                    window.request_redraw();
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}

/// Averages frame deltas over roughly one second.
#[derive(Debug, Default)]
struct FpsCounter {
    elapsed: f32,
    frames: u32,
}

impl FpsCounter {
    const WINDOW_SECS: f32 = 1.0;

    /// Returns the average rate once a full window has accumulated.
    fn record(&mut self, dt: f32) -> Option<f32> {
        self.elapsed += dt;
        self.frames += 1;
        if self.elapsed < Self::WINDOW_SECS {
            return None;
        }
        let fps = self.frames as f32 / self.elapsed;
        *self = Self::default();
        Some(fps)
    }
}
