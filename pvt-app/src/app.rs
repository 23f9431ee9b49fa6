use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use pixels::{Pixels, SurfaceTexture};
use pvt_core::{Point, Presenter};
use pvt_experiment::{PvtEngine, SessionConfig};
use pvt_render::{RenderConfig, SkiaRenderer, load_font};
use pvt_timing::{Clock, FrameTimings, MonotonicClock};
use rand::rngs::ThreadRng;
use tiny_skia::{Color, Paint, PathBuilder, Pixmap, Transform};
use tracing::{debug, error, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::{PhysicalPosition, PhysicalSize},
    event::{ElementState, MouseButton, TouchPhase, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Fullscreen, Icon, Window, WindowId},
};

/// Path to a JSON `SessionConfig`.
pub const SESSION_CONFIG_ENV: &str = "PVT_CONFIG";
/// Path to a JSON `RenderConfig`.
pub const RENDER_CONFIG_ENV: &str = "PVT_RENDER_CONFIG";

pub struct App {
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    renderer: Option<SkiaRenderer>,
    engine: PvtEngine<ThreadRng>,
    render_config: RenderConfig,
    clock: MonotonicClock,
    icon: Icon,
    cursor: Option<PhysicalPosition<f64>>,
    scale_factor: f64,
    refresh_rate: Option<f64>,
    frame_intervals: FrameTimings,
    last_present: Option<Instant>,
    reported: bool,
}

impl App {
    pub fn new() -> Result<Self> {
        let session = load_session_config()?;
        let render_config = load_render_config()?;
        let engine = PvtEngine::new(session, rand::rng()).context("invalid session config")?;

        Ok(Self {
            window: None,
            pixels: None,
            renderer: None,
            engine,
            render_config,
            clock: MonotonicClock::new(),
            icon: build_icon()?,
            cursor: None,
            scale_factor: 1.0,
            refresh_rate: None,
            frame_intervals: FrameTimings::default(),
            last_present: None,
            reported: false,
        })
    }

    pub fn run(mut self) -> Result<()> {
        let event_loop = EventLoop::new()?;
        info!(
            os = std::env::consts::OS,
            arch = std::env::consts::ARCH,
            "S/Enter starts, R resets, Esc exits"
        );
        event_loop.run_app(&mut self).map_err(Into::into)
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
            .ok_or_else(|| anyhow!("no monitor available"))?;
        self.refresh_rate = monitor
            .refresh_rate_millihertz()
            .map(|rate| rate as f64 / 1000.0);

        let attributes = Window::default_attributes()
            .with_title("PVT")
            .with_fullscreen(Some(Fullscreen::Borderless(Some(monitor))))
            .with_window_icon(Some(self.icon.clone()));
        let window = Arc::new(event_loop.create_window(attributes)?);

        let size = window.inner_size();
        self.scale_factor = window.scale_factor();
        info!(
            width = size.width,
            height = size.height,
            scale_factor = self.scale_factor,
            refresh_hz = self.refresh_rate,
            "display configured"
        );

        let surface = SurfaceTexture::new(size.width, size.height, Arc::clone(&window));
        self.pixels = Some(
            Pixels::new(size.width.max(1), size.height.max(1), surface)
                .context("creating pixel surface")?,
        );

        let mut renderer = SkiaRenderer::new(
            size.width,
            size.height,
            self.scale_factor,
            self.render_config.clone(),
        )?;
        match load_font(self.render_config.font_path.as_deref()) {
            Ok(font) => renderer = renderer.with_font(font),
            Err(e) => warn!(error = %e, "no font, labels disabled"),
        }
        renderer.render(&self.engine.view(self.clock.now()));
        self.renderer = Some(renderer);

        window.request_redraw();
        self.window = Some(window);
        Ok(())
    }

    fn draw(&mut self) -> Result<()> {
        let (Some(pixels), Some(renderer)) = (self.pixels.as_mut(), self.renderer.as_mut()) else {
            return Ok(());
        };
        if renderer.present(pixels.frame_mut()).is_err() {
            // Buffer and canvas disagree mid-resize; the resize handler redraws.
            return Ok(());
        }
        pixels.render()?;

        let now = Instant::now();
        if let Some(prev) = self.last_present.replace(now) {
            self.frame_intervals.record(now - prev);
        }
        Ok(())
    }

    fn handle_key(&mut self, key: PhysicalKey, event_loop: &ActiveEventLoop) {
        let PhysicalKey::Code(code) = key else {
            return;
        };
        let at = self.clock.now();
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        match code {
            KeyCode::KeyS | KeyCode::Enter | KeyCode::NumpadEnter => {
                if self.engine.start(at, renderer) {
                    self.reported = false;
                }
            }
            KeyCode::KeyR => {
                self.engine.reset(at, renderer);
                self.reported = false;
            }
            KeyCode::Escape => self.exit(event_loop),
            _ => {}
        }
    }

    /// Forward a press at a physical position as an activation in logical units.
    fn activate(&mut self, position: PhysicalPosition<f64>) {
        let at = self.clock.now();
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        let logical = position.to_logical::<f64>(self.scale_factor);
        let point = Point::new(logical.x as f32, logical.y as f32);
        if let Some(outcome) = self.engine.activate(point, at, renderer) {
            debug!(x = point.x, y = point.y, ?outcome, "activation");
        }
    }

    fn handle_resize(&mut self, size: PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        if let Some(pixels) = self.pixels.as_mut() {
            if let Err(e) = pixels.resize_surface(size.width, size.height) {
                error!(error = %e, "failed to resize surface");
            }
            if let Err(e) = pixels.resize_buffer(size.width, size.height) {
                error!(error = %e, "failed to resize buffer");
            }
        }
        if let Some(renderer) = self.renderer.as_mut() {
            if let Err(e) = renderer.resize(size.width, size.height, self.scale_factor) {
                error!(error = %e, "failed to resize canvas");
            }
        }
        debug!(width = size.width, height = size.height, "display resized");
    }

    /// Fire due timers, then sleep until the next engine or flash deadline.
    fn pump(&mut self, event_loop: &ActiveEventLoop) {
        let now = self.clock.now();
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        self.engine.update(now, renderer);
        renderer.refresh(now);

        if renderer.is_dirty() {
            if let Some(window) = &self.window {
                window.request_redraw();
            }
        }

        let wake = match (self.engine.next_deadline(), renderer.flash_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        event_loop.set_control_flow(match wake {
            Some(deadline) => ControlFlow::WaitUntil(self.clock.instant_at(deadline)),
            None => ControlFlow::Wait,
        });

        if self.engine.phase().is_done() && !self.reported {
            self.reported = true;
            self.report();
        }
    }

    fn report(&mut self) {
        if let Some(summary) = self.engine.summary() {
            match serde_json::to_string(summary) {
                Ok(json) => info!(summary = %json, "session summary"),
                Err(e) => error!(error = %e, "failed to serialise summary"),
            }
        }
        let cadence = self.frame_intervals.stats();
        debug!(
            frames = self.frame_intervals.len(),
            refresh_hz = self.refresh_rate,
            average_ms = cadence.average_frame_time_ns / 1e6,
            jitter_ms = cadence.jitter_ns / 1e6,
            effective_fps = cadence.effective_fps,
            "display cadence"
        );
        if let Some(renderer) = &self.renderer {
            let draw = renderer.draw_stats();
            debug!(
                average_us = draw.average_frame_time_ns / 1e3,
                max_us = draw.max_frame_time_ns / 1e3,
                "draw times"
            );
        }
    }

    fn exit(&mut self, event_loop: &ActiveEventLoop) {
        info!(phase = self.engine.phase().label(), "exiting");
        event_loop.exit();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                error!(error = %e, "failed to create window and surface");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => self.exit(event_loop),
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.draw() {
                    error!(error = %e, "render failed");
                    event_loop.exit();
                }
            }
            WindowEvent::KeyboardInput { event, .. }
                if event.state.is_pressed() && !event.repeat =>
            {
                self.handle_key(event.physical_key, event_loop);
            }
            WindowEvent::CursorMoved { position, .. } => self.cursor = Some(position),
            WindowEvent::CursorLeft { .. } => self.cursor = None,
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                if let Some(position) = self.cursor {
                    self.activate(position);
                }
            }
            WindowEvent::Touch(touch) if touch.phase == TouchPhase::Started => {
                self.activate(touch.location);
            }
            WindowEvent::Resized(size) => self.handle_resize(size),
            WindowEvent::ScaleFactorChanged { scale_factor, .. } => {
                self.scale_factor = scale_factor;
                if let Some(window) = &self.window {
                    let size = window.inner_size();
                    self.handle_resize(size);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.pump(event_loop);
    }
}

fn load_session_config() -> Result<SessionConfig> {
    match std::env::var_os(SESSION_CONFIG_ENV) {
        Some(path) => {
            let config = SessionConfig::load(&path)
                .with_context(|| format!("loading {}", path.to_string_lossy()))?;
            info!(path = %path.to_string_lossy(), "session config loaded");
            Ok(config)
        }
        None => Ok(SessionConfig::default()),
    }
}

fn load_render_config() -> Result<RenderConfig> {
    match std::env::var_os(RENDER_CONFIG_ENV) {
        Some(path) => {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.to_string_lossy()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("parsing {}", path.to_string_lossy()))
        }
        None => Ok(RenderConfig::default()),
    }
}

/// Window icon: the red target on the app background.
fn build_icon() -> Result<Icon> {
    const SIZE: u32 = 64;
    let mut pm = Pixmap::new(SIZE, SIZE).ok_or_else(|| anyhow!("icon pixmap"))?;
    pm.fill(Color::from_rgba8(0x0b, 0x0e, 0x14, 0xff));

    let half = SIZE as f32 / 2.0;
    let circle = PathBuilder::from_circle(half, half, half * 0.7)
        .ok_or_else(|| anyhow!("icon path"))?;
    let mut paint = Paint::default();
    paint.set_color(Color::from_rgba8(0xef, 0x44, 0x44, 0xff));
    pm.fill_path(
        &circle,
        &paint,
        tiny_skia::FillRule::Winding,
        Transform::identity(),
        None,
    );

    // Opaque, so the premultiplied bytes are already straight RGBA.
    Icon::from_rgba(pm.take(), SIZE, SIZE).map_err(|e| anyhow!("building icon: {e}"))
}
