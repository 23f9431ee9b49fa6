use std::time::{Duration, Instant};

use ab_glyph::FontVec;
use anyhow::{Result, anyhow};
use pvt_core::{
    Phase, Presenter, ResponseOutcome, SurfaceGeometry, Timestamp, View, ms_to_ns,
};
use pvt_timing::{CadenceStats, FrameTimings};
use tiny_skia::{
    Color, FillRule, Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Transform,
};
use tracing::{debug, trace};

use crate::config::{RenderConfig, Rgba};
use crate::labels;
use crate::text::TextCache;

/// Draws slower than this are logged.
const SLOW_DRAW: Duration = Duration::from_millis(8);

#[derive(Debug, Clone, Copy, PartialEq)]
struct Flash {
    color: Rgba,
    until: Timestamp,
}

/// Software renderer for the PVT surface.
///
/// Draws into an opaque physical-pixel canvas; all layout is done in logical
/// units and scaled on the way out, so the geometry reported to the engine
/// matches the coordinates activations arrive in.
pub struct SkiaRenderer {
    config: RenderConfig,
    width: u32,
    height: u32,
    scale: f32,
    canvas: Pixmap,
    text: Option<TextCache>,
    last_view: Option<View>,
    flash: Option<Flash>,
    draw_times: FrameTimings,
    dirty: bool,
}

impl SkiaRenderer {
    pub fn new(width: u32, height: u32, scale: f64, config: RenderConfig) -> Result<Self> {
        let canvas = Pixmap::new(width.max(1), height.max(1))
            .ok_or_else(|| anyhow!("cannot allocate a {width}×{height} canvas"))?;
        let mut renderer = Self {
            config,
            width: canvas.width(),
            height: canvas.height(),
            scale: sanitize_scale(scale),
            canvas,
            text: None,
            last_view: None,
            flash: None,
            draw_times: FrameTimings::default(),
            dirty: true,
        };
        renderer.clear();
        Ok(renderer)
    }

    pub fn with_font(mut self, font: FontVec) -> Self {
        self.text = Some(TextCache::new(font));
        self
    }

    pub fn has_font(&self) -> bool {
        self.text.is_some()
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Reallocate for a new surface size. Zero-sized surfaces (minimised
    /// windows) keep the previous canvas.
    pub fn resize(&mut self, width: u32, height: u32, scale: f64) -> Result<()> {
        self.scale = sanitize_scale(scale);
        if width == 0 || height == 0 {
            debug!(width, height, "ignoring zero-sized surface");
            return Ok(());
        }
        if (width, height) != (self.width, self.height) {
            self.canvas = Pixmap::new(width, height)
                .ok_or_else(|| anyhow!("cannot allocate a {width}×{height} canvas"))?;
            self.width = width;
            self.height = height;
        }
        self.redraw();
        Ok(())
    }

    /// Drop an expired flash. Returns true when the canvas changed.
    pub fn refresh(&mut self, now: Timestamp) -> bool {
        match self.flash {
            Some(flash) if now >= flash.until => {
                self.flash = None;
                self.redraw();
                true
            }
            _ => false,
        }
    }

    /// When the current flash needs to be taken down.
    pub fn flash_deadline(&self) -> Option<Timestamp> {
        self.flash.map(|f| f.until)
    }

    /// Whether the canvas changed since the last [`SkiaRenderer::present`].
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Copy the canvas into an RGBA8 frame of the same size.
    pub fn present(&mut self, frame: &mut [u8]) -> Result<()> {
        let src = self.canvas.data();
        if frame.len() != src.len() {
            return Err(anyhow!(
                "frame is {} bytes, canvas is {} bytes",
                frame.len(),
                src.len()
            ));
        }
        // The canvas is fully opaque, so premultiplied and straight RGBA agree.
        frame.copy_from_slice(src);
        self.dirty = false;
        Ok(())
    }

    pub fn canvas(&self) -> &Pixmap {
        &self.canvas
    }

    pub fn draw_stats(&self) -> CadenceStats {
        self.draw_times.stats()
    }

    fn logical_size(&self) -> (f32, f32) {
        (
            self.width as f32 / self.scale,
            self.height as f32 / self.scale,
        )
    }

    fn redraw(&mut self) {
        if let Some(view) = self.last_view.take() {
            self.draw(&view);
            self.last_view = Some(view);
        } else {
            self.clear();
        }
    }

    fn clear(&mut self) {
        self.canvas.fill(color(self.config.background));
        self.dirty = true;
    }

    fn draw(&mut self, view: &View) {
        let started = Instant::now();
        let geometry = self.geometry();
        let center = geometry.center();
        let radius = geometry.target_radius;

        self.clear();

        match (view.phase, view.target) {
            (Phase::Target, Some(target)) => {
                self.fill_circle(
                    target.position.x,
                    target.position.y,
                    target.radius,
                    self.config.target,
                );
            }
            _ => self.fill_circle(center.x, center.y, radius, self.config.idle_disc),
        }

        let text = self.config.text;
        let hint_color = match (view.phase, view.end.and_then(|e| e.verdict)) {
            (Phase::Done, Some(verdict)) => labels::verdict_colour(verdict),
            _ => text,
        };
        self.draw_label(
            &labels::headline(view),
            center.x,
            center.y - radius - 24.0,
            self.config.headline_px,
            text,
        );
        self.draw_label(
            &labels::hint(view),
            center.x,
            center.y + radius + 24.0,
            self.config.hint_px,
            hint_color,
        );
        self.draw_label(
            &labels::status_line(view),
            center.x,
            20.0,
            self.config.status_px,
            text,
        );
        if view.phase != Phase::Idle {
            self.draw_label(
                &labels::readout(view),
                center.x,
                geometry.height - 20.0,
                self.config.status_px,
                text,
            );
        }

        if let Some(flash) = self.flash {
            self.draw_border(flash.color);
        }

        let elapsed = started.elapsed();
        self.draw_times.record(elapsed);
        if elapsed > SLOW_DRAW {
            debug!(phase = view.phase.label(), ?elapsed, "slow frame");
        }
        trace!(
            phase = view.phase.label(),
            draw_us = elapsed.as_micros() as u64,
            "frame drawn"
        );
    }

    fn transform(&self) -> Transform {
        Transform::from_scale(self.scale, self.scale)
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, r: f32, rgba: Rgba) {
        let Some(path) = PathBuilder::from_circle(cx, cy, r.max(0.5)) else {
            return;
        };
        let mut paint = Paint::default();
        paint.set_color(color(rgba));
        paint.anti_alias = true;
        let transform = self.transform();
        self.canvas
            .fill_path(&path, &paint, FillRule::Winding, transform, None);
    }

    fn draw_border(&mut self, rgba: Rgba) {
        let (w, h) = self.logical_size();
        let t = self.config.flash_width.min(w / 2.0).min(h / 2.0);
        let mut paint = Paint::default();
        paint.set_color(color(rgba));
        let transform = self.transform();
        let edges = [
            Rect::from_xywh(0.0, 0.0, w, t),
            Rect::from_xywh(0.0, h - t, w, t),
            Rect::from_xywh(0.0, 0.0, t, h),
            Rect::from_xywh(w - t, 0.0, t, h),
        ];
        for rect in edges.into_iter().flatten() {
            self.canvas.fill_rect(rect, &paint, transform, None);
        }
    }

    /// Centre a label on a logical point. Skipped silently without a font.
    fn draw_label(&mut self, s: &str, x: f32, y: f32, size_px: f32, rgba: Rgba) {
        let scale = self.scale;
        let Some(cache) = self.text.as_mut() else {
            return;
        };
        let Some(pm) = cache.get_or_render(s, size_px * scale, rgba) else {
            return;
        };
        let px = (x * scale - pm.width() as f32 / 2.0).round() as i32;
        let py = (y * scale - pm.height() as f32 / 2.0).round() as i32;
        self.canvas.draw_pixmap(
            px,
            py,
            Pixmap::as_ref(&pm),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }
}

impl Presenter for SkiaRenderer {
    fn render(&mut self, view: &View) {
        match view.feedback {
            Some(outcome) => {
                let color = match outcome {
                    ResponseOutcome::FalseStart => self.config.false_start_flash,
                    ResponseOutcome::Hit | ResponseOutcome::LapseHit => self.config.hit_flash,
                };
                self.flash = Some(Flash {
                    color,
                    until: view.at.saturating_add(ms_to_ns(self.config.flash_ms)),
                });
            }
            None => {
                if self.flash.is_some_and(|f| view.at >= f.until) {
                    self.flash = None;
                }
            }
        }
        self.draw(view);
        self.last_view = Some(view.clone());
    }

    fn geometry(&self) -> SurfaceGeometry {
        let (w, h) = self.logical_size();
        SurfaceGeometry::new(w, h, self.config.target_radius(w, h))
    }
}

fn sanitize_scale(scale: f64) -> f32 {
    if scale.is_finite() && scale > 0.0 {
        scale as f32
    } else {
        1.0
    }
}

fn color(rgba: Rgba) -> Color {
    Color::from_rgba8(rgba[0], rgba[1], rgba[2], rgba[3])
}
