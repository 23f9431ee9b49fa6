use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use ab_glyph::{Font, FontVec, Glyph, PxScale, ScaleFont, point};
use anyhow::{Context, Result, anyhow};
use pvt_cache::{get_text, intern_text};
use tiny_skia::{Pixmap, PremultipliedColorU8};
use tracing::debug;

use crate::config::Rgba;

/// Fonts tried when no path is configured.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\segoeui.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Upper bound on cached label rasters before the cache is dropped wholesale.
const MAX_CACHED: usize = 512;

pub fn load_font(path: Option<&Path>) -> Result<FontVec> {
    if let Some(path) = path {
        return read_font(path);
    }
    SYSTEM_FONTS
        .iter()
        .map(Path::new)
        .filter(|p| p.exists())
        .find_map(|p| read_font(p).ok())
        .ok_or_else(|| anyhow!("no usable system font found"))
}

fn read_font(path: &Path) -> Result<FontVec> {
    let bytes =
        std::fs::read(path).with_context(|| format!("reading font {}", path.display()))?;
    let font = FontVec::try_from_vec(bytes)
        .map_err(|e| anyhow!("parsing font {}: {e}", path.display()))?;
    debug!(path = %path.display(), "font loaded");
    Ok(font)
}

/// Rasterise one line of text into a tight, premultiplied pixmap.
///
/// Returns `None` when nothing is drawable (empty string, only whitespace,
/// or glyphs missing from the font).
pub fn render_text_pixmap<F: Font>(
    text: &str,
    font_size: f32,
    font: &F,
    color: Rgba,
) -> Option<Pixmap> {
    let scale = PxScale::from(font_size);
    let sf = font.as_scaled(scale);

    // Baseline at ascent.
    let mut pen_x = 0.0f32;
    let mut glyphs = Vec::<Glyph>::new();
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = glyphs.last() {
            pen_x += sf.kern(prev.id, id);
        }
        glyphs.push(Glyph {
            id,
            scale,
            position: point(pen_x, sf.ascent()),
        });
        pen_x += sf.h_advance(id);
    }

    let outlined: Vec<_> = glyphs
        .into_iter()
        .filter_map(|g| font.outline_glyph(g))
        .collect();
    let first = outlined.first()?.px_bounds();
    let (mut min_x, mut min_y, mut max_x, mut max_y) =
        (first.min.x, first.min.y, first.max.x, first.max.y);
    for b in outlined.iter().map(|o| o.px_bounds()) {
        min_x = min_x.min(b.min.x);
        min_y = min_y.min(b.min.y);
        max_x = max_x.max(b.max.x);
        max_y = max_y.max(b.max.y);
    }

    let w = (max_x.ceil() - min_x.floor()).max(1.0) as u32;
    let h = (max_y.ceil() - min_y.floor()).max(1.0) as u32;
    let mut pm = Pixmap::new(w, h)?;
    let stride = w as usize;
    let dst = pm.pixels_mut();

    for out in &outlined {
        let b = out.px_bounds();
        out.draw(|x, y, cov| {
            if cov <= f32::EPSILON {
                return;
            }
            let ix = (x as f32 + b.min.x - min_x).floor() as i32;
            let iy = (y as f32 + b.min.y - min_y).floor() as i32;
            if ix < 0 || iy < 0 || ix >= w as i32 || iy >= h as i32 {
                return;
            }
            let i = iy as usize * stride + ix as usize;

            // Source over in premultiplied space.
            let a = (cov * color[3] as f32 / 255.0).clamp(0.0, 1.0);
            let inv = 1.0 - a;
            let bg = dst[i];
            let blend = |s: u8, d: u8| (s as f32 * a + d as f32 * inv).round().min(255.0) as u8;
            let sa = (a * 255.0 + bg.alpha() as f32 * inv).round().min(255.0) as u8;
            let (r, g, bl) = (
                blend(color[0], bg.red()),
                blend(color[1], bg.green()),
                blend(color[2], bg.blue()),
            );
            if let Some(px) = PremultipliedColorU8::from_rgba(r.min(sa), g.min(sa), bl.min(sa), sa)
            {
                dst[i] = px;
            }
        });
    }

    Some(pm)
}

/// Rasterised labels keyed by intern id, size and colour.
pub struct TextCache {
    font: FontVec,
    map: HashMap<(usize, u32, Rgba), Arc<Pixmap>>,
}

impl TextCache {
    pub fn new(font: FontVec) -> Self {
        Self {
            font,
            map: HashMap::new(),
        }
    }

    pub fn get_or_render(&mut self, text: &str, size_px: f32, color: Rgba) -> Option<Arc<Pixmap>> {
        let key = (intern_text(text), size_px.to_bits(), color);
        if let Some(pm) = self.map.get(&key) {
            return Some(Arc::clone(pm));
        }
        if self.map.len() >= MAX_CACHED {
            self.map.clear();
        }
        let atom = get_text(key.0)?;
        let pm = Arc::new(render_text_pixmap(&atom, size_px, &self.font, color)?);
        self.map.insert(key, Arc::clone(&pm));
        Some(pm)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
