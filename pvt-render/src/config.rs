use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Straight (non-premultiplied) 8-bit RGBA.
pub type Rgba = [u8; 4];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Target radius as a fraction of the surface's shorter side.
    pub target_radius_fraction: f32,
    pub background: Rgba,
    pub idle_disc: Rgba,
    pub target: Rgba,
    pub text: Rgba,
    pub hit_flash: Rgba,
    pub false_start_flash: Rgba,
    pub flash_ms: u64,
    /// Border width of the flash, logical units.
    pub flash_width: f32,
    pub headline_px: f32,
    pub hint_px: f32,
    pub status_px: f32,
    /// TrueType font for labels. When unset a few common system fonts are tried.
    pub font_path: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            target_radius_fraction: 0.18,
            background: [0x0b, 0x0e, 0x14, 0xff],
            idle_disc: [0x2a, 0x31, 0x42, 0xff],
            target: [0xef, 0x44, 0x44, 0xff],
            text: [0xcb, 0xd5, 0xe1, 0xff],
            hit_flash: [0x16, 0xa3, 0x4a, 0xff],
            false_start_flash: [0x7f, 0x1d, 0x1d, 0xff],
            flash_ms: 180,
            flash_width: 10.0,
            headline_px: 18.0,
            hint_px: 14.0,
            status_px: 15.0,
            font_path: None,
        }
    }
}

impl RenderConfig {
    pub fn target_radius(&self, width: f32, height: f32) -> f32 {
        width.min(height).max(0.0) * self.target_radius_fraction
    }
}
