pub mod config;
pub mod labels;
pub mod render;
pub mod text;

pub use config::{RenderConfig, Rgba};
pub use render::SkiaRenderer;
pub use text::{TextCache, load_font, render_text_pixmap};
