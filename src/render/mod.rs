//! Render module: deterministic slide → raster conversion behind a
//! drawing-surface abstraction.

pub mod pipeline;
pub mod surface;

pub use pipeline::{platform_dimensions, wrap_text, RenderContext, RenderPipeline, RenderTheme};
pub use surface::{measure_text, parse_hex_color, DrawSurface, RasterImage, RasterSurface, Rgba};
