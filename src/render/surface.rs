//! Drawing-surface abstraction and the in-process raster backend.
//!
//! The render pipeline targets the [`DrawSurface`] trait (fill rect,
//! vertical gradient, rounded rect, text line, measure) so the same layout
//! logic can drive any concrete backend. [`RasterSurface`] is the built-in
//! backend: an RGBA8 buffer with src-over blending, a fixed 8x8 bitmap
//! glyph set, and deterministic PNG encoding.

use font8x8::{UnicodeFonts, BASIC_FONTS};

use crate::error::{DraftError, DraftResult};

/// RGBA colour, 8 bits per channel.
pub type Rgba = [u8; 4];

/// Parses a `#rrggbb` hex colour string.
pub fn parse_hex_color(value: &str) -> DraftResult<Rgba> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(DraftError::invalid_background(value));
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
    match (channel(0), channel(2), channel(4)) {
        (Ok(r), Ok(g), Ok(b)) => Ok([r, g, b, 255]),
        _ => Err(DraftError::invalid_background(value)),
    }
}

/// Abstract drawing target for the render pipeline.
pub trait DrawSurface {
    /// Surface width in pixels.
    fn width(&self) -> u32;
    /// Surface height in pixels.
    fn height(&self) -> u32;
    /// Fills a rectangle with a (possibly translucent) colour.
    fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: Rgba);
    /// Fills a rectangle with a vertical linear gradient.
    fn fill_vertical_gradient(&mut self, x: i32, y: i32, w: u32, h: u32, top: Rgba, bottom: Rgba);
    /// Fills a rounded rectangle.
    fn fill_rounded_rect(&mut self, x: i32, y: i32, w: u32, h: u32, radius: u32, color: Rgba);
    /// Draws one line of text; `size` is the glyph height in pixels and `y`
    /// the top of the line.
    fn draw_text_line(&mut self, text: &str, x: i32, y: i32, size: u32, color: Rgba);
    /// Measured width of one line of text at the given size.
    fn measure_text(&self, text: &str, size: u32) -> u32;
    /// Draws an image scaled to cover the full surface, cropping the
    /// overflow symmetrically.
    fn blit_cover(&mut self, image: &RasterImage);
}

// =============================================================================
// RASTER IMAGE (decoded backgrounds)
// =============================================================================

/// A decoded RGBA image, used for slide background photos.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RasterImage {
    /// Wraps raw RGBA8 pixel data.
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> DraftResult<Self> {
        if pixels.len() != (width as usize) * (height as usize) * 4 {
            return Err(DraftError::validation("pixel buffer does not match dimensions"));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Decodes a PNG into RGBA8.
    pub fn from_png(bytes: &[u8]) -> DraftResult<Self> {
        let mut decoder = png::Decoder::new(std::io::Cursor::new(bytes));
        decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
        let mut reader = decoder.read_info()?;
        let mut buf = vec![0u8; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf)?;
        buf.truncate(info.buffer_size());

        let pixels = match info.color_type {
            png::ColorType::Rgba => buf,
            png::ColorType::Rgb => buf
                .chunks_exact(3)
                .flat_map(|p| [p[0], p[1], p[2], 255])
                .collect(),
            png::ColorType::Grayscale => {
                buf.iter().flat_map(|&g| [g, g, g, 255]).collect()
            }
            png::ColorType::GrayscaleAlpha => buf
                .chunks_exact(2)
                .flat_map(|p| [p[0], p[0], p[0], p[1]])
                .collect(),
            png::ColorType::Indexed => {
                return Err(DraftError::invalid_background("unsupported PNG colour type"))
            }
        };
        Self::from_rgba(info.width, info.height, pixels)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Nearest-neighbour sample at source coordinates.
    fn sample(&self, x: u32, y: u32) -> Rgba {
        let i = ((y * self.width + x) * 4) as usize;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }
}

// =============================================================================
// RASTER SURFACE
// =============================================================================

/// In-process RGBA8 raster backend.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterSurface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl RasterSurface {
    /// Creates a fully transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0u8; (width as usize) * (height as usize) * 4],
        }
    }

    /// Raw RGBA8 pixel data.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Reads one pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Rgba {
        let i = ((y * self.width + x) * 4) as usize;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    /// Src-over blends one pixel.
    fn blend_pixel(&mut self, x: i32, y: i32, color: Rgba) {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return;
        }
        let i = ((y as u32 * self.width + x as u32) * 4) as usize;
        let a = color[3] as u32;
        if a == 0 {
            return;
        }
        if a == 255 {
            self.pixels[i..i + 4].copy_from_slice(&color);
            return;
        }
        let inv = 255 - a;
        for c in 0..3 {
            let src = color[c] as u32;
            let dst = self.pixels[i + c] as u32;
            self.pixels[i + c] = ((src * a + dst * inv + 127) / 255) as u8;
        }
        let dst_a = self.pixels[i + 3] as u32;
        self.pixels[i + 3] = (a + dst_a * inv / 255).min(255) as u8;
    }

    /// Nearest-neighbour cover blit used by the trait implementation.
    fn blit_cover_impl(&mut self, image: &RasterImage) {
        if image.width == 0 || image.height == 0 {
            return;
        }
        // Cover ratio: the larger of the two axis ratios, in 1/65536 units.
        let rx = (self.width as u64) * 65536 / image.width as u64;
        let ry = (self.height as u64) * 65536 / image.height as u64;
        let ratio = rx.max(ry);
        let src_w = (self.width as u64) * 65536 / ratio;
        let src_h = (self.height as u64) * 65536 / ratio;
        let off_x = (image.width as u64).saturating_sub(src_w) / 2;
        let off_y = (image.height as u64).saturating_sub(src_h) / 2;

        for ty in 0..self.height {
            let sy = (off_y + (ty as u64) * src_h / self.height as u64).min(image.height as u64 - 1);
            for tx in 0..self.width {
                let sx =
                    (off_x + (tx as u64) * src_w / self.width as u64).min(image.width as u64 - 1);
                let color = image.sample(sx as u32, sy as u32);
                self.blend_pixel(tx as i32, ty as i32, [color[0], color[1], color[2], 255]);
            }
        }
    }

    /// Encodes the surface as a PNG. Identical pixel data always encodes to
    /// identical bytes.
    pub fn to_png(&self) -> DraftResult<Vec<u8>> {
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, self.width, self.height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header()?;
            writer.write_image_data(&self.pixels)?;
        }
        Ok(out)
    }
}

impl DrawSurface for RasterSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: Rgba) {
        for dy in 0..h as i32 {
            for dx in 0..w as i32 {
                self.blend_pixel(x + dx, y + dy, color);
            }
        }
    }

    fn fill_vertical_gradient(&mut self, x: i32, y: i32, w: u32, h: u32, top: Rgba, bottom: Rgba) {
        if h == 0 {
            return;
        }
        let span = (h - 1).max(1) as i32;
        for dy in 0..h as i32 {
            let mut color = [0u8; 4];
            for c in 0..4 {
                let t = top[c] as i32;
                let b = bottom[c] as i32;
                color[c] = (t + (b - t) * dy / span) as u8;
            }
            for dx in 0..w as i32 {
                self.blend_pixel(x + dx, y + dy, color);
            }
        }
    }

    fn fill_rounded_rect(&mut self, x: i32, y: i32, w: u32, h: u32, radius: u32, color: Rgba) {
        let r = radius.min(w / 2).min(h / 2) as i32;
        let (w, h) = (w as i32, h as i32);
        for dy in 0..h {
            for dx in 0..w {
                // Corner pixels outside the quarter-circle are skipped.
                let cx = if dx < r {
                    Some(r - 1 - dx)
                } else if dx >= w - r {
                    Some(dx - (w - r))
                } else {
                    None
                };
                let cy = if dy < r {
                    Some(r - 1 - dy)
                } else if dy >= h - r {
                    Some(dy - (h - r))
                } else {
                    None
                };
                if let (Some(cx), Some(cy)) = (cx, cy) {
                    if cx * cx + cy * cy > r * r {
                        continue;
                    }
                }
                self.blend_pixel(x + dx, y + dy, color);
            }
        }
    }

    fn draw_text_line(&mut self, text: &str, x: i32, y: i32, size: u32, color: Rgba) {
        let scale = (size / GLYPH_CELL).max(1) as i32;
        let advance = GLYPH_CELL as i32 * scale;
        for (index, ch) in text.chars().enumerate() {
            let glyph = glyph_for(ch);
            let gx = x + index as i32 * advance;
            for (row, bits) in glyph.iter().enumerate() {
                for col in 0..GLYPH_CELL as usize {
                    if bits & (1 << col) == 0 {
                        continue;
                    }
                    let px = gx + col as i32 * scale;
                    let py = y + row as i32 * scale;
                    self.fill_rect(px, py, scale as u32, scale as u32, color);
                }
            }
        }
    }

    fn measure_text(&self, text: &str, size: u32) -> u32 {
        measure_text(text, size)
    }

    fn blit_cover(&mut self, image: &RasterImage) {
        self.blit_cover_impl(image);
    }
}

/// Glyph cell edge of the built-in bitmap font.
const GLYPH_CELL: u32 = 8;

fn glyph_for(ch: char) -> [u8; 8] {
    BASIC_FONTS
        .get(ch)
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0u8; 8])
}

/// Measured width of one line at the given size (monospace glyph cells).
pub fn measure_text(text: &str, size: u32) -> u32 {
    let scale = (size / GLYPH_CELL).max(1);
    text.chars().count() as u32 * GLYPH_CELL * scale
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#1e293b").unwrap(), [0x1e, 0x29, 0x3b, 255]);
        assert_eq!(parse_hex_color("ffffff").unwrap(), [255, 255, 255, 255]);
        assert!(parse_hex_color("#12345").is_err());
        assert!(parse_hex_color("#zzzzzz").is_err());
    }

    #[test]
    fn test_fill_rect_opaque() {
        let mut surface = RasterSurface::new(4, 4);
        surface.fill_rect(1, 1, 2, 2, [255, 0, 0, 255]);
        assert_eq!(surface.pixel(1, 1), [255, 0, 0, 255]);
        assert_eq!(surface.pixel(0, 0), [0, 0, 0, 0]);
    }

    #[test]
    fn test_fill_rect_clips_outside_bounds() {
        let mut surface = RasterSurface::new(2, 2);
        surface.fill_rect(-1, -1, 10, 10, [0, 255, 0, 255]);
        assert_eq!(surface.pixel(0, 0), [0, 255, 0, 255]);
        assert_eq!(surface.pixel(1, 1), [0, 255, 0, 255]);
    }

    #[test]
    fn test_translucent_blend_over_white() {
        let mut surface = RasterSurface::new(1, 1);
        surface.fill_rect(0, 0, 1, 1, [255, 255, 255, 255]);
        surface.fill_rect(0, 0, 1, 1, [0, 0, 0, 128]);
        let pixel = surface.pixel(0, 0);
        // Roughly half-darkened white.
        assert!(pixel[0] > 120 && pixel[0] < 135);
        assert_eq!(pixel[3], 255);
    }

    #[test]
    fn test_gradient_endpoints() {
        let mut surface = RasterSurface::new(1, 10);
        surface.fill_vertical_gradient(0, 0, 1, 10, [0, 0, 0, 255], [90, 90, 90, 255]);
        assert_eq!(surface.pixel(0, 0), [0, 0, 0, 255]);
        assert_eq!(surface.pixel(0, 9), [90, 90, 90, 255]);
    }

    #[test]
    fn test_rounded_rect_skips_corners() {
        let mut surface = RasterSurface::new(20, 20);
        surface.fill_rounded_rect(0, 0, 20, 20, 8, [255, 255, 255, 255]);
        // Extreme corner is outside the rounding circle, centre is inside.
        assert_eq!(surface.pixel(0, 0), [0, 0, 0, 0]);
        assert_eq!(surface.pixel(10, 10), [255, 255, 255, 255]);
    }

    #[test]
    fn test_text_drawing_is_deterministic() {
        let mut a = RasterSurface::new(200, 40);
        let mut b = RasterSurface::new(200, 40);
        a.draw_text_line("Hello", 4, 4, 16, [255, 255, 255, 255]);
        b.draw_text_line("Hello", 4, 4, 16, [255, 255, 255, 255]);
        assert_eq!(a.pixels(), b.pixels());
    }

    #[test]
    fn test_measure_text_scales_with_size() {
        assert_eq!(measure_text("abcd", 8), 32);
        assert_eq!(measure_text("abcd", 16), 64);
        assert_eq!(measure_text("", 16), 0);
    }

    #[test]
    fn test_png_round_trip() {
        let mut surface = RasterSurface::new(3, 2);
        surface.fill_rect(0, 0, 3, 2, [10, 20, 30, 255]);
        let bytes = surface.to_png().unwrap();

        let image = RasterImage::from_png(&bytes).unwrap();
        assert_eq!(image.width(), 3);
        assert_eq!(image.height(), 2);
        assert_eq!(image.sample(0, 0), [10, 20, 30, 255]);
    }

    #[test]
    fn test_png_encoding_is_byte_identical() {
        let mut surface = RasterSurface::new(8, 8);
        surface.fill_vertical_gradient(0, 0, 8, 8, [0, 0, 0, 255], [255, 255, 255, 255]);
        assert_eq!(surface.to_png().unwrap(), surface.to_png().unwrap());
    }

    #[test]
    fn test_blit_cover_fills_surface() {
        let image = RasterImage::from_rgba(2, 2, vec![200u8; 16]).unwrap();
        let mut surface = RasterSurface::new(6, 4);
        surface.blit_cover(&image);
        assert_eq!(surface.pixel(0, 0), [200, 200, 200, 255]);
        assert_eq!(surface.pixel(5, 3), [200, 200, 200, 255]);
    }
}
