//! Render pipeline: deterministic slide → raster conversion.
//!
//! `render_slide` is a pure function of its inputs: given identical slide
//! content, platform, quality and resolved background, the output raster is
//! pixel-identical. All layout coordinates are fixed base-1080 values,
//! multiplied by the quality scale factor.

use crate::draft::{ArcLink, Background, Platform, Quality, Slide};
use crate::error::DraftResult;
use crate::render::surface::{
    parse_hex_color, DrawSurface, RasterImage, RasterSurface, Rgba,
};

/// Static platform → base canvas dimension table.
pub fn platform_dimensions(platform: Platform) -> (u32, u32) {
    match platform {
        Platform::Feed => (1080, 1080),
        Platform::Story => (1080, 1920),
        Platform::Shorts => (1080, 1920),
    }
}

// =============================================================================
// THEME
// =============================================================================

/// Fixed colours, sizes and margins of the slide layout.
#[derive(Debug, Clone)]
pub struct RenderTheme {
    /// Brand label drawn in the top-left mark.
    pub brand_label: String,
    /// Background used when a slide has no usable background value.
    pub fallback_background: Rgba,
    /// Translucent overlay gradient, top colour.
    pub overlay_top: Rgba,
    /// Translucent overlay gradient, bottom colour.
    pub overlay_bottom: Rgba,
    pub headline_color: Rgba,
    pub subheadline_color: Rgba,
    pub body_color: Rgba,
    pub cta_background: Rgba,
    pub cta_color: Rgba,
    pub narrative_color: Rgba,
    /// Horizontal page margin in base units.
    pub margin: u32,
    pub headline_size: u32,
    pub subheadline_size: u32,
    pub body_size: u32,
    pub cta_size: u32,
    pub narrative_size: u32,
    pub brand_size: u32,
    /// Vertical gap between wrapped lines, in base units.
    pub line_gap: u32,
}

impl Default for RenderTheme {
    fn default() -> Self {
        Self {
            brand_label: "POSTCRAFT".to_string(),
            fallback_background: [0x1e, 0x29, 0x3b, 255],
            overlay_top: [0, 0, 0, 64],
            overlay_bottom: [0, 0, 0, 160],
            headline_color: [255, 255, 255, 255],
            subheadline_color: [226, 232, 240, 255],
            body_color: [203, 213, 225, 255],
            cta_background: [249, 115, 22, 255],
            cta_color: [255, 255, 255, 255],
            narrative_color: [148, 163, 184, 255],
            margin: 80,
            headline_size: 64,
            subheadline_size: 40,
            body_size: 32,
            cta_size: 32,
            narrative_size: 24,
            brand_size: 24,
            line_gap: 12,
        }
    }
}

// =============================================================================
// CONTEXT
// =============================================================================

/// Per-render inputs beyond the slide itself.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    pub platform: Platform,
    pub quality: Quality,
    /// 0-based position of the slide within the draft.
    pub slide_index: usize,
    pub slide_count: usize,
    /// Narrative-arc linkage; gates the recap/cliffhanger/next-hint blocks.
    pub arc: Option<&'a ArcLink>,
    /// Draft-level CTA used when the slide carries none.
    pub cta_fallback: Option<&'a str>,
    /// Pre-resolved background image for `Background::Image` slides.
    pub background_image: Option<&'a RasterImage>,
}

impl<'a> RenderContext<'a> {
    /// Context for a standalone slide (no arc, no background image).
    pub fn standalone(platform: Platform, quality: Quality) -> Self {
        Self {
            platform,
            quality,
            slide_index: 0,
            slide_count: 1,
            arc: None,
            cta_fallback: None,
            background_image: None,
        }
    }

    fn is_first(&self) -> bool {
        self.slide_index == 0
    }

    fn is_last(&self) -> bool {
        self.slide_index + 1 == self.slide_count
    }
}

// =============================================================================
// WORD WRAP
// =============================================================================

/// Greedy line-breaking: accumulate words until adding the next would exceed
/// `max_width`, then flush the line and continue, flushing the trailing line
/// at the end. Empty text produces no lines.
pub fn wrap_text<F>(text: &str, max_width: u32, measure: F) -> Vec<String>
where
    F: Fn(&str) -> u32,
{
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if line.is_empty() {
            line.push_str(word);
            continue;
        }
        let candidate_width = measure(&line) + measure(" ") + measure(word);
        if candidate_width <= max_width {
            line.push(' ');
            line.push_str(word);
        } else {
            lines.push(std::mem::take(&mut line));
            line.push_str(word);
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

// =============================================================================
// PIPELINE
// =============================================================================

/// Deterministic slide renderer over a fixed theme.
pub struct RenderPipeline {
    theme: RenderTheme,
}

impl RenderPipeline {
    /// Creates a pipeline with the given theme.
    pub fn new(theme: RenderTheme) -> Self {
        Self { theme }
    }

    /// The pipeline's theme.
    pub fn theme(&self) -> &RenderTheme {
        &self.theme
    }

    /// Renders one slide to a raster surface.
    pub fn render_slide(&self, slide: &Slide, ctx: &RenderContext<'_>) -> DraftResult<RasterSurface> {
        let (bw, bh) = platform_dimensions(ctx.platform);
        let s = ctx.quality.scale();
        let mut surface = RasterSurface::new(bw * s, bh * s);
        self.compose(&mut surface, slide, ctx)?;
        Ok(surface)
    }

    /// Draws the full slide layout onto any drawing surface.
    fn compose(
        &self,
        surface: &mut dyn DrawSurface,
        slide: &Slide,
        ctx: &RenderContext<'_>,
    ) -> DraftResult<()> {
        let theme = &self.theme;
        let (bw, bh) = platform_dimensions(ctx.platform);
        let s = ctx.quality.scale();
        let (w, h) = (bw * s, bh * s);

        // Background
        match &slide.background {
            Background::Color(hex) => {
                let color = parse_hex_color(hex)?;
                surface.fill_rect(0, 0, w, h, color);
            }
            Background::Image(_) => match ctx.background_image {
                Some(image) => surface.blit_cover(image),
                None => surface.fill_rect(0, 0, w, h, theme.fallback_background),
            },
        }

        // Translucent overlay gradient
        surface.fill_vertical_gradient(0, 0, w, h, theme.overlay_top, theme.overlay_bottom);

        // Brand mark
        self.draw_brand_mark(surface, s);

        let margin = (theme.margin * s) as i32;
        let max_width = w - 2 * theme.margin * s;

        // Recap block, first slide of a narrative arc only
        if let Some(arc) = ctx.arc {
            if ctx.is_first() {
                if let Some(recap) = arc.recap.as_deref() {
                    self.draw_block(
                        surface,
                        recap,
                        margin,
                        ((theme.margin + 120) * s) as i32,
                        max_width,
                        theme.narrative_size * s,
                        theme.narrative_color,
                    );
                }
            }
        }

        // Main text column
        let mut y = (bh * 35 / 100 * s) as i32;
        y = self.draw_block(
            surface,
            &slide.headline,
            margin,
            y,
            max_width,
            theme.headline_size * s,
            theme.headline_color,
        );
        if let Some(subheadline) = slide.subheadline.as_deref() {
            y += (theme.line_gap * s) as i32;
            y = self.draw_block(
                surface,
                subheadline,
                margin,
                y,
                max_width,
                theme.subheadline_size * s,
                theme.subheadline_color,
            );
        }
        if let Some(body) = slide.body_text.as_deref() {
            y += (2 * theme.line_gap * s) as i32;
            self.draw_block(
                surface,
                body,
                margin,
                y,
                max_width,
                theme.body_size * s,
                theme.body_color,
            );
        }

        // Cliffhanger / next-episode hint, last slide of a narrative arc only
        if let Some(arc) = ctx.arc {
            if ctx.is_last() {
                let mut ny = ((bh - 340) * s) as i32;
                if let Some(cliffhanger) = arc.cliffhanger.as_deref() {
                    ny = self.draw_block(
                        surface,
                        cliffhanger,
                        margin,
                        ny,
                        max_width,
                        theme.narrative_size * s,
                        theme.narrative_color,
                    );
                }
                if let Some(next_hint) = arc.next_hint.as_deref() {
                    self.draw_block(
                        surface,
                        next_hint,
                        margin,
                        ny + (theme.line_gap * s) as i32,
                        max_width,
                        theme.narrative_size * s,
                        theme.narrative_color,
                    );
                }
            }
        }

        // CTA pill
        let cta = slide.cta_text.as_deref().or(ctx.cta_fallback);
        if let Some(cta) = cta.filter(|c| !c.is_empty()) {
            let size = theme.cta_size * s;
            let pad = 24 * s;
            let text_width = surface.measure_text(cta, size);
            let pill_w = (text_width + 2 * pad).min(max_width);
            let pill_h = size + pad;
            let pill_y = ((bh - 160) * s) as i32;
            surface.fill_rounded_rect(
                margin,
                pill_y,
                pill_w,
                pill_h,
                pill_h / 2,
                theme.cta_background,
            );
            surface.draw_text_line(
                cta,
                margin + pad as i32,
                pill_y + (pad / 2) as i32,
                size,
                theme.cta_color,
            );
        }

        Ok(())
    }

    fn draw_brand_mark(&self, surface: &mut dyn DrawSurface, s: u32) {
        let theme = &self.theme;
        let size = theme.brand_size * s;
        let pad = 16 * s;
        let x = (theme.margin * s) as i32;
        let y = (60 * s) as i32;
        let label_width = surface.measure_text(&theme.brand_label, size);
        surface.fill_rounded_rect(
            x,
            y,
            label_width + 2 * pad,
            size + pad,
            (size + pad) / 2,
            [255, 255, 255, 40],
        );
        surface.draw_text_line(
            &theme.brand_label,
            x + pad as i32,
            y + (pad / 2) as i32,
            size,
            theme.headline_color,
        );
    }

    /// Word-wraps and draws one text block; returns the y below it.
    fn draw_block(
        &self,
        surface: &mut dyn DrawSurface,
        text: &str,
        x: i32,
        y: i32,
        max_width: u32,
        size: u32,
        color: Rgba,
    ) -> i32 {
        let lines = wrap_text(text, max_width, |t| surface.measure_text(t, size));
        // Fixed proportional leading: a quarter of the glyph height.
        let line_height = (size + size / 4) as i32;
        let mut cursor = y;
        for line in &lines {
            surface.draw_text_line(line, x, cursor, size, color);
            cursor += line_height;
        }
        cursor
    }
}

impl Default for RenderPipeline {
    fn default() -> Self {
        Self::new(RenderTheme::default())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::Background;

    fn slide() -> Slide {
        Slide::new("Ten minute mobility")
            .with_subheadline("Start your morning right")
            .with_body_text("A short routine you can do before coffee, no equipment needed")
            .with_cta_text("Follow for more")
    }

    #[test]
    fn test_platform_dimension_table() {
        assert_eq!(platform_dimensions(Platform::Feed), (1080, 1080));
        assert_eq!(platform_dimensions(Platform::Story), (1080, 1920));
        assert_eq!(platform_dimensions(Platform::Shorts), (1080, 1920));
    }

    #[test]
    fn test_render_is_deterministic() {
        let pipeline = RenderPipeline::default();
        let ctx = RenderContext::standalone(Platform::Feed, Quality::Standard);

        let a = pipeline.render_slide(&slide(), &ctx).unwrap();
        let b = pipeline.render_slide(&slide(), &ctx).unwrap();
        assert_eq!(a.to_png().unwrap(), b.to_png().unwrap());
    }

    #[test]
    fn test_quality_scales_dimensions() {
        let pipeline = RenderPipeline::default();

        let standard = pipeline
            .render_slide(
                &slide(),
                &RenderContext::standalone(Platform::Story, Quality::Standard),
            )
            .unwrap();
        assert_eq!((standard.width(), standard.height()), (1080, 1920));

        let high = pipeline
            .render_slide(
                &slide(),
                &RenderContext::standalone(Platform::Story, Quality::High),
            )
            .unwrap();
        assert_eq!((high.width(), high.height()), (2160, 3840));
    }

    #[test]
    fn test_invalid_background_color_is_an_error() {
        let pipeline = RenderPipeline::default();
        let bad = Slide::new("x").with_background(Background::Color("#nothex".to_string()));
        let ctx = RenderContext::standalone(Platform::Feed, Quality::Standard);
        assert!(pipeline.render_slide(&bad, &ctx).is_err());
    }

    #[test]
    fn test_wrap_empty_text_produces_no_lines() {
        let lines = wrap_text("", 100, |t| t.len() as u32 * 8);
        assert!(lines.is_empty());
    }

    #[test]
    fn test_wrap_exact_width_is_one_line() {
        // "abc def" measures exactly 56 at 8 px/char.
        let lines = wrap_text("abc def", 56, |t| t.len() as u32 * 8);
        assert_eq!(lines, vec!["abc def".to_string()]);
    }

    #[test]
    fn test_wrap_breaks_greedily() {
        let lines = wrap_text("aa bb cc", 40, |t| t.len() as u32 * 8);
        assert_eq!(lines, vec!["aa bb".to_string(), "cc".to_string()]);
    }

    #[test]
    fn test_wrap_flushes_trailing_line() {
        let lines = wrap_text("one two three", 64, |t| t.len() as u32 * 8);
        assert_eq!(lines.last().unwrap(), "three");
    }

    #[test]
    fn test_overlong_word_gets_its_own_line() {
        let lines = wrap_text("a extraordinarily b", 48, |t| t.len() as u32 * 8);
        assert_eq!(
            lines,
            vec![
                "a".to_string(),
                "extraordinarily".to_string(),
                "b".to_string(),
            ]
        );
    }

    #[test]
    fn test_narrative_blocks_only_on_edge_slides() {
        let pipeline = RenderPipeline::default();
        let arc = ArcLink::new("arc-1", 2)
            .with_recap("Previously: we fixed our posture")
            .with_cliffhanger("But the hips were a different story")
            .with_next_hint("Episode 3 drops Friday");

        let base = RenderContext::standalone(Platform::Feed, Quality::Standard);
        let middle_plain = RenderContext {
            slide_index: 1,
            slide_count: 3,
            ..base
        };
        let middle_arc = RenderContext {
            arc: Some(&arc),
            ..middle_plain
        };

        // Middle slides are unaffected by the arc.
        let a = pipeline.render_slide(&slide(), &middle_plain).unwrap();
        let b = pipeline.render_slide(&slide(), &middle_arc).unwrap();
        assert_eq!(a.to_png().unwrap(), b.to_png().unwrap());

        // First and last slides are.
        let first_plain = RenderContext {
            slide_index: 0,
            slide_count: 3,
            ..base
        };
        let first_arc = RenderContext {
            arc: Some(&arc),
            ..first_plain
        };
        let a = pipeline.render_slide(&slide(), &first_plain).unwrap();
        let b = pipeline.render_slide(&slide(), &first_arc).unwrap();
        assert_ne!(a.to_png().unwrap(), b.to_png().unwrap());

        let last_plain = RenderContext {
            slide_index: 2,
            slide_count: 3,
            ..base
        };
        let last_arc = RenderContext {
            arc: Some(&arc),
            ..last_plain
        };
        let a = pipeline.render_slide(&slide(), &last_plain).unwrap();
        let b = pipeline.render_slide(&slide(), &last_arc).unwrap();
        assert_ne!(a.to_png().unwrap(), b.to_png().unwrap());
    }

    #[test]
    fn test_cta_fallback_used_when_slide_has_none() {
        let pipeline = RenderPipeline::default();
        let mut bare = slide();
        bare.cta_text = None;

        let without = RenderContext::standalone(Platform::Feed, Quality::Standard);
        let with = RenderContext {
            cta_fallback: Some("Save this post"),
            ..without
        };

        let a = pipeline.render_slide(&bare, &without).unwrap();
        let b = pipeline.render_slide(&bare, &with).unwrap();
        assert_ne!(a.to_png().unwrap(), b.to_png().unwrap());
    }
}
