//! # Rasterizer
//!
//! Draws broken lines onto a white pixmap and encodes the result as PNG.
//!
//! Geometry is fixed: text is left-aligned with its first line's em box
//! top at `(2, 2)`, and each further line sits `font_size * 1.1` lower.
//! These are the same constants the overflow predictor stacks lines with.
//!
//! Glyph shapes come from the loaded face's outlines. With the built-in
//! metrics table there are no outlines, so every visible character is
//! drawn as a solid block covering its advance from cap height to
//! baseline. That keeps output deterministic and shows exactly where the
//! layout placed each character.

use crate::error::{CanvasError, Result};
use crate::font::{FontContext, FontSpec};
use crate::layout::{line_height, max_line_width, TEXT_INSET};
use crate::model::{CanvasSettings, Rgba, TextElement};
use crate::session::EditorSession;
use crate::text::{break_lines, WrapMode};
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ColorType, ImageEncoder};
use tiny_skia::{FillRule, Paint, Path, PathBuilder, Pixmap, Rect, Transform};
use ttf_parser::{GlyphId, OutlineBuilder};

/// Fraction of the advance left empty on each side of a block glyph.
const BLOCK_SIDE_BEARING: f64 = 0.1;

/// Render `lines` onto a `width_px`×`height_px` white canvas.
pub fn render<I, S>(
    width_px: u32,
    height_px: u32,
    lines: I,
    font: &FontSpec,
    color: Rgba,
    glyphs: &FontContext,
) -> Result<Pixmap>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut pixmap = Pixmap::new(width_px, height_px).ok_or_else(|| {
        CanvasError::RenderError(format!("invalid canvas size {}x{}", width_px, height_px))
    })?;
    pixmap.fill(tiny_skia::Color::WHITE);

    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;

    let face = glyphs
        .face()
        .and_then(|(data, metrics)| ttf_parser::Face::parse(data, 0).ok().map(|f| (f, metrics)));

    let advance = line_height(font.size);
    let ascent = glyphs.ascent(font.size);
    let cap_height = glyphs.cap_height(font.size);

    for (i, line) in lines.into_iter().enumerate() {
        let line = line.as_ref();
        let top = TEXT_INSET + i as f64 * advance;
        if top >= height_px as f64 {
            break;
        }
        let baseline = top + ascent;
        let mut pen_x = TEXT_INSET;

        for ch in line.chars() {
            let width = glyphs.char_width(ch, font.size).unwrap_or(0.0);
            let path = match &face {
                Some((face, metrics)) => {
                    let scale = font.size / metrics.units_per_em as f64;
                    metrics.glyph_ids.get(&ch).and_then(|gid| {
                        let mut builder = GlyphPathBuilder::new(pen_x, baseline, scale);
                        face.outline_glyph(GlyphId(*gid), &mut builder)?;
                        builder.finish()
                    })
                }
                None => block_glyph(ch, pen_x, baseline, width, cap_height),
            };
            if let Some(path) = path {
                pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
            }
            pen_x += width;
        }
    }

    Ok(pixmap)
}

/// Draw the session's current text on its canvas.
pub fn render_session(session: &EditorSession, glyphs: &FontContext) -> Result<Pixmap> {
    render_text(session.settings(), session.current_text(), glyphs)
}

/// Lay out and draw `text` for a canvas, using the same breaker and
/// constants as [`crate::layout::will_overflow`]. Blank text draws nothing.
/// Settings are clamped into range first.
pub fn render_text(settings: &CanvasSettings, text: &str, glyphs: &FontContext) -> Result<Pixmap> {
    let settings = settings.normalized();
    let width_px = settings.canvas_width_px();
    let height_px = settings.canvas_height_px();
    let font = FontSpec::new(settings.font_size);

    let element = TextElement::project(text, settings.font_size);
    let Some(element) = element else {
        return render(width_px, height_px, std::iter::empty::<&str>(), &font, Rgba::BLACK, glyphs);
    };

    let color = Rgba::from_hex(&element.color).unwrap_or(Rgba::BLACK);
    let lines = break_lines(
        &element.text,
        max_line_width(width_px),
        &font,
        glyphs,
        WrapMode::from_char_wrap(settings.char_wrap),
    );
    render(width_px, height_px, lines, &font, color, glyphs)
}

/// Encode a pixmap as an 8-bit RGBA PNG.
pub fn encode_png(pixmap: &Pixmap) -> Result<Vec<u8>> {
    let mut rgba = Vec::with_capacity(pixmap.data().len());
    for px in pixmap.pixels() {
        let c = px.demultiply();
        rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }

    let mut out = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut out, CompressionType::Best, FilterType::Adaptive);
    encoder
        .write_image(&rgba, pixmap.width(), pixmap.height(), ColorType::Rgba8)
        .map_err(|e| CanvasError::RenderError(format!("png encode failed: {}", e)))?;
    Ok(out)
}

fn block_glyph(ch: char, pen_x: f64, baseline: f64, advance: f64, cap_height: f64) -> Option<Path> {
    if ch.is_whitespace() || ch.is_control() || advance <= 0.0 {
        return None;
    }
    let inset = advance * BLOCK_SIDE_BEARING;
    let rect = Rect::from_xywh(
        (pen_x + inset) as f32,
        (baseline - cap_height) as f32,
        (advance - 2.0 * inset) as f32,
        cap_height as f32,
    )?;
    Some(PathBuilder::from_rect(rect))
}

/// Converts font-unit outlines (y up) into pixmap paths (y down).
struct GlyphPathBuilder {
    builder: PathBuilder,
    origin_x: f64,
    origin_y: f64,
    scale: f64,
}

impl GlyphPathBuilder {
    fn new(origin_x: f64, origin_y: f64, scale: f64) -> Self {
        Self {
            builder: PathBuilder::new(),
            origin_x,
            origin_y,
            scale,
        }
    }

    fn x(&self, x: f32) -> f32 {
        (self.origin_x + x as f64 * self.scale) as f32
    }

    fn y(&self, y: f32) -> f32 {
        (self.origin_y - y as f64 * self.scale) as f32
    }

    fn finish(self) -> Option<Path> {
        self.builder.finish()
    }
}

impl OutlineBuilder for GlyphPathBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        let (x, y) = (self.x(x), self.y(y));
        self.builder.move_to(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let (x, y) = (self.x(x), self.y(y));
        self.builder.line_to(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        let (x1, y1, x, y) = (self.x(x1), self.y(y1), self.x(x), self.y(y));
        self.builder.quad_to(x1, y1, x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        let (x1, y1) = (self.x(x1), self.y(y1));
        let (x2, y2) = (self.x(x2), self.y(y2));
        let (x, y) = (self.x(x), self.y(y));
        self.builder.cubic_to(x1, y1, x2, y2, x, y);
    }

    fn close(&mut self) {
        self.builder.close();
    }
}
