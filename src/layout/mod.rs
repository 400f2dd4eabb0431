//! # Overflow Prediction
//!
//! Decides whether text fits a canvas before anything is drawn. The
//! prediction counts lines with the same breaker the rasterizer uses and
//! stacks them with the same constants, so a prediction of "fits" always
//! means the drawn text stays inside the canvas height.

use crate::font::{FontSpec, GlyphMetrics};
use crate::model::{clamp_tokens, CanvasSettings, PIXEL_SIZE};
use crate::text::{break_lines, WrapMode};

/// Inset between the canvas edge and the text, on every side.
pub const TEXT_INSET: f64 = 2.0;
/// Line advance as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f64 = 1.1;

pub fn line_height(font_size: f64) -> f64 {
    font_size * LINE_HEIGHT_FACTOR
}

/// Width available to a line on a canvas `width_px` wide.
pub fn max_line_width(width_px: u32) -> f64 {
    width_px as f64 - 2.0 * TEXT_INSET
}

/// The vertical extent of a laid-out text block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextBlock {
    pub line_count: usize,
    pub line_height: f64,
    /// Lines plus top and bottom inset.
    pub total_height: f64,
    pub available_height: f64,
}

impl TextBlock {
    pub fn overflows(&self) -> bool {
        self.total_height > self.available_height
    }

    /// How many pixels the block extends past the canvas bottom.
    pub fn overflow_px(&self) -> f64 {
        (self.total_height - self.available_height).max(0.0)
    }
}

/// Lay out `text` on a canvas and measure the resulting block.
///
/// Returns `None` when the text is blank or the metrics oracle cannot
/// measure anything; in both cases there is nothing that could overflow.
/// Token counts outside `[1, 32]` are clamped first.
pub fn measure_block<M: GlyphMetrics + ?Sized>(
    text: &str,
    width_tokens: u32,
    height_tokens: u32,
    font_size: f64,
    char_wrap: bool,
    metrics: &M,
) -> Option<TextBlock> {
    if text.trim().is_empty() {
        return None;
    }

    let font = FontSpec::new(font_size);
    if metrics.measure("", &font).is_none() {
        tracing::debug!("text measurement unavailable for '{}', assuming no overflow", font);
        return None;
    }

    let width_tokens = clamp_tokens(width_tokens as i64);
    let height_tokens = clamp_tokens(height_tokens as i64);
    let max_width = max_line_width(width_tokens * PIXEL_SIZE);
    let mode = WrapMode::from_char_wrap(char_wrap);
    let line_count = break_lines(text, max_width, &font, metrics, mode).count();

    let line_height = line_height(font_size);
    Some(TextBlock {
        line_count,
        line_height,
        total_height: line_count as f64 * line_height + 2.0 * TEXT_INSET,
        available_height: (height_tokens * PIXEL_SIZE) as f64,
    })
}

/// Predict whether `text` overflows a `width_tokens`×`height_tokens` canvas.
pub fn will_overflow<M: GlyphMetrics + ?Sized>(
    text: &str,
    width_tokens: u32,
    height_tokens: u32,
    font_size: f64,
    char_wrap: bool,
    metrics: &M,
) -> bool {
    measure_block(text, width_tokens, height_tokens, font_size, char_wrap, metrics)
        .map(|block| block.overflows())
        .unwrap_or(false)
}

/// [`will_overflow`] against a full settings value.
pub fn settings_overflow<M: GlyphMetrics + ?Sized>(
    text: &str,
    settings: &CanvasSettings,
    metrics: &M,
) -> bool {
    will_overflow(
        text,
        settings.width_tokens,
        settings.height_tokens,
        settings.font_size,
        settings.char_wrap,
        metrics,
    )
}

/// How far `text` runs past the canvas bottom; zero when it fits.
pub fn settings_overflow_px<M: GlyphMetrics + ?Sized>(
    text: &str,
    settings: &CanvasSettings,
    metrics: &M,
) -> f64 {
    measure_block(
        text,
        settings.width_tokens,
        settings.height_tokens,
        settings.font_size,
        settings.char_wrap,
        metrics,
    )
    .map(|block| block.overflow_px())
    .unwrap_or(0.0)
}
