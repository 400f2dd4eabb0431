//! # Font Management
//!
//! Glyph metrics for layout and glyph data for rasterization.
//!
//! Layout only ever asks one question: how wide is this string at this
//! size? That question is the [`GlyphMetrics`] trait, so that a browser
//! canvas, a test double, or the bundled [`FontContext`] can answer it.
//! `FontContext` answers from either a built-in Helvetica-proportioned table
//! or a real TrueType/OpenType face parsed with ttf-parser.

pub mod metrics;
pub mod system;

pub use metrics::StandardFontMetrics;

use crate::error::{CanvasError, Result};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// The CSS family stack used for every canvas.
pub const FONT_FAMILY: &str = "system-ui, -apple-system, sans-serif";

/// The font a string is measured and drawn with.
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub family: String,
    pub size: f64,
    pub weight: String,
}

impl FontSpec {
    pub fn new(size: f64) -> Self {
        Self {
            family: FONT_FAMILY.to_string(),
            size,
            weight: "normal".to_string(),
        }
    }
}

impl fmt::Display for FontSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}px {}", self.weight, self.size, self.family)
    }
}

/// A text measurement oracle.
pub trait GlyphMetrics {
    /// Advance width of `text` in fractional pixels, or `None` when no
    /// measurement surface is available.
    fn measure(&self, text: &str, font: &FontSpec) -> Option<f64>;
}

impl<T: GlyphMetrics + ?Sized> GlyphMetrics for &T {
    fn measure(&self, text: &str, font: &FontSpec) -> Option<f64> {
        (**self).measure(text, font)
    }
}

/// Parsed metrics from a TrueType/OpenType font via ttf-parser.
#[derive(Debug, Clone)]
pub struct CustomFontMetrics {
    pub units_per_em: u16,
    pub advance_widths: HashMap<char, u16>,
    pub default_advance: u16,
    pub ascender: i16,
    pub cap_height: i16,
    /// Maps characters to their glyph IDs in the font.
    pub glyph_ids: HashMap<char, u16>,
}

impl CustomFontMetrics {
    /// Get the advance width of a character in pixels.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        let w = self
            .advance_widths
            .get(&ch)
            .copied()
            .unwrap_or(self.default_advance);
        (w as f64 / self.units_per_em as f64) * font_size
    }

    /// Parse metrics from font data using ttf-parser.
    pub fn from_font_data(data: &[u8]) -> Option<Self> {
        let face = ttf_parser::Face::parse(data, 0).ok()?;
        let units_per_em = face.units_per_em();
        let ascender = face.ascender();
        let cap_height = face.capital_height().unwrap_or(ascender);

        let mut advance_widths = HashMap::new();
        let mut glyph_ids = HashMap::new();
        let mut default_advance = 0u16;

        let planes = (32u32..=0xFFFF).chain(0x1F300..=0x1FAFF);
        for code in planes {
            if let Some(ch) = char::from_u32(code) {
                if let Some(glyph_id) = face.glyph_index(ch) {
                    let advance = face.glyph_hor_advance(glyph_id).unwrap_or(0);
                    advance_widths.insert(ch, advance);
                    glyph_ids.insert(ch, glyph_id.0);
                    if ch == ' ' {
                        default_advance = advance;
                    }
                }
            }
        }

        if default_advance == 0 {
            default_advance = units_per_em / 2;
        }

        Some(CustomFontMetrics {
            units_per_em,
            advance_widths,
            default_advance,
            ascender,
            cap_height,
            glyph_ids,
        })
    }
}

#[derive(Debug, Clone)]
enum FontSource {
    Standard(StandardFontMetrics),
    Custom {
        data: Vec<u8>,
        metrics: CustomFontMetrics,
    },
    Unavailable,
}

/// Shared font context used by layout and rasterization.
#[derive(Debug, Clone)]
pub struct FontContext {
    source: FontSource,
}

impl Default for FontContext {
    fn default() -> Self {
        Self::new()
    }
}

impl FontContext {
    /// The built-in sans-serif table.
    pub fn new() -> Self {
        Self {
            source: FontSource::Standard(StandardFontMetrics),
        }
    }

    /// A context with no measurement surface. Every measurement is `None`.
    pub fn unavailable() -> Self {
        Self {
            source: FontSource::Unavailable,
        }
    }

    /// Load a TrueType/OpenType face from raw bytes.
    pub fn from_font_data(data: Vec<u8>) -> Result<Self> {
        let metrics = CustomFontMetrics::from_font_data(&data).ok_or_else(|| {
            CanvasError::FontError(format!(
                "could not parse font data ({} bytes)",
                data.len()
            ))
        })?;
        Ok(Self {
            source: FontSource::Custom { data, metrics },
        })
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path).map_err(|e| {
            CanvasError::FontError(format!("failed to read '{}': {}", path.display(), e))
        })?;
        Self::from_font_data(data)
    }

    /// The platform's sans-serif face, or the built-in table when none of
    /// the known faces is installed.
    pub fn system() -> Self {
        match system::load_sans_serif() {
            Some((path, data)) => match Self::from_font_data(data) {
                Ok(ctx) => {
                    tracing::debug!("using system font {}", path.display());
                    ctx
                }
                Err(e) => {
                    tracing::warn!("system font {} unusable: {}", path.display(), e);
                    Self::new()
                }
            },
            None => {
                tracing::warn!("no system sans-serif font found, using built-in metrics");
                Self::new()
            }
        }
    }

    pub fn is_available(&self) -> bool {
        !matches!(self.source, FontSource::Unavailable)
    }

    /// Get the advance width of a single character in pixels.
    pub fn char_width(&self, ch: char, font_size: f64) -> Option<f64> {
        match &self.source {
            FontSource::Standard(m) => Some(m.char_width(ch, font_size)),
            FontSource::Custom { metrics, .. } => Some(metrics.char_width(ch, font_size)),
            FontSource::Unavailable => None,
        }
    }

    /// Measure the width of a string in pixels.
    pub fn measure_string(&self, text: &str, font_size: f64) -> Option<f64> {
        match &self.source {
            FontSource::Standard(m) => Some(m.measure_string(text, font_size)),
            FontSource::Custom { metrics, .. } => {
                let mut width = 0.0;
                for ch in text.chars() {
                    width += metrics.char_width(ch, font_size);
                }
                Some(width)
            }
            FontSource::Unavailable => None,
        }
    }

    /// Distance from the top of the em box to the baseline.
    pub fn ascent(&self, font_size: f64) -> f64 {
        match &self.source {
            FontSource::Custom { metrics, .. } => {
                metrics.ascender as f64 / metrics.units_per_em as f64 * font_size
            }
            _ => metrics::ASCENDER as f64 / metrics::UNITS_PER_EM as f64 * font_size,
        }
    }

    pub fn cap_height(&self, font_size: f64) -> f64 {
        match &self.source {
            FontSource::Custom { metrics, .. } => {
                metrics.cap_height as f64 / metrics.units_per_em as f64 * font_size
            }
            _ => metrics::CAP_HEIGHT as f64 / metrics::UNITS_PER_EM as f64 * font_size,
        }
    }

    /// Raw face bytes and metrics when a real font is loaded.
    pub fn face(&self) -> Option<(&[u8], &CustomFontMetrics)> {
        match &self.source {
            FontSource::Custom { data, metrics } => Some((data.as_slice(), metrics)),
            _ => None,
        }
    }
}

impl GlyphMetrics for FontContext {
    fn measure(&self, text: &str, font: &FontSpec) -> Option<f64> {
        self.measure_string(text, font.size)
    }
}
