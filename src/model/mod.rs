//! # Canvas Model
//!
//! The editing state of a canvas and the document that carries it out of
//! the editor. Everything here serializes in camelCase so exported JSON
//! matches what browser-side tooling reads.
//!
//! The canvas is measured in **tokens**: 32×32 px squares matching a vision
//! model's native patch size. A 4×4 token canvas is 128×128 px.

use serde::{Deserialize, Serialize};

/// Pixels per token side. Never configurable.
pub const PIXEL_SIZE: u32 = 32;
pub const MIN_TOKENS: u32 = 1;
pub const MAX_TOKENS: u32 = 32;
pub const MIN_FONT_SIZE: f64 = 1.0;
pub const MAX_FONT_SIZE: f64 = 72.0;
/// Display canvases never grow beyond this, layout math ignores it.
pub const MAX_DISPLAY_PX: u32 = 600;

/// Canvas dimensions and typography.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasSettings {
    pub width_tokens: u32,
    pub height_tokens: u32,
    #[serde(default = "default_pixel_size")]
    pub pixel_size: u32,
    pub font_size: f64,
    #[serde(default)]
    pub char_wrap: bool,
}

fn default_pixel_size() -> u32 {
    PIXEL_SIZE
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            width_tokens: 1,
            height_tokens: 1,
            pixel_size: PIXEL_SIZE,
            font_size: 8.0,
            char_wrap: false,
        }
    }
}

impl CanvasSettings {
    pub fn canvas_width_px(&self) -> u32 {
        self.width_tokens.saturating_mul(self.pixel_size)
    }

    pub fn canvas_height_px(&self) -> u32 {
        self.height_tokens.saturating_mul(self.pixel_size)
    }

    pub fn display_width_px(&self) -> u32 {
        self.canvas_width_px().min(MAX_DISPLAY_PX)
    }

    pub fn display_height_px(&self) -> u32 {
        self.canvas_height_px().min(MAX_DISPLAY_PX)
    }

    /// Merge a partial update into these settings. Unset fields keep their
    /// prior values; numbers out of range are clamped, never rejected.
    pub fn merged(&self, update: &SettingsUpdate) -> Self {
        let mut next = *self;
        if let Some(w) = update.width_tokens {
            next.width_tokens = clamp_tokens(w);
        }
        if let Some(h) = update.height_tokens {
            next.height_tokens = clamp_tokens(h);
        }
        if let Some(size) = update.font_size {
            next.font_size = clamp_font_size(size);
        }
        if let Some(char_wrap) = update.char_wrap {
            next.char_wrap = char_wrap;
        }
        next
    }

    /// Bring every field back inside its valid range. Used on documents
    /// that arrive from outside the editor.
    pub fn normalized(&self) -> Self {
        Self {
            width_tokens: clamp_tokens(self.width_tokens as i64),
            height_tokens: clamp_tokens(self.height_tokens as i64),
            pixel_size: PIXEL_SIZE,
            font_size: clamp_font_size(self.font_size),
            char_wrap: self.char_wrap,
        }
    }
}

/// Clamp a user-typed token count into `[1, 32]`.
pub fn clamp_tokens(value: i64) -> u32 {
    value.clamp(MIN_TOKENS as i64, MAX_TOKENS as i64) as u32
}

/// Clamp a user-typed font size into `[1, 72]`. NaN maps to the minimum.
pub fn clamp_font_size(value: f64) -> f64 {
    if value.is_nan() {
        return MIN_FONT_SIZE;
    }
    value.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE)
}

/// A partial settings change. Token counts are signed so that raw stepper
/// or keyboard input can be handed over unclamped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width_tokens: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_tokens: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub char_wrap: Option<bool>,
}

impl SettingsUpdate {
    pub fn dimensions(width_tokens: i64, height_tokens: i64) -> Self {
        Self {
            width_tokens: Some(width_tokens),
            height_tokens: Some(height_tokens),
            ..Default::default()
        }
    }

    pub fn font_size(size: f64) -> Self {
        Self {
            font_size: Some(size),
            ..Default::default()
        }
    }

    pub fn char_wrap(char_wrap: bool) -> Self {
        Self {
            char_wrap: Some(char_wrap),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width_tokens.is_none()
            && self.height_tokens.is_none()
            && self.font_size.is_none()
            && self.char_wrap.is_none()
    }
}

/// The drawable projection of the current text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextElement {
    pub id: String,
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub font_size: f64,
    pub color: String,
    pub font_weight: String,
}

pub const TEXT_ELEMENT_ID: &str = "main-text";

impl TextElement {
    /// Project `text` into an element, or `None` when it is blank.
    pub fn project(text: &str, font_size: f64) -> Option<Self> {
        if text.trim().is_empty() {
            return None;
        }
        Some(Self {
            id: TEXT_ELEMENT_ID.to_string(),
            text: text.to_string(),
            x: 2.0,
            y: 2.0,
            font_size,
            color: "#000000".to_string(),
            font_weight: "normal".to_string(),
        })
    }
}

/// The state carried inside exported PNGs and data files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub settings: CanvasSettings,
    #[serde(default)]
    pub text_elements: Vec<TextElement>,
    #[serde(default)]
    pub current_text: String,
    pub exported_at: String,
}

/// An 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba { r: 0, g: 0, b: 0, a: 255 };
    pub const WHITE: Rgba = Rgba { r: 255, g: 255, b: 255, a: 255 };

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#')?;
        if !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        match hex.len() {
            3 => {
                let mut out = [0u8; 3];
                for (i, c) in hex.chars().enumerate() {
                    let v = c.to_digit(16)? as u8;
                    out[i] = v * 17;
                }
                Some(Rgba { r: out[0], g: out[1], b: out[2], a: 255 })
            }
            6 => Some(Rgba {
                r: channel(0)?,
                g: channel(2)?,
                b: channel(4)?,
                a: 255,
            }),
            8 => Some(Rgba {
                r: channel(0)?,
                g: channel(2)?,
                b: channel(4)?,
                a: channel(6)?,
            }),
            _ => None,
        }
    }
}
