//! # Vision Canvas
//!
//! Text canvases sized in vision-model tokens, exported as PNGs that carry
//! their own editing state.
//!
//! A vision model reads an image as a grid of 32×32 px patches. Vision
//! Canvas lets you size a canvas in those patches, type into it, and know
//! *before* anything is drawn whether the text fits. The exported PNG is an
//! ordinary image to every decoder, but it also holds the settings and text
//! that produced it, so it can be reopened and edited.
//!
//! ## Architecture
//!
//! ```text
//! EditorSession (settings + text)
//!       ↓
//!   [text]     — Greedy line breaking (word or char)
//!       ↓
//!   [layout]   — Overflow prediction, accept/reject per policy
//!       ↓
//!   [raster]   — Draw lines, encode PNG
//!       ↓
//!   [png]      — Splice zTXt metadata chunk before IEND
//! ```

pub mod config;
pub mod error;
pub mod font;
pub mod layout;
pub mod model;
pub mod png;
pub mod raster;
pub mod session;
pub mod text;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use error::{CanvasError, Result};

use font::FontContext;
use model::ExportDocument;

/// Render a canvas to PNG bytes without metadata.
pub fn render_png(settings: &model::CanvasSettings, text: &str, glyphs: &FontContext) -> Result<Vec<u8>> {
    let pixmap = raster::render_text(settings, text, glyphs)?;
    raster::encode_png(&pixmap)
}

/// Render an export document to a PNG that embeds the document itself.
///
/// The document is rendered as-is: settings are clamped into range but an
/// overflowing text is still drawn (and clipped by the canvas).
pub fn render_document(document: &ExportDocument, glyphs: &FontContext) -> Result<Vec<u8>> {
    let settings = document.settings.normalized();
    let png = render_png(&settings, &document.current_text, glyphs)?;
    png::embed::embed(&png, document)
}

/// Render an export document described as JSON.
pub fn render_json(json: &str, glyphs: &FontContext) -> Result<Vec<u8>> {
    let document: ExportDocument = serde_json::from_str(json)?;
    render_document(&document, glyphs)
}
