//! Editor configuration.
//!
//! Everything here is a deliberate choice made once per editor, not per
//! canvas. Loaded from JSON with every field optional:
//!
//! ```json
//! { "overflowPolicy": "warn", "warningTimeoutMs": 3000, "fontPath": "./Inter.ttf" }
//! ```

use crate::error::Result;
use crate::font::FontContext;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// What happens to a mutation that would make text overflow the canvas.
/// Applies identically to settings changes and text edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Keep the prior state and raise a warning.
    #[default]
    Reject,
    /// Apply the mutation and raise a warning.
    Warn,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    pub overflow_policy: OverflowPolicy,
    /// How long an overflow warning stays visible.
    pub warning_timeout_ms: u64,
    /// Prefix of exported file names.
    pub file_prefix: String,
    /// Whether PNG exports carry the editing state.
    pub embed_metadata: bool,
    /// A TrueType/OpenType face to measure and draw with. Without one the
    /// platform's sans-serif face is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            overflow_policy: OverflowPolicy::Reject,
            warning_timeout_ms: 5000,
            file_prefix: "vision-canvas".to_string(),
            embed_metadata: true,
            font_path: None,
        }
    }
}

impl EditorConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn warning_timeout(&self) -> Duration {
        Duration::from_millis(self.warning_timeout_ms)
    }

    /// Load the configured face, or the platform's sans-serif face.
    pub fn load_fonts(&self) -> Result<FontContext> {
        match &self.font_path {
            Some(path) => FontContext::from_file(path),
            None => Ok(FontContext::system()),
        }
    }
}
