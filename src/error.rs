//! Structured error types for the canvas engine.
//!
//! Overflow is deliberately absent: it is a policy signal reported through
//! the session, not a failure. Missing glyph metrics degrade silently.

use thiserror::Error;

/// The unified error type returned by all public API functions.
#[derive(Debug, Error)]
pub enum CanvasError {
    /// JSON input failed to parse as a valid export document or config.
    #[error("Failed to parse document: {source}{}", format_hint(.hint))]
    ParseError {
        #[source]
        source: serde_json::Error,
        hint: String,
    },
    /// A font could not be loaded or parsed.
    #[error("Font error: {0}")]
    FontError(String),
    /// The byte stream is not a well-formed PNG chunk sequence.
    #[error("Malformed container: {0}")]
    MalformedContainer(String),
    /// Rasterization or image encoding failed.
    #[error("Render error: {0}")]
    RenderError(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CanvasError>;

fn format_hint(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for CanvasError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the canvas export schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input; is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        CanvasError::ParseError { source: e, hint }
    }
}
