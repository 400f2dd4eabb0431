//! # Editor Session
//!
//! The one mutable object of an editor: canvas settings, the current text,
//! and the overflow warning. All mutation goes through
//! [`EditorSession::update_settings`] and [`EditorSession::set_text`], both
//! of which predict overflow before committing and then follow the
//! configured [`OverflowPolicy`].
//!
//! Exports are synchronous and return owned bytes plus a suggested file
//! name; where the bytes go is the caller's business.

use crate::config::{EditorConfig, OverflowPolicy};
use crate::error::{CanvasError, Result};
use crate::font::{FontContext, GlyphMetrics};
use crate::layout::settings_overflow_px;
use crate::model::{CanvasSettings, ExportDocument, SettingsUpdate, TextElement};
use crate::png::embed;
use crate::raster;
use std::time::{Duration, Instant};
use time::macros::format_description;
use time::OffsetDateTime;

/// Result of a mutation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    AppliedWithWarning,
    /// The prior state was kept.
    Rejected,
}

impl Outcome {
    pub fn is_applied(&self) -> bool {
        !matches!(self, Outcome::Rejected)
    }
}

/// A user-visible overflow warning that expires on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct Warning {
    pub message: String,
    pub raised_at: Instant,
}

/// Bytes ready to be saved under `filename`.
#[derive(Debug, Clone, PartialEq)]
pub struct Export {
    pub filename: String,
    pub bytes: Vec<u8>,
}

pub struct EditorSession {
    settings: CanvasSettings,
    current_text: String,
    warning: Option<Warning>,
    config: EditorConfig,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl EditorSession {
    pub fn new(config: EditorConfig) -> Self {
        Self::with_settings(CanvasSettings::default(), config)
    }

    pub fn with_settings(settings: CanvasSettings, config: EditorConfig) -> Self {
        Self {
            settings: settings.normalized(),
            current_text: String::new(),
            warning: None,
            config,
        }
    }

    /// Restore a session from an exported document. Settings are clamped
    /// back into range; the text is taken as-is, even if it overflows.
    pub fn from_document(document: &ExportDocument, config: EditorConfig) -> Self {
        let mut session = Self::with_settings(document.settings, config);
        session.current_text = if document.current_text.is_empty() {
            document
                .text_elements
                .first()
                .map(|el| el.text.clone())
                .unwrap_or_default()
        } else {
            document.current_text.clone()
        };
        session
    }

    /// Restore a session from a PNG written by [`EditorSession::export_png`].
    pub fn from_png(png: &[u8], config: EditorConfig) -> Result<Self> {
        let document = embed::extract(png)?.ok_or_else(|| {
            CanvasError::MalformedContainer("PNG carries no canvas metadata".to_string())
        })?;
        Ok(Self::from_document(&document, config))
    }

    /// Restore a session from a data export.
    pub fn from_json(json: &str, config: EditorConfig) -> Result<Self> {
        let document: ExportDocument = serde_json::from_str(json)?;
        Ok(Self::from_document(&document, config))
    }

    pub fn settings(&self) -> &CanvasSettings {
        &self.settings
    }

    pub fn current_text(&self) -> &str {
        &self.current_text
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// The drawable element, present iff the text is not blank.
    pub fn text_element(&self) -> Option<TextElement> {
        TextElement::project(&self.current_text, self.settings.font_size)
    }

    /// The active warning message, if it has not expired.
    pub fn warning(&self) -> Option<&str> {
        self.warning_at(Instant::now())
    }

    pub fn warning_at(&self, now: Instant) -> Option<&str> {
        let warning = self.warning.as_ref()?;
        if now.saturating_duration_since(warning.raised_at) >= self.config.warning_timeout() {
            return None;
        }
        Some(&warning.message)
    }

    pub fn warning_timeout(&self) -> Duration {
        self.config.warning_timeout()
    }

    pub fn dismiss_warning(&mut self) {
        self.warning = None;
    }

    /// Apply a partial settings change, checking the prospective settings
    /// for overflow first. A change that leaves the text overflowing but
    /// by less than before is applied with a warning, never rejected.
    pub fn update_settings<M: GlyphMetrics + ?Sized>(
        &mut self,
        update: SettingsUpdate,
        metrics: &M,
    ) -> Outcome {
        let next = self.settings.merged(&update);
        let overflow = settings_overflow_px(&self.current_text, &next, metrics);
        if overflow <= 0.0 {
            self.warning = None;
            self.settings = next;
            return Outcome::Applied;
        }
        let worse = overflow > settings_overflow_px(&self.current_text, &self.settings, metrics);

        let message = if update.width_tokens.is_some() || update.height_tokens.is_some() {
            format!(
                "Text will overflow at {}×{} tokens. Clear text or use larger canvas.",
                next.width_tokens, next.height_tokens
            )
        } else if update.font_size.is_some() {
            format!(
                "Text will overflow with {}px font. Reduce font size or use larger canvas.",
                next.font_size
            )
        } else {
            let wrap = if next.char_wrap { "character" } else { "word" };
            format!(
                "Text will overflow with {} wrap. Clear text or use larger canvas.",
                wrap
            )
        };
        self.raise(message);

        match (self.config.overflow_policy, worse) {
            (OverflowPolicy::Reject, true) => {
                tracing::debug!("settings change rejected: {:?}", update);
                Outcome::Rejected
            }
            _ => {
                self.settings = next;
                Outcome::AppliedWithWarning
            }
        }
    }

    /// Replace the whole text, checking it against the current settings.
    /// Same rule as settings: only an edit that grows the overflow can be
    /// rejected.
    pub fn set_text<M: GlyphMetrics + ?Sized>(&mut self, text: impl Into<String>, metrics: &M) -> Outcome {
        let text = text.into();
        let overflow = settings_overflow_px(&text, &self.settings, metrics);
        if overflow <= 0.0 {
            self.warning = None;
            self.current_text = text;
            return Outcome::Applied;
        }
        let worse = overflow > settings_overflow_px(&self.current_text, &self.settings, metrics);

        self.raise(format!(
            "Text too large for {}×{} canvas. Increase canvas size or reduce text.",
            self.settings.width_tokens, self.settings.height_tokens
        ));

        match (self.config.overflow_policy, worse) {
            (OverflowPolicy::Reject, true) => {
                tracing::debug!("text edit rejected ({} chars)", text.chars().count());
                Outcome::Rejected
            }
            _ => {
                self.current_text = text;
                Outcome::AppliedWithWarning
            }
        }
    }

    /// Empty the canvas and drop any warning.
    pub fn clear(&mut self) {
        self.current_text.clear();
        self.warning = None;
    }

    fn raise(&mut self, message: String) {
        self.warning = Some(Warning {
            message,
            raised_at: Instant::now(),
        });
    }

    pub fn export_document(&self, exported_at: OffsetDateTime) -> ExportDocument {
        ExportDocument {
            settings: self.settings,
            text_elements: self.text_element().into_iter().collect(),
            current_text: self.current_text.clone(),
            exported_at: format_timestamp(exported_at),
        }
    }

    /// The session state as indented JSON.
    pub fn export_data(&self, now: OffsetDateTime) -> Result<Export> {
        let document = self.export_document(now);
        let json = serde_json::to_string_pretty(&document)?;
        Ok(Export {
            filename: format!("{}-data-{}.json", self.config.file_prefix, unix_millis(now)),
            bytes: json.into_bytes(),
        })
    }

    /// Render, encode and (per config) embed the session state.
    ///
    /// A failure to embed fails the export; the bare image is never
    /// returned in its place.
    pub fn export_png(&self, glyphs: &FontContext, now: OffsetDateTime) -> Result<Export> {
        let pixmap = raster::render_session(self, glyphs)?;
        let png = raster::encode_png(&pixmap)?;
        let bytes = if self.config.embed_metadata {
            embed::embed(&png, &self.export_document(now))?
        } else {
            png
        };
        tracing::debug!(
            "exported {}x{} canvas, {} bytes",
            self.settings.width_tokens,
            self.settings.height_tokens,
            bytes.len()
        );
        Ok(Export {
            filename: format!(
                "{}-{}x{}-{}.png",
                self.config.file_prefix,
                self.settings.width_tokens,
                self.settings.height_tokens,
                unix_millis(now)
            ),
            bytes,
        })
    }
}

/// `2024-05-01T12:00:00.000Z`
pub fn format_timestamp(at: OffsetDateTime) -> String {
    let format = format_description!(
        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
    );
    at.to_offset(time::UtcOffset::UTC)
        .format(format)
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
}

pub fn unix_millis(at: OffsetDateTime) -> i128 {
    at.unix_timestamp_nanos() / 1_000_000
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MAX_TOKENS;

    fn ctx() -> FontContext {
        FontContext::new()
    }

    fn four_by_four(policy: OverflowPolicy) -> EditorSession {
        let config = EditorConfig {
            overflow_policy: policy,
            ..Default::default()
        };
        let settings = CanvasSettings {
            width_tokens: 4,
            height_tokens: 4,
            ..Default::default()
        };
        EditorSession::with_settings(settings, config)
    }

    fn fixed_time() -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp_nanos(1_700_000_000_123_000_000).unwrap()
    }

    #[test]
    fn test_set_text_applies_and_projects_element() {
        let mut s = four_by_four(OverflowPolicy::Reject);
        assert_eq!(s.set_text("hello world", &ctx()), Outcome::Applied);
        let el = s.text_element().unwrap();
        assert_eq!(el.text, "hello world");
        assert_eq!(el.font_size, 8.0);
        assert!(s.warning().is_none());
    }

    #[test]
    fn test_element_follows_font_size() {
        let mut s = four_by_four(OverflowPolicy::Reject);
        s.set_text("hi", &ctx());
        s.update_settings(SettingsUpdate::font_size(12.0), &ctx());
        assert_eq!(s.text_element().unwrap().font_size, 12.0);
        s.set_text("  ", &ctx());
        assert!(s.text_element().is_none());
    }

    #[test]
    fn test_reject_policy_blocks_overflowing_text() {
        let mut s = four_by_four(OverflowPolicy::Reject);
        s.set_text("short", &ctx());
        let long = "word ".repeat(200);
        assert_eq!(s.set_text(long, &ctx()), Outcome::Rejected);
        assert_eq!(s.current_text(), "short");
        assert_eq!(
            s.warning(),
            Some("Text too large for 4×4 canvas. Increase canvas size or reduce text.")
        );
    }

    #[test]
    fn test_warn_policy_accepts_overflowing_text() {
        let mut s = four_by_four(OverflowPolicy::Warn);
        let long = "word ".repeat(200);
        assert_eq!(s.set_text(long.clone(), &ctx()), Outcome::AppliedWithWarning);
        assert_eq!(s.current_text(), long);
        assert!(s.warning().is_some());
    }

    #[test]
    fn test_reject_policy_blocks_font_growth() {
        let mut s = four_by_four(OverflowPolicy::Reject);
        s.set_text("hello world", &ctx());
        let outcome = s.update_settings(SettingsUpdate::font_size(72.0), &ctx());
        assert_eq!(outcome, Outcome::Rejected);
        assert_eq!(s.settings().font_size, 8.0);
        assert_eq!(
            s.warning(),
            Some("Text will overflow with 72px font. Reduce font size or use larger canvas.")
        );
    }

    #[test]
    fn test_reject_policy_blocks_shrinking_canvas() {
        let mut s = four_by_four(OverflowPolicy::Reject);
        s.set_text("the quick brown fox jumps over the lazy dog", &ctx());
        let outcome = s.update_settings(SettingsUpdate::dimensions(1, 1), &ctx());
        assert_eq!(outcome, Outcome::Rejected);
        assert_eq!(s.settings().width_tokens, 4);
        assert_eq!(
            s.warning(),
            Some("Text will overflow at 1×1 tokens. Clear text or use larger canvas.")
        );
    }

    #[test]
    fn test_warn_policy_applies_settings() {
        let mut s = four_by_four(OverflowPolicy::Warn);
        s.set_text("hello world", &ctx());
        let outcome = s.update_settings(SettingsUpdate::font_size(72.0), &ctx());
        assert_eq!(outcome, Outcome::AppliedWithWarning);
        assert!(outcome.is_applied());
        assert_eq!(s.settings().font_size, 72.0);
    }

    #[test]
    fn test_successful_change_clears_warning() {
        let mut s = four_by_four(OverflowPolicy::Reject);
        s.set_text("hello world", &ctx());
        s.update_settings(SettingsUpdate::font_size(72.0), &ctx());
        assert!(s.warning().is_some());
        assert_eq!(s.update_settings(SettingsUpdate::font_size(10.0), &ctx()), Outcome::Applied);
        assert!(s.warning().is_none());
    }

    #[test]
    fn test_settings_without_text_always_apply() {
        let mut s = four_by_four(OverflowPolicy::Reject);
        let outcome = s.update_settings(
            SettingsUpdate {
                width_tokens: Some(1),
                height_tokens: Some(1),
                font_size: Some(72.0),
                char_wrap: Some(true),
            },
            &ctx(),
        );
        assert_eq!(outcome, Outcome::Applied);
        assert_eq!(s.settings().font_size, 72.0);
        assert!(s.settings().char_wrap);
    }

    #[test]
    fn test_out_of_range_input_is_clamped() {
        let mut s = EditorSession::default();
        s.update_settings(SettingsUpdate::dimensions(500, -4), &ctx());
        assert_eq!(s.settings().width_tokens, MAX_TOKENS);
        assert_eq!(s.settings().height_tokens, 1);
    }

    #[test]
    fn test_char_wrap_toggle_is_checked() {
        let mut s = EditorSession::new(EditorConfig::default());
        // One 34-char run: a single overflowing line under word wrap, six
        // lines under char wrap, which is too tall for one token.
        let text = "a".repeat(34);
        assert_eq!(s.set_text(text.clone(), &ctx()), Outcome::Applied);
        let outcome = s.update_settings(SettingsUpdate::char_wrap(true), &ctx());
        assert_eq!(outcome, Outcome::Rejected);
        assert!(!s.settings().char_wrap);
        assert_eq!(
            s.warning(),
            Some("Text will overflow with character wrap. Clear text or use larger canvas.")
        );
        assert_eq!(s.current_text(), text);
    }

    #[test]
    fn test_restored_overflow_can_be_reduced() {
        let document = ExportDocument {
            settings: CanvasSettings {
                font_size: 20.0,
                ..Default::default()
            },
            text_elements: vec![],
            current_text: "word ".repeat(60),
            exported_at: "2024-05-01T12:00:00.000Z".to_string(),
        };
        let mut s = EditorSession::from_document(&document, EditorConfig::default());

        assert_eq!(
            s.update_settings(SettingsUpdate::font_size(10.0), &ctx()),
            Outcome::AppliedWithWarning
        );
        assert_eq!(s.settings().font_size, 10.0);
        assert!(s.warning().is_some());

        assert_eq!(s.set_text("word ".repeat(30), &ctx()), Outcome::AppliedWithWarning);
        assert_eq!(s.current_text(), "word ".repeat(30));

        // Growing the overflow again is still refused.
        assert_eq!(s.set_text("word ".repeat(40), &ctx()), Outcome::Rejected);
        assert_eq!(
            s.update_settings(SettingsUpdate::font_size(30.0), &ctx()),
            Outcome::Rejected
        );
        assert_eq!(s.current_text(), "word ".repeat(30));
        assert_eq!(s.settings().font_size, 10.0);

        assert_eq!(s.set_text("word", &ctx()), Outcome::Applied);
        assert!(s.warning().is_none());
    }

    #[test]
    fn test_warning_expires_after_timeout() {
        let mut s = four_by_four(OverflowPolicy::Reject);
        s.set_text("word ".repeat(200), &ctx());
        let raised = s.warning.as_ref().unwrap().raised_at;
        assert!(s.warning_at(raised).is_some());
        assert!(s.warning_at(raised + Duration::from_millis(4999)).is_some());
        assert!(s.warning_at(raised + Duration::from_secs(5)).is_none());
    }

    #[test]
    fn test_clear_resets_text_and_warning() {
        let mut s = four_by_four(OverflowPolicy::Warn);
        s.set_text("word ".repeat(200), &ctx());
        s.clear();
        assert_eq!(s.current_text(), "");
        assert!(s.warning().is_none());
        assert!(s.text_element().is_none());
    }

    #[test]
    fn test_unavailable_metrics_never_block() {
        let mut s = four_by_four(OverflowPolicy::Reject);
        let blind = FontContext::unavailable();
        assert_eq!(s.set_text("word ".repeat(200), &blind), Outcome::Applied);
    }

    #[test]
    fn test_export_document_shape() {
        let mut s = four_by_four(OverflowPolicy::Reject);
        s.set_text("hi", &ctx());
        let doc = s.export_document(fixed_time());
        assert_eq!(doc.exported_at, "2023-11-14T22:13:20.123Z");
        assert_eq!(doc.text_elements.len(), 1);
        let json = serde_json::to_value(&doc).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(|k| k.as_str()).collect();
        for key in ["settings", "textElements", "currentText", "exportedAt"] {
            assert!(keys.contains(&key), "missing {}", key);
        }
        assert_eq!(keys.len(), 4);
    }

    #[test]
    fn test_export_data_is_indented_json() {
        let mut s = four_by_four(OverflowPolicy::Reject);
        s.set_text("hi", &ctx());
        let export = s.export_data(fixed_time()).unwrap();
        assert_eq!(export.filename, "vision-canvas-data-1700000000123.json");
        let text = String::from_utf8(export.bytes).unwrap();
        assert!(text.starts_with("{\n  \"settings\": {"));
        let back = EditorSession::from_json(&text, EditorConfig::default()).unwrap();
        assert_eq!(back.current_text(), "hi");
        assert_eq!(back.settings(), s.settings());
    }

    #[test]
    fn test_export_png_filename_and_round_trip() {
        let mut s = four_by_four(OverflowPolicy::Reject);
        s.set_text("héllo 🙂", &ctx());
        let export = s.export_png(&ctx(), fixed_time()).unwrap();
        assert_eq!(export.filename, "vision-canvas-4x4-1700000000123.png");
        let restored = EditorSession::from_png(&export.bytes, EditorConfig::default()).unwrap();
        assert_eq!(restored.current_text(), "héllo 🙂");
        assert_eq!(restored.settings(), s.settings());
    }

    #[test]
    fn test_export_png_without_metadata() {
        let config = EditorConfig {
            embed_metadata: false,
            ..Default::default()
        };
        let s = EditorSession::new(config);
        let export = s.export_png(&ctx(), fixed_time()).unwrap();
        assert!(embed::extract(&export.bytes).unwrap().is_none());
        let err = EditorSession::from_png(&export.bytes, EditorConfig::default()).err().unwrap();
        assert!(matches!(err, CanvasError::MalformedContainer(_)));
    }

    #[test]
    fn test_from_document_falls_back_to_element_text() {
        let doc = ExportDocument {
            settings: CanvasSettings {
                width_tokens: 99,
                font_size: 0.0,
                ..Default::default()
            },
            text_elements: TextElement::project("legacy", 8.0).into_iter().collect(),
            current_text: String::new(),
            exported_at: String::new(),
        };
        let s = EditorSession::from_document(&doc, EditorConfig::default());
        assert_eq!(s.current_text(), "legacy");
        assert_eq!(s.settings().width_tokens, MAX_TOKENS);
        assert_eq!(s.settings().font_size, 1.0);
    }

    #[test]
    fn test_from_json_reports_schema_errors() {
        let err = EditorSession::from_json(r#"{"settings": 3}"#, EditorConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, CanvasError::ParseError { .. }));
    }
}
