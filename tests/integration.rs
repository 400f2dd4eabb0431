//! Integration tests for the Vision Canvas pipeline.
//!
//! These tests exercise the full path from an editor session to PNG bytes.
//! They verify:
//! - Overflow prediction agrees with what the breaker lays out
//! - Overflowing mutations are handled by the configured policy
//! - Exported PNGs decode with a standard reader
//! - Embedded metadata survives the round trip byte for byte

use time::OffsetDateTime;
use vision_canvas::config::{EditorConfig, OverflowPolicy};
use vision_canvas::font::{FontContext, FontSpec};
use vision_canvas::layout::{max_line_width, measure_block, will_overflow};
use vision_canvas::model::{CanvasSettings, ExportDocument, SettingsUpdate};
use vision_canvas::png::{embed, read_chunks, PNG_SIGNATURE};
use vision_canvas::session::{EditorSession, Outcome};
use vision_canvas::text::{break_lines, WrapMode};
use vision_canvas::CanvasError;

// ─── Helpers ────────────────────────────────────────────────────

fn glyphs() -> FontContext {
    FontContext::new()
}

fn fixed_time() -> OffsetDateTime {
    OffsetDateTime::from_unix_timestamp_nanos(1_714_564_800_000_000_000).unwrap()
}

fn canvas(width_tokens: u32, height_tokens: u32, font_size: f64, char_wrap: bool) -> CanvasSettings {
    CanvasSettings {
        width_tokens,
        height_tokens,
        font_size,
        char_wrap,
        ..Default::default()
    }
}

fn session_with(settings: CanvasSettings, policy: OverflowPolicy) -> EditorSession {
    let config = EditorConfig {
        overflow_policy: policy,
        ..Default::default()
    };
    EditorSession::with_settings(settings, config)
}

fn decode(png: &[u8]) -> image::RgbaImage {
    image::load_from_memory(png).expect("standard decoder rejected PNG").to_rgba8()
}

fn assert_valid_png(bytes: &[u8]) {
    assert!(bytes.starts_with(&PNG_SIGNATURE), "missing PNG signature");
    let chunks = read_chunks(bytes).expect("chunk stream should parse");
    assert_eq!(chunks.first().map(|c| c.tag), Some(*b"IHDR"));
    assert_eq!(chunks.last().map(|c| c.tag), Some(*b"IEND"));
    for chunk in &chunks {
        assert_eq!(chunk.crc, chunk.computed_crc(), "bad CRC on {}", chunk.tag_str());
    }
}

// ─── Scenarios ──────────────────────────────────────────────────

#[test]
fn test_short_text_fits_on_one_line() {
    let settings = canvas(4, 4, 8.0, false);
    assert_eq!((settings.canvas_width_px(), settings.canvas_height_px()), (128, 128));

    let block = measure_block("hello world", 4, 4, 8.0, false, &glyphs()).unwrap();
    assert_eq!(block.line_count, 1);
    assert!(!block.overflows());
}

#[test]
fn test_large_font_overflows() {
    assert!(!will_overflow("hello world", 4, 4, 8.0, false, &glyphs()));
    assert!(will_overflow("hello world", 4, 4, 72.0, false, &glyphs()));

    let block = measure_block("hello world", 4, 4, 72.0, false, &glyphs()).unwrap();
    assert_eq!(block.line_count, 2);
    assert!((block.line_height - 79.2).abs() < 1e-9);
}

#[test]
fn test_char_wrap_breaks_long_run() {
    let text = "a".repeat(34);
    let font = FontSpec::new(8.0);
    let ctx = glyphs();

    let words: Vec<String> = break_lines(&text, max_line_width(32), &font, &ctx, WrapMode::Word).collect();
    assert_eq!(words, vec![text.clone()]);

    let chars: Vec<String> = break_lines(&text, max_line_width(32), &font, &ctx, WrapMode::Char).collect();
    assert!(chars.len() > 1);
    assert_eq!(chars.concat(), text);
    for line in &chars[..chars.len() - 1] {
        assert!(ctx.measure_string(line, 8.0).unwrap() <= max_line_width(32));
    }
}

#[test]
fn test_blank_canvas_export() {
    let session = session_with(canvas(4, 4, 8.0, false), OverflowPolicy::Reject);
    let export = session.export_png(&glyphs(), fixed_time()).unwrap();
    assert_eq!(export.filename, "vision-canvas-4x4-1714564800000.png");
    assert_valid_png(&export.bytes);

    let image = decode(&export.bytes);
    assert_eq!(image.dimensions(), (128, 128));
    assert!(image.pixels().all(|px| px.0 == [255, 255, 255, 255]));

    let document = embed::extract(&export.bytes).unwrap().unwrap();
    assert_eq!(document.current_text, "");
    assert!(document.text_elements.is_empty());
    assert_eq!(document.exported_at, "2024-05-01T12:00:00.000Z");
}

#[test]
fn test_unicode_text_survives_embedding() {
    let settings = canvas(4, 2, 12.0, false);
    let document = ExportDocument {
        settings,
        text_elements: vec![],
        current_text: "héllo 🙂".to_string(),
        exported_at: "2024-05-01T12:00:00.000Z".to_string(),
    };
    let png = vision_canvas::render_png(&settings, &document.current_text, &glyphs()).unwrap();
    let embedded = embed::embed(&png, &document).unwrap();

    let recovered = embed::extract(&embedded).unwrap().unwrap();
    assert_eq!(recovered.current_text, "héllo 🙂");

    let json = embed::extract_json(&embedded).unwrap().unwrap();
    assert_eq!(json, serde_json::to_vec(&document).unwrap());
}

// ─── Session pipeline ───────────────────────────────────────────

#[test]
fn test_export_reopen_edit_export() {
    let ctx = glyphs();
    let mut session = session_with(canvas(4, 2, 10.0, false), OverflowPolicy::Reject);
    assert_eq!(session.set_text("first draft", &ctx), Outcome::Applied);
    let first = session.export_png(&ctx, fixed_time()).unwrap();

    let mut reopened = EditorSession::from_png(&first.bytes, EditorConfig::default()).unwrap();
    assert_eq!(reopened.current_text(), "first draft");
    assert_eq!(reopened.settings(), session.settings());

    assert_eq!(reopened.set_text("second draft", &ctx), Outcome::Applied);
    let second = reopened.export_png(&ctx, fixed_time()).unwrap();
    assert_valid_png(&second.bytes);

    let chunks = read_chunks(&second.bytes).unwrap();
    assert_eq!(chunks.iter().filter(|c| &c.tag == b"zTXt").count(), 1);
    let document = embed::extract(&second.bytes).unwrap().unwrap();
    assert_eq!(document.current_text, "second draft");
    assert_eq!(document.text_elements[0].text, "second draft");
}

#[test]
fn test_reject_policy_keeps_state_on_both_paths() {
    let ctx = glyphs();
    let mut session = session_with(canvas(4, 4, 8.0, false), OverflowPolicy::Reject);
    assert_eq!(session.set_text("hello world", &ctx), Outcome::Applied);

    assert_eq!(session.update_settings(SettingsUpdate::font_size(72.0), &ctx), Outcome::Rejected);
    assert_eq!(session.settings().font_size, 8.0);
    assert!(session.warning().is_some());

    let long = "word ".repeat(400);
    assert_eq!(session.set_text(long, &ctx), Outcome::Rejected);
    assert_eq!(session.current_text(), "hello world");
}

#[test]
fn test_warn_policy_applies_and_still_exports() {
    let ctx = glyphs();
    let mut session = session_with(canvas(1, 1, 8.0, false), OverflowPolicy::Warn);
    let long = "overflowing ".repeat(20);
    assert_eq!(session.set_text(long.clone(), &ctx), Outcome::AppliedWithWarning);
    assert_eq!(session.current_text(), long);

    let export = session.export_png(&ctx, fixed_time()).unwrap();
    let image = decode(&export.bytes);
    assert_eq!(image.dimensions(), (32, 32));
    let document = embed::extract(&export.bytes).unwrap().unwrap();
    assert_eq!(document.current_text, long);
}

#[test]
fn test_data_export_matches_embedded_document() {
    let ctx = glyphs();
    let mut session = session_with(canvas(3, 2, 9.0, true), OverflowPolicy::Reject);
    session.set_text("tokens", &ctx);

    let data = session.export_data(fixed_time()).unwrap();
    assert_eq!(data.filename, "vision-canvas-data-1714564800000.json");
    let from_data: ExportDocument = serde_json::from_slice(&data.bytes).unwrap();

    let png = session.export_png(&ctx, fixed_time()).unwrap();
    let from_png = embed::extract(&png.bytes).unwrap().unwrap();
    assert_eq!(from_data, from_png);

    let reopened = EditorSession::from_json(std::str::from_utf8(&data.bytes).unwrap(), EditorConfig::default()).unwrap();
    assert!(reopened.settings().char_wrap);
    assert_eq!(reopened.current_text(), "tokens");
}

#[test]
fn test_render_json_embeds_its_input() {
    let json = r#"{
        "settings": {"widthTokens": 2, "heightTokens": 1, "pixelSize": 32, "fontSize": 8, "charWrap": false},
        "textElements": [],
        "currentText": "hi",
        "exportedAt": "2024-05-01T12:00:00.000Z"
    }"#;
    let png = vision_canvas::render_json(json, &glyphs()).unwrap();
    assert_valid_png(&png);
    assert_eq!(decode(&png).dimensions(), (64, 32));
    assert_eq!(embed::extract(&png).unwrap().unwrap().current_text, "hi");
}

#[test]
fn test_render_json_rejects_bad_input() {
    let err = vision_canvas::render_json("{\"settings\": 4}", &glyphs()).unwrap_err();
    assert!(matches!(err, CanvasError::ParseError { .. }));
}

#[test]
fn test_embed_into_foreign_png() {
    let mut foreign = Vec::new();
    let pixels = image::RgbaImage::from_pixel(3, 3, image::Rgba([10, 20, 30, 255]));
    image::DynamicImage::ImageRgba8(pixels)
        .write_to(&mut std::io::Cursor::new(&mut foreign), image::ImageOutputFormat::Png)
        .unwrap();

    let document = EditorSession::default().export_document(fixed_time());
    let embedded = embed::embed(&foreign, &document).unwrap();
    assert_valid_png(&embedded);
    assert_eq!(decode(&embedded).get_pixel(1, 1).0, [10, 20, 30, 255]);
    assert_eq!(embed::extract(&embedded).unwrap().unwrap(), document);
}

#[test]
fn test_unavailable_metrics_never_block_edits() {
    let blind = FontContext::unavailable();
    let mut session = session_with(canvas(1, 1, 72.0, false), OverflowPolicy::Reject);
    let long = "x ".repeat(500);
    assert_eq!(session.set_text(long, &blind), Outcome::Applied);
    assert!(session.warning().is_none());
}
