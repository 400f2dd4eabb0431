use crate::font::FontContext;
use crate::model::CanvasSettings;
use wasm_bindgen::prelude::*;

fn to_js(e: crate::CanvasError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[wasm_bindgen(js_name = willOverflow)]
pub fn will_overflow(text: &str, settings: JsValue) -> Result<bool, JsValue> {
    let settings: CanvasSettings = serde_wasm_bindgen::from_value(settings)?;
    Ok(crate::layout::settings_overflow(text, &settings.normalized(), &FontContext::new()))
}

#[wasm_bindgen(js_name = renderPng)]
pub fn render_png(json: &str) -> Result<Vec<u8>, JsValue> {
    crate::render_json(json, &FontContext::new()).map_err(to_js)
}

#[wasm_bindgen(js_name = embedMetadata)]
pub fn embed_metadata(png: &[u8], json: &str) -> Result<Vec<u8>, JsValue> {
    let document = serde_json::from_str(json).map_err(|e| to_js(e.into()))?;
    crate::png::embed::embed(png, &document).map_err(to_js)
}

#[wasm_bindgen(js_name = extractMetadata)]
pub fn extract_metadata(png: &[u8]) -> Result<Option<String>, JsValue> {
    let json = crate::png::embed::extract_json(png).map_err(to_js)?;
    Ok(json.map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
}

#[wasm_bindgen(js_name = breakLines)]
pub fn break_lines(text: &str, max_width: f64, font_size: f64, char_wrap: bool) -> js_sys::Array {
    let font = crate::font::FontSpec::new(font_size);
    let ctx = FontContext::new();
    let mode = crate::text::WrapMode::from_char_wrap(char_wrap);
    crate::text::break_lines(text, max_width, &font, &ctx, mode)
        .map(|line| JsValue::from_str(&line))
        .collect()
}
