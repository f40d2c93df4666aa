//! WASM bindings for the PDF text-layer editor
//!
//! This module provides a stateful, session-based API: the document
//! and its editable text layer live in Rust, and JavaScript only
//! handles rendering, DOM events, and file I/O.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { EditorSession, quick_validate } from './pkg/textlayer_wasm.js';
//!
//! await init();
//!
//! quick_validate(bytes);
//! const session = new EditorSession("report.pdf", bytes, 1.5);
//!
//! // Feed PDF.js getTextContent output per rendered page
//! session.setPageRuns(1, JSON.stringify(runs), viewport.height);
//!
//! // Edit through the store
//! const items = JSON.parse(session.itemsJson(1));
//! session.updateText(1, items[0].id, "Edited");
//! session.moveItem(1, items[0].id, 120, 340);
//!
//! const bytes = session.exportPdf();
//! downloadBlob(bytes, "report-edited.pdf");
//! ```

pub mod session;
pub mod validation;

use wasm_bindgen::prelude::*;

pub use session::EditorSession;
pub use validation::PdfInfo;

/// Initialize the WASM module
/// Called automatically by wasm-bindgen
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Get the library version
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Quick validation check for a PDF file
/// Returns Ok(()) if valid, Err with message if not
#[wasm_bindgen]
pub fn quick_validate(bytes: &[u8]) -> Result<(), JsValue> {
    validation::quick_validate(bytes).map_err(|e| JsValue::from_str(&e))
}

/// Get detailed PDF info without creating a session
#[wasm_bindgen]
pub fn get_pdf_info(bytes: &[u8]) -> Result<JsValue, JsValue> {
    let info = validation::validate_pdf(bytes).map_err(|e| JsValue::from_str(&e))?;

    serde_wasm_bindgen::to_value(&info)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Get page count from PDF bytes (convenience function)
#[wasm_bindgen]
pub fn get_page_count(bytes: &[u8]) -> Result<u32, JsValue> {
    textlayer_core::get_page_count(bytes).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Extract plain text from all pages, CID fonts and ToUnicode CMaps
/// included. Positioned extraction goes through the session instead.
#[wasm_bindgen]
pub fn extract_plain_text(bytes: &[u8]) -> Result<String, JsValue> {
    pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| JsValue::from_str(&format!("PDF text extraction failed: {}", e)))
}

/// Rotate pages by multiples of 90 degrees.
/// `rotations` is JSON like `[[1, 90], [3, 180]]`.
#[wasm_bindgen(js_name = rotatePages)]
pub fn rotate_pages(bytes: &[u8], rotations_json: &str) -> Result<js_sys::Uint8Array, JsValue> {
    let rotations: Vec<(u32, i64)> = serde_json::from_str(rotations_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid rotations: {}", e)))?;
    let out = textlayer_core::tools::rotate_pages(bytes, &rotations)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(js_sys::Uint8Array::from(out.as_slice()))
}

/// Stamp "Page N of M" in the bottom margin of every page.
#[wasm_bindgen(js_name = addPageNumbers)]
pub fn add_page_numbers(bytes: &[u8]) -> Result<js_sys::Uint8Array, JsValue> {
    let out =
        textlayer_core::tools::add_page_numbers(bytes, &Default::default())
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(js_sys::Uint8Array::from(out.as_slice()))
}

/// Stamp a diagonal semi-transparent watermark on every page.
#[wasm_bindgen(js_name = stampWatermark)]
pub fn stamp_watermark(bytes: &[u8], text: &str) -> Result<js_sys::Uint8Array, JsValue> {
    let out = textlayer_core::tools::stamp_watermark(bytes, text, &Default::default())
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(js_sys::Uint8Array::from(out.as_slice()))
}
