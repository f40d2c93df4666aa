//! Stateful editing session for the browser
//!
//! Wraps the core session behind wasm-bindgen. JavaScript renders
//! pages with PDF.js, feeds each page's `getTextContent` output in
//! via [`EditorSession::set_page_runs`], edits items through the
//! typed methods, and pulls the exported bytes back out.
//!
//! Page text arrives asynchronously; every call that completes later
//! carries the session id it was started under, and completions from
//! a session that has since been replaced are dropped silently.

use textlayer_core::session::EditorSession as CoreSession;
use textlayer_core::{ExportReport, TextRun};
use wasm_bindgen::prelude::*;
use web_sys::console;

#[wasm_bindgen]
pub struct EditorSession {
    name: String,
    core: CoreSession,
    last_export_report: Option<ExportReport>,
}

#[wasm_bindgen]
impl EditorSession {
    /// Create a session for one uploaded document. Extraction is
    /// deferred until the rendering side supplies text runs per page.
    #[wasm_bindgen(constructor)]
    pub fn new(name: &str, bytes: &[u8], scale: f64) -> Result<EditorSession, JsValue> {
        let core = CoreSession::new_deferred(bytes.to_vec(), scale)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Self {
            name: name.to_string(),
            core,
            last_export_report: None,
        })
    }

    #[wasm_bindgen(getter)]
    pub fn name(&self) -> String {
        self.name.clone()
    }

    /// Identifier for async fencing; changes with every new session.
    #[wasm_bindgen(js_name = sessionId)]
    pub fn session_id(&self) -> f64 {
        self.core.generation() as f64
    }

    #[wasm_bindgen(js_name = pageCount)]
    pub fn page_count(&self) -> u32 {
        self.core.page_count()
    }

    /// Point dimensions of a 1-based page as `[width, height]`.
    #[wasm_bindgen(js_name = pageSizePt)]
    pub fn page_size_pt(&self, page: u32) -> Result<Vec<f64>, JsValue> {
        let (w, h) = self
            .core
            .page_size_pt(page)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(vec![w, h])
    }

    /// Feed one page's PDF.js `getTextContent` items, replacing that
    /// page's text layer. `runs_json` is the item array serialized as
    /// `[{text, transform, font_name, width?, color?}, ...]`.
    #[wasm_bindgen(js_name = setPageRuns)]
    pub fn set_page_runs(
        &mut self,
        session_id: f64,
        page: u32,
        runs_json: &str,
        page_height_px: f64,
    ) -> Result<(), JsValue> {
        let runs: Vec<TextRun> = serde_json::from_str(runs_json)
            .map_err(|e| JsValue::from_str(&format!("Invalid runs payload: {}", e)))?;
        self.core
            .ingest_page_runs(session_id as u64, page, &runs, page_height_px)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Items of one page as JSON for the overlay layer.
    #[wasm_bindgen(js_name = itemsJson)]
    pub fn items_json(&self, page: u32) -> Result<String, JsValue> {
        serde_json::to_string(self.core.store().items(page))
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    #[wasm_bindgen(js_name = itemCount)]
    pub fn item_count(&self, page: u32) -> u32 {
        self.core.store().item_count(page) as u32
    }

    /// Insert a fresh text box with default styling; returns its id.
    #[wasm_bindgen(js_name = addTextBox)]
    pub fn add_text_box(&mut self, page: u32) -> f64 {
        self.core.store_mut().add_text_box(page) as f64
    }

    #[wasm_bindgen(js_name = updateText)]
    pub fn update_text(&mut self, page: u32, id: f64, text: &str) {
        self.core.store_mut().update_text(page, id as u64, text);
    }

    #[wasm_bindgen(js_name = updateFontSize)]
    pub fn update_font_size(&mut self, page: u32, id: f64, size_px: f64) {
        self.core.store_mut().update_font_size(page, id as u64, size_px);
    }

    /// `color` is a 6-hex-digit RGB string like "#ff0000".
    #[wasm_bindgen(js_name = updateColor)]
    pub fn update_color(&mut self, page: u32, id: f64, color: &str) {
        self.core.store_mut().update_color(page, id as u64, color);
    }

    /// Move an item; the store clamps the target to the canvas.
    #[wasm_bindgen(js_name = moveItem)]
    pub fn move_item(&mut self, page: u32, id: f64, x: f64, y: f64) {
        self.core.store_mut().move_item(page, id as u64, x, y);
    }

    #[wasm_bindgen(js_name = removeItem)]
    pub fn remove_item(&mut self, page: u32, id: f64) -> bool {
        self.core.store_mut().remove(page, id as u64)
    }

    #[wasm_bindgen(js_name = selectItem)]
    pub fn select_item(&mut self, id: Option<f64>) {
        self.core.store_mut().select(id.map(|v| v as u64));
    }

    /// Compose the edited document and return its bytes. Skipped
    /// items are mirrored to the console and kept in the report,
    /// available afterwards via `exportReportJson`.
    #[wasm_bindgen(js_name = exportPdf)]
    pub fn export_pdf(&mut self) -> Result<js_sys::Uint8Array, JsValue> {
        let out = self
            .core
            .export()
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        for skipped in &out.report.skipped {
            console::warn_1(&JsValue::from_str(&format!(
                "Export skipped item {} on page {} ({:?}): {:?}",
                skipped.id, skipped.page, skipped.reason, skipped.text
            )));
        }

        let bytes = js_sys::Uint8Array::from(out.bytes.as_slice());
        self.last_export_report = Some(out.report);
        Ok(bytes)
    }

    /// Report of the most recent export, or null before the first.
    #[wasm_bindgen(js_name = exportReportJson)]
    pub fn export_report_json(&self) -> Result<JsValue, JsValue> {
        match &self.last_export_report {
            Some(report) => serde_wasm_bindgen::to_value(report)
                .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e))),
            None => Ok(JsValue::NULL),
        }
    }

    /// Extraction warnings accumulated so far.
    #[wasm_bindgen(js_name = extractReportJson)]
    pub fn extract_report_json(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.core.extract_report())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }
}
