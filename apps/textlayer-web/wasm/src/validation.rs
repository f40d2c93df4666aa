//! PDF validation and info extraction
//!
//! Validates an uploaded file before a session is created and
//! extracts the metadata the UI shows up front, including the point
//! size of every page so canvases can be laid out before rendering.

use lopdf::Document;
use serde::Serialize;
use textlayer_core::has_pdf_signature;

/// PDF file information extracted during validation
#[derive(Debug, Clone, Serialize, Default)]
pub struct PdfInfo {
    /// Number of pages in the document
    pub page_count: u32,
    /// PDF version string (e.g., "1.7")
    pub version: String,
    /// Whether the document is encrypted
    pub encrypted: bool,
    /// File size in bytes
    pub size_bytes: usize,
    /// Width and height of each page in points, in page order
    pub page_sizes_pt: Vec<(f64, f64)>,
    /// Document title from metadata (if available)
    pub title: Option<String>,
}

/// Validate a PDF file and extract basic info
pub fn validate_pdf(bytes: &[u8]) -> Result<PdfInfo, String> {
    if bytes.len() < 8 {
        return Err("File too small to be a valid PDF".to_string());
    }
    if !has_pdf_signature(bytes) {
        return Err("Not a valid PDF file (missing %PDF- header)".to_string());
    }

    let version = extract_version(bytes);

    let document = Document::load_mem(bytes).map_err(|e| format!("Failed to parse PDF: {}", e))?;
    let encrypted = document.is_encrypted();

    let pages = document.get_pages();
    if pages.is_empty() {
        return Err("PDF has no pages".to_string());
    }

    let mut page_sizes_pt = Vec::with_capacity(pages.len());
    for &page_id in pages.values() {
        let size = page_size(&document, page_id).unwrap_or((612.0, 792.0));
        page_sizes_pt.push(size);
    }

    Ok(PdfInfo {
        page_count: pages.len() as u32,
        version,
        encrypted,
        size_bytes: bytes.len(),
        page_sizes_pt,
        title: extract_title(&document),
    })
}

/// Quick validation without full parsing
pub fn quick_validate(bytes: &[u8]) -> Result<(), String> {
    if bytes.len() < 8 {
        return Err("File too small to be a valid PDF".to_string());
    }
    if !has_pdf_signature(bytes) {
        return Err("Not a valid PDF file".to_string());
    }
    Ok(())
}

fn extract_version(bytes: &[u8]) -> String {
    // Header looks like "%PDF-1.7"
    bytes
        .get(5..8)
        .and_then(|v| std::str::from_utf8(v).ok())
        .unwrap_or("?")
        .to_string()
}

fn page_size(doc: &Document, page_id: lopdf::ObjectId) -> Option<(f64, f64)> {
    let page = doc.get_object(page_id).ok()?.as_dict().ok()?;
    let media_box = match page.get(b"MediaBox") {
        Ok(lopdf::Object::Reference(id)) => doc.get_object(*id).ok()?,
        Ok(obj) => obj,
        Err(_) => return None,
    };
    let arr = media_box.as_array().ok()?;
    if arr.len() != 4 {
        return None;
    }
    let values: Vec<f64> = arr.iter().filter_map(|o| o.as_float().ok()).map(f64::from).collect();
    if values.len() != 4 {
        return None;
    }
    Some((values[2] - values[0], values[3] - values[1]))
}

fn extract_title(doc: &Document) -> Option<String> {
    let info_ref = doc.trailer.get(b"Info").ok()?;
    let info = match info_ref {
        lopdf::Object::Reference(id) => doc.get_object(*id).ok()?.as_dict().ok()?,
        lopdf::Object::Dictionary(dict) => dict,
        _ => return None,
    };
    match info.get(b"Title").ok()? {
        lopdf::Object::String(bytes, _) => Some(String::from_utf8_lossy(bytes).into_owned()),
        _ => None,
    }
}
