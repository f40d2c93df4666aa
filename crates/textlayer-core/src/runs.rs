//! Positioned text-run reading from page content streams
//!
//! The browser shell gets positioned runs from the rasterizer
//! (PDF.js `getTextContent`); this module reproduces that surface
//! natively with lopdf so extraction, tests, and round-trips work
//! without a browser. It interprets the common text operators and
//! reports runs in pixel space at the requested scale, the same shape
//! the rasterizer yields.

use crate::error::EditorError;
use crate::item::TextRun;
use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};

fn as_f64(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(v) => Some(*v as f64),
        Object::Real(v) => Some(*v as f64),
        _ => None,
    }
}

/// Follow references until a concrete object is reached.
fn resolve<'a>(doc: &'a Document, mut obj: &'a Object) -> &'a Object {
    // Bounded to guard against reference cycles in damaged files
    for _ in 0..16 {
        match obj {
            Object::Reference(id) => match doc.get_object(*id) {
                Ok(inner) => obj = inner,
                Err(_) => break,
            },
            _ => break,
        }
    }
    obj
}

/// Content-stream string bytes decoded as Latin-1. Sufficient for
/// standard-font output; CID text is out of scope for the native path.
fn decode_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn text_from_operand(operand: &Object) -> Option<String> {
    match operand {
        Object::String(bytes, _) => Some(decode_string(bytes)),
        Object::Array(arr) => {
            // TJ array: strings interleaved with kerning adjustments
            let mut out = String::new();
            for entry in arr {
                if let Object::String(bytes, _) = entry {
                    out.push_str(&decode_string(bytes));
                }
            }
            Some(out)
        }
        _ => None,
    }
}

/// Resolve a page's font resource name (e.g. "F0") to its BaseFont.
fn base_font_name(doc: &Document, page_fonts: Option<&Dictionary>, resource: &str) -> String {
    if let Some(fonts) = page_fonts {
        if let Ok(font_obj) = fonts.get(resource.as_bytes()) {
            if let Object::Dictionary(font) = resolve(doc, font_obj) {
                if let Ok(base) = font.get(b"BaseFont") {
                    if let Object::Name(name) = resolve(doc, base) {
                        return String::from_utf8_lossy(name).into_owned();
                    }
                }
            }
        }
    }
    resource.to_string()
}

fn page_font_resources(doc: &Document, page_id: ObjectId) -> Option<Dictionary> {
    let page = resolve(doc, doc.get_object(page_id).ok()?).as_dict().ok()?.clone();
    let resources = match page.get(b"Resources") {
        Ok(obj) => resolve(doc, obj).as_dict().ok()?.clone(),
        Err(_) => return None,
    };
    match resources.get(b"Font") {
        Ok(obj) => resolve(doc, obj).as_dict().ok().cloned(),
        Err(_) => None,
    }
}

/// 2x3 text matrix translate: `m * translate(tx, ty)`.
fn translate(m: [f64; 6], tx: f64, ty: f64) -> [f64; 6] {
    [
        m[0],
        m[1],
        m[2],
        m[3],
        m[4] + tx * m[0] + ty * m[2],
        m[5] + tx * m[1] + ty * m[3],
    ]
}

const IDENTITY: [f64; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Read the positioned text runs of one page, scaled to pixel space.
///
/// Handles the common text-positioning and showing operators (BT/ET,
/// Tf, Td, TD, TL, Tm, T*, Tj, TJ, ', ") plus rg/g fill color. Runs
/// carry no advance width; the extractor falls back to its heuristic.
pub fn read_text_runs(
    doc: &Document,
    page_id: ObjectId,
    scale: f64,
) -> Result<Vec<TextRun>, EditorError> {
    let content_bytes = doc
        .get_page_content(page_id)
        .map_err(|e| EditorError::ParseError(e.to_string()))?;
    let content =
        Content::decode(&content_bytes).map_err(|e| EditorError::ParseError(e.to_string()))?;

    let fonts = page_font_resources(doc, page_id);

    let mut runs = Vec::new();
    let mut tm = IDENTITY;
    let mut tlm = IDENTITY;
    let mut font_size = 0.0f64;
    let mut font_name = String::new();
    let mut leading = 0.0f64;
    let mut fill: [f64; 3] = [0.0, 0.0, 0.0];

    let mut emit = |text: String, tm: &[f64; 6], font_size: f64, font_name: &str, fill: [f64; 3]| {
        if text.is_empty() {
            return;
        }
        runs.push(TextRun {
            text,
            transform: [
                font_size * tm[0] * scale,
                font_size * tm[1] * scale,
                font_size * tm[2] * scale,
                font_size * tm[3] * scale,
                tm[4] * scale,
                tm[5] * scale,
            ],
            font_name: font_name.to_string(),
            width: None,
            color: Some(fill),
        });
    };

    for op in &content.operations {
        match op.operator.as_str() {
            "BT" => {
                tm = IDENTITY;
                tlm = IDENTITY;
            }
            "Tf" => {
                if let (Some(Object::Name(name)), Some(size)) =
                    (op.operands.first(), op.operands.get(1).and_then(as_f64))
                {
                    font_name =
                        base_font_name(doc, fonts.as_ref(), &String::from_utf8_lossy(name));
                    font_size = size;
                }
            }
            "TL" => {
                if let Some(l) = op.operands.first().and_then(as_f64) {
                    leading = l;
                }
            }
            "Td" => {
                if let (Some(tx), Some(ty)) = (
                    op.operands.first().and_then(as_f64),
                    op.operands.get(1).and_then(as_f64),
                ) {
                    tlm = translate(tlm, tx, ty);
                    tm = tlm;
                }
            }
            "TD" => {
                if let (Some(tx), Some(ty)) = (
                    op.operands.first().and_then(as_f64),
                    op.operands.get(1).and_then(as_f64),
                ) {
                    leading = -ty;
                    tlm = translate(tlm, tx, ty);
                    tm = tlm;
                }
            }
            "Tm" => {
                let vals: Vec<f64> = op.operands.iter().filter_map(as_f64).collect();
                if vals.len() == 6 {
                    tm = [vals[0], vals[1], vals[2], vals[3], vals[4], vals[5]];
                    tlm = tm;
                }
            }
            "T*" => {
                tlm = translate(tlm, 0.0, -leading);
                tm = tlm;
            }
            "Tj" | "TJ" => {
                if let Some(text) = op.operands.first().and_then(text_from_operand) {
                    emit(text, &tm, font_size, &font_name, fill);
                }
            }
            "'" => {
                tlm = translate(tlm, 0.0, -leading);
                tm = tlm;
                if let Some(text) = op.operands.first().and_then(text_from_operand) {
                    emit(text, &tm, font_size, &font_name, fill);
                }
            }
            "\"" => {
                tlm = translate(tlm, 0.0, -leading);
                tm = tlm;
                if let Some(text) = op.operands.get(2).and_then(text_from_operand) {
                    emit(text, &tm, font_size, &font_name, fill);
                }
            }
            "rg" => {
                let vals: Vec<f64> = op.operands.iter().filter_map(as_f64).collect();
                if vals.len() == 3 {
                    fill = [vals[0], vals[1], vals[2]];
                }
            }
            "g" => {
                if let Some(v) = op.operands.first().and_then(as_f64) {
                    fill = [v, v, v];
                }
            }
            _ => {}
        }
    }

    Ok(runs)
}
