//! Single-purpose whole-document tools
//!
//! Small stateless transformations that operate directly on document
//! bytes, independent of the editing session: page rotation, page
//! numbering, and watermark stamping. Each loads a fresh copy,
//! mutates page dictionaries or appends content streams, and
//! serializes the result.

use crate::error::EditorError;
use crate::sanitize::encode_latin1;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};

#[derive(Debug, Clone)]
pub struct PageNumberOptions {
    pub font_size_pt: f64,
    /// Distance from the bottom edge to the number's baseline.
    pub margin_pt: f64,
    /// "Page N of M" instead of bare "N".
    pub include_total: bool,
}

impl Default for PageNumberOptions {
    fn default() -> Self {
        Self {
            font_size_pt: 10.0,
            margin_pt: 30.0,
            include_total: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WatermarkOptions {
    pub font_size_pt: f64,
    /// Fill and stroke alpha in 0..=1.
    pub opacity: f64,
    pub angle_degrees: f64,
}

impl Default for WatermarkOptions {
    fn default() -> Self {
        Self {
            font_size_pt: 48.0,
            opacity: 0.3,
            angle_degrees: 45.0,
        }
    }
}

/// Rotate pages by adding to their current `/Rotate` value.
///
/// Degrees must be a multiple of 90; the stored value is normalized
/// into {0, 90, 180, 270}.
pub fn rotate_pages(pdf_bytes: &[u8], rotations: &[(u32, i64)]) -> Result<Vec<u8>, EditorError> {
    let mut doc = load(pdf_bytes)?;
    let pages = doc.get_pages();

    for &(page_number, degrees) in rotations {
        if degrees % 90 != 0 {
            return Err(EditorError::OperationError(format!(
                "rotation must be a multiple of 90, got {}",
                degrees
            )));
        }
        let page_id = *pages
            .get(&page_number)
            .ok_or(EditorError::PageOutOfRange(page_number))?;

        let current = doc
            .get_object(page_id)
            .ok()
            .and_then(|obj| obj.as_dict().ok())
            .and_then(|dict| dict.get(b"Rotate").ok())
            .and_then(|obj| obj.as_i64().ok())
            .unwrap_or(0);
        let normalized = (current + degrees).rem_euclid(360);

        let page = doc
            .get_object_mut(page_id)
            .map_err(|e| EditorError::OperationError(e.to_string()))?
            .as_dict_mut()
            .map_err(|e| EditorError::OperationError(e.to_string()))?;
        page.set("Rotate", normalized);
    }

    save(doc)
}

/// Draw a centered page number in the bottom margin of every page.
pub fn add_page_numbers(
    pdf_bytes: &[u8],
    opts: &PageNumberOptions,
) -> Result<Vec<u8>, EditorError> {
    let mut doc = load(pdf_bytes)?;
    let pages: Vec<(u32, ObjectId)> = doc.get_pages().into_iter().collect();
    let total = pages.len();
    let font_id = add_helvetica(&mut doc);

    for (page_number, page_id) in pages {
        let font_name = free_resource_name(&doc, page_id, b"Font", "F");
        let media_box = crate::recompose::page_media_box(&doc, page_id)?;
        let page_width = media_box[2] - media_box[0];

        let label = if opts.include_total {
            format!("Page {} of {}", page_number, total)
        } else {
            page_number.to_string()
        };
        // Standard-font width approximation, consistent with extraction
        let approx_width = label.len() as f64 * opts.font_size_pt * 0.5;
        let x = media_box[0] + (page_width - approx_width) / 2.0;
        let y = media_box[1] + opts.margin_pt;

        let operations = vec![
            Operation::new("q", vec![]),
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![
                    Object::Name(font_name.clone().into_bytes()),
                    Object::Real(opts.font_size_pt as f32),
                ],
            ),
            Operation::new("rg", vec![0.into(), 0.into(), 0.into()]),
            Operation::new(
                "Td",
                vec![Object::Real(x as f32), Object::Real(y as f32)],
            ),
            Operation::new(
                "Tj",
                vec![Object::String(encode_latin1(&label), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
            Operation::new("Q", vec![]),
        ];
        append_page_content(&mut doc, page_id, operations)?;
        set_page_resource(&mut doc, page_id, b"Font", &font_name, font_id)?;
    }

    save(doc)
}

/// Stamp rotated semi-transparent text across the center of every
/// page.
pub fn stamp_watermark(
    pdf_bytes: &[u8],
    text: &str,
    opts: &WatermarkOptions,
) -> Result<Vec<u8>, EditorError> {
    let mut doc = load(pdf_bytes)?;
    let pages: Vec<(u32, ObjectId)> = doc.get_pages().into_iter().collect();
    let font_id = add_helvetica(&mut doc);
    let gs_id = doc.add_object(dictionary! {
        "Type" => "ExtGState",
        "ca" => Object::Real(opts.opacity as f32),
        "CA" => Object::Real(opts.opacity as f32),
    });

    let (sin, cos) = opts.angle_degrees.to_radians().sin_cos();

    for (_, page_id) in pages {
        let font_name = free_resource_name(&doc, page_id, b"Font", "F");
        let gs_name = free_resource_name(&doc, page_id, b"ExtGState", "G");
        let media_box = crate::recompose::page_media_box(&doc, page_id)?;
        let center_x = (media_box[0] + media_box[2]) / 2.0;
        let center_y = (media_box[1] + media_box[3]) / 2.0;
        let approx_width = text.len() as f64 * opts.font_size_pt * 0.5;
        // Back the start point up half the run length along the slope
        // so the text centers on the page
        let tx = center_x - (approx_width / 2.0) * cos;
        let ty = center_y - (approx_width / 2.0) * sin;

        let operations = vec![
            Operation::new("q", vec![]),
            Operation::new("gs", vec![Object::Name(gs_name.clone().into_bytes())]),
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![
                    Object::Name(font_name.clone().into_bytes()),
                    Object::Real(opts.font_size_pt as f32),
                ],
            ),
            Operation::new(
                "rg",
                vec![Object::Real(0.5), Object::Real(0.5), Object::Real(0.5)],
            ),
            Operation::new(
                "Tm",
                vec![
                    Object::Real(cos as f32),
                    Object::Real(sin as f32),
                    Object::Real(-sin as f32),
                    Object::Real(cos as f32),
                    Object::Real(tx as f32),
                    Object::Real(ty as f32),
                ],
            ),
            Operation::new(
                "Tj",
                vec![Object::String(encode_latin1(text), StringFormat::Literal)],
            ),
            Operation::new("ET", vec![]),
            Operation::new("Q", vec![]),
        ];
        append_page_content(&mut doc, page_id, operations)?;
        set_page_resource(&mut doc, page_id, b"Font", &font_name, font_id)?;
        set_page_resource(&mut doc, page_id, b"ExtGState", &gs_name, gs_id)?;
    }

    save(doc)
}

fn load(pdf_bytes: &[u8]) -> Result<Document, EditorError> {
    if !crate::has_pdf_signature(pdf_bytes) {
        return Err(EditorError::InvalidInput(
            "missing %PDF- header".to_string(),
        ));
    }
    Document::load_mem(pdf_bytes).map_err(|e| EditorError::ParseError(e.to_string()))
}

fn save(mut doc: Document) -> Result<Vec<u8>, EditorError> {
    doc.compress();
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| EditorError::OperationError(e.to_string()))?;
    Ok(bytes)
}

fn add_helvetica(doc: &mut Document) -> ObjectId {
    doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    })
}

/// Pick a resource name under `/Resources/<category>` that no entry on
/// the page already uses, so existing bindings stay intact.
fn free_resource_name(
    doc: &Document,
    page_id: ObjectId,
    category: &[u8],
    prefix: &str,
) -> String {
    let existing = crate::recompose::inherited_attr(doc, page_id, b"Resources")
        .and_then(|res| match res {
            Object::Reference(id) => doc.get_object(*id).ok(),
            other => Some(other),
        })
        .and_then(|res| res.as_dict().ok())
        .and_then(|res| res.get(category).ok())
        .and_then(|cat| match cat {
            Object::Reference(id) => doc.get_object(*id).ok(),
            other => Some(other),
        })
        .and_then(|cat| cat.as_dict().ok());

    let mut n = 0u32;
    loop {
        let name = format!("{}{}", prefix, n);
        match existing {
            Some(dict) if dict.has(name.as_bytes()) => n += 1,
            _ => return name,
        }
    }
}

/// Append a content stream to a page, preserving existing streams.
fn append_page_content(
    doc: &mut Document,
    page_id: ObjectId,
    operations: Vec<Operation>,
) -> Result<(), EditorError> {
    let content = Content { operations };
    let stream_id = doc.add_object(Stream::new(
        Dictionary::new(),
        content
            .encode()
            .map_err(|e| EditorError::OperationError(e.to_string()))?,
    ));

    let page = doc
        .get_object_mut(page_id)
        .map_err(|e| EditorError::OperationError(e.to_string()))?
        .as_dict_mut()
        .map_err(|e| EditorError::OperationError(e.to_string()))?;
    let contents = match page.get(b"Contents") {
        Ok(Object::Array(existing)) => {
            let mut arr = existing.clone();
            arr.push(Object::Reference(stream_id));
            arr
        }
        Ok(other) => vec![other.clone(), Object::Reference(stream_id)],
        Err(_) => vec![Object::Reference(stream_id)],
    };
    page.set("Contents", contents);
    Ok(())
}

/// Register an object under `/Resources/<category>/<name>` on a page,
/// creating the dictionaries as needed. Handles both inline and
/// referenced resource dictionaries.
fn set_page_resource(
    doc: &mut Document,
    page_id: ObjectId,
    category: &[u8],
    name: &str,
    object_id: ObjectId,
) -> Result<(), EditorError> {
    enum Location {
        Referenced(ObjectId),
        Inline,
    }

    let location = {
        let page = doc
            .get_object(page_id)
            .map_err(|e| EditorError::OperationError(e.to_string()))?
            .as_dict()
            .map_err(|e| EditorError::OperationError(e.to_string()))?;
        match page.get(b"Resources") {
            Ok(Object::Reference(id)) => Location::Referenced(*id),
            _ => Location::Inline,
        }
    };

    let resources = match location {
        Location::Referenced(id) => doc
            .get_object_mut(id)
            .map_err(|e| EditorError::OperationError(e.to_string()))?
            .as_dict_mut()
            .map_err(|e| EditorError::OperationError(e.to_string()))?,
        Location::Inline => {
            let page = doc
                .get_object_mut(page_id)
                .map_err(|e| EditorError::OperationError(e.to_string()))?
                .as_dict_mut()
                .map_err(|e| EditorError::OperationError(e.to_string()))?;
            if page.get(b"Resources").is_err() {
                page.set("Resources", Dictionary::new());
            }
            page.get_mut(b"Resources")
                .map_err(|e| EditorError::OperationError(e.to_string()))?
                .as_dict_mut()
                .map_err(|e| EditorError::OperationError(e.to_string()))?
        }
    };

    if resources.get(category).is_err() {
        resources.set(category, Dictionary::new());
    }
    let entry = resources
        .get_mut(category)
        .map_err(|e| EditorError::OperationError(e.to_string()))?
        .as_dict_mut()
        .map_err(|e| EditorError::OperationError(e.to_string()))?;
    entry.set(name.as_bytes(), Object::Reference(object_id));
    Ok(())
}
