//! PDF recomposition
//!
//! Builds the exported document: every source page is wrapped in a
//! Form XObject and drawn as the background of a fresh page of the
//! same size, then the surviving text items are drawn on top with
//! standard fonts. The source buffer is never mutated.
//!
//! Known limitation: the background carries the original page
//! verbatim, so an edited item that was not deleted leaves its
//! original glyphs underneath the new ones.

use crate::coords::to_document_space;
use crate::error::EditorError;
use crate::fonts::{classify, FontCache};
use crate::item::ItemId;
use crate::sanitize::{encode_latin1, sanitize_for_standard_font, SanitizeOutcome};
use crate::store::TextItemStore;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Why an item was left out of the exported document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Text still contained characters outside the standard-font
    /// range after substitution.
    UnsupportedCharacters,
    /// The item could not be drawn (degenerate size or position).
    DrawFailed,
}

/// One item excluded from the export, with enough context to tell
/// the user which one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedItem {
    pub page: u32,
    pub id: ItemId,
    pub text: String,
    pub reason: SkipReason,
}

/// Outcome summary for one export. Skips are data, not errors; the
/// export itself only fails when the document cannot be produced at
/// all.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportReport {
    pub pages_processed: u32,
    pub items_drawn: u32,
    pub skipped: Vec<SkippedItem>,
    pub warnings: Vec<String>,
}

/// The exported bytes plus the per-item outcome report.
#[derive(Debug, Clone)]
pub struct ExportOutput {
    pub bytes: Vec<u8>,
    pub report: ExportReport,
}

/// Recursively remap object references by an id offset.
fn remap_object_refs(obj: Object, offset: u32) -> Object {
    match obj {
        Object::Reference(id) => Object::Reference((id.0 + offset, id.1)),
        Object::Array(arr) => Object::Array(
            arr.into_iter()
                .map(|o| remap_object_refs(o, offset))
                .collect(),
        ),
        Object::Dictionary(mut dict) => {
            for (_, value) in dict.iter_mut() {
                *value = remap_object_refs(value.clone(), offset);
            }
            Object::Dictionary(dict)
        }
        Object::Stream(mut stream) => {
            for (_, value) in stream.dict.iter_mut() {
                *value = remap_object_refs(value.clone(), offset);
            }
            Object::Stream(stream)
        }
        other => other,
    }
}

/// Look up a page attribute, following the Pages tree inheritance
/// chain (MediaBox and Resources may live on an ancestor node).
pub(crate) fn inherited_attr<'a>(
    doc: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut node_id = page_id;
    for _ in 0..32 {
        let dict = doc.get_object(node_id).ok()?.as_dict().ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        match dict.get(b"Parent") {
            Ok(Object::Reference(parent)) => node_id = *parent,
            _ => return None,
        }
    }
    None
}

pub(crate) fn page_media_box(doc: &Document, page_id: ObjectId) -> Result<[f64; 4], EditorError> {
    let obj = inherited_attr(doc, page_id, b"MediaBox")
        .ok_or_else(|| EditorError::ExportError("page has no MediaBox".into()))?;
    let obj = match obj {
        Object::Reference(id) => doc
            .get_object(*id)
            .map_err(|e| EditorError::ExportError(e.to_string()))?,
        other => other,
    };
    let arr = obj
        .as_array()
        .map_err(|e| EditorError::ExportError(e.to_string()))?;
    if arr.len() != 4 {
        return Err(EditorError::ExportError("malformed MediaBox".into()));
    }
    let mut rect = [0.0f64; 4];
    for (slot, entry) in rect.iter_mut().zip(arr) {
        *slot = entry
            .as_float()
            .map_err(|e| EditorError::ExportError(e.to_string()))? as f64;
    }
    Ok(rect)
}

fn parse_hex_color(color: &str) -> (f32, f32, f32) {
    let hex = color.trim_start_matches('#');
    // Anything but 6 hex digits falls back to black; the digit check
    // also keeps the byte slicing below on char boundaries
    if hex.len() == 6 && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(0) as f32 / 255.0;
        let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(0) as f32 / 255.0;
        let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(0) as f32 / 255.0;
        (r, g, b)
    } else {
        (0.0, 0.0, 0.0)
    }
}

/// Export the edited document.
///
/// Loads the source from a fresh copy, imports its whole object graph
/// into a new document with offset-remapped ids, rebuilds each page as
/// background XObject plus text overlay, and serializes. Item-level
/// problems are recorded in the report and skipped; only
/// document-level failures return `Err`.
pub fn export_document(
    original_bytes: &[u8],
    store: &TextItemStore,
    canvas_width_px: f64,
    canvas_height_px: f64,
) -> Result<ExportOutput, EditorError> {
    if !crate::has_pdf_signature(original_bytes) {
        return Err(EditorError::InvalidInput(
            "missing %PDF- header".to_string(),
        ));
    }

    let source = Document::load_mem(original_bytes)
        .map_err(|e| EditorError::ParseError(e.to_string()))?;
    let source_pages = source.get_pages();

    let mut dest = Document::with_version("1.5");
    let id_offset = dest.max_id;

    // Import the full source graph; the new page tree references its
    // streams and resources, and prune drops the rest at the end.
    let mut remapped: BTreeMap<ObjectId, Object> = BTreeMap::new();
    for (old_id, object) in source.objects.iter() {
        let new_id = (old_id.0 + id_offset, old_id.1);
        remapped.insert(new_id, remap_object_refs(object.clone(), id_offset));
    }
    for (id, object) in remapped {
        dest.objects.insert(id, object);
    }
    dest.max_id = source.max_id + id_offset;

    let mut report = ExportReport::default();
    let mut font_cache = FontCache::new();
    let pages_id = dest.new_object_id();
    let mut page_refs: Vec<Object> = Vec::new();

    for (&page_number, &page_id) in &source_pages {
        let media_box = page_media_box(&source, page_id)?;
        let page_width_pt = media_box[2] - media_box[0];
        let page_height_pt = media_box[3] - media_box[1];

        let content_bytes = source
            .get_page_content(page_id)
            .map_err(|e| EditorError::ExportError(e.to_string()))?;

        let background_resources = match inherited_attr(&source, page_id, b"Resources") {
            Some(obj) => remap_object_refs(obj.clone(), id_offset),
            None => Object::Dictionary(Dictionary::new()),
        };

        let mut xobject_dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![
                Object::Real(media_box[0] as f32),
                Object::Real(media_box[1] as f32),
                Object::Real(media_box[2] as f32),
                Object::Real(media_box[3] as f32),
            ],
        };
        xobject_dict.set("Resources", background_resources);
        let background_id = dest.add_object(Stream::new(xobject_dict, content_bytes));

        let mut operations = vec![
            Operation::new("q", vec![]),
            Operation::new("Do", vec![Object::Name(b"Bg0".to_vec())]),
            Operation::new("Q", vec![]),
        ];
        let mut page_font_names: Vec<(String, ObjectId)> = Vec::new();

        for item in store.items(page_number) {
            if item.is_blank() {
                continue;
            }
            if !item.font_size_px.is_finite()
                || item.font_size_px <= 0.0
                || !item.x.is_finite()
                || !item.y.is_finite()
            {
                report.skipped.push(SkippedItem {
                    page: page_number,
                    id: item.id,
                    text: item.text.clone(),
                    reason: SkipReason::DrawFailed,
                });
                continue;
            }
            let clean = match sanitize_for_standard_font(&item.text) {
                SanitizeOutcome::Clean(text) => text,
                SanitizeOutcome::Unsupported => {
                    report.skipped.push(SkippedItem {
                        page: page_number,
                        id: item.id,
                        text: item.text.clone(),
                        reason: SkipReason::UnsupportedCharacters,
                    });
                    continue;
                }
            };

            let class = classify(&item.font_family, &item.original_font_name);
            let font_id = font_cache.get_or_embed(class, |class| {
                dest.add_object(dictionary! {
                    "Type" => "Font",
                    "Subtype" => "Type1",
                    "BaseFont" => class.base14_name(),
                    "Encoding" => "WinAnsiEncoding",
                })
            });
            let font_name = format!("F{}", font_id.0);
            if !page_font_names.iter().any(|(n, _)| n == &font_name) {
                page_font_names.push((font_name.clone(), font_id));
            }

            let (doc_x, doc_y, font_size_pt) = to_document_space(
                item.x,
                item.y,
                item.font_size_px,
                page_height_pt,
                canvas_height_px,
                page_width_pt,
                canvas_width_px,
            );
            let (r, g, b) = parse_hex_color(&item.color);

            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new(
                "Tf",
                vec![
                    Object::Name(font_name.into_bytes()),
                    Object::Real(font_size_pt as f32),
                ],
            ));
            operations.push(Operation::new(
                "rg",
                vec![Object::Real(r), Object::Real(g), Object::Real(b)],
            ));
            operations.push(Operation::new(
                "Td",
                vec![Object::Real(doc_x as f32), Object::Real(doc_y as f32)],
            ));
            operations.push(Operation::new(
                "Tj",
                vec![Object::String(encode_latin1(&clean), StringFormat::Literal)],
            ));
            operations.push(Operation::new("ET", vec![]));
            report.items_drawn += 1;
        }

        let content = Content { operations };
        let content_id = dest.add_object(Stream::new(
            Dictionary::new(),
            content
                .encode()
                .map_err(|e| EditorError::ExportError(e.to_string()))?,
        ));

        let mut font_dict = Dictionary::new();
        for (name, id) in &page_font_names {
            font_dict.set(name.as_bytes(), Object::Reference(*id));
        }
        let resources = dictionary! {
            "XObject" => dictionary! { "Bg0" => Object::Reference(background_id) },
            "Font" => font_dict,
        };

        let new_page_id = dest.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![
                Object::Real(media_box[0] as f32),
                Object::Real(media_box[1] as f32),
                Object::Real(media_box[2] as f32),
                Object::Real(media_box[3] as f32),
            ],
            "Contents" => Object::Reference(content_id),
            "Resources" => resources,
        });
        page_refs.push(Object::Reference(new_page_id));
        report.pages_processed += 1;
    }

    let page_count = page_refs.len() as i64;
    dest.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_refs,
            "Count" => page_count,
        }),
    );
    let catalog_id = dest.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    dest.trailer.set("Root", Object::Reference(catalog_id));

    dest.prune_objects();
    dest.compress();

    let mut bytes = Vec::new();
    dest.save_to(&mut bytes)
        .map_err(|e| EditorError::ExportError(e.to_string()))?;

    Ok(ExportOutput { bytes, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::TextItem;

    /// Minimal one-page letter-size source with a single text line.
    fn source_pdf() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), 12.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new(
                    "Tj",
                    vec![Object::String(b"Original".to_vec(), StringFormat::Literal)],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            Dictionary::new(),
            content.encode().unwrap(),
        ));
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => Object::Reference(content_id),
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => Object::Reference(font_id) },
            },
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    fn item(id: ItemId, text: &str) -> TextItem {
        TextItem {
            id,
            page_number: 1,
            text: text.to_string(),
            x: 72.0,
            y: 80.0,
            width: 100.0,
            height: 12.0,
            font_size_px: 12.0,
            font_family: "Helvetica, Arial, sans-serif".to_string(),
            color: "#000000".to_string(),
            original_font_name: "Helvetica".to_string(),
            transform: [12.0, 0.0, 0.0, 12.0, 72.0, 712.0],
        }
    }

    fn store_with(items: Vec<TextItem>) -> TextItemStore {
        let mut store = TextItemStore::new(612.0, 792.0);
        store.insert_extracted(1, items);
        store
    }

    #[test]
    fn test_rejects_bytes_without_header() {
        let store = TextItemStore::new(612.0, 792.0);
        let err = export_document(b"not a pdf", &store, 612.0, 792.0).unwrap_err();
        assert!(matches!(err, EditorError::InvalidInput(_)));
    }

    #[test]
    fn test_export_preserves_page_count_and_loads() {
        let bytes = source_pdf();
        let out = export_document(&bytes, &store_with(vec![item(1, "Edited")]), 612.0, 792.0)
            .unwrap();
        let doc = Document::load_mem(&out.bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 1);
        assert_eq!(out.report.pages_processed, 1);
        assert_eq!(out.report.items_drawn, 1);
        assert!(out.report.skipped.is_empty());
    }

    #[test]
    fn test_exported_item_lands_at_mapped_position() {
        let bytes = source_pdf();
        let out = export_document(&bytes, &store_with(vec![item(1, "Edited")]), 612.0, 792.0)
            .unwrap();
        let doc = Document::load_mem(&out.bytes).unwrap();
        let (_, page_id) = doc.get_pages().into_iter().next().unwrap();
        let runs = crate::runs::read_text_runs(&doc, page_id, 1.0).unwrap();
        let edited: Vec<_> = runs.iter().filter(|r| r.text == "Edited").collect();
        assert_eq!(edited.len(), 1);
        // (72px, 80px) on a 1:1 canvas maps to (72pt, 700pt)
        assert!((edited[0].transform[4] - 72.0).abs() < 0.01);
        assert!((edited[0].transform[5] - 700.0).abs() < 0.01);
        assert!((edited[0].transform[3] - 12.0).abs() < 0.01);
    }

    #[test]
    fn test_blank_items_are_dropped_silently() {
        let bytes = source_pdf();
        let out = export_document(&bytes, &store_with(vec![item(1, "   ")]), 612.0, 792.0)
            .unwrap();
        assert_eq!(out.report.items_drawn, 0);
        assert!(out.report.skipped.is_empty());
    }

    #[test]
    fn test_unsupported_characters_skip_and_report() {
        let bytes = source_pdf();
        let out = export_document(
            &bytes,
            &store_with(vec![item(1, "Edited"), item(2, "\u{4f60}\u{597d}")]),
            612.0,
            792.0,
        )
        .unwrap();
        assert_eq!(out.report.items_drawn, 1);
        assert_eq!(out.report.skipped.len(), 1);
        assert_eq!(out.report.skipped[0].id, 2);
        assert_eq!(
            out.report.skipped[0].reason,
            SkipReason::UnsupportedCharacters
        );
    }

    #[test]
    fn test_substitutable_characters_are_rewritten_not_skipped() {
        let bytes = source_pdf();
        let out = export_document(
            &bytes,
            &store_with(vec![item(1, "Go \u{2192} Stop")]),
            612.0,
            792.0,
        )
        .unwrap();
        assert_eq!(out.report.items_drawn, 1);
        let doc = Document::load_mem(&out.bytes).unwrap();
        let (_, page_id) = doc.get_pages().into_iter().next().unwrap();
        let runs = crate::runs::read_text_runs(&doc, page_id, 1.0).unwrap();
        assert!(runs.iter().any(|r| r.text == "Go -> Stop"));
    }

    #[test]
    fn test_malformed_color_draws_black_without_failing() {
        // A color that never went through the store's validation,
        // including multi-byte text of the right byte length
        let bytes = source_pdf();
        for bad in ["\u{20ac}\u{20ac}", "red", "#12345"] {
            let mut bad_color = item(1, "Edited");
            bad_color.color = bad.to_string();
            let out =
                export_document(&bytes, &store_with(vec![bad_color]), 612.0, 792.0).unwrap();
            assert_eq!(out.report.items_drawn, 1, "failed on {:?}", bad);

            let doc = Document::load_mem(&out.bytes).unwrap();
            let (_, page_id) = doc.get_pages().into_iter().next().unwrap();
            let runs = crate::runs::read_text_runs(&doc, page_id, 1.0).unwrap();
            let edited = runs.iter().find(|r| r.text == "Edited").unwrap();
            assert_eq!(edited.color, Some([0.0, 0.0, 0.0]));
        }
    }

    #[test]
    fn test_one_font_object_per_class() {
        let bytes = source_pdf();
        let mut second = item(2, "Also Helvetica");
        second.y = 120.0;
        let out = export_document(
            &bytes,
            &store_with(vec![item(1, "Edited"), second]),
            612.0,
            792.0,
        )
        .unwrap();
        let doc = Document::load_mem(&out.bytes).unwrap();
        let overlay_fonts = doc
            .objects
            .values()
            .filter(|obj| {
                obj.as_dict()
                    .ok()
                    .and_then(|d| d.get(b"Encoding").ok())
                    .is_some()
            })
            .count();
        assert_eq!(overlay_fonts, 1);
    }
}
