//! Editing session over one loaded document
//!
//! The session owns the verbatim original bytes, the reconstructed
//! text layer, and a generation counter. Opening a document replaces
//! the whole state and bumps the generation; callers that hand work
//! to asynchronous collaborators tag it with the generation and
//! discard completions whose tag no longer matches.

use crate::error::EditorError;
use crate::extract::{extract_runs, merge_adjacent};
use crate::item::TextRun;
use crate::recompose::{export_document, ExportOutput};
use crate::runs::read_text_runs;
use crate::store::TextItemStore;
use lopdf::Document;
use serde::{Deserialize, Serialize};

/// Per-open extraction summary. Unreadable pages yield an empty item
/// set and a warning here rather than failing the open.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractReport {
    pub pages_scanned: u32,
    pub items_extracted: u32,
    pub warnings: Vec<String>,
}

#[derive(Debug)]
pub struct EditorSession {
    original_bytes: Vec<u8>,
    /// Point dimensions per page, in page order.
    page_sizes_pt: Vec<(f64, f64)>,
    scale: f64,
    store: TextItemStore,
    extract_report: ExtractReport,
    generation: u64,
}

impl EditorSession {
    /// Open a document and reconstruct the text layer of every page
    /// up front.
    pub fn open(bytes: Vec<u8>, scale: f64) -> Result<Self, EditorError> {
        let mut session = Self::new_deferred(bytes, scale)?;

        let doc = Document::load_mem(&session.original_bytes)
            .map_err(|e| EditorError::ParseError(e.to_string()))?;
        let pages = doc.get_pages();
        for (&page_number, &page_id) in &pages {
            let page_height_px = session.page_sizes_pt[(page_number - 1) as usize].1 * scale;
            match read_text_runs(&doc, page_id, scale) {
                Ok(runs) => {
                    session.ingest(page_number, &runs, page_height_px);
                }
                Err(e) => {
                    session.store.insert_extracted(page_number, Vec::new());
                    session
                        .extract_report
                        .warnings
                        .push(format!("Page {}: {}", page_number, e));
                }
            }
            session.extract_report.pages_scanned += 1;
        }

        Ok(session)
    }

    /// Open a document without extracting anything. Used when an
    /// external rasterizer supplies the runs page by page via
    /// [`EditorSession::ingest_page_runs`].
    pub fn new_deferred(bytes: Vec<u8>, scale: f64) -> Result<Self, EditorError> {
        if !crate::has_pdf_signature(&bytes) {
            return Err(EditorError::InvalidInput(
                "missing %PDF- header".to_string(),
            ));
        }
        if !(scale.is_finite() && scale > 0.0) {
            return Err(EditorError::InvalidInput(format!(
                "invalid scale {}",
                scale
            )));
        }

        let doc =
            Document::load_mem(&bytes).map_err(|e| EditorError::ParseError(e.to_string()))?;
        let pages = doc.get_pages();
        if pages.is_empty() {
            return Err(EditorError::InvalidInput("document has no pages".into()));
        }
        let mut page_sizes_pt = Vec::with_capacity(pages.len());
        for &page_id in pages.values() {
            let media_box = crate::recompose::page_media_box(&doc, page_id)
                .map_err(|_| EditorError::ParseError("page has no readable MediaBox".into()))?;
            page_sizes_pt.push((media_box[2] - media_box[0], media_box[3] - media_box[1]));
        }

        let (first_w, first_h) = page_sizes_pt[0];
        Ok(Self {
            original_bytes: bytes,
            page_sizes_pt,
            scale,
            store: TextItemStore::new(first_w * scale, first_h * scale),
            extract_report: ExtractReport::default(),
            generation: next_generation(),
        })
    }

    /// Feed externally extracted runs for one page, replacing that
    /// page's items. `generation` must match the current session;
    /// stale completions from a previously opened document are
    /// discarded without effect.
    pub fn ingest_page_runs(
        &mut self,
        generation: u64,
        page: u32,
        runs: &[TextRun],
        page_height_px: f64,
    ) -> Result<(), EditorError> {
        if generation != self.generation {
            return Ok(());
        }
        if page == 0 || page as usize > self.page_sizes_pt.len() {
            return Err(EditorError::PageOutOfRange(page));
        }
        self.ingest(page, runs, page_height_px);
        Ok(())
    }

    fn ingest(&mut self, page: u32, runs: &[TextRun], page_height_px: f64) {
        let mut next_id = || self.store.next_id();
        let raw = extract_runs(runs, page, page_height_px, &mut next_id);
        let items = merge_adjacent(raw);
        self.extract_report.items_extracted += items.len() as u32;
        self.store.replace_page(page, items);
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn page_count(&self) -> u32 {
        self.page_sizes_pt.len() as u32
    }

    /// Point dimensions of a 1-based page.
    pub fn page_size_pt(&self, page: u32) -> Result<(f64, f64), EditorError> {
        self.page_sizes_pt
            .get((page as usize).wrapping_sub(1))
            .copied()
            .ok_or(EditorError::PageOutOfRange(page))
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn extract_report(&self) -> &ExtractReport {
        &self.extract_report
    }

    pub fn store(&self) -> &TextItemStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut TextItemStore {
        &mut self.store
    }

    /// Compose the edited document from the untouched original bytes
    /// and the current item state.
    pub fn export(&self) -> Result<ExportOutput, EditorError> {
        let (canvas_w, canvas_h) = self.store.canvas_size();
        export_document(&self.original_bytes, &self.store, canvas_w, canvas_h)
    }
}

fn next_generation() -> u64 {
    use std::sync::atomic::{AtomicU64, Ordering};
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    COUNTER.fetch_add(1, Ordering::Relaxed) + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Dictionary, Object, Stream, StringFormat};

    fn two_page_pdf() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });
        let pages_id = doc.new_object_id();
        let mut kids = Vec::new();
        for text in ["First page", "Second page"] {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), 12.into()]),
                    Operation::new("Td", vec![72.into(), 700.into()]),
                    Operation::new(
                        "Tj",
                        vec![Object::String(
                            text.as_bytes().to_vec(),
                            StringFormat::Literal,
                        )],
                    ),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(
                Dictionary::new(),
                content.encode().unwrap(),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => Object::Reference(pages_id),
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Contents" => Object::Reference(content_id),
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => Object::Reference(font_id) },
                },
            });
            kids.push(Object::Reference(page_id));
        }
        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
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

    #[test]
    fn test_open_extracts_all_pages() {
        let session = EditorSession::open(two_page_pdf(), 1.0).unwrap();
        assert_eq!(session.page_count(), 2);
        assert_eq!(session.store().item_count(1), 1);
        assert_eq!(session.store().item_count(2), 1);
        assert_eq!(session.store().items(1)[0].text, "First page");
        assert_eq!(session.extract_report().pages_scanned, 2);
        assert!(session.extract_report().warnings.is_empty());
    }

    #[test]
    fn test_open_rejects_garbage() {
        let err = EditorSession::open(b"garbage".to_vec(), 1.0).unwrap_err();
        assert!(matches!(err, EditorError::InvalidInput(_)));
    }

    #[test]
    fn test_open_rejects_nonpositive_scale() {
        let err = EditorSession::open(two_page_pdf(), 0.0).unwrap_err();
        assert!(matches!(err, EditorError::InvalidInput(_)));
    }

    #[test]
    fn test_generations_differ_between_opens() {
        let a = EditorSession::open(two_page_pdf(), 1.0).unwrap();
        let b = EditorSession::open(two_page_pdf(), 1.0).unwrap();
        assert_ne!(a.generation(), b.generation());
    }

    #[test]
    fn test_stale_generation_ingest_is_discarded() {
        let mut session = EditorSession::new_deferred(two_page_pdf(), 1.0).unwrap();
        let current = session.generation();
        let run = TextRun {
            text: "late arrival".to_string(),
            transform: [12.0, 0.0, 0.0, 12.0, 72.0, 712.0],
            font_name: "F1".to_string(),
            width: None,
            color: None,
        };
        session
            .ingest_page_runs(current.wrapping_sub(1), 1, &[run.clone()], 792.0)
            .unwrap();
        assert_eq!(session.store().item_count(1), 0);

        session.ingest_page_runs(current, 1, &[run], 792.0).unwrap();
        assert_eq!(session.store().item_count(1), 1);
    }

    #[test]
    fn test_ingest_out_of_range_page_errors() {
        let mut session = EditorSession::new_deferred(two_page_pdf(), 1.0).unwrap();
        let generation = session.generation();
        let err = session
            .ingest_page_runs(generation, 3, &[], 792.0)
            .unwrap_err();
        assert!(matches!(err, EditorError::PageOutOfRange(3)));
    }

    #[test]
    fn test_edit_and_export_moves_text() {
        let mut session = EditorSession::open(two_page_pdf(), 1.0).unwrap();
        let id = session.store().items(1)[0].id;
        session.store_mut().update_text(1, id, "EDITED");
        let out = session.export().unwrap();

        let doc = Document::load_mem(&out.bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
        let (_, page_id) = doc.get_pages().into_iter().next().unwrap();
        let runs = read_text_runs(&doc, page_id, 1.0).unwrap();
        assert!(runs.iter().any(|r| r.text == "EDITED"));
    }
}
