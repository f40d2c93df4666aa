//! WYSIWYG PDF text-layer editing
//!
//! This crate reconstructs the text layer of a PDF page as editable
//! items, lets a caller mutate them, and composes a new document that
//! layers the edited text over each original page embedded verbatim
//! as a background.
//!
//! The main entry point is [`EditorSession`]: open a document, edit
//! items through its [`TextItemStore`], export. The standalone tools
//! in [`tools`] (rotation, page numbers, watermarks) operate on raw
//! bytes independently of any session.

pub mod coords;
pub mod error;
pub mod extract;
pub mod fonts;
pub mod item;
pub mod recompose;
pub mod runs;
pub mod sanitize;
pub mod session;
pub mod store;
pub mod tools;

pub use error::EditorError;
pub use extract::{extract_runs, merge_adjacent};
pub use fonts::{classify, FontCache, FontClass, FontFamily};
pub use item::{ItemId, TextItem, TextRun};
pub use recompose::{export_document, ExportOutput, ExportReport, SkipReason, SkippedItem};
pub use runs::read_text_runs;
pub use sanitize::{sanitize_for_standard_font, SanitizeOutcome};
pub use session::{EditorSession, ExtractReport};
pub use store::TextItemStore;

/// True when the buffer starts with the PDF file header.
pub fn has_pdf_signature(bytes: &[u8]) -> bool {
    bytes.starts_with(b"%PDF-")
}

/// Parse PDF bytes and return page count
pub fn get_page_count(bytes: &[u8]) -> Result<u32, EditorError> {
    let doc =
        lopdf::Document::load_mem(bytes).map_err(|e| EditorError::ParseError(e.to_string()))?;
    Ok(doc.get_pages().len() as u32)
}
