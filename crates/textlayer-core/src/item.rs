//! Editable text item model
//!
//! A `TextItem` is one independently positioned, editable run of text
//! reconstructed from a PDF page. Positions and sizes live in the
//! rasterizer's pixel space (top-left origin) at the scale that was
//! active when the item was created; export converts them back to
//! document points.

use serde::{Deserialize, Serialize};

pub type ItemId = u64;

/// One editable unit of text on one page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextItem {
    /// Unique within the page's store; never reused after deletion.
    pub id: ItemId,
    /// 1-based page index; immutable after creation.
    pub page_number: u32,
    pub text: String,
    /// Top-left position in pixel space.
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub font_size_px: f64,
    /// CSS fallback list used for on-screen rendering only.
    pub font_family: String,
    /// 6-hex-digit RGB string, e.g. "#1a2b3c".
    pub color: String,
    /// PDF-internal font name the run was extracted from. Only used
    /// to infer bold/italic and the export font choice.
    pub original_font_name: String,
    /// Raw source text matrix, retained for provenance.
    pub transform: [f64; 6],
}

impl TextItem {
    /// True when the item would be dropped at export.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A raw positioned text run as reported by the page rasterizer.
///
/// This mirrors the shape of PDF.js `getTextContent` items: a string,
/// its text matrix (with the font size folded into the scale
/// components), the resource font name, and optionally an advance
/// width and fill color.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TextRun {
    pub text: String,
    /// [scale_x, skew_y, skew_x, scale_y, translate_x, translate_y]
    pub transform: [f64; 6],
    pub font_name: String,
    /// Advance width in the same space as the transform, when the
    /// rasterizer reports one.
    #[serde(default)]
    pub width: Option<f64>,
    /// Fill color as RGB components in 0..=1, when reported.
    #[serde(default)]
    pub color: Option<[f64; 3]>,
}
