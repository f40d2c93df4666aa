//! Font classification and the per-export embedded font cache
//!
//! Arbitrary source font names (PDF.js reports things like
//! "BCDEEE+ArialMT" or CSS stacks like "Times New Roman, serif") are
//! deliberately narrowed to the three universally available standard
//! families, each with bold/italic variants.

use lopdf::ObjectId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontFamily {
    Helvetica,
    Times,
    Courier,
}

/// Result of classifying a source font: one standard family plus
/// weight and slant flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FontClass {
    pub family: FontFamily,
    pub is_bold: bool,
    pub is_italic: bool,
}

/// Classify a font from its on-screen family hint and the original
/// PDF font name. Unmatched input falls back to regular Helvetica.
pub fn classify(font_family_hint: &str, original_font_name: &str) -> FontClass {
    let combined = format!("{} {}", font_family_hint, original_font_name).to_lowercase();

    let is_bold = combined.contains("bold") || combined.contains("700");
    let is_italic = combined.contains("italic") || combined.contains("oblique");

    let family = if combined.contains("times") {
        FontFamily::Times
    } else if combined.contains("courier") {
        FontFamily::Courier
    } else {
        FontFamily::Helvetica
    };

    FontClass {
        family,
        is_bold,
        is_italic,
    }
}

impl FontClass {
    /// The standard-14 BaseFont name for this class.
    pub fn base14_name(&self) -> &'static str {
        match self.family {
            FontFamily::Times => match (self.is_bold, self.is_italic) {
                (true, true) => "Times-BoldItalic",
                (true, false) => "Times-Bold",
                (false, true) => "Times-Italic",
                (false, false) => "Times-Roman",
            },
            FontFamily::Helvetica => match (self.is_bold, self.is_italic) {
                (true, true) => "Helvetica-BoldOblique",
                (true, false) => "Helvetica-Bold",
                (false, true) => "Helvetica-Oblique",
                (false, false) => "Helvetica",
            },
            FontFamily::Courier => match (self.is_bold, self.is_italic) {
                (true, true) => "Courier-BoldOblique",
                (true, false) => "Courier-Bold",
                (false, true) => "Courier-Oblique",
                (false, false) => "Courier",
            },
        }
    }

    /// CSS fallback list for on-screen rendering of this family.
    pub fn css_stack(&self) -> &'static str {
        match self.family {
            FontFamily::Helvetica => "Helvetica, Arial, sans-serif",
            FontFamily::Times => "Times New Roman, Times, serif",
            FontFamily::Courier => "Courier New, Courier, monospace",
        }
    }
}

/// CSS stack for a raw PDF font name, used when building the
/// on-screen representation of an extracted run.
pub fn css_stack_for(original_font_name: &str) -> &'static str {
    classify("", original_font_name).css_stack()
}

/// Embedded font handles for one output document.
///
/// Owned by a single export invocation so that interleaved exports
/// can never share handles across documents.
#[derive(Debug, Default)]
pub struct FontCache {
    embedded: HashMap<FontClass, ObjectId>,
}

impl FontCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the font object for `class`, embedding it via `embed` on
    /// first use.
    pub fn get_or_embed<F>(&mut self, class: FontClass, embed: F) -> ObjectId
    where
        F: FnOnce(&FontClass) -> ObjectId,
    {
        *self.embedded.entry(class).or_insert_with(|| embed(&class))
    }

    pub fn len(&self) -> usize {
        self.embedded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.embedded.is_empty()
    }
}
