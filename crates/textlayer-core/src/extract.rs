//! Text run extraction and adjacency merging
//!
//! Converts the rasterizer's raw positioned runs into editable
//! [`TextItem`]s, then optionally groups per-glyph-run fragments into
//! human-editable lines. PDFs routinely split one visual line into
//! many runs; the merge pass undoes that without conflating visually
//! distinct blocks.

use crate::fonts::css_stack_for;
use crate::item::{ItemId, TextItem, TextRun};

/// Items whose Y differs by no more than this are on the same line.
const SAME_LINE_TOLERANCE_PX: f64 = 2.0;
/// A horizontal gap wider than this gets a space inserted on merge.
const WORD_GAP_PX: f64 = 1.0;
/// Fallback width per character, as a fraction of font size, when the
/// rasterizer reports no advance width.
const WIDTH_HEURISTIC_FACTOR: f64 = 0.5;

fn rgb_to_hex(rgb: [f64; 3]) -> String {
    let clamp = |v: f64| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!("#{:02x}{:02x}{:02x}", clamp(rgb[0]), clamp(rgb[1]), clamp(rgb[2]))
}

/// Build editable items from the raw runs of one page.
///
/// `page_height_px` flips the rasterizer's bottom-up translation into
/// top-left pixel coordinates; `next_id` supplies stable item ids.
/// Blank runs are dropped. An empty run list is a valid empty result
/// (blank or image-only pages).
pub fn extract_runs(
    runs: &[TextRun],
    page_number: u32,
    page_height_px: f64,
    next_id: &mut impl FnMut() -> ItemId,
) -> Vec<TextItem> {
    let mut items = Vec::new();

    for run in runs {
        if run.text.trim().is_empty() {
            continue;
        }

        let transform = run.transform;
        // scale_y carries the effective font size; negative for flipped text
        let font_size = transform[3].abs();
        if font_size <= 0.0 {
            continue;
        }

        let x = transform[4];
        let y = page_height_px - transform[5];

        let width = run
            .width
            .unwrap_or_else(|| run.text.chars().count() as f64 * font_size * WIDTH_HEURISTIC_FACTOR);
        let height = font_size;

        let color = run.color.map(rgb_to_hex).unwrap_or_else(|| "#000000".to_string());

        items.push(TextItem {
            id: next_id(),
            page_number,
            text: run.text.clone(),
            x,
            // Adjust for baseline: stored y is the box top
            y: y - height,
            width,
            height,
            font_size_px: font_size,
            font_family: css_stack_for(&run.font_name).to_string(),
            color,
            original_font_name: run.font_name.clone(),
            transform,
        });
    }

    items
}

/// Merge adjacent items that belong to the same visual line.
///
/// Applied once after extraction, never re-applied on edit. Two items
/// merge when they sit on the same line (vertical gap within
/// tolerance), the horizontal gap is smaller than the next item's
/// font size, sizes differ by less than 1px, and family and color
/// match. A space is inserted when the gap exceeds [`WORD_GAP_PX`].
pub fn merge_adjacent(items: Vec<TextItem>) -> Vec<TextItem> {
    if items.is_empty() {
        return items;
    }

    // Quantize Y into line buckets before comparing; a "same line
    // within tolerance" comparator is not a total order (tolerance
    // chains are intransitive) and std sort may panic on one.
    let line_of = |y: f64| (y / SAME_LINE_TOLERANCE_PX).round();
    let mut sorted = items;
    sorted.sort_by(|a, b| {
        line_of(a.y)
            .partial_cmp(&line_of(b.y))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
    });

    let mut merged: Vec<TextItem> = Vec::with_capacity(sorted.len());
    let mut iter = sorted.into_iter();
    let mut current = iter.next().expect("non-empty");

    for item in iter {
        let y_diff = (item.y - current.y).abs();
        let x_gap = item.x - (current.x + current.width);
        let same_size = (item.font_size_px - current.font_size_px).abs() < 1.0;
        let same_font = item.font_family == current.font_family;
        let same_color = item.color == current.color;

        if y_diff < SAME_LINE_TOLERANCE_PX
            && x_gap < item.font_size_px
            && same_size
            && same_font
            && same_color
        {
            if x_gap > WORD_GAP_PX {
                current.text.push(' ');
            }
            current.text.push_str(&item.text);
            current.width = item.x + item.width - current.x;
        } else {
            merged.push(current);
            current = item;
        }
    }

    merged.push(current);
    merged
}
