//! In-memory per-page collection of editable text items
//!
//! The store is the single source of truth for both the on-screen
//! overlay and export. Items are only ever mutated through store
//! operations; the recomposition engine reads, never writes.

use crate::item::{ItemId, TextItem};
use std::collections::BTreeMap;

/// Defaults for a user-inserted text box.
const NEW_TEXT: &str = "New Text";
const NEW_TEXT_OFFSET: f64 = 50.0;
const NEW_TEXT_WIDTH: f64 = 200.0;
const NEW_TEXT_HEIGHT: f64 = 40.0;
const NEW_TEXT_SIZE: f64 = 16.0;

#[derive(Debug, Default)]
pub struct TextItemStore {
    pages: BTreeMap<u32, Vec<TextItem>>,
    next_id: ItemId,
    canvas_width: f64,
    canvas_height: f64,
    selected: Option<ItemId>,
}

impl TextItemStore {
    pub fn new(canvas_width: f64, canvas_height: f64) -> Self {
        Self {
            pages: BTreeMap::new(),
            next_id: 1,
            canvas_width,
            canvas_height,
            selected: None,
        }
    }

    pub fn canvas_size(&self) -> (f64, f64) {
        (self.canvas_width, self.canvas_height)
    }

    /// Ids are unique for the lifetime of the store and never reused.
    pub fn next_id(&mut self) -> ItemId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Bulk insertion of freshly extracted items (load time).
    pub fn insert_extracted(&mut self, page: u32, items: Vec<TextItem>) {
        self.pages.entry(page).or_default().extend(items);
    }

    /// Replace a page's items wholesale, e.g. when the rasterizer
    /// re-delivers runs for a page. Selection on that page is
    /// dropped.
    pub fn replace_page(&mut self, page: u32, items: Vec<TextItem>) {
        if let Some(selected) = self.selected {
            let on_page = self
                .pages
                .get(&page)
                .map(|existing| existing.iter().any(|item| item.id == selected))
                .unwrap_or(false);
            if on_page {
                self.selected = None;
            }
        }
        self.pages.insert(page, items);
    }

    /// Insert a user-created text box with the default styling and a
    /// fixed offset from the page corner. Returns the new item's id.
    pub fn add_text_box(&mut self, page: u32) -> ItemId {
        let id = self.next_id();
        let item = TextItem {
            id,
            page_number: page,
            text: NEW_TEXT.to_string(),
            x: NEW_TEXT_OFFSET,
            y: NEW_TEXT_OFFSET,
            width: NEW_TEXT_WIDTH,
            height: NEW_TEXT_HEIGHT,
            font_size_px: NEW_TEXT_SIZE,
            font_family: "Helvetica, Arial, sans-serif".to_string(),
            color: "#000000".to_string(),
            original_font_name: "Helvetica".to_string(),
            transform: [
                NEW_TEXT_SIZE,
                0.0,
                0.0,
                NEW_TEXT_SIZE,
                NEW_TEXT_OFFSET,
                NEW_TEXT_OFFSET,
            ],
        };
        self.pages.entry(page).or_default().push(item);
        id
    }

    pub fn items(&self, page: u32) -> &[TextItem] {
        self.pages.get(&page).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn pages(&self) -> impl Iterator<Item = (u32, &[TextItem])> {
        self.pages.iter().map(|(&page, items)| (page, items.as_slice()))
    }

    pub fn item_count(&self, page: u32) -> usize {
        self.items(page).len()
    }

    fn find_mut(&mut self, page: u32, id: ItemId) -> Option<&mut TextItem> {
        self.pages
            .get_mut(&page)
            .and_then(|items| items.iter_mut().find(|item| item.id == id))
    }

    /// Replace the text content. Unknown ids are a silent no-op: the
    /// UI only ever acts on items it just listed.
    pub fn update_text(&mut self, page: u32, id: ItemId, text: &str) {
        if let Some(item) = self.find_mut(page, id) {
            item.text = text.to_string();
        }
    }

    pub fn update_font_size(&mut self, page: u32, id: ItemId, size_px: f64) {
        if size_px <= 0.0 {
            return;
        }
        if let Some(item) = self.find_mut(page, id) {
            item.font_size_px = size_px;
            item.height = size_px;
        }
    }

    /// Set the color. Values that are not a 6-hex-digit RGB string
    /// are dropped so downstream consumers can rely on the format.
    pub fn update_color(&mut self, page: u32, id: ItemId, color: &str) {
        let hex = color.strip_prefix('#').unwrap_or(color);
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return;
        }
        if let Some(item) = self.find_mut(page, id) {
            item.color = format!("#{}", hex);
        }
    }

    /// Move an item, clamping so it cannot be dragged fully outside
    /// the canvas.
    pub fn move_item(&mut self, page: u32, id: ItemId, x: f64, y: f64) {
        let (canvas_w, canvas_h) = (self.canvas_width, self.canvas_height);
        if let Some(item) = self.find_mut(page, id) {
            item.x = x.clamp(0.0, (canvas_w - item.width).max(0.0));
            item.y = y.clamp(0.0, (canvas_h - item.height).max(0.0));
        }
    }

    /// Delete an item. Clears the selection if it pointed at the item.
    pub fn remove(&mut self, page: u32, id: ItemId) -> bool {
        let removed = self
            .pages
            .get_mut(&page)
            .map(|items| {
                let before = items.len();
                items.retain(|item| item.id != id);
                items.len() != before
            })
            .unwrap_or(false);

        if removed && self.selected == Some(id) {
            self.selected = None;
        }
        removed
    }

    pub fn select(&mut self, id: Option<ItemId>) {
        self.selected = id;
    }

    pub fn selected(&self) -> Option<ItemId> {
        self.selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_item() -> (TextItemStore, ItemId) {
        let mut store = TextItemStore::new(600.0, 800.0);
        let id = store.add_text_box(1);
        (store, id)
    }

    #[test]
    fn test_add_text_box_defaults() {
        let (store, id) = store_with_item();
        let item = &store.items(1)[0];
        assert_eq!(item.id, id);
        assert_eq!(item.text, "New Text");
        assert_eq!((item.x, item.y), (50.0, 50.0));
        assert_eq!(item.font_size_px, 16.0);
        assert_eq!(item.color, "#000000");
    }

    #[test]
    fn test_ids_are_unique_and_never_reused() {
        let mut store = TextItemStore::new(600.0, 800.0);
        let a = store.add_text_box(1);
        store.remove(1, a);
        let b = store.add_text_box(1);
        assert_ne!(a, b);
    }

    #[test]
    fn test_update_text() {
        let (mut store, id) = store_with_item();
        store.update_text(1, id, "EDITED");
        assert_eq!(store.items(1)[0].text, "EDITED");
    }

    #[test]
    fn test_update_unknown_id_is_noop() {
        let (mut store, _) = store_with_item();
        store.update_text(1, 9999, "nothing");
        assert_eq!(store.items(1)[0].text, "New Text");
    }

    #[test]
    fn test_update_font_size_tracks_height() {
        let (mut store, id) = store_with_item();
        store.update_font_size(1, id, 24.0);
        let item = &store.items(1)[0];
        assert_eq!(item.font_size_px, 24.0);
        assert_eq!(item.height, 24.0);
    }

    #[test]
    fn test_update_font_size_rejects_nonpositive() {
        let (mut store, id) = store_with_item();
        store.update_font_size(1, id, 0.0);
        assert_eq!(store.items(1)[0].font_size_px, 16.0);
    }

    #[test]
    fn test_update_color_accepts_hex() {
        let (mut store, id) = store_with_item();
        store.update_color(1, id, "#1A2B3C");
        assert_eq!(store.items(1)[0].color, "#1A2B3C");
        store.update_color(1, id, "ff0000");
        assert_eq!(store.items(1)[0].color, "#ff0000");
    }

    #[test]
    fn test_update_color_rejects_malformed_values() {
        let (mut store, id) = store_with_item();
        for bad in ["red", "#12345", "#12345g", "\u{20ac}\u{20ac}", ""] {
            store.update_color(1, id, bad);
            assert_eq!(store.items(1)[0].color, "#000000", "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_move_clamps_to_canvas() {
        // 600x800 canvas, 100x20 item
        let mut store = TextItemStore::new(600.0, 800.0);
        let id = store.next_id();
        store.insert_extracted(
            1,
            vec![TextItem {
                id,
                page_number: 1,
                text: "clamped".to_string(),
                x: 10.0,
                y: 10.0,
                width: 100.0,
                height: 20.0,
                font_size_px: 20.0,
                font_family: "Helvetica, Arial, sans-serif".to_string(),
                color: "#000000".to_string(),
                original_font_name: "Helvetica".to_string(),
                transform: [20.0, 0.0, 0.0, 20.0, 10.0, 10.0],
            }],
        );

        store.move_item(1, id, -50.0, 99999.0);
        let item = &store.items(1)[0];
        assert_eq!((item.x, item.y), (0.0, 780.0));

        store.move_item(1, id, 99999.0, -1.0);
        let item = &store.items(1)[0];
        assert_eq!((item.x, item.y), (500.0, 0.0));
    }

    #[test]
    fn test_remove_clears_selection() {
        let (mut store, id) = store_with_item();
        store.select(Some(id));
        assert!(store.remove(1, id));
        assert_eq!(store.selected(), None);
        assert!(store.items(1).is_empty());
    }

    #[test]
    fn test_remove_keeps_unrelated_selection() {
        let mut store = TextItemStore::new(600.0, 800.0);
        let a = store.add_text_box(1);
        let b = store.add_text_box(1);
        store.select(Some(a));
        store.remove(1, b);
        assert_eq!(store.selected(), Some(a));
    }

    #[test]
    fn test_replace_page_swaps_items_and_drops_selection() {
        let (mut store, id) = store_with_item();
        store.select(Some(id));
        store.replace_page(1, Vec::new());
        assert!(store.items(1).is_empty());
        assert_eq!(store.selected(), None);
    }

    #[test]
    fn test_pages_iteration_order() {
        let mut store = TextItemStore::new(600.0, 800.0);
        store.add_text_box(2);
        store.add_text_box(1);
        let pages: Vec<u32> = store.pages().map(|(p, _)| p).collect();
        assert_eq!(pages, vec![1, 2]);
    }
}
