//! Incremental reconstruction of a page snapshot
//!
//! The browser sends a page in pieces: text updates carrying one glyph and
//! one colour per cell, and pixel updates carrying two stacked pixels per
//! cell. Each update covers a sub-rectangle of the page. Both kinds are kept
//! keyed by absolute cell index, and every touched cell is rebuilt from
//! whatever is known about it, so updates to disjoint regions can arrive in
//! any order.
//!
//! Vertical sizes in [`FrameMeta`] are in pixel rows; a cell row is two
//! pixel rows.

use crate::cell::{is_transparent, Cell, CellStore};
use crate::color::Rgb;
use crate::input_box::InputBox;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Why an update was not applied.
///
/// These are expected while a page is loading and are never fatal.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum FrameError {
    #[error("text update is empty")]
    EmptyText,
    #[error("text update too short: {got} entries for {expected} cells")]
    ShortText { got: usize, expected: usize },
    #[error("pixel update arrived before any text")]
    PixelsBeforeText,
    #[error("pixel update is empty")]
    EmptyPixels,
    #[error("pixel update has {got} colour values, expected {expected}")]
    WrongPixelCount { got: usize, expected: usize },
}

/// Geometry of an update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameMeta {
    /// Tab the update belongs to
    pub id: i64,
    pub sub_left: usize,
    pub sub_top: usize,
    pub sub_width: usize,
    pub sub_height: usize,
    pub total_width: usize,
    pub total_height: usize,
}

/// Page geometry of a text input, in page pixels vertically
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingInputBox {
    pub id: String,
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
    #[serde(default)]
    pub tag_name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub colour: Vec<u8>,
}

/// Glyphs and text colours for a sub-rectangle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameText {
    pub meta: FrameMeta,
    #[serde(default)]
    pub text: Vec<String>,
    #[serde(default)]
    pub colours: Vec<u8>,
    #[serde(default)]
    pub input_boxes: HashMap<String, IncomingInputBox>,
}

/// Pixel colours for a sub-rectangle, row-major over pixel rows
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FramePixels {
    pub meta: FrameMeta,
    #[serde(default)]
    pub colours: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct TextCell {
    glyph: String,
    fg: Rgb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PixelPair {
    upper: Rgb,
    lower: Rgb,
}

/// The reconstructed page of one tab
#[derive(Debug, Default)]
pub struct Frame {
    pub sub_left: usize,
    pub sub_top: usize,
    pub sub_width: usize,
    pub sub_height: usize,
    pub total_width: usize,
    pub total_height: usize,
    pub x_scroll: usize,
    pub y_scroll: usize,
    is_dom_size_changed: bool,
    text: HashMap<usize, TextCell>,
    pixels: HashMap<usize, PixelPair>,
    cells: Arc<CellStore>,
    input_boxes: HashMap<String, InputBox>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle on the cell table, for readers on other threads
    pub fn cells(&self) -> Arc<CellStore> {
        Arc::clone(&self.cells)
    }

    /// Page height in cell rows
    pub fn total_rows(&self) -> usize {
        self.total_height / 2
    }

    /// Whether the last update changed the page dimensions
    pub fn is_dom_size_changed(&self) -> bool {
        self.is_dom_size_changed
    }

    /// Apply a text update.
    pub fn apply_text(&mut self, update: &FrameText) -> Result<(), FrameError> {
        let meta = update.meta;
        let expected = meta.sub_width * (meta.sub_height / 2);
        if update.text.is_empty() {
            return Err(FrameError::EmptyText);
        }
        if update.text.len() < expected {
            return Err(FrameError::ShortText {
                got: update.text.len(),
                expected,
            });
        }
        if update.colours.len() < expected * 3 {
            return Err(FrameError::ShortText {
                got: update.colours.len() / 3,
                expected,
            });
        }
        self.setup(&meta);
        self.update_input_boxes(update);

        for y in 0..meta.sub_height / 2 {
            for x in 0..meta.sub_width {
                let local = meta.sub_width * y + x;
                let Some(index) = self.text_index(x, y) else {
                    continue;
                };
                let fg = Rgb::from_flat(&update.colours, local).unwrap_or_default();
                let glyph = update.text[local].clone();
                self.text.insert(index, TextCell { glyph, fg });
                self.build_cell(index);
            }
        }
        Ok(())
    }

    /// Apply a pixel update.
    pub fn apply_pixels(&mut self, update: &FramePixels) -> Result<(), FrameError> {
        let meta = update.meta;
        if self.text.is_empty() {
            return Err(FrameError::PixelsBeforeText);
        }
        if update.colours.is_empty() {
            return Err(FrameError::EmptyPixels);
        }
        let expected = meta.sub_width * meta.sub_height * 3;
        if update.colours.len() != expected {
            return Err(FrameError::WrongPixelCount {
                got: update.colours.len(),
                expected,
            });
        }
        self.setup(&meta);

        for y in (0..meta.sub_height.saturating_sub(1)).step_by(2) {
            for x in 0..meta.sub_width {
                let Some(index) = self.pixel_index(x, y) else {
                    continue;
                };
                let upper = Rgb::from_flat(&update.colours, meta.sub_width * y + x);
                let lower = Rgb::from_flat(&update.colours, meta.sub_width * (y + 1) + x);
                if let (Some(upper), Some(lower)) = (upper, lower) {
                    self.pixels.insert(index, PixelPair { upper, lower });
                    self.build_cell(index);
                }
            }
        }
        Ok(())
    }

    fn setup(&mut self, meta: &FrameMeta) {
        self.is_dom_size_changed =
            self.total_width != meta.total_width || self.total_height != meta.total_height;
        self.sub_left = meta.sub_left;
        self.sub_top = meta.sub_top;
        self.sub_width = meta.sub_width;
        self.sub_height = meta.sub_height;
        self.total_width = meta.total_width;
        self.total_height = meta.total_height;
        if self.is_dom_size_changed {
            log::debug!(
                "Page resized to {}x{}, rebuilding cells",
                meta.total_width,
                meta.total_height
            );
            self.text.clear();
            self.pixels.clear();
            self.cells.reset();
        }
    }

    fn page_index(&self, column: usize, row: usize) -> Option<usize> {
        (column < self.total_width && row < self.total_rows())
            .then(|| row * self.total_width + column)
    }

    fn text_index(&self, x: usize, y: usize) -> Option<usize> {
        self.page_index(x + self.sub_left, y + self.sub_top / 2)
    }

    fn pixel_index(&self, x: usize, y: usize) -> Option<usize> {
        self.page_index(x + self.sub_left, (self.sub_top + y) / 2)
    }

    fn build_cell(&self, index: usize) {
        let column = index % self.total_width.max(1);
        let pixels = self.pixels.get(&index);
        let cell = match (self.text.get(&index), pixels) {
            (Some(text), Some(pixels)) if !is_transparent(&text.glyph) => {
                Cell::new(text.glyph.clone(), text.fg, pixels.upper)
            }
            (Some(text), None) if !is_transparent(&text.glyph) => {
                Cell::new(text.glyph.clone(), text.fg, Cell::hatched(column).bg)
            }
            (_, Some(pixels)) => Cell::pixels(pixels.upper, pixels.lower),
            (_, None) => Cell::hatched(column),
        };
        self.cells.set(index, cell);
    }

    /// Keep the viewport inside the page.
    pub fn limit_scroll(&mut self, viewport_width: usize, viewport_height: usize) {
        let max_y = self.total_rows().saturating_sub(viewport_height);
        let max_x = self.total_width.saturating_sub(viewport_width);
        self.y_scroll = self.y_scroll.min(max_y);
        self.x_scroll = self.x_scroll.min(max_x);
    }

    /// Scroll by a signed amount, then clamp to the page.
    pub fn scroll_by(&mut self, dx: isize, dy: isize, viewport: (usize, usize)) {
        self.x_scroll = self.x_scroll.saturating_add_signed(dx);
        self.y_scroll = self.y_scroll.saturating_add_signed(dy);
        self.limit_scroll(viewport.0, viewport.1);
    }

    /// The cell shown at viewport position `(x, y)`.
    pub fn cell_at(&self, x: usize, y: usize) -> Cell {
        let column = x + self.x_scroll;
        let index = (y + self.y_scroll) * self.total_width + column;
        self.cells
            .get(index)
            .unwrap_or_else(|| Cell::hatched(column))
    }

    pub fn input_boxes(&self) -> impl Iterator<Item = &InputBox> {
        self.input_boxes.values()
    }

    pub fn input_box(&self, id: &str) -> Option<&InputBox> {
        self.input_boxes.get(id)
    }

    pub fn input_box_mut(&mut self, id: &str) -> Option<&mut InputBox> {
        self.input_boxes.get_mut(id)
    }

    /// The input box covering page position `(column, row)`, if any
    pub fn input_box_at(&self, column: usize, row: usize) -> Option<&InputBox> {
        self.input_boxes.values().find(|b| {
            (b.x..b.x + b.width).contains(&column) && (b.y..b.y + b.height).contains(&row)
        })
    }

    fn update_input_boxes(&mut self, update: &FrameText) {
        self.input_boxes
            .retain(|id, _| update.input_boxes.contains_key(id));
        for (id, incoming) in &update.input_boxes {
            let input = self
                .input_boxes
                .entry(id.clone())
                .or_insert_with(|| InputBox::new(id.clone(), 1, 1));
            input.x = incoming.x;
            input.y = (incoming.y + 1) / 2;
            input.tag_name = incoming.tag_name.clone();
            input.kind = incoming.kind.clone();
            if let Some(fg) = Rgb::from_triplet(&incoming.colour) {
                input.fg = fg;
            }
            let height = (incoming.height / 2).max(1);
            if input.width != incoming.width.max(1) || input.height != height {
                input.resize(incoming.width, height);
            }
        }
    }

    /// Paint every input box's visible text into the cell table.
    ///
    /// The box area is rebuilt from page data first, so text the user has
    /// since deleted does not linger.
    pub fn overlay_input_boxes(&self) {
        for input in self.input_boxes.values() {
            let lines = input.visible_lines();
            for row in 0..input.height {
                let line: Vec<char> = lines.get(row).map_or_else(Vec::new, |l| l.chars().collect());
                for col in 0..input.width {
                    let Some(index) = self.page_index(input.x + col, input.y + row) else {
                        continue;
                    };
                    self.build_cell(index);
                    let Some(&c) = line.get(col) else {
                        continue;
                    };
                    if c.is_whitespace() {
                        continue;
                    }
                    let bg = self
                        .cells
                        .get(index)
                        .map_or(Rgb::WHITE, |cell| cell.bg);
                    self.cells.set(index, Cell::new(c.to_string(), input.fg, bg));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(sub_width: usize, sub_height: usize) -> FrameMeta {
        FrameMeta {
            id: 1,
            sub_width,
            sub_height,
            total_width: sub_width,
            total_height: sub_height,
            ..FrameMeta::default()
        }
    }

    fn text_update(text: &[&str], colours: &[u8]) -> FrameText {
        let mut flat = Vec::new();
        for c in colours {
            flat.extend([*c, *c, *c]);
        }
        FrameText {
            meta: meta(2, 4),
            text: text.iter().map(|t| t.to_string()).collect(),
            colours: flat,
            input_boxes: HashMap::new(),
        }
    }

    fn pixel_update(values: &[u8]) -> FramePixels {
        let mut flat = Vec::new();
        for v in values {
            flat.extend([*v, *v, *v]);
        }
        FramePixels {
            meta: meta(2, 4),
            colours: flat,
        }
    }

    fn grey(v: u8) -> Rgb {
        Rgb::new(v, v, v)
    }

    fn glyphs(frame: &Frame) -> Vec<String> {
        (0..4)
            .map(|i| frame.cells().get(i).map(|c| c.glyph).unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_text_update_builds_cells() {
        let mut frame = Frame::new();
        frame
            .apply_text(&text_update(&["A", "b", "c", ""], &[77, 101, 102, 103]))
            .unwrap();
        assert_eq!(glyphs(&frame), ["A", "b", "c", "▄"]);
        assert_eq!(frame.cells().get(0).unwrap().fg, grey(77));
        // No pixels yet: the hatch shows through
        assert_eq!(frame.cells().get(3).unwrap(), Cell::hatched(1));
    }

    #[test]
    fn test_pixel_update_fills_backgrounds() {
        let mut frame = Frame::new();
        frame
            .apply_text(&text_update(&["A", "b", "c", ""], &[77, 101, 102, 103]))
            .unwrap();
        frame
            .apply_pixels(&pixel_update(&[254, 111, 1, 2, 3, 4, 123, 200]))
            .unwrap();

        let first = frame.cells().get(0).unwrap();
        assert_eq!(first.glyph, "A");
        assert_eq!(first.fg, grey(77));
        assert_eq!(first.bg, grey(254));

        let last = frame.cells().get(3).unwrap();
        assert_eq!(last.glyph, "▄");
        assert_eq!(last.fg, grey(200));
        assert_eq!(last.bg, grey(4));
    }

    #[test]
    fn test_rejects_bad_updates() {
        let mut frame = Frame::new();
        assert_eq!(
            frame.apply_pixels(&pixel_update(&[1; 8])),
            Err(FrameError::PixelsBeforeText)
        );
        assert_eq!(
            frame.apply_text(&text_update(&[], &[])),
            Err(FrameError::EmptyText)
        );
        assert!(matches!(
            frame.apply_text(&text_update(&["a", "b"], &[1, 2])),
            Err(FrameError::ShortText { .. })
        ));

        frame
            .apply_text(&text_update(&["a", "b", "c", "d"], &[1, 2, 3, 4]))
            .unwrap();
        assert!(matches!(
            frame.apply_pixels(&pixel_update(&[1; 7])),
            Err(FrameError::WrongPixelCount { got: 21, expected: 24 })
        ));
        assert_eq!(
            frame.apply_pixels(&pixel_update(&[])),
            Err(FrameError::EmptyPixels)
        );
    }

    #[test]
    fn test_sub_rectangles_are_placed_on_the_page() {
        let mut frame = Frame::new();
        let update = FrameText {
            meta: FrameMeta {
                id: 1,
                sub_left: 1,
                sub_top: 2,
                sub_width: 1,
                sub_height: 2,
                total_width: 3,
                total_height: 4,
            },
            text: vec!["z".into()],
            colours: vec![9, 9, 9],
            input_boxes: HashMap::new(),
        };
        frame.apply_text(&update).unwrap();
        // Row 1, column 1 of a 3-wide page
        assert_eq!(frame.cells().get(4).unwrap().glyph, "z");
        assert_eq!(frame.cells().len(), 1);
    }

    #[test]
    fn test_disjoint_updates_commute() {
        let halves = |left: usize, glyph: &str, pixel: u8| {
            let meta = FrameMeta {
                id: 1,
                sub_left: left,
                sub_top: 0,
                sub_width: 2,
                sub_height: 2,
                total_width: 4,
                total_height: 2,
            };
            let text = FrameText {
                meta,
                text: vec![glyph.into(), " ".into()],
                colours: vec![5; 6],
                input_boxes: HashMap::new(),
            };
            let pixels = FramePixels {
                meta,
                colours: vec![pixel; 12],
            };
            (text, pixels)
        };
        let (left_text, left_pixels) = halves(0, "L", 10);
        let (right_text, right_pixels) = halves(2, "R", 20);

        let mut forward = Frame::new();
        forward.apply_text(&left_text).unwrap();
        forward.apply_pixels(&left_pixels).unwrap();
        forward.apply_text(&right_text).unwrap();
        forward.apply_pixels(&right_pixels).unwrap();

        let mut backward = Frame::new();
        backward.apply_text(&right_text).unwrap();
        backward.apply_pixels(&right_pixels).unwrap();
        backward.apply_pixels(&left_pixels).unwrap();
        backward.apply_text(&left_text).unwrap();

        for i in 0..4 {
            assert_eq!(forward.cells().get(i), backward.cells().get(i), "cell {i}");
        }
    }

    #[test]
    fn test_dom_size_change_drops_old_cells() {
        let mut frame = Frame::new();
        frame
            .apply_text(&text_update(&["a", "b", "c", "d"], &[1, 2, 3, 4]))
            .unwrap();
        assert!(frame.is_dom_size_changed());

        let mut bigger = text_update(&["x", "y"], &[1, 2]);
        bigger.meta = FrameMeta {
            id: 1,
            sub_left: 0,
            sub_top: 0,
            sub_width: 1,
            sub_height: 4,
            total_width: 5,
            total_height: 8,
        };
        frame.apply_text(&bigger).unwrap();
        assert!(frame.is_dom_size_changed());
        assert_eq!(frame.cells().len(), 2);
        assert_eq!(frame.cells().get(0).unwrap().glyph, "x");
        assert_eq!(frame.cells().get(5).unwrap().glyph, "y");
        assert!(frame.cells().get(1).is_none());
    }

    #[test]
    fn test_limit_scroll() {
        let mut frame = Frame::new();
        frame
            .apply_text(&text_update(&["a", "b", "c", "d"], &[1, 2, 3, 4]))
            .unwrap();
        frame.scroll_by(0, 10, (2, 1));
        assert_eq!(frame.y_scroll, 1);
        frame.scroll_by(0, -10, (2, 1));
        assert_eq!(frame.y_scroll, 0);
        // Viewport taller than the page
        frame.y_scroll = 3;
        frame.limit_scroll(2, 10);
        assert_eq!(frame.y_scroll, 0);
    }

    #[test]
    fn test_cell_at_follows_scroll() {
        let mut frame = Frame::new();
        frame
            .apply_text(&text_update(&["a", "b", "c", "d"], &[1, 2, 3, 4]))
            .unwrap();
        assert_eq!(frame.cell_at(1, 0).glyph, "b");
        frame.y_scroll = 1;
        assert_eq!(frame.cell_at(0, 0).glyph, "c");
        assert_eq!(frame.cell_at(0, 5), Cell::hatched(0));
    }

    #[test]
    fn test_input_boxes_follow_updates() {
        let mut frame = Frame::new();
        let mut update = text_update(&["a", "b", "c", "d"], &[1, 2, 3, 4]);
        update.input_boxes.insert(
            "q".into(),
            IncomingInputBox {
                id: "q".into(),
                x: 0,
                y: 1,
                width: 2,
                height: 2,
                tag_name: "INPUT".into(),
                kind: "text".into(),
                colour: vec![10, 20, 30],
            },
        );
        frame.apply_text(&update).unwrap();
        let input = frame.input_box("q").unwrap();
        assert_eq!((input.x, input.y, input.width, input.height), (0, 1, 2, 1));
        assert_eq!(input.fg, Rgb::new(10, 20, 30));
        assert_eq!(frame.input_box_at(1, 1).map(|b| b.id.as_str()), Some("q"));
        assert!(frame.input_box_at(1, 0).is_none());

        frame.input_box_mut("q").unwrap().set_text("h");
        frame.apply_text(&update).unwrap();
        assert_eq!(frame.input_box("q").unwrap().text(), "h");

        update.input_boxes.clear();
        frame.apply_text(&update).unwrap();
        assert!(frame.input_box("q").is_none());
    }

    #[test]
    fn test_overlay_paints_box_text() {
        let mut frame = Frame::new();
        let mut update = text_update(&["a", "b", "c", "d"], &[1, 2, 3, 4]);
        update.input_boxes.insert(
            "q".into(),
            IncomingInputBox {
                id: "q".into(),
                x: 0,
                y: 1,
                width: 2,
                height: 2,
                colour: vec![10, 20, 30],
                ..IncomingInputBox::default()
            },
        );
        frame.apply_text(&update).unwrap();
        frame.input_box_mut("q").unwrap().set_text("h");
        frame.overlay_input_boxes();
        let cell = frame.cells().get(2).unwrap();
        assert_eq!(cell.glyph, "h");
        assert_eq!(cell.fg, Rgb::new(10, 20, 30));

        frame.input_box_mut("q").unwrap().backspace();
        frame.overlay_input_boxes();
        assert_eq!(frame.cells().get(2).unwrap().glyph, "c");
    }

    #[test]
    fn test_deserializes_wire_json() {
        let json = r#"{
            "meta": {"id": 3, "sub_left": 0, "sub_top": 0, "sub_width": 1,
                     "sub_height": 2, "total_width": 1, "total_height": 2},
            "text": ["x"],
            "colours": [1, 2, 3],
            "input_boxes": {"b": {"id": "b", "x": 0, "y": 0, "width": 1,
                     "height": 2, "tag_name": "INPUT", "type": "password",
                     "colour": [0, 0, 0]}}
        }"#;
        let update: FrameText = serde_json::from_str(json).unwrap();
        assert_eq!(update.meta.id, 3);
        assert_eq!(update.input_boxes["b"].kind, "password");
    }
}
