//! Terminal cell types
//!
//! A cell is one terminal character position of a rendered page: a glyph
//! plus the two colours it is drawn with. Cells live in a [`CellStore`],
//! keyed by their linear index `y * total_width + x` within the page.

use crate::color::{hatch_colours, Rgb};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Glyph used to draw two stacked pixels in one cell.
///
/// The foreground paints the lower half, the background the upper half.
pub const HALF_BLOCK: &str = "▄";

/// A single character cell of the rendered page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    /// Grapheme to draw; may hold several code points
    pub glyph: String,
    /// Foreground color
    pub fg: Rgb,
    /// Background color
    pub bg: Rgb,
}

impl Cell {
    pub fn new(glyph: impl Into<String>, fg: Rgb, bg: Rgb) -> Self {
        Self {
            glyph: glyph.into(),
            fg,
            bg,
        }
    }

    /// A cell showing two pixels through the half-block glyph
    pub fn pixels(upper: Rgb, lower: Rgb) -> Self {
        Self::new(HALF_BLOCK, lower, upper)
    }

    /// Placeholder for a cell in column `x` that has no data yet
    pub fn hatched(x: usize) -> Self {
        let (fg, bg) = hatch_colours(x);
        Self::new(HALF_BLOCK, fg, bg)
    }

    /// First character of the glyph, or a space for an empty glyph
    pub fn first_char(&self) -> char {
        self.glyph.chars().next().unwrap_or(' ')
    }
}

/// Whether a glyph lets the pixels underneath show through.
pub fn is_transparent(glyph: &str) -> bool {
    glyph.chars().next().map_or(true, char::is_whitespace)
}

/// Thread-safe sparse cell table.
///
/// Writers are the frame update path; readers are render passes. Many
/// readers may proceed at once, a writer excludes everyone.
#[derive(Debug, Default)]
pub struct CellStore {
    cells: RwLock<HashMap<usize, Cell>>,
}

impl CellStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a cell by linear index
    pub fn get(&self, index: usize) -> Option<Cell> {
        self.cells.read().get(&index).cloned()
    }

    /// Store a cell, replacing what was there
    pub fn set(&self, index: usize, cell: Cell) {
        self.cells.write().insert(index, cell);
    }

    /// Drop every cell
    pub fn reset(&self) {
        self.cells.write().clear();
    }

    /// Number of populated cells
    pub fn len(&self) -> usize {
        self.cells.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_set_get_reset() {
        let store = CellStore::new();
        assert!(store.get(3).is_none());

        store.set(3, Cell::new("x", Rgb::WHITE, Rgb::BLACK));
        assert_eq!(store.get(3).map(|c| c.glyph), Some("x".to_string()));
        assert_eq!(store.len(), 1);

        store.reset();
        assert!(store.is_empty());
        assert!(store.get(3).is_none());
    }

    #[test]
    fn test_multi_codepoint_glyph() {
        let cell = Cell::new("e\u{301}", Rgb::WHITE, Rgb::BLACK);
        assert_eq!(cell.first_char(), 'e');
        assert!(!is_transparent(&cell.glyph));
    }

    #[test]
    fn test_transparency() {
        assert!(is_transparent(""));
        assert!(is_transparent(" "));
        assert!(is_transparent("\u{a0}"));
        assert!(!is_transparent("a"));
    }

    #[test]
    fn test_pixels_cell_orientation() {
        let upper = Rgb::new(1, 1, 1);
        let lower = Rgb::new(2, 2, 2);
        let cell = Cell::pixels(upper, lower);
        assert_eq!(cell.glyph, HALF_BLOCK);
        assert_eq!(cell.fg, lower);
        assert_eq!(cell.bg, upper);
    }

    #[test]
    fn test_concurrent_readers_and_writer() {
        let store = Arc::new(CellStore::new());
        let writer = {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..500 {
                    store.set(i, Cell::hatched(i));
                }
            })
        };
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..500 {
                        if let Some(cell) = store.get(i) {
                            assert_eq!(cell, Cell::hatched(i));
                        }
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(store.len(), 500);
    }
}
