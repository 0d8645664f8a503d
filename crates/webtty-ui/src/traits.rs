//! UI abstraction traits
//!
//! These traits define what the session needs from a front-end: somewhere
//! to draw cells and a clipboard. In-memory implementations are provided for
//! headless use and tests.

use webtty_core::Rgb;

/// How a cell is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Style {
    /// Foreground, or the terminal default
    pub fg: Option<Rgb>,
    /// Background, or the terminal default
    pub bg: Option<Rgb>,
    /// Swap foreground and background
    pub reverse: bool,
}

impl Style {
    pub fn colours(fg: Rgb, bg: Rgb) -> Self {
        Self {
            fg: Some(fg),
            bg: Some(bg),
            reverse: false,
        }
    }

    pub fn reversed() -> Self {
        Self {
            reverse: true,
            ..Self::default()
        }
    }
}

/// A grid of character cells that can be drawn on
pub trait Surface {
    /// Size in cells as `(columns, rows)`
    fn size(&self) -> (usize, usize);

    /// Blank every cell
    fn clear(&mut self);

    /// Draw one glyph. Positions outside the surface are ignored.
    fn put(&mut self, x: usize, y: usize, glyph: &str, style: Style);

    /// Toggle reverse video on an already drawn cell
    fn reverse(&mut self, x: usize, y: usize);

    /// Make everything drawn since the last call visible
    fn present(&mut self) -> std::io::Result<()>;

    /// Draw a string one character per cell, returning the columns used
    fn put_str(&mut self, x: usize, y: usize, text: &str, style: Style) -> usize {
        let width = self.size().0;
        let mut used = 0;
        for (i, c) in text.chars().enumerate() {
            if x + i >= width {
                break;
            }
            let mut buf = [0u8; 4];
            self.put(x + i, y, c.encode_utf8(&mut buf), style);
            used += 1;
        }
        used
    }
}

/// A surface kept in memory
#[derive(Debug, Clone)]
pub struct MemorySurface {
    width: usize,
    height: usize,
    cells: Vec<(String, Style)>,
}

impl MemorySurface {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![(String::from(" "), Style::default()); width * height],
        }
    }

    /// Change the size, blanking the contents
    pub fn resize(&mut self, width: usize, height: usize) {
        *self = Self::new(width, height);
    }

    pub fn glyph(&self, x: usize, y: usize) -> Option<&str> {
        self.index(x, y).map(|i| self.cells[i].0.as_str())
    }

    pub fn style(&self, x: usize, y: usize) -> Option<Style> {
        self.index(x, y).map(|i| self.cells[i].1)
    }

    /// One row as a string
    pub fn row_text(&self, y: usize) -> String {
        (0..self.width)
            .filter_map(|x| self.glyph(x, y))
            .collect()
    }

    fn index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }
}

impl Surface for MemorySurface {
    fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        for cell in &mut self.cells {
            *cell = (String::from(" "), Style::default());
        }
    }

    fn put(&mut self, x: usize, y: usize, glyph: &str, style: Style) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = (glyph.to_string(), style);
        }
    }

    fn reverse(&mut self, x: usize, y: usize) {
        if let Some(i) = self.index(x, y) {
            self.cells[i].1.reverse = !self.cells[i].1.reverse;
        }
    }

    fn present(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Clipboard operations
pub trait Clipboard {
    /// Get text from clipboard
    fn get_text(&mut self) -> Option<String>;

    /// Set text to clipboard
    fn set_text(&mut self, text: &str);
}

/// A process-local clipboard
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    text: Option<String>,
}

impl Clipboard for MemoryClipboard {
    fn get_text(&mut self) -> Option<String> {
        self.text.clone()
    }

    fn set_text(&mut self, text: &str) {
        self.text = Some(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_put_str_clips_to_width() {
        let mut surface = MemorySurface::new(4, 2);
        let used = surface.put_str(1, 0, "hello", Style::default());
        assert_eq!(used, 3);
        assert_eq!(surface.row_text(0), " hel");
        assert_eq!(surface.row_text(1), "    ");
    }

    #[test]
    fn test_out_of_bounds_is_ignored() {
        let mut surface = MemorySurface::new(2, 2);
        surface.put(5, 5, "x", Style::default());
        surface.reverse(9, 0);
        assert!(surface.glyph(5, 5).is_none());
    }

    #[test]
    fn test_reverse_toggles() {
        let mut surface = MemorySurface::new(2, 1);
        surface.put(0, 0, "a", Style::colours(Rgb::WHITE, Rgb::BLACK));
        surface.reverse(0, 0);
        assert!(surface.style(0, 0).unwrap().reverse);
        surface.reverse(0, 0);
        assert!(!surface.style(0, 0).unwrap().reverse);
    }

    #[test]
    fn test_memory_clipboard() {
        let mut clipboard = MemoryClipboard::default();
        assert!(clipboard.get_text().is_none());
        clipboard.set_text("https://example.com");
        assert_eq!(clipboard.get_text().as_deref(), Some("https://example.com"));
    }
}
