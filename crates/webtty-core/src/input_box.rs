//! Editable text inputs mirrored from the page
//!
//! The page's text inputs (and the URL bar) are edited locally: the browser
//! only learns the resulting text. A box is either single-line, scrolled
//! horizontally, or multi-line, laid out with [`crate::wrap`] and scrolled a
//! line at a time.

use crate::color::Rgb;
use crate::wrap::{wrap, Wrapped};
use std::ops::Range;

/// Shown instead of each hidden character of a password box
pub const PASSWORD_MASK: char = '●';

/// An editable text box
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputBox {
    pub id: String,
    /// Left edge, in page columns
    pub x: usize,
    /// Top edge, in page rows
    pub y: usize,
    pub width: usize,
    pub height: usize,
    /// Element tag, e.g. `INPUT` or `TEXTAREA`
    pub tag_name: String,
    /// The element's type attribute, e.g. `text` or `password`
    pub kind: String,
    /// Text colour
    pub fg: Rgb,
    text: Vec<char>,
    text_cursor: usize,
    x_cursor: usize,
    y_cursor: usize,
    x_scroll: usize,
    y_scroll: usize,
    selection: Option<Range<usize>>,
}

impl InputBox {
    pub fn new(id: impl Into<String>, width: usize, height: usize) -> Self {
        Self {
            id: id.into(),
            x: 0,
            y: 0,
            width: width.max(1),
            height: height.max(1),
            tag_name: String::from("INPUT"),
            kind: String::from("text"),
            fg: Rgb::WHITE,
            text: Vec::new(),
            text_cursor: 0,
            x_cursor: 0,
            y_cursor: 0,
            x_scroll: 0,
            y_scroll: 0,
            selection: None,
        }
    }

    pub fn is_multi_line(&self) -> bool {
        self.tag_name.eq_ignore_ascii_case("textarea") || self.kind == "textbox"
    }

    pub fn is_password(&self) -> bool {
        self.kind == "password"
    }

    pub fn text(&self) -> String {
        self.text.iter().collect()
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn text_cursor(&self) -> usize {
        self.text_cursor
    }

    pub fn x_scroll(&self) -> usize {
        self.x_scroll
    }

    pub fn y_scroll(&self) -> usize {
        self.y_scroll
    }

    pub fn selection(&self) -> Option<Range<usize>> {
        self.selection.clone()
    }

    /// Replace the text and put the cursor after it.
    pub fn set_text(&mut self, text: &str) {
        self.text = text.chars().collect();
        self.selection = None;
        self.text_cursor = self.text.len();
        self.update_cursors();
    }

    /// Change the box size, keeping text and cursor.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.x_scroll = 0;
        self.y_scroll = 0;
        self.update_cursors();
    }

    pub fn select_all(&mut self) {
        self.selection = (!self.text.is_empty()).then(|| 0..self.text.len());
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Delete the selected text. Returns whether the text changed.
    pub fn delete_selection(&mut self) -> bool {
        let Some(range) = self.selection.take() else {
            return false;
        };
        let start = range.start.min(self.text.len());
        let end = range.end.min(self.text.len());
        if start >= end {
            return false;
        }
        self.text.drain(start..end);
        self.text_cursor = start;
        self.update_cursors();
        true
    }

    /// Insert a character at the cursor, replacing any selection.
    pub fn insert(&mut self, c: char) -> bool {
        self.delete_selection();
        self.text.insert(self.text_cursor, c);
        self.text_cursor += 1;
        self.update_cursors();
        true
    }

    /// Insert a line break. Only multi-line boxes take one.
    pub fn newline(&mut self) -> bool {
        if !self.is_multi_line() {
            return false;
        }
        self.insert('\n')
    }

    /// Remove the character before the cursor, or the selection.
    pub fn backspace(&mut self) -> bool {
        if self.delete_selection() {
            return true;
        }
        if self.text_cursor == 0 {
            return false;
        }
        self.text_cursor -= 1;
        self.text.remove(self.text_cursor);
        self.update_cursors();
        true
    }

    pub fn cursor_left(&mut self) {
        self.selection = None;
        self.text_cursor = self.text_cursor.saturating_sub(1);
        self.update_cursors();
    }

    pub fn cursor_right(&mut self) {
        self.selection = None;
        self.text_cursor += 1;
        self.update_cursors();
    }

    pub fn cursor_up(&mut self) {
        self.move_lines(-1);
    }

    pub fn cursor_down(&mut self) {
        self.move_lines(1);
    }

    pub fn cursor_home(&mut self) {
        self.selection = None;
        self.text_cursor = 0;
        self.update_cursors();
    }

    pub fn cursor_end(&mut self) {
        self.selection = None;
        self.text_cursor = self.text.len();
        self.update_cursors();
    }

    fn move_lines(&mut self, delta: isize) {
        if !self.is_multi_line() {
            return;
        }
        self.selection = None;
        self.text_cursor = self.wrapped().move_vertically(self.text_cursor, delta);
        self.update_cursors();
    }

    fn wrapped(&self) -> Wrapped {
        wrap(&self.text(), self.width)
    }

    /// Cursor position relative to the box's top-left corner
    pub fn cursor_in_box(&self) -> (usize, usize) {
        if self.is_multi_line() {
            (self.x_cursor, self.y_cursor.saturating_sub(self.y_scroll))
        } else {
            (self.text_cursor.saturating_sub(self.x_scroll), 0)
        }
    }

    /// The rows of text currently visible inside the box.
    pub fn visible_lines(&self) -> Vec<String> {
        if self.is_multi_line() {
            let wrapped = self.wrapped();
            return wrapped
                .lines()
                .iter()
                .skip(self.y_scroll)
                .take(self.height)
                .cloned()
                .collect();
        }
        let line = self
            .display_chars()
            .skip(self.x_scroll)
            .take(self.width)
            .collect();
        vec![line]
    }

    /// Columns of a single-line box covered by the selection.
    pub fn selected_columns(&self) -> Option<Range<usize>> {
        if self.is_multi_line() {
            return None;
        }
        let range = self.selection.as_ref()?;
        let start = range.start.max(self.x_scroll) - self.x_scroll;
        let end = range.end.min(self.x_scroll + self.width).checked_sub(self.x_scroll)?;
        (start < end).then_some(start..end)
    }

    fn display_chars(&self) -> impl Iterator<Item = char> + '_ {
        let password = self.is_password();
        let cursor = self.text_cursor;
        self.text
            .iter()
            .enumerate()
            .map(move |(i, &c)| {
                if password && i != cursor {
                    PASSWORD_MASK
                } else {
                    c
                }
            })
            .chain(std::iter::once(' '))
    }

    fn update_cursors(&mut self) {
        self.limit_text_cursor();
        self.update_xy();
        self.scroll_while(
            |b| b.is_cursor_over_left_edge() || !b.is_best_fit(),
            |b| b.x_scroll_by(-1),
        );
        self.scroll_while(Self::is_cursor_over_top_edge, |b| b.y_scroll_by(-1));
        self.scroll_while(Self::is_cursor_over_right_edge, |b| b.x_scroll_by(1));
        self.scroll_while(Self::is_cursor_over_bottom_edge, |b| b.y_scroll_by(1));
        self.limit_scroll();
        self.update_xy();
    }

    /// Step the scroll until the edge condition clears or nothing moves.
    fn scroll_while(&mut self, edge: fn(&Self) -> bool, step: fn(&mut Self)) {
        while edge(self) {
            let before = (self.x_scroll, self.y_scroll);
            step(self);
            if before == (self.x_scroll, self.y_scroll) {
                break;
            }
        }
    }

    fn limit_text_cursor(&mut self) {
        self.text_cursor = self.text_cursor.min(self.text.len());
    }

    fn update_xy(&mut self) {
        if self.is_multi_line() {
            let (x, y) = self.wrapped().cursor_to_visual(self.text_cursor);
            self.x_cursor = x;
            self.y_cursor = y;
        } else {
            self.x_cursor = self.text_cursor;
            self.y_cursor = 0;
        }
    }

    fn relative_cursor(&self) -> i64 {
        self.text_cursor as i64 - self.x_scroll as i64
    }

    fn is_best_fit(&self) -> bool {
        self.text.len() as i64 - self.x_scroll as i64 >= self.width as i64
    }

    fn is_cursor_over_left_edge(&self) -> bool {
        self.relative_cursor() < 0
    }

    fn is_cursor_over_right_edge(&self) -> bool {
        self.relative_cursor() >= self.width as i64
    }

    fn is_cursor_over_top_edge(&self) -> bool {
        self.y_cursor < self.y_scroll
    }

    fn is_cursor_over_bottom_edge(&self) -> bool {
        self.y_cursor >= self.y_scroll + self.height
    }

    fn is_cursor_at_edge(&self, box_width: i64) -> bool {
        let relative = self.relative_cursor();
        relative < 0 || relative >= box_width
    }

    fn x_scroll_by(&mut self, magnitude: i64) {
        if !self.is_multi_line() {
            let mut text_width = self.text.len() as i64;
            let mut box_width = self.width as i64;
            // Scrolling back reveals the trailing cursor slot, so detect
            // the edge a little earlier
            if magnitude < 0 {
                text_width += 1;
                box_width -= 2;
            }
            let overflowing = text_width >= self.width as i64;
            if overflowing && (self.is_cursor_at_edge(box_width) || !self.is_best_fit()) {
                self.x_scroll = self.x_scroll.saturating_add_signed(magnitude as isize);
            }
        }
        self.limit_scroll();
    }

    fn y_scroll_by(&mut self, magnitude: isize) {
        self.y_scroll = self.y_scroll.saturating_add_signed(magnitude);
        self.limit_scroll();
    }

    fn limit_scroll(&mut self) {
        self.x_scroll = self.x_scroll.min(self.text.len());
        if self.is_multi_line() {
            let last_line = self.wrapped().line_count().saturating_sub(1);
            self.y_scroll = self.y_scroll.min(last_line);
        } else {
            self.y_scroll = 0;
        }
    }
}
