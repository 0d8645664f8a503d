//! Word wrapping for multi-line input boxes
//!
//! Text is filled greedily, one "wordish" (a run of non-whitespace) at a
//! time. A line is broken when the next wordish would reach the box width;
//! a wordish as long as the whole width is cut across lines. Newlines typed
//! by the user force a break and are remembered, because the linear text
//! cursor has to step over them while algorithmic breaks consume nothing.
//!
//! Lines keep their trailing whitespace, and the last line always ends with
//! one extra space that stands for the end-of-text cursor slot.

use std::collections::BTreeSet;

/// The result of wrapping a text to a width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wrapped {
    lines: Vec<String>,
    user_breaks: BTreeSet<usize>,
}

/// Wrap `text` so that no line is wider than `width` code points.
pub fn wrap(text: &str, width: usize) -> Wrapped {
    Wrapper::new(width.max(1)).run(text)
}

fn is_line_break(c: char) -> bool {
    c == '\n' || c == '\r'
}

struct Wrapper {
    width: usize,
    lines: Vec<String>,
    user_breaks: BTreeSet<usize>,
    line: String,
    line_len: usize,
    wordish: String,
    wordish_len: usize,
    previous: Option<char>,
    current: Option<char>,
}

impl Wrapper {
    fn new(width: usize) -> Self {
        Self {
            width,
            lines: Vec::new(),
            user_breaks: BTreeSet::new(),
            line: String::new(),
            line_len: 0,
            wordish: String::new(),
            wordish_len: 0,
            previous: None,
            current: None,
        }
    }

    fn run(mut self, text: &str) -> Wrapped {
        for c in text.chars().chain(std::iter::once(' ')) {
            self.previous = self.current;
            self.current = Some(c);
            if self.is_natural_word_ending() || self.is_projected_line_full() {
                self.add_wordish();
            }
            if c.is_whitespace() {
                self.add_whitespace(c);
            } else {
                self.wordish.push(c);
                self.wordish_len += 1;
            }
        }
        self.lines.push(std::mem::take(&mut self.line));
        Wrapped {
            lines: self.lines,
            user_breaks: self.user_breaks,
        }
    }

    fn is_natural_word_ending(&self) -> bool {
        let previous_is_space = self.previous.map_or(true, char::is_whitespace);
        let current_is_space = self.current.is_some_and(char::is_whitespace);
        !previous_is_space && current_is_space
    }

    fn is_projected_line_full(&self) -> bool {
        self.line_len + self.wordish_len >= self.width
    }

    fn add_wordish(&mut self) {
        if !self.is_projected_line_full() {
            self.flush_wordish();
            return;
        }
        if self.wordish_len == self.width {
            // Word fills the whole line on its own: cut it here
            self.flush_wordish();
            self.add_line();
        } else {
            self.add_line();
            if self.is_natural_word_ending() {
                self.flush_wordish();
            }
        }
    }

    fn add_whitespace(&mut self, c: char) {
        if is_line_break(c) {
            self.add_line();
            self.user_breaks.insert(self.lines.len() - 1);
        } else {
            self.line.push(c);
            self.line_len += 1;
        }
    }

    fn flush_wordish(&mut self) {
        self.line.push_str(&self.wordish);
        self.line_len += self.wordish_len;
        self.wordish.clear();
        self.wordish_len = 0;
    }

    fn add_line(&mut self) {
        self.lines.push(std::mem::take(&mut self.line));
        self.line_len = 0;
    }
}

impl Wrapped {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Length of a line in code points
    pub fn line_len(&self, line: usize) -> usize {
        self.lines.get(line).map_or(0, |l| l.chars().count())
    }

    /// Whether the line was ended by a newline the user typed
    pub fn is_user_break(&self, line: usize) -> bool {
        self.user_breaks.contains(&line)
    }

    /// Map a linear text cursor to a `(column, line)` position.
    ///
    /// A cursor sitting exactly on an algorithmic break is shown at the start
    /// of the following line.
    pub fn cursor_to_visual(&self, cursor: usize) -> (usize, usize) {
        let mut found = (0, 0);
        let mut index = 0;
        for (y, line) in self.lines.iter().enumerate() {
            let slots = line.chars().count() + 1;
            if (index..index + slots).contains(&cursor) {
                found = (cursor - index, y);
            }
            index += slots;
            if !self.is_user_break(y) {
                index -= 1;
            }
        }
        found
    }

    /// Map a `(column, line)` position back to a linear text cursor.
    pub fn visual_to_cursor(&self, x: usize, y: usize) -> usize {
        let before: usize = (0..y.min(self.lines.len()))
            .map(|line| self.line_len(line) + usize::from(self.is_user_break(line)))
            .sum();
        before + x
    }

    /// Move the cursor up or down by whole lines, keeping the column when the
    /// target line is long enough and snapping to its end otherwise.
    ///
    /// Returns the new linear cursor.
    pub fn move_vertically(&self, cursor: usize, delta: isize) -> usize {
        if self.lines.is_empty() {
            return cursor;
        }
        let (mut x, y) = self.cursor_to_visual(cursor);
        let last = self.lines.len() - 1;
        let y = y.saturating_add_signed(delta).min(last);
        let len = self.line_len(y);
        if x + 1 > len {
            x = len;
            if !self.is_user_break(y) {
                x = x.saturating_sub(1);
            }
        }
        self.visual_to_cursor(x, y)
    }

    /// Rebuild the text the lines were wrapped from.
    pub fn unwrap_text(&self) -> String {
        let mut text = String::new();
        for (y, line) in self.lines.iter().enumerate() {
            text.push_str(line);
            if self.is_user_break(y) {
                text.push('\n');
            }
        }
        // Drop the end-of-text slot
        text.pop();
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str, width: usize) -> Vec<String> {
        wrap(text, width).lines().to_vec()
    }

    #[test]
    fn test_wraps_short_words() {
        assert_eq!(lines("a ab 12 qw 34", 3), ["a ", "ab ", "12 ", "qw ", "34 "]);
    }

    #[test]
    fn test_cuts_words_as_long_as_the_line() {
        assert_eq!(
            lines("a looooong 12 qw 34", 3),
            ["a ", "loo", "ooo", "ng ", "12 ", "qw ", "34 "]
        );
    }

    #[test]
    fn test_wraps_a_sentence() {
        assert_eq!(
            lines(
                "some words to make a long sentence with many words on each line",
                20
            ),
            [
                "some words to make ",
                "a long sentence ",
                "with many words on ",
                "each line "
            ]
        );
    }

    #[test]
    fn test_user_breaks_are_recorded() {
        let wrapped = wrap("ab\ncd", 10);
        assert_eq!(wrapped.lines(), ["ab", "cd "]);
        assert!(wrapped.is_user_break(0));
        assert!(!wrapped.is_user_break(1));
    }

    #[test]
    fn test_runs_of_spaces_at_a_break() {
        assert_eq!(lines("ab   cd", 3), ["ab ", "  ", "cd "]);
    }

    #[test]
    fn test_empty_text() {
        let wrapped = wrap("", 5);
        assert_eq!(wrapped.lines(), [" "]);
        assert_eq!(wrapped.cursor_to_visual(0), (0, 0));
    }

    #[test]
    fn test_cursor_moves_down_keeping_column() {
        let text = "some words !o make a long sent+nce with many words on each line ";
        let wrapped = wrap(text, 20);
        let cursor = wrapped.move_vertically(11, 1);
        assert_eq!(cursor, 30);
        assert_eq!(wrapped.cursor_to_visual(cursor), (11, 1));
    }

    #[test]
    fn test_cursor_snaps_to_end_of_shorter_line() {
        let text = "some words !o make a long sent+nce with many words on each line ";
        let wrapped = wrap(text, 20);
        let cursor = wrapped.move_vertically(47, 1);
        assert_eq!(cursor, 64);
        assert_eq!(wrapped.cursor_to_visual(cursor), (10, 3));
    }

    #[test]
    fn test_cursor_crosses_user_break() {
        let text = "some words !o make a long \nsent+nce with many words on each line";
        let wrapped = wrap(text, 20);
        assert_eq!(wrapped.lines()[1], "a long ");
        assert!(wrapped.is_user_break(1));

        assert_eq!(wrapped.move_vertically(45, 1), 64);
        assert_eq!(wrapped.move_vertically(31, -1), 23);
        // Snaps onto the newline slot of a user-broken line
        assert_eq!(wrapped.move_vertically(40, -1), 26);
    }

    #[test]
    fn test_vertical_moves_clamp_to_first_and_last_line() {
        let wrapped = wrap("a ab 12", 3);
        assert_eq!(wrapped.move_vertically(1, -4), 1);
        let last_line = wrapped.line_count() - 1;
        let (_, y) = wrapped.cursor_to_visual(wrapped.move_vertically(0, 10));
        assert_eq!(y, last_line);
    }

    #[test]
    fn test_visual_round_trip() {
        let texts = [
            "a ab 12 qw 34",
            "a looooong 12 qw 34",
            "first\nsecond line that wraps\n\nlast",
            "ab   cd",
        ];
        for text in texts {
            let wrapped = wrap(text, 6);
            for cursor in 0..=text.chars().count() {
                let (x, y) = wrapped.cursor_to_visual(cursor);
                assert_eq!(wrapped.visual_to_cursor(x, y), cursor, "{text:?} @ {cursor}");
            }
        }
    }

    #[test]
    fn test_rewrap_is_idempotent() {
        let texts = [
            "a looooong 12 qw 34",
            "some words to make a long sentence with many words on each line",
            "one\ntwo  three\r\nfour",
        ];
        for text in texts {
            let once = wrap(text, 7);
            let twice = wrap(&once.unwrap_text(), 7);
            assert_eq!(once, twice, "{text:?}");
        }
    }

    #[test]
    fn test_unwrap_restores_text() {
        let text = "first\nsecond line that wraps";
        assert_eq!(wrap(text, 6).unwrap_text(), text);
    }
}
