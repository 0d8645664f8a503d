//! Scroll position marks
//!
//! Uppercase marks are global and remember their tab; lowercase marks only
//! exist within the tab they were made in.

use std::collections::HashMap;

/// A remembered place
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mark {
    pub tab_id: i64,
    pub uri: String,
    pub x_scroll: usize,
    pub y_scroll: usize,
}

#[derive(Debug, Default)]
pub struct Marks {
    global: HashMap<char, Mark>,
    local: HashMap<i64, HashMap<char, Mark>>,
}

impl Marks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a mark under `letter`. Returns false for anything but a letter.
    pub fn set(&mut self, letter: char, mark: Mark) -> bool {
        if letter.is_ascii_uppercase() {
            self.global.insert(letter, mark);
        } else if letter.is_ascii_lowercase() {
            self.local.entry(mark.tab_id).or_default().insert(letter, mark);
        } else {
            return false;
        }
        true
    }

    /// Find the mark for `letter` as seen from `current_tab`
    pub fn get(&self, letter: char, current_tab: i64) -> Option<&Mark> {
        if letter.is_ascii_uppercase() {
            self.global.get(&letter)
        } else {
            self.local.get(&current_tab)?.get(&letter)
        }
    }

    /// Point global marks made in tab `from` at tab `to`
    pub fn move_tab(&mut self, from: i64, to: i64) {
        for mark in self.global.values_mut().filter(|m| m.tab_id == from) {
            mark.tab_id = to;
        }
    }

    /// Drop the local marks of a closed tab
    pub fn forget_tab(&mut self, tab_id: i64) {
        self.local.remove(&tab_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mark(tab_id: i64, y_scroll: usize) -> Mark {
        Mark {
            tab_id,
            uri: format!("https://tab{tab_id}"),
            x_scroll: 0,
            y_scroll,
        }
    }

    #[test]
    fn test_local_marks_stay_in_their_tab() {
        let mut marks = Marks::new();
        assert!(marks.set('a', mark(1, 10)));
        assert_eq!(marks.get('a', 1), Some(&mark(1, 10)));
        assert_eq!(marks.get('a', 2), None);
    }

    #[test]
    fn test_global_marks_are_seen_everywhere() {
        let mut marks = Marks::new();
        marks.set('A', mark(1, 10));
        assert_eq!(marks.get('A', 2).map(|m| m.tab_id), Some(1));
        marks.set('A', mark(3, 0));
        assert_eq!(marks.get('A', 1).map(|m| m.tab_id), Some(3));
    }

    #[test]
    fn test_rejects_non_letters() {
        let mut marks = Marks::new();
        assert!(!marks.set('1', mark(1, 0)));
        assert!(marks.get('1', 1).is_none());
    }

    #[test]
    fn test_forget_tab() {
        let mut marks = Marks::new();
        marks.set('a', mark(1, 3));
        marks.set('B', mark(1, 4));
        marks.forget_tab(1);
        assert!(marks.get('a', 1).is_none());
        assert!(marks.get('B', 1).is_some());
    }

    #[test]
    fn test_move_tab() {
        let mut marks = Marks::new();
        marks.set('A', mark(1, 3));
        marks.set('B', mark(2, 4));
        marks.move_tab(1, 7);
        assert_eq!(marks.get('A', 0).map(|m| m.tab_id), Some(7));
        assert_eq!(marks.get('B', 0).map(|m| m.tab_id), Some(2));
    }
}
