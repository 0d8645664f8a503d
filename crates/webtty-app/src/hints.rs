//! Link hints
//!
//! In link mode every clickable element on screen gets a short label. Typing
//! a label picks the element. Labels are two characters: every pair of hint
//! keys first, then each remaining letter of the alphabet paired with every
//! letter.

use serde::{Deserialize, Serialize};

const ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz";

/// Screen rectangle of a clickable element, relative to the page viewport
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HintRect {
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
    pub width: i64,
    pub height: i64,
    pub href: String,
}

impl HintRect {
    /// Move the label to where it reads best: the vertical middle of tall
    /// elements and a little way into wide ones.
    fn place_label(&mut self) {
        if self.height > 2 {
            if self.height % 2 == 0 {
                self.top += self.height / 2;
            } else {
                self.top += self.height / 2 - 1;
            }
        }
        if self.width > 1 {
            self.left += (self.width / 2 - 1).min(2);
        }
    }
}

/// Result of typing a hint key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HintMatch {
    /// Several labels still start with what was typed
    Pending,
    /// Exactly this element was picked
    Picked(HintRect),
    /// Nothing starts with what was typed
    NoMatch,
}

/// A label to draw at a viewport position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintLabel {
    pub x: i64,
    pub y: i64,
    pub text: String,
}

/// Labels and the rectangles they currently point at
#[derive(Debug, Clone)]
pub struct LinkHints {
    labels: Vec<String>,
    rects: Vec<HintRect>,
    typed: String,
}

impl LinkHints {
    /// Build the label table for the given hint keys
    pub fn new(hint_keys: &str) -> Self {
        let keys: Vec<char> = dedup(hint_keys.chars().map(|c| c.to_ascii_lowercase()));
        let mut labels = Vec::new();
        for first in &keys {
            for second in &keys {
                labels.push(format!("{first}{second}"));
            }
        }
        for first in ALPHABET.chars().filter(|c| !keys.contains(c)) {
            for second in ALPHABET.chars() {
                labels.push(format!("{first}{second}"));
            }
        }
        Self {
            labels,
            rects: Vec::new(),
            typed: String::new(),
        }
    }

    /// Number of labels available
    pub fn capacity(&self) -> usize {
        self.labels.len()
    }

    pub fn is_active(&self) -> bool {
        !self.rects.is_empty()
    }

    pub fn typed(&self) -> &str {
        &self.typed
    }

    /// Take a fresh set of rectangles, in the order received
    pub fn set_rects(&mut self, rects: Vec<HintRect>) {
        if rects.len() > self.labels.len() {
            log::warn!(
                "{} link hints but only {} labels, dropping the rest",
                rects.len(),
                self.labels.len()
            );
        }
        self.rects = rects
            .into_iter()
            .take(self.labels.len())
            .map(|mut r| {
                r.place_label();
                r
            })
            .collect();
        self.typed.clear();
    }

    /// Forget the rectangles and anything typed
    pub fn erase(&mut self) {
        self.rects.clear();
        self.typed.clear();
    }

    /// Narrow the candidates by one more typed key
    pub fn push_key(&mut self, c: char) -> HintMatch {
        self.typed.push(c.to_ascii_lowercase());
        let mut candidates = self.candidates();
        match (candidates.next(), candidates.next()) {
            (None, _) => HintMatch::NoMatch,
            (Some((label, rect)), None) if *label == self.typed => HintMatch::Picked(rect.clone()),
            _ => HintMatch::Pending,
        }
    }

    fn candidates(&self) -> impl Iterator<Item = (&String, &HintRect)> + '_ {
        self.labels
            .iter()
            .zip(&self.rects)
            .filter(|(label, _)| label.starts_with(&self.typed))
    }

    /// Labels to draw, with the typed prefix already removed
    pub fn visible_labels(&self, uppercase: bool) -> Vec<HintLabel> {
        let offset = self.typed.chars().count() as i64;
        self.candidates()
            .map(|(label, rect)| {
                let rest = &label[self.typed.len()..];
                HintLabel {
                    x: rect.left + offset,
                    y: rect.top,
                    text: if uppercase {
                        rest.to_uppercase()
                    } else {
                        rest.to_string()
                    },
                }
            })
            .collect()
    }
}

fn dedup(chars: impl Iterator<Item = char>) -> Vec<char> {
    let mut seen = Vec::new();
    for c in chars {
        if !seen.contains(&c) {
            seen.push(c);
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(left: i64, top: i64, href: &str) -> HintRect {
        HintRect {
            left,
            top,
            right: left + 1,
            bottom: top + 1,
            width: 1,
            height: 1,
            href: href.into(),
        }
    }

    #[test]
    fn test_label_table() {
        let hints = LinkHints::new("asdfwerxcv");
        // 10 * 10 key pairs, then 16 remaining letters * 26
        assert_eq!(hints.capacity(), 100 + 16 * 26);
        assert_eq!(hints.labels[0], "aa");
        assert_eq!(hints.labels[1], "as");
        assert_eq!(hints.labels[99], "vv");
        assert_eq!(hints.labels[100], "ba");
    }

    #[test]
    fn test_unique_label_picks_rect() {
        let mut hints = LinkHints::new("asdfwerxcv");
        hints.set_rects(vec![rect(0, 0, "one"), rect(5, 1, "two"), rect(9, 2, "three")]);
        assert_eq!(hints.push_key('a'), HintMatch::Pending);
        assert_eq!(hints.push_key('s'), HintMatch::Picked(rect(5, 1, "two")));
    }

    #[test]
    fn test_unknown_label() {
        let mut hints = LinkHints::new("asdfwerxcv");
        hints.set_rects(vec![rect(0, 0, "one")]);
        assert_eq!(hints.push_key('q'), HintMatch::NoMatch);
    }

    #[test]
    fn test_visible_labels_drop_typed_prefix() {
        let mut hints = LinkHints::new("asdfwerxcv");
        hints.set_rects(vec![rect(0, 0, "one"), rect(5, 1, "two")]);
        let labels = hints.visible_labels(false);
        assert_eq!(labels[0].text, "aa");
        assert_eq!(hints.visible_labels(true)[1].text, "AS");

        hints.push_key('a');
        let labels = hints.visible_labels(false);
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[1], HintLabel { x: 6, y: 1, text: "s".into() });
    }

    #[test]
    fn test_label_placement() {
        let mut hints = LinkHints::new("asdfwerxcv");
        let tall = HintRect {
            left: 10,
            top: 4,
            width: 20,
            height: 4,
            ..HintRect::default()
        };
        let odd = HintRect {
            top: 4,
            width: 4,
            height: 5,
            ..HintRect::default()
        };
        hints.set_rects(vec![tall, odd]);
        assert_eq!((hints.rects[0].left, hints.rects[0].top), (12, 6));
        assert_eq!((hints.rects[1].left, hints.rects[1].top), (1, 5));
    }

    #[test]
    fn test_erase() {
        let mut hints = LinkHints::new("asdf");
        hints.set_rects(vec![rect(0, 0, "one")]);
        hints.push_key('a');
        hints.erase();
        assert!(!hints.is_active());
        assert!(hints.typed().is_empty());
        assert!(hints.visible_labels(false).is_empty());
    }
}
