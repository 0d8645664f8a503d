//! Vim-style modes
//!
//! Tracks the current mode, the recent keys used to match two-key bindings,
//! and the timed `Wait` mode entered after following a link. Caret movement
//! over the rendered page also lives here.

use std::time::{Duration, Instant};

use webtty_core::Cell;
use webtty_ui::events::{Command, KeyEvent};

use crate::shortcuts::{BindingMode, KeyBindings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VimMode {
    #[default]
    Normal,
    Insert,
    Find,
    LinkMode,
    LinkModeNewTab,
    LinkModeCopy,
    Wait,
    Visual,
    Caret,
    MakeMark,
    GotoMark,
}

impl VimMode {
    /// Short name shown in the status line
    pub fn indicator(self) -> Option<&'static str> {
        match self {
            Self::Normal | Self::Wait => None,
            Self::Insert => Some("ins"),
            Self::Find => Some("/"),
            Self::LinkMode => Some("lnk"),
            Self::LinkModeNewTab => Some("LNK"),
            Self::LinkModeCopy => Some("cp"),
            Self::Visual => Some("vis"),
            Self::Caret => Some("car"),
            Self::MakeMark => Some("mark"),
            Self::GotoMark => Some("goto"),
        }
    }

    /// Binding table consulted in this mode, if keys are looked up at all
    pub fn binding_mode(self) -> Option<BindingMode> {
        match self {
            Self::Normal | Self::Wait => Some(BindingMode::Normal),
            Self::Visual => Some(BindingMode::Visual),
            Self::Caret => Some(BindingMode::Caret),
            _ => None,
        }
    }

    pub fn is_link_mode(self) -> bool {
        matches!(self, Self::LinkMode | Self::LinkModeNewTab | Self::LinkModeCopy)
    }

    /// Modes that show the caret
    pub fn has_caret(self) -> bool {
        matches!(self, Self::Visual | Self::Caret)
    }
}

/// The last unmatched key, kept to complete a two-key binding
#[derive(Debug, Clone, Default)]
struct KeyWindow {
    previous: Option<String>,
}

impl KeyWindow {
    fn lookup(&mut self, bindings: &KeyBindings, mode: BindingMode, key: &KeyEvent) -> Option<Command> {
        let notation = key.notation();
        let pair = self
            .previous
            .take()
            .map(|previous| previous + &notation)
            .and_then(|keys| bindings.lookup(mode, &keys));
        let command = pair.or_else(|| bindings.lookup(mode, &notation));
        if command.is_none() {
            self.previous = Some(notation);
        }
        command
    }

    fn reset(&mut self) {
        self.previous = None;
    }
}

/// Current mode and the state needed to leave it
#[derive(Debug, Clone)]
pub struct Vim {
    mode: VimMode,
    keys: KeyWindow,
    wait_started: Option<Instant>,
    wait_delay: Duration,
}

impl Vim {
    pub fn new(wait_delay: Duration) -> Self {
        Self {
            mode: VimMode::Normal,
            keys: KeyWindow::default(),
            wait_started: None,
            wait_delay,
        }
    }

    pub fn mode(&self) -> VimMode {
        self.mode
    }

    /// Change mode. Pending keys are forgotten when the mode changes.
    pub fn set_mode(&mut self, mode: VimMode) {
        if self.mode == mode {
            return;
        }
        log::debug!("Mode {:?} -> {:?}", self.mode, mode);
        self.mode = mode;
        self.keys.reset();
        if mode != VimMode::Wait {
            self.wait_started = None;
        }
    }

    /// Enter `Wait`; it ends on its own once the delay has passed
    pub fn enter_wait(&mut self, now: Instant) {
        self.set_mode(VimMode::Wait);
        self.wait_started = Some(now);
    }

    /// Leave `Wait` if its delay is over. Returns whether the mode changed.
    pub fn expire_wait(&mut self, now: Instant) -> bool {
        if self.mode != VimMode::Wait {
            return false;
        }
        let over = self
            .wait_started
            .map_or(true, |start| now.saturating_duration_since(start) >= self.wait_delay);
        if over {
            self.set_mode(VimMode::Normal);
        }
        over
    }

    /// Match a key against the bindings of the current mode
    pub fn lookup(&mut self, bindings: &KeyBindings, key: &KeyEvent) -> Option<Command> {
        let mode = self.mode.binding_mode()?;
        self.keys.lookup(bindings, mode, key)
    }
}

/// Direction of a caret move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaretMotion {
    Left,
    Right,
    Up,
    Down,
}

impl CaretMotion {
    fn step(self) -> (isize, isize) {
        match self {
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
            Self::Up => (0, -1),
            Self::Down => (0, 1),
        }
    }
}

/// Move the caret from `start` until it reaches something new.
///
/// Runs of identical cells are skipped, as are the blanks in front of a
/// word, so the caret lands on the next word or the next change of colour.
/// `in_bounds` says whether the caret may keep going from a position.
pub fn walk_caret(
    start: (isize, isize),
    motion: CaretMotion,
    in_bounds: impl Fn(isize, isize) -> bool,
    cell_at: impl Fn(isize, isize) -> Cell,
) -> (isize, isize) {
    let (dx, dy) = motion.step();
    let (mut x, mut y) = start;
    while in_bounds(x, y) {
        let previous = cell_at(x, y);
        x += dx;
        y += dy;
        let next = cell_at(x, y);
        if previous == next {
            continue;
        }
        if in_bounds(x, y) {
            let after = cell_at(x + dx, y + dy);
            if !next.first_char().is_alphabetic() && after.first_char().is_alphabetic() {
                continue;
            }
            if next == after {
                continue;
            }
        }
        break;
    }
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use webtty_core::Rgb;
    use webtty_ui::events::{KeyCode, Modifiers};

    fn row_cell(row: &str) -> impl Fn(isize, isize) -> Cell + '_ {
        move |x, _| {
            let c = usize::try_from(x)
                .ok()
                .and_then(|x| row.chars().nth(x))
                .unwrap_or(' ');
            Cell::new(c.to_string(), Rgb::BLACK, Rgb::WHITE)
        }
    }

    #[test]
    fn test_two_key_bindings() {
        let bindings = KeyBindings::new();
        let mut vim = Vim::new(Duration::from_millis(1000));
        assert_eq!(vim.lookup(&bindings, &KeyEvent::char('g')), None);
        assert_eq!(
            vim.lookup(&bindings, &KeyEvent::char('g')),
            Some(Command::ScrollToTop)
        );
        // A hit clears the window, so a third `g` starts over
        assert_eq!(vim.lookup(&bindings, &KeyEvent::char('g')), None);
        assert_eq!(
            vim.lookup(&bindings, &KeyEvent::char('t')),
            Some(Command::NextTab)
        );
    }

    #[test]
    fn test_single_key_after_unmatched_pair() {
        let bindings = KeyBindings::new();
        let mut vim = Vim::new(Duration::from_millis(1000));
        vim.lookup(&bindings, &KeyEvent::char('g'));
        assert_eq!(
            vim.lookup(&bindings, &KeyEvent::char('j')),
            Some(Command::ScrollDown)
        );
    }

    #[test]
    fn test_mode_change_forgets_keys() {
        let bindings = KeyBindings::new();
        let mut vim = Vim::new(Duration::from_millis(1000));
        vim.lookup(&bindings, &KeyEvent::char('g'));
        vim.set_mode(VimMode::Insert);
        vim.set_mode(VimMode::Normal);
        assert_eq!(vim.lookup(&bindings, &KeyEvent::char('g')), None);
    }

    #[test]
    fn test_no_bindings_outside_binding_modes() {
        let bindings = KeyBindings::new();
        let mut vim = Vim::new(Duration::from_millis(1000));
        vim.set_mode(VimMode::Find);
        assert_eq!(vim.lookup(&bindings, &KeyEvent::char('j')), None);

        vim.set_mode(VimMode::Caret);
        let enter = KeyEvent::new(KeyCode::Enter, Modifiers::empty());
        assert_eq!(
            vim.lookup(&bindings, &enter),
            Some(Command::ClickAtCaretPosition)
        );
    }

    #[test]
    fn test_wait_expires_after_delay() {
        let mut vim = Vim::new(Duration::from_millis(1000));
        let start = Instant::now();
        vim.enter_wait(start);
        assert_eq!(vim.mode(), VimMode::Wait);
        assert!(!vim.expire_wait(start + Duration::from_millis(999)));
        assert_eq!(vim.mode(), VimMode::Wait);
        assert!(vim.expire_wait(start + Duration::from_millis(1000)));
        assert_eq!(vim.mode(), VimMode::Normal);
        assert!(!vim.expire_wait(start + Duration::from_secs(5)));
    }

    #[test]
    fn test_caret_skips_to_next_word() {
        let cells = row_cell("a   bc");
        let end = walk_caret((0, 0), CaretMotion::Right, |x, _| x + 1 < 6, &cells);
        assert_eq!(end, (4, 0));
        let end = walk_caret(end, CaretMotion::Right, |x, _| x + 1 < 6, &cells);
        assert_eq!(end, (5, 0));
    }

    #[test]
    fn test_caret_stops_at_bounds() {
        let cells = row_cell("      ");
        let end = walk_caret((3, 0), CaretMotion::Left, |x, _| x > 0, &cells);
        assert_eq!(end, (0, 0));
    }

    #[test]
    fn test_indicators() {
        assert_eq!(VimMode::Normal.indicator(), None);
        assert_eq!(VimMode::LinkModeNewTab.indicator(), Some("LNK"));
        assert!(VimMode::LinkModeCopy.is_link_mode());
        assert!(VimMode::Visual.has_caret());
    }
}
