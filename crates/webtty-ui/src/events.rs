//! Input events abstraction
//!
//! Defines platform-agnostic input events and the commands keys can be
//! bound to. Events also know how to present themselves to the browser,
//! which expects tcell-style key and button numbers.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Keyboard modifiers
    ///
    /// The bit values are the ones the browser side understands.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT = 1 << 0;
        const CTRL = 1 << 1;
        const ALT = 1 << 2;
        const SUPER = 1 << 3;
    }
}

/// Keyboard key codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A printable character, already shifted
    Char(char),

    /// Function key F1..F12
    F(u8),

    // Navigation
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,

    // Editing
    Insert,
    Delete,
    Backspace,
    Enter,
    Tab,
    BackTab,

    Escape,

    /// Unknown key
    Unknown,
}

/// A key press with its modifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub key: KeyCode,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: KeyCode, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    /// A plain key without modifiers
    pub fn plain(key: KeyCode) -> Self {
        Self::new(key, Modifiers::empty())
    }

    pub fn char(c: char) -> Self {
        Self::plain(KeyCode::Char(c))
    }

    pub fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), Modifiers::CTRL)
    }

    /// Check for a Ctrl+letter chord, ignoring case
    pub fn is_ctrl(&self, c: char) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
            && matches!(self.key, KeyCode::Char(k) if k.eq_ignore_ascii_case(&c))
    }

    /// The character this key types, if it types one
    pub fn typed_char(&self) -> Option<char> {
        match self.key {
            KeyCode::Char(c) if !self.modifiers.intersects(Modifiers::CTRL | Modifiers::ALT) => {
                Some(c)
            }
            _ => None,
        }
    }

    /// Vim-style notation used in key bindings, e.g. `g`, `<C-l>`, `<Enter>`
    pub fn notation(&self) -> String {
        let name = match self.key {
            KeyCode::Char(c) => {
                if self.modifiers.contains(Modifiers::CTRL) {
                    return format!("<C-{}>", c.to_ascii_lowercase());
                }
                if self.modifiers.contains(Modifiers::ALT) {
                    return format!("<M-{c}>");
                }
                return c.to_string();
            }
            KeyCode::F(n) => return format!("<F{n}>"),
            KeyCode::Up => "Up",
            KeyCode::Down => "Down",
            KeyCode::Left => "Left",
            KeyCode::Right => "Right",
            KeyCode::Home => "Home",
            KeyCode::End => "End",
            KeyCode::PageUp => "PageUp",
            KeyCode::PageDown => "PageDown",
            KeyCode::Insert => "Insert",
            KeyCode::Delete => "Del",
            KeyCode::Backspace => "BS",
            KeyCode::Enter => "Enter",
            KeyCode::Tab => "Tab",
            KeyCode::BackTab => "S-Tab",
            KeyCode::Escape => "Esc",
            KeyCode::Unknown => "Unknown",
        };
        format!("<{name}>")
    }

    /// Key number as the browser expects it
    pub fn wire_key(&self) -> u16 {
        match self.key {
            KeyCode::Char(' ') if self.modifiers.contains(Modifiers::CTRL) => 0,
            KeyCode::Char(c) if self.modifiers.contains(Modifiers::CTRL) && c.is_ascii_alphabetic() => {
                (c.to_ascii_lowercase() as u16) - ('a' as u16) + 1
            }
            KeyCode::Char(_) => 256,
            KeyCode::Up => 257,
            KeyCode::Down => 258,
            KeyCode::Right => 259,
            KeyCode::Left => 260,
            KeyCode::PageUp => 266,
            KeyCode::PageDown => 267,
            KeyCode::Home => 268,
            KeyCode::End => 269,
            KeyCode::Insert => 270,
            KeyCode::Delete => 271,
            KeyCode::BackTab => 278,
            KeyCode::F(n) => 278 + u16::from(n),
            KeyCode::Backspace => 127,
            KeyCode::Enter => 13,
            KeyCode::Tab => 9,
            KeyCode::Escape => 27,
            KeyCode::Unknown => 0,
        }
    }

    /// Character as the browser expects it; control keys send their
    /// control character
    pub fn wire_char(&self) -> String {
        let key = self.wire_key();
        match self.key {
            KeyCode::Char(c) if key == 256 => c.to_string(),
            _ if key < 128 => char::from(key as u8).to_string(),
            _ => String::new(),
        }
    }
}

/// Mouse button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

impl MouseButton {
    /// Button number as the browser expects it
    pub fn wire_button(self) -> u16 {
        match self {
            Self::Left => 1,
            Self::Right => 2,
            Self::Middle => 4,
        }
    }
}

/// Scroll direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

/// What the mouse did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseEventKind {
    Press(MouseButton),
    Release(MouseButton),
    Scroll(ScrollDirection),
    Move,
}

/// A mouse event in terminal cell coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseEvent {
    pub kind: MouseEventKind,
    pub x: usize,
    pub y: usize,
    pub modifiers: Modifiers,
}

impl MouseEvent {
    /// Button number as the browser expects it; releases report no button
    pub fn wire_button(&self) -> u16 {
        match self.kind {
            MouseEventKind::Press(button) => button.wire_button(),
            MouseEventKind::Release(_) | MouseEventKind::Move => 0,
            MouseEventKind::Scroll(ScrollDirection::Up) => 1 << 8,
            MouseEventKind::Scroll(ScrollDirection::Down) => 1 << 9,
            MouseEventKind::Scroll(ScrollDirection::Left) => 1 << 10,
            MouseEventKind::Scroll(ScrollDirection::Right) => 1 << 11,
        }
    }
}

/// Input event types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// Key was pressed
    Key(KeyEvent),

    /// Mouse pressed, released, scrolled or moved
    Mouse(MouseEvent),

    /// Terminal resized, in cells
    Resize { width: usize, height: usize },

    /// Bracketed paste
    Paste(String),
}

/// Everything a key binding can trigger
///
/// Names in configuration files are the camelCase variant names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Command {
    // Navigation
    UrlUp,
    UrlRoot,
    HistoryBack,
    HistoryForward,
    Reload,
    #[serde(rename = "editURL")]
    EditUrl,
    #[serde(rename = "editURLInNewTab")]
    EditUrlInNewTab,

    // Scrolling
    ScrollToTop,
    ScrollToBottom,
    ScrollUp,
    ScrollDown,
    ScrollLeft,
    ScrollRight,
    ScrollHalfPageUp,
    ScrollHalfPageDown,

    // Tabs
    FirstTab,
    LastTab,
    PrevTab,
    NextTab,
    PreviouslyVisitedTab,
    NewTab,
    RemoveTab,
    RestoreTab,
    DuplicateTab,
    MoveTabLeft,
    MoveTabRight,

    // Clipboard
    #[serde(rename = "copyURL")]
    CopyUrl,
    #[serde(rename = "openClipboardURL")]
    OpenClipboardUrl,
    #[serde(rename = "openClipboardURLInNewTab")]
    OpenClipboardUrlInNewTab,

    // Page interaction
    FocusFirstTextInput,
    FollowLinkLabeledNext,
    FollowLinkLabeledPrevious,
    ViewHelp,
    OpenLinkInCurrentTab,
    OpenLinkInNewTab,
    #[serde(rename = "copyLinkURL")]
    CopyLinkUrl,

    // Find
    FindMode,
    FindText,
    FindNext,
    FindPrevious,

    // Marks
    MakeMark,
    GotoMark,

    // Modes
    NormalMode,
    InsertMode,
    VisualMode,
    CaretMode,
    SwapVisualModeCursorPosition,
    CopyVisualModeSelection,
    MoveCaretLeft,
    MoveCaretRight,
    MoveCaretUp,
    MoveCaretDown,
    ClickAtCaretPosition,

    // Application
    ToggleUrlBar,
    ToggleMonochrome,
    Quit,
}
