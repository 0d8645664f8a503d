//! Key binding management
//!
//! Maps vim-style key sequences (one or two keys, e.g. `j`, `gg`, `<C-d>`)
//! to commands. Each binding belongs to the mode it is active in.

use std::collections::HashMap;

use webtty_ui::events::Command;

use crate::config::KeysConfig;

/// Which set of bindings applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingMode {
    Normal,
    Visual,
    Caret,
}

/// Manages key bindings
#[derive(Debug, Clone)]
pub struct KeyBindings {
    bindings: HashMap<(BindingMode, String), Command>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyBindings {
    /// Create a binding table with the default bindings
    pub fn new() -> Self {
        let mut bindings = Self {
            bindings: HashMap::new(),
        };
        bindings.load_defaults();
        bindings
    }

    /// Load bindings from configuration, over the defaults
    pub fn from_config(config: &KeysConfig) -> Self {
        let mut bindings = Self::new();
        let modes = [
            (BindingMode::Normal, &config.normal),
            (BindingMode::Visual, &config.visual),
            (BindingMode::Caret, &config.caret),
        ];
        for (mode, table) in modes {
            for (keys, command) in table {
                bindings.bind(mode, keys, *command);
            }
        }
        bindings
    }

    fn load_defaults(&mut self) {
        use BindingMode::*;
        use Command::*;

        let normal = [
            ("gg", ScrollToTop),
            ("G", ScrollToBottom),
            ("k", ScrollUp),
            ("j", ScrollDown),
            ("h", ScrollLeft),
            ("l", ScrollRight),
            ("d", ScrollHalfPageDown),
            ("u", ScrollHalfPageUp),
            ("gu", UrlUp),
            ("gU", UrlRoot),
            ("o", EditUrl),
            ("O", EditUrlInNewTab),
            ("H", HistoryBack),
            ("L", HistoryForward),
            ("r", Reload),
            ("g0", FirstTab),
            ("g$", LastTab),
            ("J", PrevTab),
            ("gT", PrevTab),
            ("K", NextTab),
            ("gt", NextTab),
            ("^", PreviouslyVisitedTab),
            ("t", NewTab),
            ("x", RemoveTab),
            ("X", RestoreTab),
            ("yt", DuplicateTab),
            ("<<", MoveTabLeft),
            (">>", MoveTabRight),
            ("yy", CopyUrl),
            ("p", OpenClipboardUrl),
            ("P", OpenClipboardUrlInNewTab),
            ("gi", FocusFirstTextInput),
            ("]]", FollowLinkLabeledNext),
            ("[[", FollowLinkLabeledPrevious),
            ("?", ViewHelp),
            ("f", OpenLinkInCurrentTab),
            ("F", OpenLinkInNewTab),
            ("yf", CopyLinkUrl),
            ("/", FindMode),
            ("n", FindNext),
            ("N", FindPrevious),
            ("m", MakeMark),
            ("`", GotoMark),
            ("'", GotoMark),
            ("i", InsertMode),
            ("v", VisualMode),
            ("c", CaretMode),
        ];
        let visual = [
            ("c", CaretMode),
            ("o", SwapVisualModeCursorPosition),
            ("y", CopyVisualModeSelection),
            ("h", MoveCaretLeft),
            ("l", MoveCaretRight),
            ("k", MoveCaretUp),
            ("j", MoveCaretDown),
        ];
        let caret = [
            ("v", VisualMode),
            ("h", MoveCaretLeft),
            ("l", MoveCaretRight),
            ("k", MoveCaretUp),
            ("j", MoveCaretDown),
            ("<Enter>", ClickAtCaretPosition),
        ];

        for (keys, command) in normal {
            self.bind(Normal, keys, command);
        }
        for (keys, command) in visual {
            self.bind(Visual, keys, command);
        }
        for (keys, command) in caret {
            self.bind(Caret, keys, command);
        }
    }

    /// Bind a key sequence to a command
    pub fn bind(&mut self, mode: BindingMode, keys: &str, command: Command) {
        self.bindings.insert((mode, keys.to_string()), command);
    }

    /// Remove a binding
    pub fn unbind(&mut self, mode: BindingMode, keys: &str) {
        self.bindings.remove(&(mode, keys.to_string()));
    }

    /// Look up the command for a key sequence
    pub fn lookup(&self, mode: BindingMode, keys: &str) -> Option<Command> {
        self.bindings.get(&(mode, keys.to_string())).copied()
    }

    /// All bindings of a mode, sorted by key sequence
    pub fn list(&self, mode: BindingMode) -> Vec<(&str, Command)> {
        let mut list: Vec<_> = self
            .bindings
            .iter()
            .filter(|((m, _), _)| *m == mode)
            .map(|((_, keys), command)| (keys.as_str(), *command))
            .collect();
        list.sort_by(|a, b| a.0.cmp(b.0));
        list
    }
}
