//! The browsing session
//!
//! `Browser` owns everything the terminal client knows: the tabs and their
//! frames, the URL bar, the current vim mode, marks, link hints and the
//! queue of messages for the browser. Input events and browser messages are
//! applied one at a time by the session loop, which then calls
//! [`Browser::render`].

mod commands;
mod render;

use std::time::Instant;

use webtty_core::{Cell, FramePixels, FrameText, InputBox};
use webtty_ui::events::{
    InputEvent, KeyCode, KeyEvent, Modifiers, MouseButton, MouseEvent, MouseEventKind,
    ScrollDirection,
};
use webtty_ui::traits::Clipboard;

use crate::config::Config;
use crate::hints::{HintMatch, HintRect, LinkHints};
use crate::marks::{Mark, Marks};
use crate::protocol::{Incoming, Outbox, Outgoing, TabCommand};
use crate::session::{Removal, TabManager, PROVISIONAL_TAB_ID};
use crate::shortcuts::KeyBindings;
use crate::vim::{walk_caret, CaretMotion, Vim, VimMode};

/// Rows above the page: the tab bar and the URL bar
pub const UI_HEIGHT: usize = 2;

/// Opened by F1
pub const HELP_URL: &str = "https://www.brow.sh/docs/introduction/";

/// Opened by the help command
pub const KEYBINDINGS_URL: &str = "https://www.brow.sh/docs/keybindings/";

/// Which text input receives typed keys
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ActiveInput {
    #[default]
    None,
    UrlBar,
    /// An input box of a page, looked up through its tab
    Page { tab_id: i64, box_id: String },
}

/// Scroll position of a mark whose tab is being reopened by the browser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingScroll {
    /// Id of the closed tab the mark was made in
    from_tab: i64,
    /// The reopened tab, once the browser has announced it
    tab_id: Option<i64>,
    x: usize,
    y: usize,
}

pub struct Browser {
    tabs: TabManager,
    url_bar: InputBox,
    active_input: ActiveInput,
    vim: Vim,
    bindings: KeyBindings,
    marks: Marks,
    hints: LinkHints,
    outbox: Outbox,
    clipboard: Box<dyn Clipboard + Send>,
    width: usize,
    height: usize,
    monochrome: bool,
    find_text: String,
    caret: (usize, usize),
    visual_anchor: (usize, usize),
    status: Option<String>,
    pending_scroll: Option<PendingScroll>,
    startup_url: String,
    extension_config: String,
    quit: bool,
}

impl Browser {
    /// Create a session for a terminal of `size` columns and rows
    pub fn new(
        config: &Config,
        outbox: Outbox,
        clipboard: Box<dyn Clipboard + Send>,
        size: (usize, usize),
    ) -> Self {
        let (width, height) = size;
        let extension_config = serde_json::to_string(config).unwrap_or_else(|e| {
            log::warn!("Failed to encode config for the browser: {}", e);
            String::from("{}")
        });
        Self {
            tabs: TabManager::new(),
            url_bar: InputBox::new("url_bar", width, 1),
            active_input: ActiveInput::None,
            vim: Vim::new(config.tty.wait_mode_delay()),
            bindings: KeyBindings::from_config(&config.keys),
            marks: Marks::new(),
            hints: LinkHints::new(&config.tty.link_hint_keys),
            outbox,
            clipboard,
            width,
            height,
            monochrome: config.tty.monochrome,
            find_text: String::new(),
            caret: (width / 2, height / 2),
            visual_anchor: (width / 2, height / 2),
            status: None,
            pending_scroll: None,
            startup_url: config.browser.startup_url.clone(),
            extension_config,
            quit: false,
        }
    }

    pub fn tabs(&self) -> &TabManager {
        &self.tabs
    }

    pub fn mode(&self) -> VimMode {
        self.vim.mode()
    }

    pub fn active_input(&self) -> &ActiveInput {
        &self.active_input
    }

    pub fn url_bar(&self) -> &InputBox {
        &self.url_bar
    }

    pub fn is_monochrome(&self) -> bool {
        self.monochrome
    }

    pub fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    /// Caret position in screen cells
    pub fn caret(&self) -> (usize, usize) {
        self.caret
    }

    pub fn find_text(&self) -> &str {
        &self.find_text
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn quit(&mut self) {
        self.quit = true;
    }

    /// Show a message in the status line instead of the page's own
    pub fn set_status(&mut self, status: Option<String>) {
        self.status = status;
    }

    /// Show `text` in the status line and pass it on to the browser
    pub fn announce(&mut self, text: String) {
        self.outbox.send(Outgoing::Status(text.clone()));
        self.status = Some(text);
    }

    /// Text for the status line
    pub fn status(&self) -> &str {
        match &self.status {
            Some(status) => status,
            None => self
                .tabs
                .current()
                .map_or("", |tab| tab.status_message.as_str()),
        }
    }

    /// Send the startup messages to a freshly connected browser
    pub fn on_connected(&mut self) {
        log::info!("Browser connected");
        self.outbox.send(Outgoing::Config(self.extension_config.clone()));
        self.send_tty_size();
        if self.tabs.is_empty() {
            self.outbox.send(Outgoing::NewTab(self.startup_url.clone()));
        }
    }

    /// Advance timers. Returns whether anything visible changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.vim.expire_wait(now)
    }

    /// Apply a message from the browser
    pub fn handle_message(&mut self, message: Incoming) {
        match message {
            Incoming::FrameText(update) => self.apply_frame_text(&update),
            Incoming::FramePixels(update) => self.apply_frame_pixels(&update),
            Incoming::TabState(state) => {
                let is_new = !self.tabs.contains(state.id) && !self.tabs.is_deleted(state.id);
                self.tabs.apply_tab_state(&state);
                if is_new {
                    self.claim_pending_scroll(state.id);
                }
                self.prune_active_input();
            }
            Incoming::LinkHints(rects) => {
                if self.vim.mode().is_link_mode() {
                    self.hints.set_rects(rects);
                } else {
                    log::debug!("Link hints arrived outside link mode");
                }
            }
            Incoming::Screenshot(_) | Incoming::RawText(_) => {
                log::debug!("Message for the front-end reached the session");
            }
            Incoming::Other { command, payload } => {
                log::info!("Ignoring /{}: {:.80}", command, payload);
            }
        }
    }

    fn apply_frame_text(&mut self, update: &FrameText) {
        let id = update.meta.id;
        if self.tabs.is_deleted(id) {
            return;
        }
        self.tabs.ensure_exists(id);
        let (width, height) = self.page_viewport();
        if let Some(tab) = self.tabs.get_mut(id) {
            match tab.frame.apply_text(update) {
                Ok(()) => tab.frame.limit_scroll(width, height),
                Err(e) => log::debug!("Skipping text frame for tab {}: {}", id, e),
            }
        }
        self.prune_active_input();
        self.apply_pending_scroll(id);
    }

    fn apply_frame_pixels(&mut self, update: &FramePixels) {
        let id = update.meta.id;
        if self.tabs.is_deleted(id) {
            return;
        }
        self.tabs.ensure_exists(id);
        if let Some(tab) = self.tabs.get_mut(id) {
            if let Err(e) = tab.frame.apply_pixels(update) {
                log::debug!("Skipping pixel frame for tab {}: {}", id, e);
            }
        }
    }

    /// Apply a terminal event
    pub fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::Key(key) => self.handle_key(key, Instant::now()),
            InputEvent::Mouse(mouse) => self.handle_mouse(mouse),
            InputEvent::Resize { width, height } => self.resize(width, height),
            InputEvent::Paste(text) => self.handle_paste(&text),
        }
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        if key.is_ctrl('q') {
            self.quit = true;
            return;
        }
        if self.tabs.current().is_none() {
            return;
        }
        if key.is_ctrl('l') {
            self.toggle_url_bar();
            return;
        }
        if key.is_ctrl('t') {
            self.new_tab("");
            return;
        }
        if key.is_ctrl('w') {
            self.remove_current_tab();
            return;
        }
        if key.modifiers == Modifiers::ALT && key.key == KeyCode::Char('m') {
            self.monochrome = !self.monochrome;
            return;
        }
        if key == KeyEvent::plain(KeyCode::F(1)) {
            self.outbox.send(Outgoing::NewTab(HELP_URL.into()));
            return;
        }
        if key.key == KeyCode::Backspace
            && self.active_input == ActiveInput::None
            && self.vim.mode() != VimMode::Find
        {
            self.outbox.tab(TabCommand::HistoryBack);
            return;
        }

        if self.active_input != ActiveInput::UrlBar && !self.is_multi_line_enter(&key) {
            self.outbox.send(Outgoing::Key(key));
        }
        if self.active_input == ActiveInput::None {
            self.handle_vim_key(key, now);
            self.handle_scroll_key(&key);
        } else {
            self.handle_input_box_key(key);
        }
    }

    /// A plain Enter in a multi-line box makes a new line instead of
    /// submitting the form
    fn is_multi_line_enter(&self, key: &KeyEvent) -> bool {
        key.key == KeyCode::Enter
            && !key.modifiers.contains(Modifiers::ALT)
            && self.active_page_box().is_some_and(InputBox::is_multi_line)
    }

    fn handle_scroll_key(&mut self, key: &KeyEvent) {
        let page = self.page_viewport().1 as isize;
        match key.key {
            KeyCode::Up => self.scroll_by(0, -2),
            KeyCode::Down => self.scroll_by(0, 2),
            KeyCode::PageUp => self.scroll_by(0, -page),
            KeyCode::PageDown => self.scroll_by(0, page),
            _ => {}
        }
    }

    fn handle_vim_key(&mut self, key: KeyEvent, now: Instant) {
        let escape = key.key == KeyCode::Escape;
        match self.vim.mode() {
            VimMode::Wait => {
                if self.vim.expire_wait(now) {
                    self.handle_bound_key(&key);
                }
            }
            VimMode::Normal | VimMode::Visual | VimMode::Caret => self.handle_bound_key(&key),
            VimMode::Insert => {
                if escape {
                    self.vim.set_mode(VimMode::Normal);
                }
            }
            VimMode::Find => match key.key {
                KeyCode::Escape => {
                    self.find_text.clear();
                    self.vim.set_mode(VimMode::Normal);
                }
                KeyCode::Enter => {
                    self.vim.set_mode(VimMode::Normal);
                    self.outbox.tab(TabCommand::FindNext(self.find_text.clone()));
                }
                KeyCode::Backspace => {
                    self.find_text.pop();
                }
                _ => {
                    if let Some(c) = key.typed_char() {
                        self.find_text.push(c);
                    }
                }
            },
            VimMode::MakeMark => {
                if let Some(letter) = key.typed_char() {
                    self.make_mark(letter);
                }
                self.vim.set_mode(VimMode::Normal);
            }
            VimMode::GotoMark => {
                if let Some(letter) = key.typed_char() {
                    self.goto_mark(letter);
                }
                self.vim.set_mode(VimMode::Normal);
            }
            mode @ (VimMode::LinkMode | VimMode::LinkModeNewTab | VimMode::LinkModeCopy) => {
                if escape {
                    self.hints.erase();
                    self.vim.set_mode(VimMode::Normal);
                    return;
                }
                let Some(c) = key.typed_char() else {
                    return;
                };
                match self.hints.push_key(c) {
                    HintMatch::Pending => {}
                    HintMatch::Picked(rect) => {
                        self.follow_hint(mode, &rect);
                        self.hints.erase();
                        self.vim.enter_wait(now);
                    }
                    HintMatch::NoMatch => {
                        log::debug!("No link hint starts with {:?}", self.hints.typed());
                        self.hints.erase();
                        self.vim.set_mode(VimMode::Normal);
                    }
                }
            }
        }
    }

    fn handle_bound_key(&mut self, key: &KeyEvent) {
        if key.key == KeyCode::Escape {
            self.vim.set_mode(VimMode::Normal);
            return;
        }
        if let Some(command) = self.vim.lookup(&self.bindings, key) {
            log::debug!("{} -> {:?}", key.notation(), command);
            self.execute(command);
        }
    }

    fn follow_hint(&mut self, mode: VimMode, rect: &HintRect) {
        match mode {
            VimMode::LinkModeNewTab => self.outbox.send(Outgoing::NewTab(rect.href.clone())),
            VimMode::LinkModeCopy => self.clipboard.set_text(&rect.href),
            _ => {
                let x = usize::try_from(rect.left).unwrap_or(0);
                let y = usize::try_from(rect.top).unwrap_or(0);
                self.click(x, y, rect.height == 2);
            }
        }
    }

    fn handle_input_box_key(&mut self, key: KeyEvent) {
        let alt = key.modifiers.contains(Modifiers::ALT);
        match key.key {
            KeyCode::Escape => self.blur(),
            KeyCode::Enter if self.active_input == ActiveInput::UrlBar => self.submit_url_bar(),
            KeyCode::Enter => self.edit_active_box(|b| !alt && b.newline()),
            KeyCode::Left => self.edit_active_box(|b| {
                b.cursor_left();
                false
            }),
            KeyCode::Right => self.edit_active_box(|b| {
                b.cursor_right();
                false
            }),
            KeyCode::Up => self.edit_active_box(|b| {
                b.cursor_up();
                false
            }),
            KeyCode::Down => self.edit_active_box(|b| {
                b.cursor_down();
                false
            }),
            KeyCode::Home => self.edit_active_box(|b| {
                b.cursor_home();
                false
            }),
            KeyCode::End => self.edit_active_box(|b| {
                b.cursor_end();
                false
            }),
            KeyCode::Backspace | KeyCode::Delete => self.edit_active_box(InputBox::backspace),
            _ if key.is_ctrl('a') => self.edit_active_box(|b| {
                b.select_all();
                false
            }),
            _ => {
                if let Some(c) = key.typed_char() {
                    self.edit_active_box(|b| b.insert(c));
                }
            }
        }
    }

    fn handle_paste(&mut self, text: &str) {
        let url_bar = self.active_input == ActiveInput::UrlBar;
        self.edit_active_box(|b| {
            let mut changed = false;
            for c in text.chars() {
                changed |= match c {
                    '\r' => false,
                    '\n' if url_bar => false,
                    '\n' => b.newline(),
                    c => b.insert(c),
                };
            }
            changed
        });
    }

    /// Run `edit` on the focused box. When it reports a change to a page
    /// box, the browser is told the new text.
    fn edit_active_box(&mut self, edit: impl FnOnce(&mut InputBox) -> bool) {
        let changed = match self.active_input.clone() {
            ActiveInput::None => return,
            ActiveInput::UrlBar => {
                edit(&mut self.url_bar);
                None
            }
            ActiveInput::Page { tab_id, box_id } => {
                let Some(input) = self
                    .tabs
                    .get_mut(tab_id)
                    .and_then(|tab| tab.frame.input_box_mut(&box_id))
                else {
                    self.active_input = ActiveInput::None;
                    return;
                };
                edit(input).then(|| (input.id.clone(), input.text()))
            }
        };
        if let Some((id, text)) = changed {
            self.outbox.tab(TabCommand::InputBox { id, text });
        }
    }

    fn active_page_box(&self) -> Option<&InputBox> {
        match &self.active_input {
            ActiveInput::Page { tab_id, box_id } => {
                self.tabs.get(*tab_id)?.frame.input_box(box_id)
            }
            _ => None,
        }
    }

    /// Drop focus from a page box that no longer exists or is not shown
    fn prune_active_input(&mut self) {
        if let ActiveInput::Page { tab_id, .. } = &self.active_input {
            if self.tabs.current_id() != Some(*tab_id) || self.active_page_box().is_none() {
                self.active_input = ActiveInput::None;
            }
        }
    }

    fn blur(&mut self) {
        if self.active_input == ActiveInput::UrlBar {
            self.url_bar.clear_selection();
            self.active_input = ActiveInput::None;
            // Abandoning the URL of a new tab abandons the tab
            if self.tabs.current_id() == Some(PROVISIONAL_TAB_ID) && self.tabs.len() > 1 {
                self.remove_tab(PROVISIONAL_TAB_ID);
            }
        } else {
            self.active_input = ActiveInput::None;
        }
    }

    fn focus_url_bar(&mut self, select: bool) {
        let uri = self.tabs.current().map(|tab| tab.uri.clone()).unwrap_or_default();
        self.url_bar.set_text(&uri);
        if select {
            self.url_bar.select_all();
        }
        self.active_input = ActiveInput::UrlBar;
    }

    fn toggle_url_bar(&mut self) {
        if self.active_input == ActiveInput::UrlBar {
            self.url_bar.clear_selection();
            self.active_input = ActiveInput::None;
        } else {
            self.focus_url_bar(true);
        }
    }

    fn submit_url_bar(&mut self) {
        let url = self.url_bar.text();
        self.url_bar.clear_selection();
        self.active_input = ActiveInput::None;
        if url.trim().is_empty() {
            return;
        }
        if self.tabs.current_id() == Some(PROVISIONAL_TAB_ID) {
            self.outbox.send(Outgoing::NewTab(url));
        } else {
            self.outbox.tab(TabCommand::Url(url));
        }
    }

    /// Open a local tab whose URL is typed before the browser is asked for it
    fn new_tab(&mut self, uri: &str) {
        if self.tabs.create_provisional(uri) {
            self.focus_url_bar(false);
        }
    }

    fn remove_current_tab(&mut self) {
        if let Some(id) = self.tabs.current_id() {
            self.remove_tab(id);
        }
    }

    fn remove_tab(&mut self, id: i64) {
        match self.tabs.remove(id) {
            Removal::Quit => self.quit = true,
            Removal::Removed { switched_to } => {
                if id != PROVISIONAL_TAB_ID {
                    self.outbox.send(Outgoing::RemoveTab(id));
                    self.marks.forget_tab(id);
                }
                if let Some(next) = switched_to.filter(|&next| next != PROVISIONAL_TAB_ID) {
                    self.outbox.send(Outgoing::SwitchToTab(next));
                }
                self.prune_active_input();
            }
            Removal::Unknown => log::debug!("No tab {} to remove", id),
        }
    }

    fn switch_to_tab(&mut self, id: i64) {
        if self.tabs.switch_to(id) {
            self.after_switch(Some(id));
        }
    }

    fn after_switch(&mut self, id: Option<i64>) {
        if let Some(id) = id.filter(|&id| id != PROVISIONAL_TAB_ID) {
            self.outbox.send(Outgoing::SwitchToTab(id));
        }
        self.prune_active_input();
    }

    fn make_mark(&mut self, letter: char) {
        let Some(tab) = self.tabs.current() else {
            return;
        };
        let mark = Mark {
            tab_id: tab.id,
            uri: tab.uri.clone(),
            x_scroll: tab.frame.x_scroll,
            y_scroll: tab.frame.y_scroll,
        };
        if !self.marks.set(letter, mark) {
            log::debug!("Marks are letters, not {:?}", letter);
        }
    }

    fn goto_mark(&mut self, letter: char) {
        let Some(current) = self.tabs.current_id() else {
            return;
        };
        let Some(mark) = self.marks.get(letter, current).cloned() else {
            return;
        };
        if !self.tabs.contains(mark.tab_id) {
            log::info!("Tab {} of mark {:?} is gone, reopening {}", mark.tab_id, letter, mark.uri);
            self.pending_scroll = Some(PendingScroll {
                from_tab: mark.tab_id,
                tab_id: None,
                x: mark.x_scroll,
                y: mark.y_scroll,
            });
            self.outbox.send(Outgoing::NewTab(mark.uri));
            return;
        }
        if current != mark.tab_id {
            self.switch_to_tab(mark.tab_id);
        }
        let same_uri = self.tabs.current().is_some_and(|tab| tab.uri == mark.uri);
        if !same_uri {
            self.outbox.tab(TabCommand::Url(mark.uri.clone()));
        }
        self.scroll_to(mark.x_scroll, mark.y_scroll);
    }

    /// The first tab the browser opens after a mark reopened its tab takes
    /// over that mark
    fn claim_pending_scroll(&mut self, id: i64) {
        let Some(pending) = self.pending_scroll.as_mut() else {
            return;
        };
        if pending.tab_id.is_none() && id != PROVISIONAL_TAB_ID {
            pending.tab_id = Some(id);
            self.marks.move_tab(pending.from_tab, id);
        }
    }

    /// Restore a reopened mark's scroll once its tab has a page to scroll
    fn apply_pending_scroll(&mut self, id: i64) {
        let Some(pending) = self.pending_scroll else {
            return;
        };
        if pending.tab_id != Some(id) || self.tabs.current_id() != Some(id) {
            return;
        }
        if self.tabs.get(id).map_or(0, |tab| tab.frame.total_rows()) == 0 {
            return;
        }
        self.pending_scroll = None;
        self.scroll_to(pending.x, pending.y);
    }

    fn handle_mouse(&mut self, event: MouseEvent) {
        let Some(tab) = self.tabs.current() else {
            return;
        };
        if event.y < UI_HEIGHT {
            return;
        }
        let x = event.x + tab.frame.x_scroll;
        let y = event.y - UI_HEIGHT + tab.frame.y_scroll;
        match event.kind {
            MouseEventKind::Scroll(ScrollDirection::Up) => self.scroll_by(0, -1),
            MouseEventKind::Scroll(ScrollDirection::Down) => self.scroll_by(0, 1),
            MouseEventKind::Press(MouseButton::Left) => self.focus_input_at(x, y),
            _ => {}
        }
        self.outbox.send(Outgoing::Mouse {
            event,
            x,
            y,
            y_hack: false,
        });
    }

    /// Click at a position of the page viewport
    fn click(&mut self, x: usize, y: usize, y_hack: bool) {
        let Some(tab) = self.tabs.current() else {
            return;
        };
        let page_x = x + tab.frame.x_scroll;
        let page_y = y + tab.frame.y_scroll;
        self.focus_input_at(page_x, page_y);
        for kind in [
            MouseEventKind::Press(MouseButton::Left),
            MouseEventKind::Release(MouseButton::Left),
        ] {
            let event = MouseEvent {
                kind,
                x,
                y: y + UI_HEIGHT,
                modifiers: Modifiers::empty(),
            };
            self.outbox.send(Outgoing::Mouse {
                event,
                x: page_x,
                y: page_y,
                y_hack,
            });
        }
    }

    fn focus_input_at(&mut self, column: usize, row: usize) {
        let Some(tab) = self.tabs.current() else {
            return;
        };
        self.active_input = match tab.frame.input_box_at(column, row) {
            Some(input) => {
                log::debug!("Focused input box {}", input.id);
                ActiveInput::Page {
                    tab_id: tab.id,
                    box_id: input.id.clone(),
                }
            }
            None => ActiveInput::None,
        };
    }

    fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.url_bar.resize(width, 1);
        self.caret = (
            self.caret.0.min(width.saturating_sub(1)),
            self.caret.1.min(height.saturating_sub(1)),
        );
        let (page_width, page_height) = self.page_viewport();
        if let Some(tab) = self.tabs.current_mut() {
            tab.frame.limit_scroll(page_width, page_height);
        }
        self.send_tty_size();
    }

    fn send_tty_size(&self) {
        self.outbox.send(Outgoing::TtySize {
            width: self.width,
            height: self.height,
        });
    }

    /// Width and height of the area the page is drawn in
    fn page_viewport(&self) -> (usize, usize) {
        (self.width, self.height.saturating_sub(UI_HEIGHT))
    }

    fn scroll_by(&mut self, dx: isize, dy: isize) {
        let Some(tab) = self.tabs.current() else {
            return;
        };
        let x = tab.frame.x_scroll.saturating_add_signed(dx);
        let y = tab.frame.y_scroll.saturating_add_signed(dy);
        self.scroll_to(x, y);
    }

    /// Scroll the current tab and tell the browser where the viewport is
    fn scroll_to(&mut self, x: usize, y: usize) {
        let (width, height) = self.page_viewport();
        let Some(tab) = self.tabs.current_mut() else {
            return;
        };
        tab.frame.x_scroll = x;
        tab.frame.y_scroll = y;
        tab.frame.limit_scroll(width, height);
        let (x, y) = (tab.frame.x_scroll, tab.frame.y_scroll);
        self.outbox.tab(TabCommand::ScrollStatus { x, y: y * 2 });
    }

    /// The cell drawn at a screen position, for caret movement
    fn screen_cell(&self, x: isize, y: isize) -> Cell {
        let column = usize::try_from(x).unwrap_or(0);
        let Some(tab) = self.tabs.current() else {
            return Cell::hatched(column);
        };
        match usize::try_from(y - UI_HEIGHT as isize) {
            Ok(row) if x >= 0 => tab.frame.cell_at(column, row),
            _ => Cell::hatched(column),
        }
    }

    fn move_caret(&mut self, motion: CaretMotion) {
        let width = self.width as isize;
        let height = self.height as isize;
        let ui = UI_HEIGHT as isize;
        let start = (self.caret.0 as isize, self.caret.1 as isize);
        let (x, y) = match motion {
            CaretMotion::Left => walk_caret(start, motion, |x, _| x > 0, |x, y| self.screen_cell(x, y)),
            CaretMotion::Right => walk_caret(
                start,
                motion,
                |x, _| x + 1 < width,
                |x, y| self.screen_cell(x, y),
            ),
            CaretMotion::Up => walk_caret(start, motion, |_, y| y >= ui, |x, y| self.screen_cell(x, y)),
            CaretMotion::Down => walk_caret(
                start,
                motion,
                |_, y| y <= height - ui,
                |x, y| self.screen_cell(x, y),
            ),
        };
        let half_page = (height - ui) / 2;
        let mut y = y;
        if y < ui {
            let at_top = self.tabs.current().map_or(true, |tab| tab.frame.y_scroll == 0);
            y = if at_top { ui } else { y + half_page };
            self.scroll_by(0, -half_page);
        } else if y > height - ui {
            y -= half_page;
            self.scroll_by(0, half_page);
        }
        self.caret = (x.max(0) as usize, y.max(0) as usize);
    }

    /// Text between the visual anchor and the caret, in reading order
    fn selection_text(&self) -> String {
        let (start, end) = self.selection_bounds();
        let mut lines = Vec::new();
        for y in start.1..=end.1 {
            let from = if y == start.1 { start.0 } else { 0 };
            let to = if y == end.1 {
                end.0
            } else {
                self.width.saturating_sub(1)
            };
            let line: String = (from..=to)
                .map(|x| {
                    let cell = self.screen_cell(x as isize, y as isize);
                    if webtty_core::cell::is_transparent(&cell.glyph)
                        || cell.glyph == webtty_core::HALF_BLOCK
                    {
                        ' '
                    } else {
                        cell.first_char()
                    }
                })
                .collect();
            lines.push(line.trim_end().to_string());
        }
        lines.join("\n")
    }

    /// Visual selection as (start, end) screen positions, start first
    fn selection_bounds(&self) -> ((usize, usize), (usize, usize)) {
        let anchor = self.visual_anchor;
        let caret = self.caret;
        if (anchor.1, anchor.0) <= (caret.1, caret.0) {
            (anchor, caret)
        } else {
            (caret, anchor)
        }
    }
}
