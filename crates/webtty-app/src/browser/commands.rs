//! Command dispatch

use webtty_ui::events::Command;

use super::{Browser, KEYBINDINGS_URL, UI_HEIGHT};
use crate::protocol::{Outgoing, TabCommand};
use crate::vim::{CaretMotion, VimMode};

impl Browser {
    /// Run a bound command
    pub fn execute(&mut self, command: Command) {
        let half_page = (self.page_viewport().1 / 2) as isize;
        match command {
            Command::UrlUp => self.outbox.tab(TabCommand::UrlUp),
            Command::UrlRoot => self.outbox.tab(TabCommand::UrlRoot),
            Command::HistoryBack => self.outbox.tab(TabCommand::HistoryBack),
            Command::HistoryForward => self.outbox.tab(TabCommand::HistoryForward),
            Command::Reload => self.outbox.tab(TabCommand::Reload),
            Command::EditUrl | Command::ToggleUrlBar => self.toggle_url_bar(),
            Command::EditUrlInNewTab => {
                let uri = self.current_uri();
                self.new_tab(&uri);
            }

            Command::ScrollToTop => {
                let x = self.tabs.current().map_or(0, |tab| tab.frame.x_scroll);
                self.scroll_to(x, 0);
            }
            Command::ScrollToBottom => {
                if let Some(tab) = self.tabs.current() {
                    let (x, rows) = (tab.frame.x_scroll, tab.frame.total_rows());
                    self.scroll_to(x, rows);
                }
            }
            Command::ScrollUp => self.scroll_by(0, -1),
            Command::ScrollDown => self.scroll_by(0, 1),
            Command::ScrollLeft => self.scroll_by(-1, 0),
            Command::ScrollRight => self.scroll_by(1, 0),
            Command::ScrollHalfPageUp => self.scroll_by(0, -half_page),
            Command::ScrollHalfPageDown => self.scroll_by(0, half_page),

            Command::FirstTab => {
                let id = self.tabs.first();
                self.after_switch(id);
            }
            Command::LastTab => {
                let id = self.tabs.last();
                self.after_switch(id);
            }
            Command::PrevTab => {
                let id = self.tabs.previous();
                self.after_switch(id);
            }
            Command::NextTab => {
                let id = self.tabs.next();
                self.after_switch(id);
            }
            Command::PreviouslyVisitedTab => {
                if let Some(id) = self.tabs.previously_visited() {
                    self.switch_to_tab(id);
                }
            }
            Command::NewTab => self.new_tab(""),
            Command::RemoveTab => self.remove_current_tab(),
            Command::RestoreTab => self.outbox.send(Outgoing::RestoreTab),
            Command::DuplicateTab => {
                if let Some(id) = self.tabs.current_id() {
                    self.outbox.send(Outgoing::DuplicateTab(id));
                }
            }
            Command::MoveTabLeft => {
                if let Some(id) = self.tabs.current_id() {
                    self.tabs.move_left(id);
                }
            }
            Command::MoveTabRight => {
                if let Some(id) = self.tabs.current_id() {
                    self.tabs.move_right(id);
                }
            }

            Command::CopyUrl => {
                let uri = self.current_uri();
                self.clipboard.set_text(&uri);
            }
            Command::OpenClipboardUrl => {
                if let Some(url) = self.clipboard_url() {
                    self.outbox.tab(TabCommand::Url(url));
                }
            }
            Command::OpenClipboardUrlInNewTab => {
                if let Some(url) = self.clipboard_url() {
                    self.outbox.send(Outgoing::NewTab(url));
                }
            }

            Command::FocusFirstTextInput => self.outbox.tab(TabCommand::FocusFirstTextInput),
            Command::FollowLinkLabeledNext => self.outbox.tab(TabCommand::FollowLinkLabeledNext),
            Command::FollowLinkLabeledPrevious => {
                self.outbox.tab(TabCommand::FollowLinkLabeledPrevious)
            }
            Command::ViewHelp => self.outbox.send(Outgoing::NewTab(KEYBINDINGS_URL.into())),

            Command::OpenLinkInCurrentTab => {
                self.enter_link_mode(VimMode::LinkMode, TabCommand::GetClickableHints)
            }
            Command::OpenLinkInNewTab => {
                self.enter_link_mode(VimMode::LinkModeNewTab, TabCommand::GetLinkHints)
            }
            Command::CopyLinkUrl => {
                self.enter_link_mode(VimMode::LinkModeCopy, TabCommand::GetLinkHints)
            }

            Command::FindMode => {
                self.find_text.clear();
                self.vim.set_mode(VimMode::Find);
            }
            Command::FindText | Command::FindNext => {
                self.outbox.tab(TabCommand::FindNext(self.find_text.clone()))
            }
            Command::FindPrevious => {
                self.outbox.tab(TabCommand::FindPrevious(self.find_text.clone()))
            }

            Command::MakeMark => self.vim.set_mode(VimMode::MakeMark),
            Command::GotoMark => self.vim.set_mode(VimMode::GotoMark),

            Command::NormalMode => {
                self.hints.erase();
                self.vim.set_mode(VimMode::Normal);
            }
            Command::InsertMode => self.vim.set_mode(VimMode::Insert),
            Command::VisualMode => {
                if !self.vim.mode().has_caret() {
                    self.center_caret();
                }
                self.visual_anchor = self.caret;
                self.vim.set_mode(VimMode::Visual);
            }
            Command::CaretMode => {
                if !self.vim.mode().has_caret() {
                    self.center_caret();
                }
                self.vim.set_mode(VimMode::Caret);
            }
            Command::SwapVisualModeCursorPosition => {
                std::mem::swap(&mut self.visual_anchor, &mut self.caret);
            }
            Command::CopyVisualModeSelection => {
                let text = self.selection_text();
                self.clipboard.set_text(&text);
                self.vim.set_mode(VimMode::Normal);
            }
            Command::MoveCaretLeft => self.move_caret(CaretMotion::Left),
            Command::MoveCaretRight => self.move_caret(CaretMotion::Right),
            Command::MoveCaretUp => self.move_caret(CaretMotion::Up),
            Command::MoveCaretDown => self.move_caret(CaretMotion::Down),
            Command::ClickAtCaretPosition => {
                let (x, y) = self.caret;
                if y >= UI_HEIGHT {
                    self.click(x, y - UI_HEIGHT, false);
                }
            }

            Command::ToggleMonochrome => self.monochrome = !self.monochrome,
            Command::Quit => self.quit = true,
        }
    }

    fn enter_link_mode(&mut self, mode: VimMode, request: TabCommand) {
        self.hints.erase();
        self.vim.set_mode(mode);
        self.outbox.tab(request);
    }

    fn center_caret(&mut self) {
        self.caret = (self.width / 2, self.height / 2);
    }

    fn current_uri(&self) -> String {
        self.tabs
            .current()
            .map(|tab| tab.uri.clone())
            .unwrap_or_default()
    }

    fn clipboard_url(&mut self) -> Option<String> {
        let text = self.clipboard.get_text()?;
        let url = text.trim();
        if url.is_empty() {
            log::debug!("Clipboard is empty");
            return None;
        }
        Some(url.to_string())
    }
}
