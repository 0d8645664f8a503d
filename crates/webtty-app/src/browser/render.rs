//! Drawing the session onto a surface
//!
//! Layout, top to bottom: the tab bar, the URL bar, the page, and a status
//! line drawn over the last page row.

use webtty_core::{Rgb, HALF_BLOCK};
use webtty_ui::traits::{Style, Surface};

use super::{ActiveInput, Browser, UI_HEIGHT};
use crate::vim::VimMode;

/// Characters of a title shown in the tab bar
const TAB_TITLE_WIDTH: usize = 20;

impl Browser {
    /// Draw everything and present it
    pub fn render<S: Surface + ?Sized>(&self, surface: &mut S) -> std::io::Result<()> {
        surface.clear();
        self.render_tabs(surface);
        self.render_url_bar(surface);
        self.render_page(surface);
        self.render_status(surface);
        self.render_overlays(surface);
        surface.present()
    }

    fn render_tabs<S: Surface + ?Sized>(&self, surface: &mut S) {
        let current = self.tabs.current_id();
        let mut x = 0;
        for tab in self.tabs.ordered() {
            let mut title: String = tab.display_title().chars().take(TAB_TITLE_WIDTH).collect();
            let padding = TAB_TITLE_WIDTH - title.chars().count();
            title.extend(std::iter::repeat(' ').take(padding));
            let style = if Some(tab.id) == current {
                Style::reversed()
            } else {
                Style::default()
            };
            surface.put_str(x, 0, &title, style);
            surface.put(x + TAB_TITLE_WIDTH, 0, "|", Style::default());
            x += TAB_TITLE_WIDTH + 1;
        }
    }

    fn render_url_bar<S: Surface + ?Sized>(&self, surface: &mut S) {
        if self.active_input != ActiveInput::UrlBar {
            let uri = self.tabs.current().map_or("", |tab| tab.uri.as_str());
            surface.put_str(0, 1, uri, Style::default());
            return;
        }
        let line = self.url_bar.visible_lines().concat();
        surface.put_str(0, 1, &line, Style::default());
        match self.url_bar.selected_columns() {
            Some(columns) => {
                for x in columns {
                    surface.reverse(x, 1);
                }
            }
            None => surface.reverse(self.url_bar.cursor_in_box().0, 1),
        }
    }

    fn render_page<S: Surface + ?Sized>(&self, surface: &mut S) {
        let Some(tab) = self.tabs.current() else {
            return;
        };
        let frame = &tab.frame;
        frame.overlay_input_boxes();

        let (width, height) = surface.size();
        for y in 0..height.saturating_sub(UI_HEIGHT) {
            for x in 0..width {
                let cell = frame.cell_at(x, y);
                if cell.glyph.is_empty() {
                    continue;
                }
                if self.monochrome {
                    let glyph = if cell.glyph == HALF_BLOCK {
                        " "
                    } else {
                        cell.glyph.as_str()
                    };
                    surface.put(x, y + UI_HEIGHT, glyph, Style::colours(Rgb::WHITE, Rgb::BLACK));
                } else {
                    surface.put(x, y + UI_HEIGHT, &cell.glyph, Style::colours(cell.fg, cell.bg));
                }
            }
        }

        if let Some(input) = self.active_page_box() {
            let (cursor_x, cursor_y) = input.cursor_in_box();
            let columns = match input.selected_columns() {
                Some(columns) => columns,
                None => cursor_x..cursor_x + 1,
            };
            for column in columns {
                let page_x = input.x + column;
                let page_y = input.y + cursor_y;
                if page_x < frame.x_scroll || page_y < frame.y_scroll {
                    continue;
                }
                surface.reverse(page_x - frame.x_scroll, page_y - frame.y_scroll + UI_HEIGHT);
            }
        }
    }

    fn render_status<S: Surface + ?Sized>(&self, surface: &mut S) {
        let (width, height) = surface.size();
        let Some(row) = height.checked_sub(1) else {
            return;
        };
        let status = self.status();
        let indicator = match self.vim.mode() {
            VimMode::Find => Some(format!("/{}", self.find_text)),
            mode => mode.indicator().map(String::from),
        };
        if status.is_empty() && indicator.is_none() {
            return;
        }
        surface.put_str(0, row, &" ".repeat(width), Style::default());
        surface.put_str(0, row, status, Style::default());
        if let Some(indicator) = indicator {
            // After the status, separated by a space
            let x = match status.chars().count() {
                0 => 0,
                n => n + 1,
            };
            surface.put_str(x, row, &indicator, Style::default());
        }
    }

    fn render_overlays<S: Surface + ?Sized>(&self, surface: &mut S) {
        let mode = self.vim.mode();
        if mode.is_link_mode() {
            for label in self.hints.visible_labels(mode == VimMode::LinkModeNewTab) {
                let (Ok(x), Ok(y)) = (usize::try_from(label.x), usize::try_from(label.y)) else {
                    continue;
                };
                surface.put_str(x, y + UI_HEIGHT, &label.text, Style::default());
            }
        }
        if mode == VimMode::Visual {
            let (start, end) = self.selection_bounds();
            let width = surface.size().0;
            for y in start.1..=end.1 {
                let from = if y == start.1 { start.0 } else { 0 };
                let to = if y == end.1 { end.0 } else { width.saturating_sub(1) };
                for x in from..=to {
                    surface.reverse(x, y);
                }
            }
        } else if mode == VimMode::Caret {
            surface.reverse(self.caret.0, self.caret.1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::protocol::{Incoming, Outbox, TabState};
    use webtty_core::{FrameMeta, FrameText};
    use webtty_ui::events::{InputEvent, KeyEvent};
    use webtty_ui::traits::{MemoryClipboard, MemorySurface};

    fn browser(width: usize, height: usize) -> Browser {
        let (outbox, _rx) = Outbox::channel();
        Browser::new(
            &Config::default(),
            outbox,
            Box::new(MemoryClipboard::default()),
            (width, height),
        )
    }

    fn tab_state(id: i64, active: bool, title: &str) -> Incoming {
        Incoming::TabState(TabState {
            id,
            active,
            title: title.into(),
            uri: format!("https://{id}.example/"),
            page_state: "parsing_complete".into(),
            status_message: String::new(),
        })
    }

    fn text_frame(id: i64, rows: &[&str]) -> Incoming {
        let width = rows[0].chars().count();
        let text: Vec<String> = rows
            .iter()
            .flat_map(|row| row.chars().map(String::from))
            .collect();
        let colours = vec![10; text.len() * 3];
        Incoming::FrameText(FrameText {
            meta: FrameMeta {
                id,
                sub_width: width,
                sub_height: rows.len() * 2,
                total_width: width,
                total_height: rows.len() * 2,
                ..FrameMeta::default()
            },
            text,
            colours,
            input_boxes: Default::default(),
        })
    }

    #[test]
    fn test_tab_bar() {
        let mut browser = browser(50, 6);
        browser.handle_message(tab_state(1, true, "First"));
        browser.handle_message(tab_state(2, false, "A rather long title for a tab"));
        let mut surface = MemorySurface::new(50, 6);
        browser.render(&mut surface).unwrap();

        let bar = surface.row_text(0);
        assert!(bar.starts_with("First               |A rather long title |"));
        assert!(surface.style(0, 0).unwrap().reverse);
        assert!(!surface.style(21, 0).unwrap().reverse);
        assert_eq!(surface.row_text(1).trim_end(), "https://1.example/");
    }

    #[test]
    fn test_page_text_is_drawn_below_the_bars() {
        let mut browser = browser(4, 5);
        browser.handle_message(tab_state(1, true, "t"));
        browser.handle_message(text_frame(1, &["abcd", "efgh"]));
        let mut surface = MemorySurface::new(4, 5);
        browser.render(&mut surface).unwrap();

        assert_eq!(surface.row_text(2), "abcd");
        assert_eq!(surface.row_text(3), "efgh");
        assert_eq!(
            surface.style(0, 2).unwrap().fg,
            Some(Rgb::new(10, 10, 10))
        );
    }

    #[test]
    fn test_monochrome_hides_half_blocks() {
        let mut browser = browser(4, 5);
        browser.handle_message(tab_state(1, true, "t"));
        browser.handle_message(text_frame(1, &["ab  "]));
        browser.handle_input(InputEvent::Key(KeyEvent::new(
            webtty_ui::events::KeyCode::Char('m'),
            webtty_ui::events::Modifiers::ALT,
        )));
        assert!(browser.is_monochrome());

        let mut surface = MemorySurface::new(4, 5);
        browser.render(&mut surface).unwrap();
        assert_eq!(surface.row_text(2), "ab  ");
        // Rows below the page are hatched placeholders, blank in monochrome
        assert_eq!(surface.glyph(0, 3), Some(" "));
        assert_eq!(
            surface.style(0, 2).unwrap(),
            Style::colours(Rgb::WHITE, Rgb::BLACK)
        );
    }

    #[test]
    fn test_status_line_and_mode() {
        let mut browser = browser(20, 6);
        browser.handle_message(tab_state(1, true, "t"));
        browser.set_status(Some("Quitting in 3".into()));
        browser.handle_input(InputEvent::Key(KeyEvent::char('/')));
        browser.handle_input(InputEvent::Key(KeyEvent::char('x')));

        let mut surface = MemorySurface::new(20, 6);
        browser.render(&mut surface).unwrap();
        assert_eq!(surface.row_text(5).trim_end(), "Quitting in 3 /x");

        browser.set_status(None);
        browser.render(&mut surface).unwrap();
        assert_eq!(surface.row_text(5).trim_end(), "/x");
    }

    #[test]
    fn test_url_bar_cursor() {
        let mut browser = browser(30, 6);
        browser.handle_message(tab_state(1, true, "t"));
        browser.handle_input(InputEvent::Key(KeyEvent::ctrl('l')));
        let mut surface = MemorySurface::new(30, 6);
        browser.render(&mut surface).unwrap();
        // Everything selected
        assert!((0..18).all(|x| surface.style(x, 1).unwrap().reverse));

        browser.handle_input(InputEvent::Key(KeyEvent::char('a')));
        browser.render(&mut surface).unwrap();
        assert_eq!(surface.row_text(1).trim_end(), "a");
        assert!(!surface.style(0, 1).unwrap().reverse);
        assert!(surface.style(1, 1).unwrap().reverse);
    }
}
