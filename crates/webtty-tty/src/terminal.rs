//! The real terminal, through crossterm
//!
//! [`TerminalGuard`] switches the terminal into raw alternate-screen mode
//! for as long as it lives. [`CrosstermSurface`] implements the drawing
//! trait with a back buffer and only writes cells that changed since the
//! last frame. Input is read on its own thread and handed to the session
//! loop as [`InputEvent`]s.

use std::io::{self, Write};
use std::thread::{self, JoinHandle};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{
    self as ct_event, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste,
    EnableMouseCapture, Event, KeyEventKind, KeyModifiers,
};
use crossterm::style::{
    Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use crossterm::{execute, queue};
use tokio::sync::mpsc::UnboundedSender;

use webtty_core::Rgb;
use webtty_ui::events::{
    InputEvent, KeyCode, KeyEvent, Modifiers, MouseButton, MouseEvent, MouseEventKind,
    ScrollDirection,
};
use webtty_ui::traits::{Style, Surface};

use crate::session::AppEvent;

/// Terminal size in cells
pub fn size() -> io::Result<(usize, usize)> {
    let (width, height) = crossterm::terminal::size()?;
    Ok((usize::from(width), usize::from(height)))
}

/// Raw mode, alternate screen and mouse capture, undone on drop
pub struct TerminalGuard {
    _private: (),
}

impl TerminalGuard {
    pub fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        execute!(
            io::stdout(),
            EnterAlternateScreen,
            EnableMouseCapture,
            EnableBracketedPaste,
            Hide
        )?;

        // Leave the terminal usable if anything panics while it is raw
        let default_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            restore();
            default_hook(info);
        }));

        Ok(Self { _private: () })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        restore();
    }
}

fn restore() {
    let _ = execute!(
        io::stdout(),
        Show,
        DisableBracketedPaste,
        DisableMouseCapture,
        LeaveAlternateScreen
    );
    let _ = disable_raw_mode();
}

/// A double-buffered surface written with crossterm commands
pub struct CrosstermSurface<W: Write> {
    out: W,
    width: usize,
    height: usize,
    back: Vec<(String, Style)>,
    /// What the terminal currently shows; empty after a resize
    front: Vec<(String, Style)>,
}

impl<W: Write> CrosstermSurface<W> {
    pub fn new(out: W, width: usize, height: usize) -> Self {
        Self {
            out,
            width,
            height,
            back: vec![blank(); width * height],
            front: Vec::new(),
        }
    }

    /// Change size; the next frame is drawn in full
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.back = vec![blank(); width * height];
        self.front.clear();
    }

    /// The underlying writer
    pub fn writer(&self) -> &W {
        &self.out
    }

    fn index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }
}

fn blank() -> (String, Style) {
    (String::from(" "), Style::default())
}

fn to_color(rgb: Rgb) -> Color {
    Color::Rgb {
        r: rgb.r,
        g: rgb.g,
        b: rgb.b,
    }
}

fn queue_style<W: Write>(out: &mut W, style: Style) -> io::Result<()> {
    queue!(out, SetAttribute(Attribute::Reset), ResetColor)?;
    if let Some(fg) = style.fg {
        queue!(out, SetForegroundColor(to_color(fg)))?;
    }
    if let Some(bg) = style.bg {
        queue!(out, SetBackgroundColor(to_color(bg)))?;
    }
    if style.reverse {
        queue!(out, SetAttribute(Attribute::Reverse))?;
    }
    Ok(())
}

impl<W: Write> Surface for CrosstermSurface<W> {
    fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn clear(&mut self) {
        for cell in &mut self.back {
            *cell = blank();
        }
    }

    fn put(&mut self, x: usize, y: usize, glyph: &str, style: Style) {
        if let Some(i) = self.index(x, y) {
            self.back[i] = (glyph.to_string(), style);
        }
    }

    fn reverse(&mut self, x: usize, y: usize) {
        if let Some(i) = self.index(x, y) {
            self.back[i].1.reverse = !self.back[i].1.reverse;
        }
    }

    fn present(&mut self) -> io::Result<()> {
        let full = self.front.len() != self.back.len();
        if full {
            queue!(self.out, ResetColor, Clear(ClearType::All))?;
        }

        let mut style = None;
        let mut cursor = None;
        let mut written = false;
        for y in 0..self.height {
            for x in 0..self.width {
                let i = y * self.width + x;
                let cell = &self.back[i];
                if !full && self.front[i] == *cell {
                    continue;
                }
                if cursor != Some((x, y)) {
                    queue!(self.out, MoveTo(x as u16, y as u16))?;
                }
                if style != Some(cell.1) {
                    queue_style(&mut self.out, cell.1)?;
                    style = Some(cell.1);
                }
                queue!(self.out, Print(&cell.0))?;
                cursor = Some((x + 1, y));
                written = true;
            }
        }
        if written {
            queue!(self.out, SetAttribute(Attribute::Reset), ResetColor)?;
        }
        self.front.clone_from(&self.back);
        self.out.flush()
    }
}

/// Read terminal events on a dedicated thread until the session stops
/// listening
pub fn spawn_input_thread(events: UnboundedSender<AppEvent>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("webtty-input".into())
        .spawn(move || loop {
            match ct_event::read() {
                Ok(event) => {
                    let Some(input) = convert_event(event) else {
                        continue;
                    };
                    if events.send(AppEvent::Input(input)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    let _ = events.send(AppEvent::Fatal(e.into()));
                    break;
                }
            }
        })
}

/// Translate a crossterm event; focus changes and key releases are dropped
pub fn convert_event(event: Event) -> Option<InputEvent> {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => convert_key(key).map(InputEvent::Key),
        Event::Mouse(mouse) => Some(InputEvent::Mouse(convert_mouse(mouse))),
        Event::Resize(width, height) => Some(InputEvent::Resize {
            width: usize::from(width),
            height: usize::from(height),
        }),
        Event::Paste(text) => Some(InputEvent::Paste(text)),
        _ => None,
    }
}

fn convert_modifiers(modifiers: KeyModifiers) -> Modifiers {
    let mut result = Modifiers::empty();
    if modifiers.contains(KeyModifiers::SHIFT) {
        result |= Modifiers::SHIFT;
    }
    if modifiers.contains(KeyModifiers::CONTROL) {
        result |= Modifiers::CTRL;
    }
    if modifiers.contains(KeyModifiers::ALT) {
        result |= Modifiers::ALT;
    }
    if modifiers.contains(KeyModifiers::SUPER) {
        result |= Modifiers::SUPER;
    }
    result
}

fn convert_key(key: ct_event::KeyEvent) -> Option<KeyEvent> {
    use ct_event::KeyCode as Ct;

    let mut modifiers = convert_modifiers(key.modifiers);
    let code = match key.code {
        Ct::Char(c) => {
            // Characters arrive already shifted
            modifiers.remove(Modifiers::SHIFT);
            KeyCode::Char(c)
        }
        Ct::F(n) => KeyCode::F(n),
        Ct::Up => KeyCode::Up,
        Ct::Down => KeyCode::Down,
        Ct::Left => KeyCode::Left,
        Ct::Right => KeyCode::Right,
        Ct::Home => KeyCode::Home,
        Ct::End => KeyCode::End,
        Ct::PageUp => KeyCode::PageUp,
        Ct::PageDown => KeyCode::PageDown,
        Ct::Insert => KeyCode::Insert,
        Ct::Delete => KeyCode::Delete,
        Ct::Backspace => KeyCode::Backspace,
        Ct::Enter => KeyCode::Enter,
        Ct::Tab => KeyCode::Tab,
        Ct::BackTab => {
            modifiers.remove(Modifiers::SHIFT);
            KeyCode::BackTab
        }
        Ct::Esc => KeyCode::Escape,
        _ => return None,
    };
    Some(KeyEvent::new(code, modifiers))
}

fn convert_button(button: ct_event::MouseButton) -> MouseButton {
    match button {
        ct_event::MouseButton::Left => MouseButton::Left,
        ct_event::MouseButton::Right => MouseButton::Right,
        ct_event::MouseButton::Middle => MouseButton::Middle,
    }
}

fn convert_mouse(mouse: ct_event::MouseEvent) -> MouseEvent {
    use ct_event::MouseEventKind as Ct;

    let kind = match mouse.kind {
        Ct::Down(button) => MouseEventKind::Press(convert_button(button)),
        Ct::Up(button) => MouseEventKind::Release(convert_button(button)),
        Ct::Drag(_) | Ct::Moved => MouseEventKind::Move,
        Ct::ScrollUp => MouseEventKind::Scroll(ScrollDirection::Up),
        Ct::ScrollDown => MouseEventKind::Scroll(ScrollDirection::Down),
        Ct::ScrollLeft => MouseEventKind::Scroll(ScrollDirection::Left),
        Ct::ScrollRight => MouseEventKind::Scroll(ScrollDirection::Right),
    };
    MouseEvent {
        kind,
        x: usize::from(mouse.column),
        y: usize::from(mouse.row),
        modifiers: convert_modifiers(mouse.modifiers),
    }
}
