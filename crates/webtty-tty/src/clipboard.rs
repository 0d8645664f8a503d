//! System clipboard access
//!
//! There is often no clipboard to talk to (over SSH, or without a display
//! server), so the last copied text is also kept locally and served when the
//! system clipboard cannot be read.

use webtty_ui::traits::{Clipboard, MemoryClipboard};

#[derive(Debug, Default)]
pub struct SystemClipboard {
    local: MemoryClipboard,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clipboard for SystemClipboard {
    fn get_text(&mut self) -> Option<String> {
        let system = arboard::Clipboard::new()
            .and_then(|mut clipboard| clipboard.get_text())
            .map_err(|e| log::debug!("System clipboard unavailable: {}", e))
            .ok();
        system.or_else(|| self.local.get_text())
    }

    fn set_text(&mut self, text: &str) {
        self.local.set_text(text);
        if let Err(e) = arboard::Clipboard::new().and_then(|mut c| c.set_text(text)) {
            log::debug!("Could not copy to the system clipboard: {}", e);
        }
    }
}
