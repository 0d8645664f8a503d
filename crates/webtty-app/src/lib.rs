//! webtty-app: session logic for webtty
//!
//! This crate holds everything between the websocket and the terminal that
//! does not touch either directly: configuration, the message protocol, the
//! tabs, vim-style modes and key bindings, link hints, marks, and the
//! [`Browser`] session that ties them together and renders onto a surface.

pub mod browser;
pub mod config;
pub mod hints;
pub mod marks;
pub mod protocol;
pub mod session;
pub mod shortcuts;
pub mod vim;

pub use browser::{ActiveInput, Browser, UI_HEIGHT};
pub use config::{load_config, load_config_from, Config};
pub use protocol::{Incoming, Outbox, Outgoing, ProtocolError, TabCommand};
pub use session::{Tab, TabManager};
pub use shortcuts::KeyBindings;
pub use vim::VimMode;
