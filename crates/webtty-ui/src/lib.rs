//! webtty-ui: UI abstraction layer
//!
//! This crate defines the input events and drawing traits shared by the
//! session logic and the terminal front-end, so the session can be driven
//! and rendered without a real terminal.

pub mod events;
pub mod traits;

pub use events::*;
pub use traits::*;
