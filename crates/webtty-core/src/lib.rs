//! webtty-core: page model for a terminal web client
//!
//! This crate provides the pieces that turn browser output into terminal
//! cells and keep local editing state:
//! - Color and cell types, and the shared cell store
//! - The per-tab frame, rebuilt incrementally from text and pixel updates
//! - Editable input boxes and the word wrapper behind multi-line boxes

pub mod cell;
pub mod color;
pub mod frame;
pub mod input_box;
pub mod wrap;

pub use cell::{Cell, CellStore, HALF_BLOCK};
pub use color::Rgb;
pub use frame::{Frame, FrameError, FrameMeta, FramePixels, FrameText, IncomingInputBox};
pub use input_box::InputBox;
pub use wrap::{wrap, Wrapped};
