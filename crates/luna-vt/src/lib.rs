//! luna-vt: Headless terminal surface for Luna.
//!
//! Provides a small API over `alacritty_terminal` for terminal emulation,
//! together with the presentation state the rest of Luna manipulates at
//! runtime: the active font, the scrollback depth and the cursor style.
//! Drawing the surface is somebody else's job; this crate only keeps the
//! state a renderer would read.

pub mod cursor;
pub mod font;
pub mod terminal;

pub use cursor::{CursorPosition, CursorShape, CursorStyle};
pub use font::FontDescription;
pub use terminal::VtTerminal;
