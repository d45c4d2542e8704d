//! The terminal surface as seen from the core.
//!
//! Surfaces are owned by the host (one per window). The core only ever holds
//! a `Weak` reference and calls these methods; it never keeps a surface alive.

use luna_vt::{CursorStyle, FontDescription};

/// Presentation controls exposed by a terminal surface.
///
/// Methods take `&self` because surfaces are shared between the host's event
/// thread, the PTY I/O thread and control requests; implementations lock
/// internally.
pub trait TerminalSurface: Send + Sync {
    /// The font currently applied, if any has been set.
    fn font(&self) -> Option<FontDescription>;

    fn set_font(&self, font: FontDescription);

    fn scrollback_lines(&self) -> usize;

    fn set_scrollback_lines(&self, lines: usize);

    fn cursor_style(&self) -> CursorStyle;

    fn set_cursor_style(&self, style: CursorStyle);
}
