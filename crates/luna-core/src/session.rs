use std::sync::{Arc, Weak};

use luna_vt::{CursorStyle, FontDescription};
use thiserror::Error;

use crate::font::{Direction, FontSelector};
use crate::surface::TerminalSurface;

/// Unique identifier for a terminal session. Never reused within a process.
pub type SessionId = u64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("terminal surface of session {0} is gone")]
    SurfaceGone(SessionId),

    #[error("session {0} has no font set")]
    NoFont(SessionId),
}

/// One live terminal: identity, font list position and a non-owning link to
/// the surface that displays it.
pub struct Session {
    id: SessionId,
    font_index: usize,
    surface: Weak<dyn TerminalSurface>,
}

impl Session {
    pub fn new(id: SessionId, surface: Weak<dyn TerminalSurface>) -> Self {
        Self {
            id,
            font_index: 0,
            surface,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Position in the font list that cycling resumes from.
    pub fn font_index(&self) -> usize {
        self.font_index
    }

    /// Whether the surface behind this session still exists.
    pub fn is_alive(&self) -> bool {
        self.surface.strong_count() > 0
    }

    fn surface(&self) -> Result<Arc<dyn TerminalSurface>, SessionError> {
        self.surface
            .upgrade()
            .ok_or(SessionError::SurfaceGone(self.id))
    }

    /// Apply the initial presentation for a freshly opened window: the first
    /// font of the list, the scrollback depth and the cursor style.
    pub fn configure(
        &mut self,
        fonts: &FontSelector,
        scrollback_lines: usize,
        cursor: CursorStyle,
    ) -> Result<(), SessionError> {
        let surface = self.surface()?;
        self.font_index = 0;
        apply_font_name(surface.as_ref(), fonts.get(0));
        surface.set_scrollback_lines(scrollback_lines);
        surface.set_cursor_style(cursor);
        Ok(())
    }

    pub fn font(&self) -> Result<FontDescription, SessionError> {
        self.surface()?.font().ok_or(SessionError::NoFont(self.id))
    }

    /// Step through the font list and apply the font landed on.
    ///
    /// The current point size carries over to the new font.
    pub fn cycle_font(
        &mut self,
        fonts: &FontSelector,
        direction: Direction,
    ) -> Result<FontDescription, SessionError> {
        let surface = self.surface()?;
        self.font_index = fonts.step(self.font_index, direction);
        Ok(apply_font_name(surface.as_ref(), fonts.get(self.font_index)))
    }

    /// Switch to an arbitrary font, listed or not.
    ///
    /// Leaves the cycle position alone, so the next cycle continues from the
    /// last listed font rather than from this one.
    pub fn set_font_by_name(&mut self, name: &str) -> Result<FontDescription, SessionError> {
        let surface = self.surface()?;
        Ok(apply_font_name(surface.as_ref(), name))
    }

    /// Add `step` points to the font size. No lower or upper bound is applied.
    pub fn resize_font(&mut self, step: i32) -> Result<FontDescription, SessionError> {
        let surface = self.surface()?;
        let current = surface.font().ok_or(SessionError::NoFont(self.id))?;
        let resized = current.with_size(current.size.saturating_add(step));
        surface.set_font(resized.clone());
        Ok(resized)
    }

    pub fn scrollback_lines(&self) -> Result<usize, SessionError> {
        Ok(self.surface()?.scrollback_lines())
    }

    pub fn set_scrollback_lines(&mut self, lines: usize) -> Result<(), SessionError> {
        self.surface()?.set_scrollback_lines(lines);
        Ok(())
    }
}

/// Apply a font by name, keeping the size of the font it replaces.
fn apply_font_name(surface: &dyn TerminalSurface, name: &str) -> FontDescription {
    let mut font = FontDescription::parse(name);
    if let Some(previous) = surface.font() {
        font.size = previous.size;
    }
    surface.set_font(font.clone());
    font
}
