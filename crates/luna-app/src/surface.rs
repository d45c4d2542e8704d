//! The terminal surface of one window, shared between the host, the
//! window's I/O thread and the control server.

use std::sync::{Mutex, MutexGuard, PoisonError};

use luna_core::TerminalSurface;
use luna_pty::TerminalSession;
use luna_vt::{CursorStyle, FontDescription};

pub struct SessionSurface {
    session: Mutex<TerminalSession>,
}

impl SessionSurface {
    pub fn new(session: TerminalSession) -> Self {
        Self {
            session: Mutex::new(session),
        }
    }

    /// Lock the terminal session. Keep the guard short-lived: the I/O thread
    /// and control requests wait on the same lock.
    pub fn lock(&self) -> MutexGuard<'_, TerminalSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TerminalSurface for SessionSurface {
    fn font(&self) -> Option<FontDescription> {
        self.lock().vt().font().cloned()
    }

    fn set_font(&self, font: FontDescription) {
        let mut session = self.lock();
        log::debug!("session {}: font {font}", session.id());
        session.vt_mut().set_font(font);
    }

    fn scrollback_lines(&self) -> usize {
        self.lock().vt().scrollback_lines()
    }

    fn set_scrollback_lines(&self, lines: usize) {
        self.lock().vt_mut().set_scrollback_lines(lines);
    }

    fn cursor_style(&self) -> CursorStyle {
        self.lock().vt().cursor_style()
    }

    fn set_cursor_style(&self, style: CursorStyle) {
        self.lock().vt_mut().set_cursor_style(style);
    }
}
