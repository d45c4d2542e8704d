//! In-memory surface used by the unit tests.

use std::sync::{Arc, Mutex};

use luna_vt::{CursorStyle, FontDescription};

use crate::surface::TerminalSurface;

#[derive(Default)]
struct FakeState {
    font: Option<FontDescription>,
    scrollback_lines: usize,
    cursor: CursorStyle,
}

#[derive(Default)]
pub struct FakeSurface {
    state: Mutex<FakeState>,
}

impl FakeSurface {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl TerminalSurface for FakeSurface {
    fn font(&self) -> Option<FontDescription> {
        self.state.lock().unwrap().font.clone()
    }

    fn set_font(&self, font: FontDescription) {
        self.state.lock().unwrap().font = Some(font);
    }

    fn scrollback_lines(&self) -> usize {
        self.state.lock().unwrap().scrollback_lines
    }

    fn set_scrollback_lines(&self, lines: usize) {
        self.state.lock().unwrap().scrollback_lines = lines;
    }

    fn cursor_style(&self) -> CursorStyle {
        self.state.lock().unwrap().cursor
    }

    fn set_cursor_style(&self, style: CursorStyle) {
        self.state.lock().unwrap().cursor = style;
    }
}
