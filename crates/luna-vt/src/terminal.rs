use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use alacritty_terminal::event::{Event, EventListener};
use alacritty_terminal::grid::Dimensions;
use alacritty_terminal::term::{Config, Term};
use alacritty_terminal::vte::ansi;

use crate::cursor::{CursorPosition, CursorStyle};
use crate::font::FontDescription;

/// Scrollback depth used until someone configures another one.
pub const DEFAULT_SCROLLBACK: usize = 10_000;

/// Shared event state captured from the terminal.
#[derive(Default)]
struct EventState {
    title: Option<String>,
    bell: bool,
    pty_writes: Vec<String>,
}

/// Event proxy that captures terminal events.
///
/// `Term` may clone its listener, so the captured state lives behind an
/// `Arc<Mutex<_>>`.
#[derive(Clone)]
pub struct EventProxy {
    state: Arc<Mutex<EventState>>,
}

impl EventProxy {
    fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(EventState::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, EventState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventListener for EventProxy {
    fn send_event(&self, event: Event) {
        let mut state = self.lock();
        match event {
            Event::Title(title) => state.title = Some(title),
            Event::ResetTitle => state.title = None,
            Event::Bell => state.bell = true,
            Event::PtyWrite(data) => state.pty_writes.push(data),
            _ => {}
        }
    }
}

struct TermSize {
    columns: usize,
    screen_lines: usize,
}

impl Dimensions for TermSize {
    fn total_lines(&self) -> usize {
        self.screen_lines
    }

    fn screen_lines(&self) -> usize {
        self.screen_lines
    }

    fn columns(&self) -> usize {
        self.columns
    }
}

/// A headless terminal surface.
///
/// Wraps `alacritty_terminal::Term` and a VTE parser, and carries the
/// presentation state (font, scrollback depth, cursor style) that a
/// renderer would pick up.
pub struct VtTerminal {
    term: Term<EventProxy>,
    parser: ansi::Processor,
    event_proxy: EventProxy,
    config: Config,
    font: Option<FontDescription>,
}

impl VtTerminal {
    /// Create a new terminal with the given dimensions and
    /// [`DEFAULT_SCROLLBACK`] lines of history.
    pub fn new(cols: u16, rows: u16) -> Self {
        let config = Config {
            scrolling_history: DEFAULT_SCROLLBACK,
            default_cursor_style: CursorStyle::default().into(),
            ..Config::default()
        };

        let size = TermSize {
            columns: cols as usize,
            screen_lines: rows as usize,
        };

        let event_proxy = EventProxy::new();
        let term = Term::new(config.clone(), &size, event_proxy.clone());

        Self {
            term,
            parser: ansi::Processor::new(),
            event_proxy,
            config,
            font: None,
        }
    }

    /// Feed raw PTY output bytes into the terminal.
    pub fn write(&mut self, bytes: &[u8]) {
        self.parser.advance(&mut self.term, bytes);
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        let size = TermSize {
            columns: cols as usize,
            screen_lines: rows as usize,
        };
        self.term.resize(size);
    }

    pub fn cols(&self) -> u16 {
        self.term.columns() as u16
    }

    pub fn rows(&self) -> u16 {
        self.term.screen_lines() as u16
    }

    /// Characters on a visible row, trailing blanks included.
    pub fn row_text(&self, row: u16) -> String {
        use alacritty_terminal::index::{Column, Line};

        if row >= self.rows() {
            return String::new();
        }
        let grid = self.term.grid();
        (0..self.term.columns())
            .map(|col| grid[Line(row as i32)][Column(col)].c)
            .collect()
    }

    pub fn cursor(&self) -> CursorPosition {
        let content = self.term.renderable_content();
        let cursor = &content.cursor;

        CursorPosition {
            row: cursor.point.line.0 as u16,
            col: cursor.point.column.0 as u16,
            visible: cursor.shape != ansi::CursorShape::Hidden,
        }
    }

    /// The font currently applied to this surface, if any.
    pub fn font(&self) -> Option<&FontDescription> {
        self.font.as_ref()
    }

    pub fn set_font(&mut self, font: FontDescription) {
        self.font = Some(font);
    }

    pub fn scrollback_lines(&self) -> usize {
        self.config.scrolling_history
    }

    /// Change how many lines of history the terminal keeps.
    ///
    /// Shrinking the limit drops the oldest history lines.
    pub fn set_scrollback_lines(&mut self, lines: usize) {
        self.config.scrolling_history = lines;
        self.term.set_options(self.config.clone());
    }

    /// Cursor style used when the running program has not asked for another.
    pub fn cursor_style(&self) -> CursorStyle {
        self.config.default_cursor_style.into()
    }

    pub fn set_cursor_style(&mut self, style: CursorStyle) {
        self.config.default_cursor_style = style.into();
        self.term.set_options(self.config.clone());
    }

    /// Current window title, if set by OSC escape sequences.
    pub fn title_owned(&self) -> Option<String> {
        self.event_proxy.lock().title.clone()
    }

    /// Drain any write-back data from the terminal (e.g., device status responses).
    pub fn take_pty_writes(&mut self) -> Vec<String> {
        std::mem::take(&mut self.event_proxy.lock().pty_writes)
    }

    /// Check and clear the bell flag.
    pub fn has_bell(&mut self) -> bool {
        std::mem::take(&mut self.event_proxy.lock().bell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursor::CursorShape;
    use alacritty_terminal::grid::Dimensions;

    #[test]
    fn test_create_terminal_dimensions() {
        let term = VtTerminal::new(80, 24);
        assert_eq!(term.cols(), 80);
        assert_eq!(term.rows(), 24);
    }

    #[test]
    fn test_write_hello() {
        let mut term = VtTerminal::new(80, 24);
        term.write(b"hello");
        assert!(term.row_text(0).starts_with("hello "));
        assert_eq!(term.row_text(0).len(), 80);
    }

    #[test]
    fn test_resize_terminal() {
        let mut term = VtTerminal::new(80, 24);
        term.resize(120, 40);
        assert_eq!(term.cols(), 120);
        assert_eq!(term.rows(), 40);
    }

    #[test]
    fn test_cursor_position_multiline() {
        let mut term = VtTerminal::new(10, 5);
        term.write(b"0123456789AB");

        let cursor = term.cursor();
        assert_eq!(cursor.row, 1);
        assert_eq!(cursor.col, 2);
        assert!(cursor.visible);
    }

    #[test]
    fn test_title_change() {
        let mut term = VtTerminal::new(80, 24);
        term.write(b"\x1b]0;Luna\x07");
        assert_eq!(term.title_owned(), Some("Luna".to_string()));
    }

    #[test]
    fn test_bell_is_cleared_after_read() {
        let mut term = VtTerminal::new(80, 24);
        assert!(!term.has_bell());
        term.write(b"\x07");
        assert!(term.has_bell());
        assert!(!term.has_bell());
    }

    #[test]
    fn test_device_status_response() {
        let mut term = VtTerminal::new(80, 24);
        term.write(b"\x1b[6n");

        let writes = term.take_pty_writes();
        assert!(!writes.is_empty(), "Expected a device status response");
        assert!(writes[0].starts_with("\x1b["));
        assert!(term.take_pty_writes().is_empty());
    }

    #[test]
    fn test_font_starts_unset() {
        let mut term = VtTerminal::new(80, 24);
        assert!(term.font().is_none());

        term.set_font(FontDescription::parse("Anonymous Pro 9"));
        assert_eq!(term.font(), Some(&FontDescription::new("Anonymous Pro", 9)));
    }

    #[test]
    fn test_scrollback_lines() {
        let mut term = VtTerminal::new(80, 24);
        assert_eq!(term.scrollback_lines(), DEFAULT_SCROLLBACK);

        term.set_scrollback_lines(100_000);
        assert_eq!(term.scrollback_lines(), 100_000);
    }

    #[test]
    fn test_scrollback_history_is_limited() {
        let mut term = VtTerminal::new(10, 2);
        term.set_scrollback_lines(3);
        for _ in 0..20 {
            term.write(b"line\r\n");
        }
        assert!(term.inner_history_size() <= 3);
    }

    #[test]
    fn test_cursor_style() {
        let mut term = VtTerminal::new(80, 24);
        assert_eq!(term.cursor_style(), CursorStyle::default());

        let style = CursorStyle::new(CursorShape::Underline, true);
        term.set_cursor_style(style);
        assert_eq!(term.cursor_style(), style);
    }

    impl VtTerminal {
        fn inner_history_size(&self) -> usize {
            self.term.grid().history_size()
        }
    }
}
