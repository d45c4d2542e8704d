//! The host process: owns the terminal windows and reacts to what happens
//! inside them.
//!
//! All window bookkeeping happens on the thread that calls [`Host::run`].
//! I/O threads and the Ctrl-C handler only talk to it through [`HostEvent`]s.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError};

use anyhow::Context;
use luna_core::{FontSelector, SessionId, SessionRegistry, SharedSession, ShellDefault};
use luna_pty::TerminalSession;
use tokio::sync::mpsc;

use crate::config::Config;
use crate::io_thread::start_io_thread;
use crate::surface::SessionSurface;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// The window's shell exited, or its PTY closed.
    ChildExited { id: SessionId, code: Option<u32> },
    TitleChanged { id: SessionId, title: String },
    Bell { id: SessionId },
    /// The user closed one window.
    WindowClosed { id: SessionId },
    /// Close every window and return from [`Host::run`].
    Quit,
}

pub struct Window {
    surface: Arc<SessionSurface>,
    title: String,
}

pub struct Host {
    config: Config,
    registry: Arc<SessionRegistry>,
    fonts: Arc<FontSelector>,
    shell: ShellDefault,
    control_port: u16,
    windows: HashMap<SessionId, Window>,
    events_tx: mpsc::Sender<HostEvent>,
}

impl Host {
    pub fn new(
        config: Config,
        registry: Arc<SessionRegistry>,
        fonts: Arc<FontSelector>,
        shell: ShellDefault,
        control_port: u16,
        events_tx: mpsc::Sender<HostEvent>,
    ) -> Self {
        Self {
            config,
            registry,
            fonts,
            shell,
            control_port,
            windows: HashMap::new(),
            events_tx,
        }
    }

    /// Spawn the default shell in a new window and register it.
    ///
    /// The shell is read at the moment the window opens, so a `shell`
    /// command only affects windows opened after it.
    pub fn open_window(&mut self) -> anyhow::Result<SessionId> {
        let shell = self.shell.get();
        let (cols, rows) = (self.config.columns, self.config.rows);
        let control_port = self.control_port;

        let (session, surface) = self.registry.register_with(|id| {
            TerminalSession::new(id, &shell, cols, rows, control_port)
                .map(|session| Arc::new(SessionSurface::new(session)))
                .with_context(|| format!("failed to start {shell}"))
        })?;

        let id = configure_session(&self.registry, &session, &self.fonts, &self.config)?;

        let reader = surface.lock().take_pty_reader();
        if let Err(e) = start_io_thread(id, Arc::downgrade(&surface), reader, self.events_tx.clone()) {
            self.registry.unregister(id);
            return Err(e).context("failed to start the I/O thread");
        }

        self.windows.insert(
            id,
            Window {
                surface,
                title: shell,
            },
        );
        log::info!("opened window {id}");
        Ok(id)
    }

    /// Unregister the session, then drop the window's surface. Returns
    /// whether the window was open.
    pub fn close_window(&mut self, id: SessionId) -> bool {
        self.registry.unregister(id);
        match self.windows.remove(&id) {
            Some(window) => {
                drop(window);
                log::info!("closed window {id}");
                true
            }
            None => false,
        }
    }

    /// Apply one event. Returns `false` once the host should stop.
    pub fn handle_event(&mut self, event: HostEvent) -> bool {
        match event {
            HostEvent::ChildExited { id, code } => {
                match code {
                    Some(code) => log::info!("window {id}: shell exited with status {code}"),
                    None => log::info!("window {id}: shell exited"),
                }
                self.close_window(id);
            }
            HostEvent::TitleChanged { id, title } => {
                if let Some(window) = self.windows.get_mut(&id) {
                    log::debug!("window {id}: title {title:?}");
                    window.title = title;
                }
            }
            HostEvent::Bell { id } => {
                if let Some(window) = self.windows.get(&id) {
                    log::debug!("window {id} ({}): bell", window.title);
                }
            }
            HostEvent::WindowClosed { id } => {
                self.close_window(id);
            }
            HostEvent::Quit => {
                log::info!("quitting with {} open window(s)", self.windows.len());
                let ids: Vec<SessionId> = self.windows.keys().copied().collect();
                for id in ids {
                    self.close_window(id);
                }
                return false;
            }
        }
        !self.windows.is_empty()
    }

    /// Process events until the last window closes or a quit is requested.
    pub fn run(&mut self, events_rx: &mut mpsc::Receiver<HostEvent>) {
        while !self.windows.is_empty() {
            let Some(event) = events_rx.blocking_recv() else {
                break;
            };
            if !self.handle_event(event) {
                break;
            }
        }
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }
}

/// Apply the configured presentation to a freshly registered session. On
/// failure the session is unregistered again.
fn configure_session(
    registry: &SessionRegistry,
    session: &SharedSession,
    fonts: &FontSelector,
    config: &Config,
) -> anyhow::Result<SessionId> {
    let mut session = session.lock().unwrap_or_else(PoisonError::into_inner);
    let id = session.id();
    if let Err(e) = session.configure(fonts, config.scrollback_lines, config.cursor) {
        registry.unregister(id);
        return Err(e).context("failed to configure the new window");
    }
    Ok(id)
}

/// Deliver a quit request, waiting for room in the channel rather than
/// dropping it. Must not be called from inside the tokio runtime.
pub fn request_quit(events: &mpsc::Sender<HostEvent>) {
    if events.blocking_send(HostEvent::Quit).is_err() {
        log::warn!("quit requested after the event loop ended");
    }
}
