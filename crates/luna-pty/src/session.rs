use std::io::Read;

use luna_core::{SessionId, CONTROL_PORT_ENV, SESSION_ID_ENV};
use luna_vt::VtTerminal;

use crate::pty::{PtyError, PtyHandle};

/// Environment every session's shell starts with: the control server port,
/// the session's own id, and the terminal type.
pub fn session_env(id: SessionId, control_port: u16) -> Vec<(&'static str, String)> {
    vec![
        (CONTROL_PORT_ENV, control_port.to_string()),
        (SESSION_ID_ENV, id.to_string()),
        ("TERM", "xterm-256color".to_string()),
    ]
}

/// What a chunk of PTY output changed, for the host to react to.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct FeedOutcome {
    /// Set when the window title differs from before the chunk.
    pub title: Option<String>,
    pub bell: bool,
}

/// A terminal session that pairs a PTY process with a VT terminal.
///
/// The I/O thread takes the PTY reader and passes what it reads to
/// [`TerminalSession::feed`]; everything else goes through the session.
pub struct TerminalSession {
    id: SessionId,
    shell: String,
    vt: VtTerminal,
    pty: PtyHandle,
    title: Option<String>,
    exit_code: Option<u32>,
}

impl TerminalSession {
    /// Spawn `shell` on a fresh PTY, telling it its session id and where the
    /// control server listens.
    pub fn new(
        id: SessionId,
        shell: &str,
        cols: u16,
        rows: u16,
        control_port: u16,
    ) -> Result<Self, PtyError> {
        let pty = PtyHandle::spawn(shell, cols, rows, &session_env(id, control_port))?;
        let vt = VtTerminal::new(cols, rows);
        log::info!("session {id}: spawned {shell} ({cols}x{rows})");

        Ok(Self {
            id,
            shell: shell.to_string(),
            vt,
            pty,
            title: None,
            exit_code: None,
        })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// The shell this session was spawned with.
    pub fn shell(&self) -> &str {
        &self.shell
    }

    /// Extract the PTY reader for use in a dedicated I/O thread.
    pub fn take_pty_reader(&mut self) -> Box<dyn Read + Send> {
        self.pty.take_reader()
    }

    /// Feed PTY output into the VT terminal.
    ///
    /// Write-backs the terminal produces (device status responses and the
    /// like) are sent straight back to the PTY.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<FeedOutcome, PtyError> {
        self.vt.write(bytes);

        for data in self.vt.take_pty_writes() {
            self.pty.write(data.as_bytes())?;
        }

        let title = self.vt.title_owned();
        let changed = if title != self.title {
            self.title = title.clone();
            title
        } else {
            None
        };

        Ok(FeedOutcome {
            title: changed,
            bell: self.vt.has_bell(),
        })
    }

    pub fn write_input(&mut self, data: &[u8]) -> Result<(), PtyError> {
        self.pty.write(data)
    }

    /// Resize both the PTY and VT terminal.
    pub fn resize(&mut self, cols: u16, rows: u16) -> Result<(), PtyError> {
        self.pty.resize(cols, rows)?;
        self.vt.resize(cols, rows);
        Ok(())
    }

    pub fn vt(&self) -> &VtTerminal {
        &self.vt
    }

    pub fn vt_mut(&mut self) -> &mut VtTerminal {
        &mut self.vt
    }

    /// Current title (set by the shell via OSC escape sequences).
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Exit code if the process has exited.
    pub fn exit_code(&mut self) -> Option<u32> {
        if self.exit_code.is_none() {
            self.exit_code = self.pty.try_wait();
        }
        self.exit_code
    }

    pub fn is_alive(&mut self) -> bool {
        self.exit_code().is_none()
    }
}
