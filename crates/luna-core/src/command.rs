//! Command dispatch: request in, command result or [`ControlError`] out.
//!
//! Commands are a closed enum looked up by name; each variant has its own
//! handler function. Adding a command means adding a variant, a name and a
//! handler.

use std::sync::{Arc, PoisonError};

use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::ControlError;
use crate::font::{Direction, FontSelector};
use crate::protocol::{Request, Response};
use crate::registry::SessionRegistry;
use crate::session::{Session, SessionError};
use crate::shell::ShellDefault;

/// Commands understood by the control protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommandKind {
    /// Get, and optionally set, the session's font. Replies with the family.
    Font,
    /// Get, and optionally set, the process-wide shell for future sessions.
    Shell,
    /// Move to the next or previous font in the configured list.
    Cycle,
    /// Grow or shrink the font by a number of points.
    Resize,
    /// Get, and optionally set, the scrollback depth.
    Scrollback,
}

impl CommandKind {
    pub const ALL: [CommandKind; 5] = [
        CommandKind::Font,
        CommandKind::Shell,
        CommandKind::Cycle,
        CommandKind::Resize,
        CommandKind::Scrollback,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            CommandKind::Font => "font",
            CommandKind::Shell => "shell",
            CommandKind::Cycle => "cycle",
            CommandKind::Resize => "resize",
            CommandKind::Scrollback => "scrollback",
        }
    }
}

/// Failure raised by a command handler itself.
#[derive(Debug, Error)]
enum CommandFailure {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("{0}")]
    InvalidArgument(String),
}

impl From<CommandFailure> for ControlError {
    fn from(failure: CommandFailure) -> Self {
        match failure {
            // The surface died between lookup and execution: same as never found.
            CommandFailure::Session(SessionError::SurfaceGone(id)) => {
                ControlError::SessionNotFound(id)
            }
            other => ControlError::CommandFailed(other.to_string()),
        }
    }
}

type CommandResult = Result<Option<String>, CommandFailure>;

/// Typed access to a request's named arguments.
struct Args<'a>(&'a Map<String, Value>);

impl<'a> Args<'a> {
    fn str(&self, key: &str) -> Result<Option<&'a str>, CommandFailure> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(invalid(key, "a string", other)),
        }
    }

    fn u64(&self, key: &str) -> Result<Option<u64>, CommandFailure> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value
                .as_u64()
                .map(Some)
                .ok_or_else(|| invalid(key, "a non-negative integer", value)),
        }
    }

    fn i64(&self, key: &str) -> Result<Option<i64>, CommandFailure> {
        match self.0.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value
                .as_i64()
                .map(Some)
                .ok_or_else(|| invalid(key, "an integer", value)),
        }
    }
}

fn invalid(key: &str, expected: &str, got: &Value) -> CommandFailure {
    CommandFailure::InvalidArgument(format!("argument `{key}` must be {expected}, got {got}"))
}

fn missing(key: &str) -> CommandFailure {
    CommandFailure::InvalidArgument(format!("missing argument `{key}`"))
}

/// Routes requests to sessions.
///
/// Holds no lock of its own: the registry lock is taken only for the lookup,
/// then the session's lock for the duration of the command.
pub struct Dispatcher {
    registry: Arc<SessionRegistry>,
    fonts: Arc<FontSelector>,
    shell: ShellDefault,
}

impl Dispatcher {
    pub fn new(registry: Arc<SessionRegistry>, fonts: Arc<FontSelector>, shell: ShellDefault) -> Self {
        Self {
            registry,
            fonts,
            shell,
        }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Run one decoded request.
    ///
    /// Checks the command name first, then resolves the session, then runs
    /// the handler. `Ok(None)` means the command succeeded with nothing to
    /// report.
    pub fn dispatch(&self, request: &Request) -> Result<Option<String>, ControlError> {
        let kind = CommandKind::from_name(&request.cmd)
            .ok_or_else(|| ControlError::UnknownCommand(request.cmd.clone()))?;

        let session = self.registry.lookup(request.id)?;
        let mut session = session.lock().unwrap_or_else(PoisonError::into_inner);
        let args = Args(&request.args);

        log::debug!("control: `{}` on session {}", kind.name(), request.id);

        let result = match kind {
            CommandKind::Font => self.font(&mut session, &args),
            CommandKind::Shell => self.shell(&args),
            CommandKind::Cycle => self.cycle(&mut session, &args),
            CommandKind::Resize => self.resize(&mut session, &args),
            CommandKind::Scrollback => self.scrollback(&mut session, &args),
        };
        result.map_err(ControlError::from)
    }

    /// Decode and run one request line, producing the response to send back.
    pub fn handle_line(&self, line: &str) -> Response {
        match Request::decode(line).and_then(|request| self.dispatch(&request)) {
            Ok(message) => Response::ok(message),
            Err(err) => {
                log::debug!("control request failed: {err}");
                Response::error(&err)
            }
        }
    }

    fn font(&self, session: &mut Session, args: &Args<'_>) -> CommandResult {
        if let Some(name) = args.str("font")? {
            session.set_font_by_name(name)?;
        }
        Ok(Some(session.font()?.family))
    }

    fn shell(&self, args: &Args<'_>) -> CommandResult {
        if let Some(shell) = args.str("shell")? {
            if shell.trim().is_empty() {
                return Err(CommandFailure::InvalidArgument(
                    "argument `shell` must not be empty".to_string(),
                ));
            }
            self.shell.set(shell);
            log::info!("default shell set to {shell}");
        }
        Ok(Some(self.shell.get()))
    }

    fn cycle(&self, session: &mut Session, args: &Args<'_>) -> CommandResult {
        let direction = match args.str("direction")? {
            Some(name) => name
                .parse::<Direction>()
                .map_err(CommandFailure::InvalidArgument)?,
            None => Direction::default(),
        };
        let font = session.cycle_font(&self.fonts, direction)?;
        Ok(Some(font.family))
    }

    fn resize(&self, session: &mut Session, args: &Args<'_>) -> CommandResult {
        let step = args.i64("step")?.ok_or_else(|| missing("step"))?;
        let step = i32::try_from(step).map_err(|_| {
            CommandFailure::InvalidArgument(format!("argument `step` is out of range: {step}"))
        })?;
        session.resize_font(step)?;
        Ok(None)
    }

    fn scrollback(&self, session: &mut Session, args: &Args<'_>) -> CommandResult {
        if let Some(lines) = args.u64("lines")? {
            let lines = usize::try_from(lines).map_err(|_| {
                CommandFailure::InvalidArgument(format!("argument `lines` is out of range: {lines}"))
            })?;
            session.set_scrollback_lines(lines)?;
        }
        Ok(Some(session.scrollback_lines()?.to_string()))
    }
}
