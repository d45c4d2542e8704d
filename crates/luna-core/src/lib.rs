//! luna-core: session registry and control plane for Luna.
//!
//! Terminal windows come and go on the host's event thread; external tools
//! reach into them through a line-delimited JSON protocol on a loopback TCP
//! port. This crate holds everything in between.
//!
//! # Architecture
//!
//! - [`FontSelector`] — Cycles through the configured font list.
//! - [`Session`] — One live terminal: its id, its position in the font list
//!   and a non-owning link to its [`TerminalSurface`].
//! - [`SessionRegistry`] — Thread-safe `SessionId -> Session` map with a
//!   never-reused id counter.
//! - [`Dispatcher`] — Resolves a [`Request`] to a session and runs the command.
//! - [`ControlServer`] — Accepts loopback connections, one request per connection.

pub mod client;
pub mod command;
pub mod error;
pub mod font;
pub mod protocol;
pub mod registry;
pub mod server;
pub mod session;
pub mod shell;
pub mod surface;

#[cfg(test)]
pub(crate) mod testing;

pub use command::{CommandKind, Dispatcher};
pub use error::ControlError;
pub use font::{Direction, FontSelector};
pub use protocol::{Request, Response, Status, CONTROL_PORT_ENV, SESSION_ID_ENV};
pub use registry::{SessionRegistry, SharedSession};
pub use server::{ControlServer, ServerConfig};
pub use session::{Session, SessionError, SessionId};
pub use shell::ShellDefault;
pub use surface::TerminalSurface;
