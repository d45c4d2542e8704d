//! luna-pty: PTY management and terminal session lifecycle for Luna.
//!
//! This crate sits between the PTY (real shell process) and the VT terminal
//! (screen state). Shells are spawned with the control server's port and
//! their own session id in the environment so tools running inside them can
//! talk back to Luna.
//!
//! # Architecture
//!
//! - [`PtyHandle`] — Low-level PTY process management (spawn, read, write, resize).
//! - [`TerminalSession`] — Pairs a `PtyHandle` with a `VtTerminal`.

pub mod pty;
pub mod session;

pub use pty::{PtyError, PtyHandle};
pub use session::{session_env, FeedOutcome, TerminalSession};
