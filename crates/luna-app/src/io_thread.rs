//! Per-window I/O thread that reads PTY output and feeds it into the VT terminal.
//!
//! Each window gets its own dedicated OS thread because PTY reads are
//! blocking. The PTY reader is owned by the thread directly (not behind the
//! surface lock), so blocking reads don't hold up control requests or the
//! host. The thread only holds a `Weak` to the surface: closing the window
//! drops the surface, kills the child, and the next read ends the loop.

use std::io::{self, Read};
use std::sync::Weak;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use luna_core::SessionId;
use tokio::sync::mpsc;

use crate::host::HostEvent;
use crate::surface::SessionSurface;

/// How long to wait for the exit status once the PTY reports EOF.
const EXIT_STATUS_WAIT: Duration = Duration::from_millis(500);

pub fn start_io_thread(
    id: SessionId,
    surface: Weak<SessionSurface>,
    reader: Box<dyn Read + Send>,
    events: mpsc::Sender<HostEvent>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("pty-io-{id}"))
        .spawn(move || io_loop(id, surface, reader, events))
}

fn io_loop(
    id: SessionId,
    surface: Weak<SessionSurface>,
    mut reader: Box<dyn Read + Send>,
    events: mpsc::Sender<HostEvent>,
) {
    let mut buf = [0u8; 65536];

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            // EIO is how Linux reports a PTY whose child has gone away.
            Err(_) => break,
        };

        let Some(surface) = surface.upgrade() else {
            // Window already closed.
            return;
        };

        // Lock session briefly to feed bytes into VT and handle write-backs.
        let outcome = surface.lock().feed(&buf[..n]);
        match outcome {
            Ok(outcome) => {
                if let Some(title) = outcome.title {
                    let _ = events.blocking_send(HostEvent::TitleChanged { id, title });
                }
                if outcome.bell {
                    let _ = events.blocking_send(HostEvent::Bell { id });
                }
            }
            Err(e) => log::warn!("session {id}: failed to answer terminal query: {e}"),
        }
    }

    let code = wait_for_exit(&surface);
    let _ = events.blocking_send(HostEvent::ChildExited { id, code });
}

/// EOF can arrive slightly before the child is reapable; poll briefly.
fn wait_for_exit(surface: &Weak<SessionSurface>) -> Option<u32> {
    let deadline = Instant::now() + EXIT_STATUS_WAIT;
    loop {
        let surface = surface.upgrade()?;
        if let Some(code) = surface.lock().exit_code() {
            return Some(code);
        }
        drop(surface);
        if Instant::now() >= deadline {
            return None;
        }
        thread::sleep(Duration::from_millis(10));
    }
}
