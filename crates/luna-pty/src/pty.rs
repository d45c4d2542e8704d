use std::io::{Read, Write};

use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};
use thiserror::Error;

/// Errors from PTY operations.
#[derive(Debug, Error)]
pub enum PtyError {
    #[error("PTY spawn failed: {0}")]
    SpawnFailed(String),

    #[error("PTY I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("PTY resize failed: {0}")]
    ResizeFailed(String),
}

/// Owns a portable-pty child process, master pair, reader, and writer.
///
/// Dropping the handle kills the child.
pub struct PtyHandle {
    master: Box<dyn MasterPty + Send>,
    reader: Box<dyn Read + Send>,
    writer: Box<dyn Write + Send>,
    child: Box<dyn Child + Send + Sync>,
}

impl PtyHandle {
    /// Spawn `shell` on a new PTY of the given size, with `env` added to the
    /// child's environment.
    pub fn spawn(shell: &str, cols: u16, rows: u16, env: &[(&str, String)]) -> Result<Self, PtyError> {
        let pty_system = native_pty_system();

        let pair = pty_system
            .openpty(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| PtyError::SpawnFailed(format!("failed to open PTY: {e}")))?;

        let mut cmd = CommandBuilder::new(shell);
        for (key, value) in env {
            cmd.env(key, value);
        }
        if let Some(home) = std::env::var_os("HOME") {
            cmd.cwd(home);
        }

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| PtyError::SpawnFailed(format!("failed to spawn {shell}: {e}")))?;

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| PtyError::SpawnFailed(format!("failed to clone reader: {e}")))?;

        let writer = pair
            .master
            .take_writer()
            .map_err(|e| PtyError::SpawnFailed(format!("failed to take writer: {e}")))?;

        Ok(Self {
            master: pair.master,
            reader,
            writer,
            child,
        })
    }

    pub fn resize(&self, cols: u16, rows: u16) -> Result<(), PtyError> {
        self.master
            .resize(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| PtyError::ResizeFailed(format!("{e}")))
    }

    /// Write bytes to the PTY master (user input -> shell).
    pub fn write(&mut self, data: &[u8]) -> Result<(), PtyError> {
        self.writer.write_all(data)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Hand the reader over to a dedicated I/O thread.
    ///
    /// Reads block, so they must not happen while the session lock is held.
    /// The handle keeps an empty reader in its place.
    pub fn take_reader(&mut self) -> Box<dyn Read + Send> {
        std::mem::replace(&mut self.reader, Box::new(std::io::empty()))
    }

    /// Returns `None` while the process is still running.
    pub fn try_wait(&mut self) -> Option<u32> {
        match self.child.try_wait() {
            Ok(Some(status)) => Some(status.exit_code()),
            _ => None,
        }
    }

    pub fn process_id(&self) -> Option<u32> {
        self.child.process_id()
    }
}

impl Drop for PtyHandle {
    fn drop(&mut self) {
        if self.try_wait().is_none() {
            if let Err(e) = self.child.kill() {
                log::debug!("failed to kill PTY child: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::{Duration, Instant};

    /// Read until `needle` shows up or the deadline passes.
    pub(crate) fn read_until(reader: &mut Box<dyn Read + Send>, needle: &str) -> String {
        let mut output = Vec::new();
        let mut buf = [0u8; 4096];
        let deadline = Instant::now() + Duration::from_secs(3);

        while Instant::now() < deadline {
            match reader.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => {
                    output.extend_from_slice(&buf[..n]);
                    if String::from_utf8_lossy(&output).contains(needle) {
                        break;
                    }
                }
            }
        }
        String::from_utf8_lossy(&output).into_owned()
    }

    #[test]
    fn test_spawn_pty() {
        let handle = PtyHandle::spawn("/bin/sh", 80, 24, &[]);
        assert!(handle.is_ok(), "Failed to spawn PTY: {:?}", handle.err());
        let mut handle = handle.unwrap();
        assert!(handle.try_wait().is_none());
        assert!(handle.process_id().is_some());
    }

    #[test]
    fn test_spawn_missing_shell_fails() {
        let result = PtyHandle::spawn("/nonexistent/luna-shell", 80, 24, &[]);
        assert!(matches!(result, Err(PtyError::SpawnFailed(_))));
    }

    #[test]
    fn test_write_read_echo() {
        let mut handle = PtyHandle::spawn("/bin/sh", 80, 24, &[]).unwrap();
        let mut reader = handle.take_reader();

        handle.write(b"echo LUNA_TEST_OK\n").unwrap();
        let text = read_until(&mut reader, "LUNA_TEST_OK\r\n");

        assert!(
            text.contains("LUNA_TEST_OK"),
            "Expected output to contain LUNA_TEST_OK, got: {text}"
        );
    }

    #[test]
    fn test_env_is_injected() {
        let env = [("LUNA_TEST_VALUE", "injected-42".to_string())];
        let mut handle = PtyHandle::spawn("/bin/sh", 80, 24, &env).unwrap();
        let mut reader = handle.take_reader();

        handle.write(b"echo \"value=$LUNA_TEST_VALUE\"\n").unwrap();
        let text = read_until(&mut reader, "value=injected-42");

        assert!(text.contains("value=injected-42"), "got: {text}");
    }

    #[test]
    fn test_resize() {
        let handle = PtyHandle::spawn("/bin/sh", 80, 24, &[]).unwrap();
        let result = handle.resize(120, 40);
        assert!(result.is_ok(), "Resize failed: {:?}", result.err());
    }

    #[test]
    fn test_child_exit() {
        let mut handle = PtyHandle::spawn("/bin/sh", 80, 24, &[]).unwrap();
        let mut reader = handle.take_reader();
        handle.write(b"exit 0\n").unwrap();

        // Drain until EOF so the child is not blocked on a full PTY buffer.
        let drain = thread::spawn(move || {
            let mut buf = [0u8; 4096];
            while let Ok(n) = reader.read(&mut buf) {
                if n == 0 {
                    break;
                }
            }
        });
        let _ = drain.join();

        let deadline = Instant::now() + Duration::from_secs(3);
        let mut exit_code = None;
        while Instant::now() < deadline {
            exit_code = handle.try_wait();
            if exit_code.is_some() {
                break;
            }
            thread::sleep(Duration::from_millis(50));
        }

        assert_eq!(exit_code, Some(0));
    }
}
