//! Loopback TCP server for the control protocol.
//!
//! Each accepted connection gets its own tokio task, so a client that is slow
//! to send its line never holds up the accept loop or other clients.

use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::command::Dispatcher;
use crate::error::ControlError;
use crate::protocol::Response;

/// Upper bound on a request line. Longer lines are answered with an error.
const MAX_LINE_BYTES: u64 = 64 * 1024;

/// Pause after a failed `accept` (e.g. out of file descriptors) before retrying.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: IpAddr,
    /// 0 picks an ephemeral port.
    pub port: u16,
    /// Drop connections that have not delivered a full line in this long.
    /// `None` waits for as long as the client keeps the connection open.
    pub idle_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            idle_timeout: None,
        }
    }
}

pub struct ControlServer {
    listener: TcpListener,
    dispatcher: Arc<Dispatcher>,
    idle_timeout: Option<Duration>,
}

impl ControlServer {
    pub async fn bind(config: &ServerConfig, dispatcher: Arc<Dispatcher>) -> io::Result<Self> {
        let listener = TcpListener::bind((config.bind, config.port)).await?;
        log::info!("control server listening on {}", listener.local_addr()?);
        Ok(Self {
            listener,
            dispatcher,
            idle_timeout: config.idle_timeout,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Run the server on the current runtime until `stop_rx` fires or its
    /// sender is dropped.
    pub fn start(self, stop_rx: mpsc::Receiver<()>) -> JoinHandle<()> {
        tokio::spawn(self.run(stop_rx))
    }

    /// Accept connections until `stop_rx` fires or its sender is dropped.
    pub async fn run(self, mut stop_rx: mpsc::Receiver<()>) {
        loop {
            let accepted = tokio::select! {
                accepted = self.listener.accept() => accepted,
                _ = stop_rx.recv() => break,
            };

            match accepted {
                Ok((stream, peer)) => {
                    let dispatcher = Arc::clone(&self.dispatcher);
                    let idle_timeout = self.idle_timeout;
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, &dispatcher, idle_timeout).await {
                            log::debug!("control connection from {peer} failed: {e}");
                        }
                    });
                }
                Err(e) => {
                    log::warn!("control server accept failed: {e}");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            }
        }
        log::info!("control server stopped");
    }
}

/// Serve one request on one connection.
///
/// A client that closes the connection (or idles out) before finishing its
/// line gets no response; that is not an error.
async fn handle_connection(
    stream: TcpStream,
    dispatcher: &Dispatcher,
    idle_timeout: Option<Duration>,
) -> io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader).take(MAX_LINE_BYTES);
    let mut line = Vec::new();

    let read = reader.read_until(b'\n', &mut line);
    let n = match idle_timeout {
        Some(limit) => match tokio::time::timeout(limit, read).await {
            Ok(result) => result?,
            Err(_) => {
                log::debug!("control connection idle for {limit:?}, dropping");
                return Ok(());
            }
        },
        None => read.await?,
    };

    let response = if line.last() == Some(&b'\n') {
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        match String::from_utf8(line) {
            Ok(text) => dispatcher.handle_line(&text),
            Err(e) => Response::error(&ControlError::MalformedRequest(e.to_string())),
        }
    } else if n as u64 >= MAX_LINE_BYTES {
        Response::error(&ControlError::MalformedRequest(format!(
            "request line longer than {MAX_LINE_BYTES} bytes"
        )))
    } else {
        // Closed before a full line arrived.
        return Ok(());
    };

    writer.write_all(response.encode().as_bytes()).await?;
    writer.flush().await?;
    writer.shutdown().await?;
    Ok(())
}
