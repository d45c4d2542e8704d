//! Wire format of the control protocol.
//!
//! One TCP connection carries one request line and one response line, each a
//! single JSON object terminated by `\n`:
//!
//! ```text
//! -> {"cmd":"font","id":3,"font":"TestFont 9"}
//! <- {"status":"OK","message":"TestFont"}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ControlError;
use crate::session::SessionId;

/// Environment variable carrying the control server's port (decimal) into
/// every spawned shell.
pub const CONTROL_PORT_ENV: &str = "LUNA_CONTROL_PORT";

/// Environment variable carrying the session's own id (decimal) into its shell.
pub const SESSION_ID_ENV: &str = "LUNA_SESSION_ID";

/// Message sent back when a command succeeds without a value to report.
pub const OK_PLACEHOLDER: &str = "OK";

/// A decoded request: command name, target session and named arguments.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub cmd: String,
    pub id: SessionId,
    /// Command-specific keys such as `font` or `shell`.
    #[serde(flatten)]
    pub args: Map<String, Value>,
}

impl Request {
    pub fn new(cmd: impl Into<String>, id: SessionId) -> Self {
        Self {
            cmd: cmd.into(),
            id,
            args: Map::new(),
        }
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(key.into(), value.into());
        self
    }

    /// Decode one request line (without its trailing newline).
    pub fn decode(line: &str) -> Result<Self, ControlError> {
        serde_json::from_str(line).map_err(|e| ControlError::MalformedRequest(e.to_string()))
    }

    /// Encode as a newline-terminated line.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "ERROR")]
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: Status,
    pub message: String,
}

impl Response {
    pub fn ok(message: Option<String>) -> Self {
        Self {
            status: Status::Ok,
            message: message.unwrap_or_else(|| OK_PLACEHOLDER.to_string()),
        }
    }

    pub fn error(err: &ControlError) -> Self {
        Self {
            status: Status::Error,
            message: err.to_string(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }

    pub fn decode(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }

    /// Encode as a newline-terminated line.
    pub fn encode(&self) -> String {
        let mut line = match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => {
                log::error!("failed to encode control response: {e}");
                r#"{"status":"ERROR","message":"internal encoding error"}"#.to_string()
            }
        };
        line.push('\n');
        line
    }
}
