use thiserror::Error;

use crate::session::SessionId;

/// Everything a control request can fail with.
///
/// The `Display` text is what the client sees in the `message` field of an
/// `ERROR` response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlError {
    #[error("No command by that name")]
    UnknownCommand(String),

    #[error("No session with id {0}")]
    SessionNotFound(SessionId),

    #[error("{0}")]
    CommandFailed(String),

    #[error("Malformed request: {0}")]
    MalformedRequest(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            ControlError::UnknownCommand("frobnicate".into()).to_string(),
            "No command by that name"
        );
        assert_eq!(
            ControlError::SessionNotFound(999).to_string(),
            "No session with id 999"
        );
        assert_eq!(
            ControlError::CommandFailed("bad argument".into()).to_string(),
            "bad argument"
        );
        assert!(ControlError::MalformedRequest("EOF".into())
            .to_string()
            .starts_with("Malformed request: "));
    }
}
