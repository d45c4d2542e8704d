//! Client side of the control protocol, for tools running inside a session.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpStream, ToSocketAddrs};
use thiserror::Error;

use crate::protocol::{Request, Response};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("control connection failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid control message: {0}")]
    Json(#[from] serde_json::Error),

    #[error("server closed the connection without replying")]
    NoResponse,
}

/// Send one request and wait for its response.
pub async fn request(addr: impl ToSocketAddrs, request: &Request) -> Result<Response, ClientError> {
    let stream = TcpStream::connect(addr).await?;
    let (reader, mut writer) = stream.into_split();

    writer.write_all(request.encode()?.as_bytes()).await?;
    writer.flush().await?;

    let mut line = String::new();
    let n = BufReader::new(reader).read_line(&mut line).await?;
    if n == 0 {
        return Err(ClientError::NoResponse);
    }

    Ok(Response::decode(line.trim_end())?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_no_response() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            drop(stream);
        });

        let result = request(addr, &Request::new("font", 1)).await;
        assert!(matches!(
            result,
            Err(ClientError::NoResponse) | Err(ClientError::Io(_))
        ));
    }

    #[tokio::test]
    async fn test_reads_single_line_reply() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (reader, mut writer) = stream.into_split();
            let mut line = String::new();
            BufReader::new(reader).read_line(&mut line).await.unwrap();
            assert_eq!(line, "{\"cmd\":\"shell\",\"id\":2}\n");
            writer
                .write_all(b"{\"status\":\"OK\",\"message\":\"/bin/sh\"}\n")
                .await
                .unwrap();
        });

        let response = request(addr, &Request::new("shell", 2)).await.unwrap();
        assert!(response.is_ok());
        assert_eq!(response.message, "/bin/sh");
    }
}
