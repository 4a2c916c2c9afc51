use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connect to {addr} failed: {source}")]
    Connect { addr: String, #[source] source: std::io::Error },

    #[error("send failed: {0}")]
    Send(#[source] std::io::Error),

    #[error("recv failed: {0}")]
    Recv(#[source] std::io::Error),

    #[error("recv timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection closed mid-frame: expected {expected} bytes, got {got}")]
    ShortRead { expected: usize, got: usize },

    #[error("frame length {0} exceeds the transport's maximum message size")]
    FrameTooLarge(u32),

    #[error("operation was cancelled")]
    Cancelled,
}
