//! Length-prefixed TCP framing of [`crate::BmiTransport`].
//!
//! Frames are `{len: u32 LE}{payload: len bytes}`. PVFS's real BMI layer
//! supports several underlying transports (TCP, InfiniBand, GM); this
//! client core only needs one concrete implementation to drive the state
//! machine runtime above it; the trait is the extension point for others.

use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use crate::error::TransportError;
use crate::{BmiTransport, Result};

/// Maximum frame size accepted on `recv`, guarding against a corrupt or
/// malicious length prefix turning into an unbounded allocation.
pub const MAX_FRAME_LEN: u32 = 64 * 1024 * 1024;

pub struct TcpBmiTransport {
    stream: TcpStream,
    addr: String,
}

impl TcpBmiTransport {
    pub fn connect(addr: &str, timeout: Duration) -> Result<Self> {
        let socket_addrs: Vec<_> = addr
            .trim_start_matches("tcp://")
            .to_socket_addrs()
            .map_err(|e| TransportError::Connect { addr: addr.to_string(), source: e })?
            .collect();
        let target = socket_addrs
            .first()
            .ok_or_else(|| TransportError::Connect {
                addr: addr.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses resolved"),
            })?;
        let stream = TcpStream::connect_timeout(target, timeout)
            .map_err(|e| TransportError::Connect { addr: addr.to_string(), source: e })?;
        stream.set_nodelay(true).ok();
        Ok(Self { stream, addr: addr.to_string() })
    }

    pub fn from_stream(stream: TcpStream, addr: String) -> Self {
        Self { stream, addr }
    }
}

impl BmiTransport for TcpBmiTransport {
    fn send(&mut self, frame: &[u8], timeout: Duration) -> Result<()> {
        self.stream.set_write_timeout(Some(timeout)).map_err(TransportError::Send)?;
        let len = frame.len() as u32;
        self.stream.write_all(&len.to_le_bytes()).map_err(TransportError::Send)?;
        self.stream.write_all(frame).map_err(TransportError::Send)?;
        Ok(())
    }

    fn recv(&mut self, timeout: Duration) -> Result<Vec<u8>> {
        self.stream.set_read_timeout(Some(timeout)).map_err(TransportError::Recv)?;

        let mut len_buf = [0u8; 4];
        if let Err(e) = self.stream.read_exact(&mut len_buf) {
            return Err(match e.kind() {
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut => {
                    TransportError::Timeout(timeout)
                }
                _ => TransportError::Recv(e),
            });
        }
        let len = u32::from_le_bytes(len_buf);
        if len > MAX_FRAME_LEN {
            return Err(TransportError::FrameTooLarge(len));
        }

        let mut payload = vec![0u8; len as usize];
        self.stream.read_exact(&mut payload).map_err(|e| {
            if matches!(e.kind(), std::io::ErrorKind::UnexpectedEof) {
                TransportError::ShortRead { expected: len as usize, got: 0 }
            } else {
                TransportError::Recv(e)
            }
        })?;
        Ok(payload)
    }

    fn cancel(&mut self) -> Result<()> {
        self.stream
            .shutdown(std::net::Shutdown::Both)
            .map_err(TransportError::Send)?;
        Ok(())
    }

    fn peer_addr(&self) -> &str {
        &self.addr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn round_trips_a_frame_over_a_real_socket() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut t = TcpBmiTransport::from_stream(stream, "server".into());
            let frame = t.recv(Duration::from_secs(2)).unwrap();
            t.send(&frame, Duration::from_secs(2)).unwrap();
        });

        let mut client = TcpBmiTransport::connect(&addr.to_string(), Duration::from_secs(2)).unwrap();
        client.send(b"ping", Duration::from_secs(2)).unwrap();
        let reply = client.recv(Duration::from_secs(2)).unwrap();
        assert_eq!(reply, b"ping");

        server.join().unwrap();
    }

    #[test]
    fn oversized_length_prefix_is_rejected() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let server = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            stream.write_all(&(MAX_FRAME_LEN + 1).to_le_bytes()).unwrap();
        });
        let mut client = TcpBmiTransport::connect(&addr.to_string(), Duration::from_secs(2)).unwrap();
        let err = client.recv(Duration::from_secs(2)).unwrap_err();
        assert!(matches!(err, TransportError::FrameTooLarge(_)));
        server.join().unwrap();
    }
}
