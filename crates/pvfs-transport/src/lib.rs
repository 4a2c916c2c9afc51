//! Synchronous message transport — the BMI (Buffered Message Interface)
//! layer of the client core.
//!
//! This is deliberately blocking rather than `async`: the state machine
//! runtime above it (`pvfs-client::sm`) owns its own cooperative
//! scheduling loop and expects `BmiTransport::send`/`recv` to be driven
//! from inside that loop with explicit timeouts, not polled as futures.
//! `smb-transport`'s connection-oriented `Transport` trait is the model
//! for the shape of this trait; the `async fn`s there become blocking
//! `fn`s here and gain an explicit `Duration` budget.

pub mod error;
pub mod tcp;

use std::time::Duration;

pub use error::TransportError;
pub use tcp::TcpBmiTransport;

pub type Result<T> = std::result::Result<T, TransportError>;

/// An opaque, server-assigned address string (`bmi_addr` in
/// [`pvfs_types::ServerDescriptor`]), e.g. `tcp://host:port`.
pub type BmiAddr = str;

/// A connected channel to one server. One instance per server the client
/// is currently talking to; [`pvfs_client::rpc`] pools these keyed by
/// address rather than opening a fresh connection per request.
pub trait BmiTransport: Send {
    /// Sends one complete, already-encoded message frame.
    fn send(&mut self, frame: &[u8], timeout: Duration) -> Result<()>;

    /// Blocks for up to `timeout` waiting for one complete frame.
    /// Returns `Err(TransportError::Timeout)` if none arrives in time —
    /// this is not a connection error, and callers (the RPC retry layer)
    /// treat it as transient.
    fn recv(&mut self, timeout: Duration) -> Result<Vec<u8>>;

    /// Best-effort: tears down the connection so any in-flight `recv` on
    /// another handle to the same transport returns promptly. Used when
    /// the state machine cancels an outstanding job (spec.md §4.3/§4.4
    /// "Cancellation").
    fn cancel(&mut self) -> Result<()>;

    fn peer_addr(&self) -> &str;
}

#[cfg(any(test, feature = "test-util"))]
pub mod test_support {
    //! An in-process, in-memory transport pair for exercising the RPC and
    //! state-machine layers without a real socket. Mirrors the purpose of
    //! `smb/tests/long_dir.rs`'s fixture server, scaled down to the
    //! transport boundary alone.
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Channel {
        to_server: VecDeque<Vec<u8>>,
        to_client: VecDeque<Vec<u8>>,
    }

    pub struct FakeTransport {
        chan: Arc<Mutex<Channel>>,
        is_client: bool,
        addr: String,
    }

    impl FakeTransport {
        pub fn pair(addr: &str) -> (Self, Self) {
            let chan = Arc::new(Mutex::new(Channel::default()));
            (
                FakeTransport { chan: chan.clone(), is_client: true, addr: addr.to_string() },
                FakeTransport { chan, is_client: false, addr: addr.to_string() },
            )
        }
    }

    impl BmiTransport for FakeTransport {
        fn send(&mut self, frame: &[u8], _timeout: Duration) -> Result<()> {
            let mut chan = self.chan.lock().unwrap();
            if self.is_client {
                chan.to_server.push_back(frame.to_vec());
            } else {
                chan.to_client.push_back(frame.to_vec());
            }
            Ok(())
        }

        fn recv(&mut self, timeout: Duration) -> Result<Vec<u8>> {
            let mut chan = self.chan.lock().unwrap();
            let queue = if self.is_client { &mut chan.to_client } else { &mut chan.to_server };
            queue.pop_front().ok_or(TransportError::Timeout(timeout))
        }

        fn cancel(&mut self) -> Result<()> {
            Ok(())
        }

        fn peer_addr(&self) -> &str {
            &self.addr
        }
    }

    #[test]
    fn fake_transport_delivers_in_order() {
        let (mut client, mut server) = FakeTransport::pair("fake://test");
        client.send(b"hello", Duration::from_secs(1)).unwrap();
        client.send(b"world", Duration::from_secs(1)).unwrap();
        assert_eq!(server.recv(Duration::from_secs(1)).unwrap(), b"hello");
        assert_eq!(server.recv(Duration::from_secs(1)).unwrap(), b"world");
    }

    #[test]
    fn recv_times_out_when_empty() {
        let (_client, mut server) = FakeTransport::pair("fake://test");
        let err = server.recv(Duration::from_millis(1)).unwrap_err();
        assert!(matches!(err, TransportError::Timeout(_)));
    }
}
