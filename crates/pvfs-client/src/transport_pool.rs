//! Keyed pool of [`BmiTransport`] connections, one per distinct server
//! address, so the RPC layer (`crate::rpc`) reuses a live connection
//! across message pairs instead of reconnecting per request.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use pvfs_transport::{BmiTransport, TcpBmiTransport};

/// Opens a fresh transport to a server address. Swappable so tests can
/// substitute [`pvfs_transport::test_support::FakeTransport`] without the
/// pool knowing the difference.
pub trait Connector: Send + Sync {
    fn connect(&self, addr: &str, timeout: Duration) -> pvfs_transport::Result<Box<dyn BmiTransport>>;
}

pub struct TcpConnector;

impl Connector for TcpConnector {
    fn connect(&self, addr: &str, timeout: Duration) -> pvfs_transport::Result<Box<dyn BmiTransport>> {
        Ok(Box::new(TcpBmiTransport::connect(addr, timeout)?))
    }
}

pub struct TransportPool {
    connector: Box<dyn Connector>,
    conns: Mutex<HashMap<String, Box<dyn BmiTransport>>>,
}

impl TransportPool {
    pub fn new(connector: Box<dyn Connector>) -> Self {
        Self { connector, conns: Mutex::new(HashMap::new()) }
    }

    /// Runs `f` against the (possibly newly-opened) connection for `addr`.
    pub fn with_connection<R>(
        &self,
        addr: &str,
        connect_timeout: Duration,
        f: impl FnOnce(&mut dyn BmiTransport) -> R,
    ) -> pvfs_transport::Result<R> {
        let mut conns = self.conns.lock().unwrap();
        if !conns.contains_key(addr) {
            let conn = self.connector.connect(addr, connect_timeout)?;
            conns.insert(addr.to_string(), conn);
        }
        let transport = conns.get_mut(addr).expect("just inserted");
        Ok(f(transport.as_mut()))
    }

    /// Discards a pooled connection after it's seen a structural or
    /// connection-level failure, so the next request reconnects instead of
    /// reusing a stream left in an unknown state.
    pub fn drop_connection(&self, addr: &str) {
        self.conns.lock().unwrap().remove(addr);
    }

    /// Best-effort cancel of every pooled connection — used when a caller
    /// cancels an op id whose message array has pairs outstanding on
    /// several servers at once (spec.md §5 "Cancellation").
    pub fn cancel_all(&self) {
        for t in self.conns.lock().unwrap().values_mut() {
            let _ = t.cancel();
        }
    }

    pub fn cancel(&self, addr: &str) {
        if let Some(t) = self.conns.lock().unwrap().get_mut(addr) {
            let _ = t.cancel();
        }
    }
}
