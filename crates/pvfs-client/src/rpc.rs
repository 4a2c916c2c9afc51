//! Message Array / RPC layer — C3.
//!
//! A [`MessagePair`] is one outbound request and its matched inbound
//! reply addressed to one server. A [`MessageArray`] is a parallel batch
//! of pairs plus shared retry/timeout policy.
//!
//! Reference: spec.md §4.3.

use std::time::{Duration, Instant};

use pvfs_msg::{Header, OpCode, ReplyBody, RequestBody, StatusCode, TransientKind};
use pvfs_types::FsId;

use crate::context::CoreContext;
use crate::error::{Error, Result};

/// Defaults per spec.md §4.3: 30 s job timeout, 5 retries, 2000 ms delay.
#[derive(Debug, Clone, Copy)]
pub struct RpcPolicy {
    pub job_timeout: Duration,
    pub retry_limit: u32,
    pub retry_delay: Duration,
    pub scheduling_context: u32,
}

impl Default for RpcPolicy {
    fn default() -> Self {
        Self {
            job_timeout: Duration::from_secs(30),
            retry_limit: 5,
            retry_delay: Duration::from_millis(2000),
            scheduling_context: 0,
        }
    }
}

/// Transient failures worth retrying (spec.md §4.3 step 5's "listed set").
/// `server-out-of-memory` surfaces here as `StatusCode::ENOMEM` from a
/// decoded reply, not as a [`pvfs_transport::TransportError`].
fn transport_error_is_transient(e: &pvfs_transport::TransportError) -> bool {
    use pvfs_transport::TransportError::*;
    matches!(e, Timeout(_) | Connect { .. } | Send(_) | Recv(_))
}

enum PairState {
    Unsent,
    WaitingReply { sent_at: Instant },
    WaitingRetry { retry_at: Instant },
    Done(ReplyBody),
    /// A permanent failure, or a transient one that exhausted `retry_limit`.
    Failed(Error),
}

pub struct MessagePair {
    pub server_addr: String,
    header: Header,
    request: RequestBody,
    attempt: u32,
    state: PairState,
}

impl MessagePair {
    pub fn new(server_addr: impl Into<String>, tag: u64, fs_id: FsId, request: RequestBody) -> Self {
        let header = Header::new(request.op_code(), tag, fs_id);
        Self { server_addr: server_addr.into(), header, request, attempt: 0, state: PairState::Unsent }
    }

    pub fn attempts(&self) -> u32 {
        self.attempt
    }
}

/// Outcome of polling one pair to completion: either the decoded reply
/// body, or the error — transport-level or a permanent server status —
/// that this pair ultimately failed with.
pub type PairOutcome = std::result::Result<ReplyBody, Error>;

pub enum MessageArrayStatus {
    InProgress,
    Done(Vec<PairOutcome>),
}

pub struct MessageArray {
    policy: RpcPolicy,
    pairs: Vec<MessagePair>,
    cancelled: bool,
}

impl MessageArray {
    pub fn new(policy: RpcPolicy) -> Self {
        Self { policy, pairs: Vec::new(), cancelled: false }
    }

    pub fn push(&mut self, server_addr: impl Into<String>, tag: u64, fs_id: FsId, request: RequestBody) {
        self.pairs.push(MessagePair::new(server_addr, tag, fs_id, request));
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    /// Sends every pair currently in [`PairState::Unsent`]. Safe to call
    /// repeatedly — only unsent pairs are touched, so re-posting after a
    /// retry delay elapses is a no-op for pairs already in flight.
    fn send_unsent(&mut self, ctx: &CoreContext) {
        let job_timeout = self.policy.job_timeout;
        for pair in &mut self.pairs {
            let should_send = matches!(pair.state, PairState::Unsent)
                || matches!(pair.state, PairState::WaitingRetry { retry_at } if Instant::now() >= retry_at);
            if !should_send {
                continue;
            }
            let frame = match pvfs_msg::encode_request(&pair.header, &pair.request) {
                Ok(f) => f,
                Err(e) => {
                    pair.state = PairState::Failed(Error::Msg(e));
                    continue;
                }
            };
            let send_result = ctx.transports.with_connection(&pair.server_addr, job_timeout, |t| {
                t.send(&frame, job_timeout)
            });
            match send_result {
                Ok(Ok(())) => {
                    pair.attempt += 1;
                    pair.state = PairState::WaitingReply { sent_at: Instant::now() };
                    log::trace!(
                        "rpc: sent {:?} to {} (attempt {})",
                        pair.header.op_code, pair.server_addr, pair.attempt
                    );
                }
                Ok(Err(e)) | Err(e) => {
                    ctx.transports.drop_connection(&pair.server_addr);
                    Self::handle_transport_failure(pair, e, self.policy);
                }
            }
        }
    }

    fn handle_transport_failure(pair: &mut MessagePair, e: pvfs_transport::TransportError, policy: RpcPolicy) {
        let transient = transport_error_is_transient(&e);
        if transient && pair.attempt < policy.retry_limit {
            log::warn!(
                "rpc: transient failure talking to {} ({e}), retrying ({}/{})",
                pair.server_addr, pair.attempt, policy.retry_limit
            );
            pair.state = PairState::WaitingRetry { retry_at: Instant::now() + policy.retry_delay };
        } else {
            pair.state = PairState::Failed(Error::Transport(e));
        }
    }

    /// Advances every pair by up to `budget`, retrying transient failures
    /// per policy. Returns [`MessageArrayStatus::Done`] once every pair
    /// has reached [`PairState::Done`] or [`PairState::Failed`].
    pub fn poll(&mut self, ctx: &CoreContext, budget: Duration) -> MessageArrayStatus {
        if self.cancelled {
            return MessageArrayStatus::Done(
                self.pairs.iter().map(|_| Err(Error::Cancelled)).collect(),
            );
        }

        let deadline = Instant::now() + budget;
        self.send_unsent(ctx);

        loop {
            let mut all_terminal = true;
            for i in 0..self.pairs.len() {
                if matches!(self.pairs[i].state, PairState::Done(_) | PairState::Failed(_)) {
                    continue;
                }
                all_terminal = false;
                if let PairState::WaitingReply { .. } = self.pairs[i].state {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        continue;
                    }
                    self.poll_one_reply(ctx, i, remaining.min(self.policy.job_timeout));
                }
            }
            self.send_unsent(ctx);

            if all_terminal {
                break;
            }
            if Instant::now() >= deadline {
                break;
            }
            // Nothing more to usefully do within this tick once every
            // in-flight pair has been offered a `recv` once; the caller's
            // next `poll` call will continue where this left off.
            if self.pairs.iter().all(|p| !matches!(p.state, PairState::WaitingReply { .. })) {
                break;
            }
        }

        if self.pairs.iter().all(|p| matches!(p.state, PairState::Done(_) | PairState::Failed(_))) {
            let results = self
                .pairs
                .iter_mut()
                .map(|p| match std::mem::replace(&mut p.state, PairState::Unsent) {
                    PairState::Done(body) => Ok(body),
                    PairState::Failed(e) => Err(e),
                    other => {
                        // Restore the state we just took; unreachable in
                        // practice since we only entered this branch when
                        // every pair was terminal.
                        p.state = other;
                        Err(Error::Cancelled)
                    }
                })
                .collect();
            MessageArrayStatus::Done(results)
        } else {
            MessageArrayStatus::InProgress
        }
    }

    fn poll_one_reply(&mut self, ctx: &CoreContext, idx: usize, slice: Duration) {
        let addr = self.pairs[idx].server_addr.clone();
        let recv_result = ctx.transports.with_connection(&addr, self.policy.job_timeout, |t| t.recv(slice));
        let frame = match recv_result {
            Ok(Ok(f)) => f,
            Ok(Err(pvfs_transport::TransportError::Timeout(_))) => {
                // Nothing arrived within this tick's slice. On its own this
                // isn't a transport failure — a blocking transport handed a
                // short slice (or a non-blocking one like FakeTransport) is
                // expected to time out on every tick until a reply shows up.
                // Only escalate to a retryable failure once the pair has
                // been waiting longer than its whole job_timeout budget.
                if let PairState::WaitingReply { sent_at } = self.pairs[idx].state {
                    if Instant::now().duration_since(sent_at) >= self.policy.job_timeout {
                        Self::handle_transport_failure(
                            &mut self.pairs[idx],
                            pvfs_transport::TransportError::Timeout(slice),
                            self.policy,
                        );
                    }
                }
                return;
            }
            Ok(Err(e)) | Err(e) => {
                ctx.transports.drop_connection(&addr);
                Self::handle_transport_failure(&mut self.pairs[idx], e, self.policy);
                return;
            }
        };

        let (header, body) = match pvfs_msg::decode_reply(&frame) {
            Ok(v) => v,
            Err(e) => {
                self.pairs[idx].state = PairState::Failed(Error::Msg(e));
                return;
            }
        };
        if header.op_code != self.pairs[idx].header.op_code || header.tag != self.pairs[idx].header.tag {
            self.pairs[idx].state = PairState::Failed(Error::Server {
                server: addr,
                status: StatusCode::EINVAL,
            });
            return;
        }

        let status = pvfs_msg::codec::reply_status(&body);
        if status.is_success() {
            self.pairs[idx].state = PairState::Done(body);
            return;
        }

        match status.classify() {
            TransientKind::Transient if self.pairs[idx].attempt < self.policy.retry_limit => {
                log::warn!(
                    "rpc: {:?} to {} returned {:?}, retrying ({}/{})",
                    self.pairs[idx].header.op_code, addr, status, self.pairs[idx].attempt, self.policy.retry_limit
                );
                self.pairs[idx].state =
                    PairState::WaitingRetry { retry_at: Instant::now() + self.policy.retry_delay };
            }
            _ => {
                self.pairs[idx].state = PairState::Failed(Error::Server { server: addr, status });
            }
        }
    }

    /// Cancels the batch: in-flight sends complete or abort at the
    /// transport's discretion, receives are dropped, and every
    /// not-yet-terminal pair reports [`Error::Cancelled`] on the next
    /// [`MessageArray::poll`]. Idempotent (spec.md §5 "Cancellation is
    /// idempotent").
    pub fn cancel(&mut self, ctx: &CoreContext) {
        if self.cancelled {
            return;
        }
        self.cancelled = true;
        for pair in &self.pairs {
            if matches!(pair.state, PairState::WaitingReply { .. }) {
                ctx.transports.cancel(&pair.server_addr);
            }
        }
    }

    pub fn op_code(&self) -> Option<OpCode> {
        self.pairs.first().map(|p| p.header.op_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CoreContext;
    use crate::transport_pool::Connector;
    use pvfs_msg::ops::{GetattrReply, GetattrRequest};
    use pvfs_msg::wire_attr::WireObjectAttributes;
    use pvfs_msg::wire_sec::WireCapability;
    use pvfs_transport::test_support::FakeTransport;
    use pvfs_types::{Handle, ObjectAttributes, ObjectRef};
    use std::sync::Mutex;

    struct FixedConnector(Mutex<Option<FakeTransport>>);
    impl Connector for FixedConnector {
        fn connect(
            &self,
            _addr: &str,
            _timeout: Duration,
        ) -> pvfs_transport::Result<Box<dyn pvfs_transport::BmiTransport>> {
            Ok(Box::new(self.0.lock().unwrap().take().expect("single use in test")))
        }
    }

    fn getattr_request() -> RequestBody {
        RequestBody::Getattr(GetattrRequest {
            target: ObjectRef::new(Handle(1), FsId(1)),
            requested_mask: 0,
            capability: WireCapability {
                issuer: String::new(),
                fs_id: FsId(1),
                timeout: 0,
                op_mask: 0,
                handle_set: vec![].into(),
                sig: pvfs_msg::wire_util::WireBytes(vec![]),
            },
        })
    }

    #[test]
    fn single_pair_completes_on_success_reply() {
        let (client, mut server) = FakeTransport::pair("fake://srv");
        let ctx = CoreContext::for_test(Box::new(FixedConnector(Mutex::new(Some(client)))));

        let mut arr = MessageArray::new(RpcPolicy::default());
        arr.push("fake://srv", 1, FsId(1), getattr_request());

        // Drive one poll tick to perform the send.
        assert!(matches!(arr.poll(&ctx, Duration::from_millis(10)), MessageArrayStatus::InProgress));

        let req_frame = server.recv(Duration::from_secs(1)).unwrap();
        let (header, _) = pvfs_msg::decode_request(&req_frame).unwrap();
        let reply = ReplyBody::Getattr(GetattrReply {
            status: StatusCode::Success,
            attrs: WireObjectAttributes::from(&ObjectAttributes::empty()),
        });
        let reply_frame = pvfs_msg::encode_reply(&header, &reply).unwrap();
        server.send(&reply_frame, Duration::from_secs(1)).unwrap();

        match arr.poll(&ctx, Duration::from_millis(100)) {
            MessageArrayStatus::Done(results) => {
                assert_eq!(results.len(), 1);
                assert!(results[0].is_ok());
            }
            MessageArrayStatus::InProgress => panic!("expected completion"),
        }
    }

    #[test]
    fn permanent_status_fails_without_retrying() {
        let (client, mut server) = FakeTransport::pair("fake://srv");
        let ctx = CoreContext::for_test(Box::new(FixedConnector(Mutex::new(Some(client)))));

        let mut arr = MessageArray::new(RpcPolicy::default());
        arr.push("fake://srv", 1, FsId(1), getattr_request());
        arr.poll(&ctx, Duration::from_millis(10));

        let req_frame = server.recv(Duration::from_secs(1)).unwrap();
        let (header, _) = pvfs_msg::decode_request(&req_frame).unwrap();
        let reply = ReplyBody::Getattr(GetattrReply {
            status: StatusCode::ENOENT,
            attrs: WireObjectAttributes::from(&ObjectAttributes::empty()),
        });
        let reply_frame = pvfs_msg::encode_reply(&header, &reply).unwrap();
        server.send(&reply_frame, Duration::from_secs(1)).unwrap();

        match arr.poll(&ctx, Duration::from_millis(100)) {
            MessageArrayStatus::Done(results) => {
                assert!(matches!(&results[0], Err(Error::Server { status: StatusCode::ENOENT, .. })));
            }
            MessageArrayStatus::InProgress => panic!("expected completion"),
        }
    }

    #[test]
    fn cancel_marks_in_flight_pairs_cancelled() {
        let (client, _server) = FakeTransport::pair("fake://srv");
        let ctx = CoreContext::for_test(Box::new(FixedConnector(Mutex::new(Some(client)))));

        let mut arr = MessageArray::new(RpcPolicy::default());
        arr.push("fake://srv", 1, FsId(1), getattr_request());
        arr.poll(&ctx, Duration::from_millis(10));
        arr.cancel(&ctx);
        arr.cancel(&ctx); // idempotent

        match arr.poll(&ctx, Duration::from_millis(10)) {
            MessageArrayStatus::Done(results) => {
                assert!(matches!(&results[0], Err(Error::Cancelled)));
            }
            MessageArrayStatus::InProgress => panic!("cancellation should resolve immediately"),
        }
    }
}
