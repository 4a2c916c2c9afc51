//! State Machine Runtime — C4.
//!
//! Operations are declared as nested state machines: a frame stack inside
//! the [`Smcb`], each frame an explicit `Box<dyn SmState>`. The runtime is
//! single-threaded cooperative per scheduling context (spec.md §4.4/§5):
//! a state's [`SmState::step`] runs to completion and returns either
//! [`StepOutcome::Complete`] (transition immediately), [`StepOutcome::Push`]
//! (invoke a nested SM, pushing its frame), or [`StepOutcome::Deferred`]
//! (the state posted a [`MessageArray`] and must be resumed once it
//! progresses).
//!
//! Reference: spec.md §4.4, §9 "Coroutine-like control flow" design note.

use std::time::{Duration, Instant};

use pvfs_msg::StatusCode;
use pvfs_types::Credential;

use crate::context::CoreContext;
use crate::id_table::OpId;
use crate::rpc::{MessageArray, MessageArrayStatus};

/// What an [`SmState::step`] is being invoked with.
pub enum Resume {
    /// First invocation of this frame.
    Start,
    /// The [`MessageArray`] this frame posted last time has completed.
    Deferred(Vec<crate::rpc::PairOutcome>),
    /// A nested SM frame this state pushed has popped with this result.
    ChildComplete(StatusCode),
}

pub enum StepOutcome {
    /// This frame is finished; pop it and surface `StatusCode` to the
    /// parent frame (or as the SM's overall result if this was the last
    /// frame on the stack).
    Complete(StatusCode),
    /// Posts a [`MessageArray`]; the runtime sends it and resumes this
    /// frame with [`Resume::Deferred`] once it completes.
    Deferred(MessageArray),
    /// Pushes a nested SM frame; the runtime resumes `self` with
    /// [`Resume::ChildComplete`] once the child frame completes.
    Push(Box<dyn SmState>),
}

pub trait SmState: Send {
    /// A short name for logging — e.g. `"lookup:resolve_segment"`.
    fn name(&self) -> &'static str;
    fn step(&mut self, resume: Resume, ctx: &CoreContext) -> StepOutcome;
}

struct Frame {
    state: Box<dyn SmState>,
    pending: Option<MessageArray>,
}

/// The runtime object of a live operation (spec.md §3 "SM control block").
pub struct Smcb {
    pub op_type: &'static str,
    pub cred: Credential,
    pub error_code: Option<StatusCode>,
    frame_stack: Vec<Frame>,
    pending_child_result: Option<StatusCode>,
    cancelled: bool,
}

impl Smcb {
    pub fn new(op_type: &'static str, cred: Credential) -> Self {
        Self {
            op_type,
            cred,
            error_code: None,
            frame_stack: Vec::new(),
            pending_child_result: None,
            cancelled: false,
        }
    }

    pub fn push_root(&mut self, state: Box<dyn SmState>) {
        self.frame_stack.push(Frame { state, pending: None });
    }

    pub fn is_terminal(&self) -> bool {
        self.frame_stack.is_empty() && self.error_code.is_some()
    }

    pub fn request_cancel(&mut self, ctx: &CoreContext) {
        self.cancelled = true;
        for frame in &mut self.frame_stack {
            if let Some(arr) = &mut frame.pending {
                arr.cancel(ctx);
            }
        }
    }

    /// Drives this SMCB's top frame until it either reaches a terminal
    /// state or `deadline` passes. Returns `true` once terminal.
    fn drive(&mut self, ctx: &CoreContext, deadline: Instant) -> bool {
        loop {
            if self.frame_stack.is_empty() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }

            let top = self.frame_stack.last_mut().unwrap();
            let resume = if let Some(arr) = &mut top.pending {
                let remaining = deadline.saturating_duration_since(Instant::now());
                match arr.poll(ctx, remaining) {
                    MessageArrayStatus::InProgress => return false,
                    MessageArrayStatus::Done(results) => {
                        top.pending = None;
                        Resume::Deferred(results)
                    }
                }
            } else if let Some(code) = self.pending_child_result.take() {
                Resume::ChildComplete(code)
            } else {
                Resume::Start
            };

            if self.cancelled {
                // A cancelled SMCB still lets its current frame observe
                // one more Deferred/ChildComplete so cleanup states (e.g.
                // create's rollback) can run; Start resumes are refused.
                if matches!(resume, Resume::Start) {
                    self.frame_stack.clear();
                    self.error_code = Some(StatusCode::EIO);
                    return true;
                }
            }

            let outcome = top.state.step(resume, ctx);
            match outcome {
                StepOutcome::Complete(code) => {
                    log::debug!("sm: {} frame {} complete: {:?}", self.op_type, top.state.name(), code);
                    self.frame_stack.pop();
                    if self.frame_stack.is_empty() {
                        self.error_code = Some(code);
                        return true;
                    }
                    self.pending_child_result = Some(code);
                }
                StepOutcome::Deferred(arr) => {
                    // `poll` (next loop iteration, via `top.pending`) sends
                    // any unsent pairs itself; nothing to do here but stash it.
                    top.pending = Some(arr);
                }
                StepOutcome::Push(child) => {
                    log::trace!("sm: {} pushing nested frame {}", self.op_type, child.name());
                    self.frame_stack.push(Frame { state: child, pending: None });
                }
            }
        }
    }
}

/// Cooperative-scheduling entry points — C4's `post`/`test`/`testsome`/
/// `testcontext`/`wait` surface (spec.md §4.4).
pub struct Scheduler;

impl Scheduler {
    /// Allocates an op id for a freshly-constructed, not-yet-driven SMCB.
    pub fn post(ctx: &CoreContext, mut smcb: Smcb, root: Box<dyn SmState>) -> OpId {
        smcb.push_root(root);
        ctx.id_table.register(smcb)
    }

    /// Waits on one specific operation for up to `budget_ms`. Returns
    /// `None` (spec.md "may return COUNT=0 on timeout without error") if
    /// it hasn't reached a terminal state in time.
    pub fn test(ctx: &CoreContext, op_id: OpId, budget_ms: u64) -> Option<StatusCode> {
        let deadline = Instant::now() + Duration::from_millis(budget_ms);
        let terminal = ctx.id_table.with_mut(op_id, |smcb| smcb.drive(ctx, deadline))?;
        if terminal {
            ctx.id_table.with_mut(op_id, |smcb| smcb.error_code).flatten()
        } else {
            None
        }
    }

    /// Waits for any subset of `op_ids` to progress, returning the ones
    /// that reached a terminal state within `budget_ms`.
    pub fn testsome(ctx: &CoreContext, op_ids: &[OpId], budget_ms: u64) -> Vec<(OpId, StatusCode)> {
        let deadline = Instant::now() + Duration::from_millis(budget_ms);
        let mut done = Vec::new();
        loop {
            for &id in op_ids {
                if done.iter().any(|(d, _)| *d == id) {
                    continue;
                }
                let remaining = deadline.saturating_duration_since(Instant::now());
                if let Some(true) = ctx.id_table.with_mut(id, |smcb| smcb.drive(ctx, Instant::now() + remaining.min(Duration::from_millis(5)))) {
                    if let Some(Some(code)) = ctx.id_table.with_mut(id, |smcb| smcb.error_code) {
                        done.push((id, code));
                    }
                }
            }
            if !done.is_empty() || Instant::now() >= deadline {
                return done;
            }
        }
    }

    /// Drains whatever is ready across every currently-registered op id.
    pub fn testcontext(ctx: &CoreContext, budget_ms: u64) -> Vec<(OpId, StatusCode)> {
        Self::testsome(ctx, &ctx.id_table.all_ids(), budget_ms)
    }

    /// Convenience: loops `test` with a large budget until the operation
    /// terminates.
    pub fn wait(ctx: &CoreContext, op_id: OpId) -> StatusCode {
        loop {
            if let Some(code) = Self::test(ctx, op_id, 60_000) {
                return code;
            }
        }
    }

    /// Cancellation races with completion: an op that has already
    /// completed reports the completion result regardless of this call;
    /// otherwise its next `test*` reports a cancelled status. Idempotent.
    pub fn cancel(ctx: &CoreContext, op_id: OpId) {
        ctx.id_table.with_mut(op_id, |smcb| {
            if !smcb.is_terminal() {
                smcb.request_cancel(ctx);
            }
        });
    }

    /// Releases the SMCB after the caller has read its terminal result
    /// (spec.md §3 "Op id" lifetime).
    pub fn release(ctx: &CoreContext, op_id: OpId) {
        ctx.id_table.unregister(op_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pvfs_types::FsId;

    struct ImmediateSuccess;
    impl SmState for ImmediateSuccess {
        fn name(&self) -> &'static str {
            "test:immediate_success"
        }
        fn step(&mut self, _resume: Resume, _ctx: &CoreContext) -> StepOutcome {
            StepOutcome::Complete(StatusCode::Success)
        }
    }

    struct ParentPushesChild {
        pushed: bool,
    }
    impl SmState for ParentPushesChild {
        fn name(&self) -> &'static str {
            "test:parent"
        }
        fn step(&mut self, resume: Resume, _ctx: &CoreContext) -> StepOutcome {
            match resume {
                Resume::Start if !self.pushed => {
                    self.pushed = true;
                    StepOutcome::Push(Box::new(ImmediateSuccess))
                }
                Resume::ChildComplete(code) => StepOutcome::Complete(code),
                _ => StepOutcome::Complete(StatusCode::EINVAL),
            }
        }
    }

    fn test_cred() -> Credential {
        Credential { fs_id: FsId(1), serial: 0, uid: 0, gids: vec![], issuer: String::new(), timeout: 0, sig: vec![] }
    }

    #[test]
    fn immediate_completion_is_observed_by_test() {
        let ctx = CoreContext::for_test(Box::new(crate::transport_pool::TcpConnector));
        let smcb = Smcb::new("noop", test_cred());
        let id = Scheduler::post(&ctx, smcb, Box::new(ImmediateSuccess));
        assert_eq!(Scheduler::test(&ctx, id, 100), Some(StatusCode::Success));
    }

    #[test]
    fn nested_frame_surfaces_child_result_to_parent() {
        let ctx = CoreContext::for_test(Box::new(crate::transport_pool::TcpConnector));
        let smcb = Smcb::new("nested", test_cred());
        let id = Scheduler::post(&ctx, smcb, Box::new(ParentPushesChild { pushed: false }));
        assert_eq!(Scheduler::test(&ctx, id, 100), Some(StatusCode::Success));
    }

    #[test]
    fn cancel_before_any_progress_resolves_to_terminal_error() {
        struct NeverStarts;
        impl SmState for NeverStarts {
            fn name(&self) -> &'static str {
                "test:never"
            }
            fn step(&mut self, _resume: Resume, _ctx: &CoreContext) -> StepOutcome {
                StepOutcome::Complete(StatusCode::Success)
            }
        }
        let ctx = CoreContext::for_test(Box::new(crate::transport_pool::TcpConnector));
        let smcb = Smcb::new("cancel-me", test_cred());
        let id = Scheduler::post(&ctx, smcb, Box::new(NeverStarts));
        Scheduler::cancel(&ctx, id);
        Scheduler::cancel(&ctx, id); // idempotent
        let code = Scheduler::test(&ctx, id, 100);
        assert!(code.is_some());
    }
}
