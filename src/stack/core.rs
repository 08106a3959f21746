//! # Stack scheduler core.
//!
//! [`StackCore`] serializes all stack mutation requests into a strict FIFO,
//! guaranteeing exactly one active exit/enter sequence, while still accepting
//! new requests issued *during* an in-flight transition (including requests
//! issued from inside a state's own enter/exit hook).
//!
//! ## Transition protocol
//! ```text
//! submit(request)
//!   ├─ transitioning? ──► enqueue (FIFO), park caller on oneshot ack
//!   │                     (ack resolves only once the queue has fully drained)
//!   └─ idle?          ──► mark transitioning, drive:
//!         loop {
//!           ├─► exit current top (if any)
//!           ├─► apply stack mutation (push / replace / pop / clear)
//!           ├─► enter new top (if any)
//!           └─► dequeue next request, or mark idle and stop
//!         }
//!         release all parked acks collected during the drain
//! ```
//!
//! ## Rules
//! - Requests are served strictly in arrival order; no priority, no preemption.
//! - A request issued while idle starts immediately.
//! - A caller that awaits a queued request observes completion only after
//!   *all* transitions queued ahead of it, and its own, have finished; other
//!   queued requests may further mutate the stack, so the caller can land on
//!   a different state than it asked for (documented, intentional).
//! - Cancellation is not supported: in-flight and already-queued transitions
//!   always run to completion. The future of an awaiting submission must be
//!   driven to completion as well; dropping it mid-drain wedges the stack.
//! - The mutex guarding the bookkeeping is never held across an await;
//!   correctness comes from the transitioning flag plus the FIFO queue.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use log::warn;
use tokio::sync::oneshot;

use crate::contexts::ContextRegistry;
use crate::error::TransitionError;
use crate::events::{Bus, Event, EventKind};
use crate::stack::request::{Queued, Request, StackAction};
use crate::states::StateRef;

type Ack = oneshot::Sender<Result<(), TransitionError>>;

/// Mutable bookkeeping, guarded by a mutex that is never held across awaits.
struct Inner {
    /// Ordered sequence of states; top = most recent push.
    states: Vec<StateRef>,
    /// Set while a drain is in flight.
    transitioning: bool,
    /// FIFO of requests that arrived mid-flight.
    queue: VecDeque<Queued>,
}

/// Serialized transition scheduler for one supervisor's state stack.
pub(crate) struct StackCore {
    inner: Mutex<Inner>,
    registry: ContextRegistry,
    bus: Bus,
    depth_warn: usize,
}

impl StackCore {
    pub(crate) fn new(registry: ContextRegistry, bus: Bus, depth_warn: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                states: Vec::new(),
                transitioning: false,
                queue: VecDeque::new(),
            }),
            registry,
            bus,
            depth_warn,
        }
    }

    pub(crate) fn bus(&self) -> &Bus {
        &self.bus
    }

    pub(crate) fn depth(&self) -> usize {
        self.inner.lock().unwrap().states.len()
    }

    pub(crate) fn is_transitioning(&self) -> bool {
        self.inner.lock().unwrap().transitioning
    }

    pub(crate) fn current_state(&self) -> Option<Arc<str>> {
        let inner = self.inner.lock().unwrap();
        inner.states.last().map(|s| Arc::from(s.name()))
    }

    pub(crate) fn top_ref(&self) -> Option<StateRef> {
        self.inner.lock().unwrap().states.last().cloned()
    }

    /// Submits a request and awaits its completion.
    ///
    /// If the stack is idle the caller becomes the driver and returns once
    /// its own request *and everything queued behind it* have run. If a drain
    /// is already in flight the request is enqueued and the caller parks on
    /// an ack resolved at drain end.
    ///
    /// The driving caller's future must run to completion: dropping it
    /// mid-drain (`select!`, `timeout`) abandons the drain with the
    /// transitioning flag still set, wedging the stack. Cancellation is not
    /// part of the contract.
    pub(crate) async fn submit(
        self: &Arc<Self>,
        request: Request,
    ) -> Result<(), TransitionError> {
        // The lock block either keeps the request (queued, caller parks on
        // the returned ack) or hands it back so this caller becomes the
        // driver.
        let parked = {
            let mut inner = self.inner.lock().unwrap();
            if inner.transitioning {
                let (tx, rx) = oneshot::channel();
                inner.queue.push_back(Queued {
                    request,
                    ack: Some(tx),
                });
                Ok(rx)
            } else {
                inner.transitioning = true;
                Err(request)
            }
        };

        match parked {
            Ok(rx) => rx.await.unwrap_or(Err(TransitionError::StackDropped)),
            Err(request) => self.drive(request).await,
        }
    }

    /// Submits a request without awaiting it (fire-and-forget).
    ///
    /// The only legal submission form from inside a state's own enter/exit
    /// hook: awaiting your own queued request there would deadlock the drain.
    /// If the stack is idle the drive loop is spawned onto the runtime; a
    /// failure inside it is reported on the bus since no caller is waiting.
    pub(crate) fn submit_detached(self: &Arc<Self>, request: Request) {
        let own = {
            let mut inner = self.inner.lock().unwrap();
            if inner.transitioning {
                inner.queue.push_back(Queued { request, ack: None });
                None
            } else {
                inner.transitioning = true;
                Some(request)
            }
        };

        if let Some(request) = own {
            let core = Arc::clone(self);
            tokio::spawn(async move {
                let _ = core.drive(request).await;
            });
        }
    }

    /// Runs the driver's own request, then drains the queue to empty.
    ///
    /// Parked acks are collected during the drain and released only after the
    /// queue is empty, so every awaiting caller observes a fully settled
    /// stack. Each request's own error goes to its own caller; a failed
    /// request does not stop the drain.
    async fn drive(self: &Arc<Self>, first: Request) -> Result<(), TransitionError> {
        let own = self.apply(first).await;
        if let Err(err) = &own {
            self.report_failure(err);
        }

        let mut settled: Vec<(Ack, Result<(), TransitionError>)> = Vec::new();
        loop {
            let next = {
                let mut inner = self.inner.lock().unwrap();
                match inner.queue.pop_front() {
                    Some(queued) => Some(queued),
                    None => {
                        inner.transitioning = false;
                        None
                    }
                }
            };
            let Some(queued) = next else { break };

            let result = self.apply(queued.request).await;
            if let Err(err) = &result {
                self.report_failure(err);
            }
            if let Some(ack) = queued.ack {
                settled.push((ack, result));
            }
        }

        for (ack, result) in settled {
            let _ = ack.send(result);
        }
        own
    }

    async fn apply(&self, request: Request) -> Result<(), TransitionError> {
        match request {
            Request::Change { state, action } => self.apply_change(state, action).await,
            Request::Pop { count } => self.apply_pop(count).await,
            Request::Clear => self.apply_clear().await.map(|_| ()),
        }
    }

    /// One exit-mutate-enter cycle for a `change` request.
    async fn apply_change(
        &self,
        state: StateRef,
        action: StackAction,
    ) -> Result<(), TransitionError> {
        self.exit_top().await?;

        match action {
            StackAction::Push => {}
            StackAction::ReplaceTop => {
                self.inner.lock().unwrap().states.pop();
            }
            StackAction::ClearAndPush => {
                // The old top has already exited; tear down the rest via
                // repeated pop so every stacked state gets a real exit call.
                self.inner.lock().unwrap().states.pop();
                self.drain_to_empty().await?;
            }
        }

        let depth = {
            let mut inner = self.inner.lock().unwrap();
            inner.states.push(Arc::clone(&state));
            inner.states.len()
        };
        if depth > self.depth_warn {
            warn!(
                "state stack depth {depth} exceeds soft threshold {} (runaway push loop?)",
                self.depth_warn
            );
            self.bus.publish(
                Event::new(EventKind::DepthWarning)
                    .with_state(state.name())
                    .with_depth(depth),
            );
        }

        self.enter(&state, depth).await?;

        let kind = match action {
            StackAction::Push => EventKind::StatePushed,
            StackAction::ReplaceTop => EventKind::StateReplaced,
            StackAction::ClearAndPush => EventKind::StatePushed,
        };
        self.bus
            .publish(Event::new(kind).with_state(state.name()).with_depth(depth));
        Ok(())
    }

    /// Exit the current top, discard `count` entries, enter the newly exposed
    /// top (if any — emptying the stack is a legal terminal outcome).
    async fn apply_pop(&self, count: usize) -> Result<(), TransitionError> {
        let count = if count < 1 {
            warn!("pop count {count} corrected to 1");
            1
        } else {
            count
        };

        let depth = self.depth();
        if count > depth {
            warn!("pop of {count} states requested but stack depth is {depth}; ignoring");
            self.bus.publish(
                Event::new(EventKind::PopOutOfRange)
                    .with_count(count)
                    .with_depth(depth),
            );
            return Ok(());
        }

        self.exit_top().await?;

        let (exposed, depth) = {
            let mut inner = self.inner.lock().unwrap();
            let keep = inner.states.len() - count;
            inner.states.truncate(keep);
            (inner.states.last().cloned(), inner.states.len())
        };

        if let Some(top) = &exposed {
            self.enter(top, depth).await?;
        }
        let mut ev = Event::new(EventKind::StatePopped)
            .with_count(count)
            .with_depth(depth);
        if let Some(top) = &exposed {
            ev = ev.with_state(top.name());
        }
        self.bus.publish(ev);
        Ok(())
    }

    /// Repeated single-pop until empty; every stacked state gets a real,
    /// individual exit call and nothing is entered at the end.
    async fn apply_clear(&self) -> Result<usize, TransitionError> {
        let cleared = self.drain_to_empty().await?;
        self.bus
            .publish(Event::new(EventKind::StackCleared).with_count(cleared));
        Ok(cleared)
    }

    /// Exits and discards states top-down until the stack is empty.
    async fn drain_to_empty(&self) -> Result<usize, TransitionError> {
        let mut cleared = 0;
        loop {
            if self.inner.lock().unwrap().states.is_empty() {
                return Ok(cleared);
            }
            self.exit_top().await?;
            self.inner.lock().unwrap().states.pop();
            cleared += 1;
        }
    }

    /// Awaits the current top's exit hook, leaving the state on the stack.
    ///
    /// On failure the state stays where it is and the planned mutation is
    /// abandoned; the error surfaces to the request's logical caller.
    async fn exit_top(&self) -> Result<(), TransitionError> {
        let Some(top) = self.inner.lock().unwrap().states.last().cloned() else {
            return Ok(());
        };
        top.exit().await.map_err(|source| TransitionError::Exit {
            state: Arc::from(top.name()),
            source,
        })?;
        self.bus
            .publish(Event::new(EventKind::StateExited).with_state(top.name()));
        Ok(())
    }

    /// Awaits a state's enter hook against the owning registry.
    ///
    /// On failure the state remains on top, "half-entered"; the caller must
    /// handle recovery (no automatic rollback).
    async fn enter(&self, state: &StateRef, depth: usize) -> Result<(), TransitionError> {
        state
            .enter(&self.registry)
            .await
            .map_err(|source| TransitionError::Enter {
                state: Arc::from(state.name()),
                source,
            })?;
        self.bus.publish(
            Event::new(EventKind::StateEntered)
                .with_state(state.name())
                .with_depth(depth),
        );
        Ok(())
    }

    fn report_failure(&self, err: &TransitionError) {
        warn!("transition failed: {}", err.as_message());
        let mut ev = Event::new(EventKind::TransitionFailed).with_reason(err.as_label());
        if let TransitionError::Enter { state, .. } | TransitionError::Exit { state, .. } = err {
            ev = ev.with_state(Arc::clone(state));
        }
        self.bus.publish(ev);
    }
}
