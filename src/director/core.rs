//! # Director: owns the active supervisor and mediates all switches.
//!
//! The [`Director`] owns the event bus, a [`SubscriberSet`], the game-wide
//! [`ContextRegistry`], and the single active [`Supervisor`](crate::Supervisor). It performs
//! supervisor switches as an atomic sequence and forwards stack operations to
//! the active supervisor's [`StateStack`](crate::StateStack).
//!
//! ## Switch sequence
//! ```text
//! switch_to(next):
//!   ├─► current supervisor active?
//!   │     ├─► stack non-empty? ──► clear (exits top-down, one per state)
//!   │     ├─► publish SupervisorUnloading
//!   │     └─► await current.unload(), then discard the reference
//!   ├─► publish SupervisorLoading
//!   ├─► await next.load(game context)   (may set up a state stack inside)
//!   └─► next becomes current, publish SupervisorActive
//! ```
//!
//! ## Rules
//! - Only one supervisor is active at any time; a new `load` never starts
//!   before the previous `unload` completes.
//! - `switch_to` is not reentrant: a second call while one is in flight is a
//!   caller-contract violation and is rejected with
//!   [`OrchestratorError::SwitchInProgress`].
//! - Unload/load failures propagate to the `switch_to` caller with no
//!   rollback; the director stays in the failing phase but admits a later
//!   recovery switch (only *concurrent* switches are rejected).
//! - Forwarded stack operations with no active supervisor/stack are reported
//!   non-fatal no-ops.

use std::sync::{Arc, Mutex};

use log::warn;
use tokio::sync::broadcast::error::RecvError;

use crate::config::Config;
use crate::contexts::ContextRegistry;
use crate::director::supervisor::{Phase, SupervisorRef};
use crate::error::{OrchestratorError, TransitionError};
use crate::events::{Bus, Event, EventKind};
use crate::stack::{StackAction, StateStack};
use crate::states::StateRef;
use crate::subscribers::{Subscribe, SubscriberSet};

/// Mutable director bookkeeping, guarded by a mutex never held across awaits.
struct Inner {
    /// Game-wide context handed to every supervisor load.
    context: Option<ContextRegistry>,
    /// The single active supervisor (sole writer: the director).
    current: Option<SupervisorRef>,
    /// Lifecycle phase of the supervisor slot.
    phase: Phase,
    /// True while a `switch_to` call is in flight. Distinct from `phase`:
    /// after a failed switch the phase records the failing step while this
    /// clears, so a recovery switch is still admitted.
    in_flight: bool,
    /// Set once the first switch begins; freezes `set_context`.
    switched: bool,
}

/// Coordinates supervisor switches, state forwarding, and event delivery.
///
/// Constructed once at process start and passed by reference to anything
/// needing it; there is no global accessor.
pub struct Director {
    cfg: Config,
    bus: Bus,
    subs: Arc<SubscriberSet>,
    inner: Mutex<Inner>,
}

impl Director {
    /// Creates a director with the given config and subscribers.
    ///
    /// Spawns the bus listener that fans events out to `subscribers`, so this
    /// must be called from within a tokio runtime.
    pub fn new(cfg: Config, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        let bus = Bus::new(cfg.bus_capacity);
        let subs = Arc::new(SubscriberSet::new(subscribers));
        let director = Self {
            cfg,
            bus,
            subs,
            inner: Mutex::new(Inner {
                context: None,
                current: None,
                phase: Phase::Unloaded,
                in_flight: false,
                switched: false,
            }),
        };
        director.subscriber_listener();
        director
    }

    /// The shared event bus. Supervisors use a clone of it when building
    /// their state stacks so that all events land on the same channel.
    pub fn bus(&self) -> Bus {
        self.bus.clone()
    }

    /// The director's configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Installs the game-wide context consumed by every supervisor load.
    ///
    /// Valid only before the first switch; later calls are reported non-fatal
    /// no-ops. If never called, supervisors load against an empty registry.
    pub fn set_context(&self, ctx: ContextRegistry) {
        {
            let mut inner = self.inner.lock().unwrap();
            if !inner.switched {
                inner.context = Some(ctx);
                return;
            }
        }
        self.ignored("set_context after first switch");
    }

    /// Switches the active supervisor: drain the current stack, await
    /// `unload`, discard, then await `next.load(ctx)`.
    ///
    /// Returns only after the new supervisor's load fully completes,
    /// including any state stack it sets up internally. Failures propagate
    /// with no rollback; the director stays in the failing phase
    /// ([`Phase::Unloading`] or [`Phase::Loading`]) and requires caller-level
    /// recovery. A later `switch_to` (e.g. to a fallback supervisor) is
    /// admitted after a failure; only a concurrent one is rejected.
    pub async fn switch_to(&self, next: SupervisorRef) -> Result<(), OrchestratorError> {
        let (prev, ctx) = {
            let mut inner = self.inner.lock().unwrap();
            if inner.in_flight {
                return Err(OrchestratorError::SwitchInProgress);
            }
            inner.in_flight = true;
            inner.switched = true;
            let ctx = inner
                .context
                .get_or_insert_with(ContextRegistry::empty)
                .clone();
            let prev = inner.current.clone();
            inner.phase = if prev.is_some() {
                Phase::Unloading
            } else {
                Phase::Loading
            };
            (prev, ctx)
        };

        let result = self.perform_switch(prev, ctx, next).await;
        self.inner.lock().unwrap().in_flight = false;
        result
    }

    /// The switch body proper; `in_flight` is already held by the caller.
    async fn perform_switch(
        &self,
        prev: Option<SupervisorRef>,
        ctx: ContextRegistry,
        next: SupervisorRef,
    ) -> Result<(), OrchestratorError> {
        self.bus
            .publish(Event::new(EventKind::SwitchRequested).with_supervisor(next.name()));

        if let Some(prev) = prev {
            if let Some(stack) = prev.stack() {
                if stack.depth() > 0 {
                    stack.clear().await?;
                }
            }
            self.bus.publish(
                Event::new(EventKind::SupervisorUnloading).with_supervisor(prev.name()),
            );
            prev.unload().await?;
            let mut inner = self.inner.lock().unwrap();
            inner.current = None;
            inner.phase = Phase::Loading;
        }

        self.bus
            .publish(Event::new(EventKind::SupervisorLoading).with_supervisor(next.name()));
        next.load(&ctx).await?;

        {
            let mut inner = self.inner.lock().unwrap();
            inner.current = Some(Arc::clone(&next));
            inner.phase = Phase::Active;
        }
        self.bus
            .publish(Event::new(EventKind::SupervisorActive).with_supervisor(next.name()));
        Ok(())
    }

    // ---- Forwarded stack operations -----------------------------------

    /// Pushes `state` onto the active supervisor's stack.
    pub async fn push_state(&self, state: StateRef) -> Result<(), TransitionError> {
        match self.active_stack() {
            Some(stack) => stack.push(state).await,
            None => self.forward_ignored("push_state"),
        }
    }

    /// Tears down the active stack and pushes `state` as its only entry.
    pub async fn set_state(&self, state: StateRef) -> Result<(), TransitionError> {
        match self.active_stack() {
            Some(stack) => stack.set(state).await,
            None => self.forward_ignored("set_state"),
        }
    }

    /// Pops `count` states off the active stack.
    pub async fn pop_states(&self, count: usize) -> Result<(), TransitionError> {
        match self.active_stack() {
            Some(stack) => stack.pop(count).await,
            None => self.forward_ignored("pop_states"),
        }
    }

    /// Re-runs exit+enter on the active stack's current top.
    pub async fn reenter_current_state(&self) -> Result<(), TransitionError> {
        match self.active_stack() {
            Some(stack) => stack.reenter_current().await,
            None => self.forward_ignored("reenter_current_state"),
        }
    }

    /// Tears down the active stack completely.
    pub async fn clear_stack_and_state(&self) -> Result<(), TransitionError> {
        match self.active_stack() {
            Some(stack) => stack.clear().await,
            None => self.forward_ignored("clear_stack_and_state"),
        }
    }

    /// Submits one transition with an explicit [`StackAction`].
    pub async fn change_state(
        &self,
        state: StateRef,
        action: StackAction,
    ) -> Result<(), TransitionError> {
        match self.active_stack() {
            Some(stack) => stack.change(state, action).await,
            None => self.forward_ignored("change_state"),
        }
    }

    /// The active supervisor's stack handle (for fire-and-forget callers).
    ///
    /// `None` while no supervisor is active or the supervisor is stackless.
    pub fn active_stack(&self) -> Option<StateStack> {
        let inner = self.inner.lock().unwrap();
        if inner.phase != Phase::Active {
            return None;
        }
        inner.current.as_ref().and_then(|s| s.stack())
    }

    // ---- Read-only diagnostics ----------------------------------------

    /// Name of the supervisor currently occupying the slot, for telemetry.
    ///
    /// During a switch this stays on the outgoing supervisor until its unload
    /// completes.
    pub fn current_supervisor(&self) -> Option<Arc<str>> {
        let inner = self.inner.lock().unwrap();
        inner.current.as_ref().map(|s| Arc::from(s.name()))
    }

    /// Name of the current top state of the current supervisor's stack.
    pub fn current_state(&self) -> Option<Arc<str>> {
        let stack = {
            let inner = self.inner.lock().unwrap();
            inner.current.as_ref().and_then(|s| s.stack())
        };
        stack.and_then(|s| s.current_state())
    }

    /// Current lifecycle phase of the supervisor slot.
    pub fn phase(&self) -> Phase {
        self.inner.lock().unwrap().phase
    }

    // ---- Internals -----------------------------------------------------

    /// Subscribes to the bus and forwards events to the subscriber set.
    fn subscriber_listener(&self) {
        let mut rx = self.bus.subscribe();
        let set = Arc::clone(&self.subs);
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(ev) => set.emit(&ev),
                    Err(RecvError::Closed) => break,
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("subscriber listener lagged; skipped {skipped} events");
                    }
                }
            }
        });
    }

    fn forward_ignored(&self, op: &str) -> Result<(), TransitionError> {
        self.ignored(&format!("{op} with no active supervisor stack"));
        Ok(())
    }

    fn ignored(&self, reason: &str) {
        warn!("request ignored: {reason}");
        self.bus
            .publish(Event::new(EventKind::RequestIgnored).with_reason(reason.to_string()));
    }
}
