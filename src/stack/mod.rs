//! # State stack: serialized push/replace/pop/clear over async states.
//!
//! [`StateStack`] owns an ordered collection of states for one supervisor and
//! sequences all mutations through one FIFO queue, guaranteeing at most one
//! enter/exit transition in flight at a time.
//!
//! Two submission surfaces exist for every operation:
//!
//! - **Awaiting** ([`change`](StateStack::change), [`push`](StateStack::push),
//!   ...): the caller suspends until its request *and the whole queue it
//!   joined* have drained. Errors from the caller's own request come back
//!   through the `Result`. These futures must be driven to completion;
//!   dropping one mid-drain wedges the stack (no cancellation).
//! - **Fire-and-forget** ([`request`](StateStack::request),
//!   [`request_pop`](StateStack::request_pop), ...): enqueue and continue.
//!   This is the only legal form from inside a state's own enter/exit hook;
//!   awaiting your own queued request there deadlocks the drain.
//!
//! ## Example
//! ```rust
//! use statevisor::{Bus, Config, ContextRegistry, StateError, StateFn, StateStack};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let cfg = Config::default();
//!     let stack = StateStack::new(ContextRegistry::empty(), Bus::new(cfg.bus_capacity), &cfg);
//!
//!     let playing = StateFn::arc(
//!         "playing",
//!         |_ctx: ContextRegistry| async { Ok::<_, StateError>(()) },
//!         || async { Ok::<_, StateError>(()) },
//!     );
//!
//!     stack.push(playing).await?;
//!     assert_eq!(stack.depth(), 1);
//!     assert_eq!(stack.current_state().as_deref(), Some("playing"));
//!
//!     stack.clear().await?;
//!     assert_eq!(stack.depth(), 0);
//!     Ok(())
//! }
//! ```

mod core;
mod request;

use std::sync::Arc;

use log::warn;

pub use request::StackAction;

use crate::config::Config;
use crate::contexts::ContextRegistry;
use crate::error::TransitionError;
use crate::events::{Bus, Event, EventKind};
use crate::stack::core::StackCore;
use crate::stack::request::Request;
use crate::states::StateRef;

/// Handle to one supervisor's serialized state stack.
///
/// Cheap to clone; all clones share the same stack. A stack is exclusively
/// owned by one supervisor and its [`ContextRegistry`] is populated before
/// the first enter call, then never mutated.
#[derive(Clone)]
pub struct StateStack {
    core: Arc<StackCore>,
}

impl StateStack {
    /// Creates an empty stack over the given registry and event bus.
    ///
    /// The registry must already contain everything the supervisor's states
    /// will require; it is frozen from here on.
    pub fn new(registry: ContextRegistry, bus: Bus, cfg: &Config) -> Self {
        Self {
            core: Arc::new(StackCore::new(registry, bus, cfg.depth_warn)),
        }
    }

    // ---- Single entry point -------------------------------------------

    /// Submits one exit-mutate-enter transition and awaits completion.
    ///
    /// All higher-level operations are expressed in terms of this primitive
    /// (and the structurally distinct [`pop`](Self::pop)). If a transition is
    /// already in flight the request is queued FIFO and this call returns
    /// only once the queue it joined has fully drained — other queued
    /// requests may run first and further mutate the stack, so the caller
    /// can end up on a different state than requested.
    ///
    /// Must not be awaited from inside a state's own enter/exit hook; use
    /// [`request`](Self::request) there instead.
    ///
    /// The returned future must be driven to completion. Dropping it
    /// mid-transition (wrapping it in `select!` or a timeout) abandons the
    /// drain and leaves the stack permanently transitioning; cancellation is
    /// not supported.
    pub async fn change(
        &self,
        state: StateRef,
        action: StackAction,
    ) -> Result<(), TransitionError> {
        self.core
            .submit(Request::Change { state, action })
            .await
    }

    /// Fire-and-forget form of [`change`](Self::change).
    pub fn request(&self, state: StateRef, action: StackAction) {
        self.core.submit_detached(Request::Change { state, action });
    }

    // ---- Higher-level operations --------------------------------------

    /// Pushes `state` on top of the stack (current top exits, stays stacked).
    pub async fn push(&self, state: StateRef) -> Result<(), TransitionError> {
        self.change(state, StackAction::Push).await
    }

    /// Fire-and-forget form of [`push`](Self::push).
    pub fn request_push(&self, state: StateRef) {
        self.request(state, StackAction::Push);
    }

    /// Tears down the whole stack, then pushes `state` as the only entry.
    pub async fn set(&self, state: StateRef) -> Result<(), TransitionError> {
        self.change(state, StackAction::ClearAndPush).await
    }

    /// Fire-and-forget form of [`set`](Self::set).
    pub fn request_set(&self, state: StateRef) {
        self.request(state, StackAction::ClearAndPush);
    }

    /// Exits the current top, discards `count` entries, enters the newly
    /// exposed top (if any; emptying the stack is a legal outcome).
    ///
    /// `count` below 1 is corrected to 1 (non-fatal). A `count` exceeding the
    /// stack depth is a reported non-fatal no-op.
    pub async fn pop(&self, count: usize) -> Result<(), TransitionError> {
        self.core.submit(Request::Pop { count }).await
    }

    /// Fire-and-forget form of [`pop`](Self::pop).
    pub fn request_pop(&self, count: usize) {
        self.core.submit_detached(Request::Pop { count });
    }

    /// Forces a fresh exit+enter cycle on the current top state object,
    /// re-applying its side effects without changing identity or depth.
    ///
    /// A reported non-fatal no-op when the stack is empty.
    pub async fn reenter_current(&self) -> Result<(), TransitionError> {
        let Some(current) = self.current_top() else {
            self.ignored("reenter_current on empty stack");
            return Ok(());
        };
        self.change(current, StackAction::ReplaceTop).await
    }

    /// Fire-and-forget form of [`reenter_current`](Self::reenter_current).
    pub fn request_reenter_current(&self) {
        let Some(current) = self.current_top() else {
            self.ignored("reenter_current on empty stack");
            return;
        };
        self.request(current, StackAction::ReplaceTop);
    }

    /// Tears down the whole stack: repeated single-pop until empty, one real
    /// exit call per stacked state, nothing entered at the end.
    pub async fn clear(&self) -> Result<(), TransitionError> {
        self.core.submit(Request::Clear).await
    }

    /// Fire-and-forget form of [`clear`](Self::clear).
    pub fn request_clear(&self) {
        self.core.submit_detached(Request::Clear);
    }

    // ---- Read-only diagnostics ----------------------------------------

    /// Current stack depth.
    pub fn depth(&self) -> usize {
        self.core.depth()
    }

    /// Name of the current top state, for display/telemetry.
    pub fn current_state(&self) -> Option<Arc<str>> {
        self.core.current_state()
    }

    /// True while a drain is in flight.
    pub fn is_transitioning(&self) -> bool {
        self.core.is_transitioning()
    }

    // ---- Internals -----------------------------------------------------

    fn current_top(&self) -> Option<StateRef> {
        // Resolved at submission time: "reenter" targets whatever is top
        // when the request is made, not when it runs.
        self.core.top_ref()
    }

    fn ignored(&self, reason: &str) {
        warn!("request ignored: {reason}");
        self.core
            .bus()
            .publish(Event::new(EventKind::RequestIgnored).with_reason(reason.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    use crate::error::StateError;
    use crate::states::State;

    /// Records every hook invocation into a shared journal.
    struct Probe {
        name: &'static str,
        journal: Arc<Mutex<Vec<String>>>,
    }

    impl Probe {
        fn arc(name: &'static str, journal: &Arc<Mutex<Vec<String>>>) -> Arc<Self> {
            Arc::new(Self {
                name,
                journal: Arc::clone(journal),
            })
        }
    }

    #[async_trait]
    impl State for Probe {
        fn name(&self) -> &str {
            self.name
        }

        async fn enter(&self, _ctx: &ContextRegistry) -> Result<(), StateError> {
            self.journal.lock().unwrap().push(format!("{}.enter", self.name));
            Ok(())
        }

        async fn exit(&self) -> Result<(), StateError> {
            self.journal.lock().unwrap().push(format!("{}.exit", self.name));
            Ok(())
        }
    }

    fn stack() -> StateStack {
        let cfg = Config::default();
        StateStack::new(ContextRegistry::empty(), Bus::new(cfg.bus_capacity), &cfg)
    }

    fn journal() -> Arc<Mutex<Vec<String>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn entries(journal: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
        journal.lock().unwrap().clone()
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_push_enters_new_top_and_exits_old() {
        let j = journal();
        let stack = stack();
        stack.push(Probe::arc("a", &j)).await.unwrap();
        stack.push(Probe::arc("b", &j)).await.unwrap();

        assert_eq!(entries(&j), ["a.enter", "a.exit", "b.enter"]);
        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.current_state().as_deref(), Some("b"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_replace_top_keeps_depth() {
        let j = journal();
        let stack = stack();
        stack.push(Probe::arc("a", &j)).await.unwrap();
        stack.push(Probe::arc("b", &j)).await.unwrap();
        stack
            .change(Probe::arc("c", &j), StackAction::ReplaceTop)
            .await
            .unwrap();

        assert_eq!(stack.depth(), 2);
        assert_eq!(stack.current_state().as_deref(), Some("c"));
        assert!(entries(&j).ends_with(&["b.exit".into(), "c.enter".into()]));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_clear_exits_every_stacked_state_top_down() {
        let j = journal();
        let stack = stack();
        for name in ["a", "b", "c"] {
            stack.push(Probe::arc(name, &j)).await.unwrap();
        }
        j.lock().unwrap().clear();

        stack.clear().await.unwrap();

        // One real exit per stacked state, top-down, zero enters.
        assert_eq!(entries(&j), ["c.exit", "b.exit", "a.exit"]);
        assert_eq!(stack.depth(), 0);
        assert_eq!(stack.current_state(), None);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_set_tears_down_then_pushes() {
        let j = journal();
        let stack = stack();
        stack.push(Probe::arc("a", &j)).await.unwrap();
        stack.push(Probe::arc("b", &j)).await.unwrap();
        j.lock().unwrap().clear();

        stack.set(Probe::arc("hub", &j)).await.unwrap();

        assert_eq!(entries(&j), ["b.exit", "a.exit", "hub.enter"]);
        assert_eq!(stack.depth(), 1);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_pop_discards_and_enters_newly_exposed() {
        let j = journal();
        let stack = stack();
        for name in ["a", "b", "c"] {
            stack.push(Probe::arc(name, &j)).await.unwrap();
        }
        j.lock().unwrap().clear();

        stack.pop(2).await.unwrap();

        assert_eq!(entries(&j), ["c.exit", "a.enter"]);
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.current_state().as_deref(), Some("a"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_pop_to_empty_is_a_legal_terminal_outcome() {
        let j = journal();
        let stack = stack();
        stack.push(Probe::arc("a", &j)).await.unwrap();
        j.lock().unwrap().clear();

        stack.pop(1).await.unwrap();

        assert_eq!(entries(&j), ["a.exit"]);
        assert_eq!(stack.depth(), 0);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_pop_beyond_depth_is_reported_noop() {
        let cfg = Config::default();
        let bus = Bus::new(cfg.bus_capacity);
        let j = journal();
        let stack = StateStack::new(ContextRegistry::empty(), bus.clone(), &cfg);
        stack.push(Probe::arc("a", &j)).await.unwrap();
        j.lock().unwrap().clear();

        let mut rx = bus.subscribe();
        stack.pop(5).await.unwrap();

        // Zero mutation, one diagnostic.
        assert_eq!(stack.depth(), 1);
        assert!(entries(&j).is_empty());
        let ev = rx.try_recv().unwrap();
        assert_eq!(ev.kind, EventKind::PopOutOfRange);
        assert_eq!(ev.count, Some(5));
        assert_eq!(ev.depth, Some(1));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_reenter_is_one_exit_one_enter_same_state() {
        let j = journal();
        let stack = stack();
        let a = Probe::arc("a", &j);
        stack.push(a).await.unwrap();
        j.lock().unwrap().clear();

        stack.reenter_current().await.unwrap();

        assert_eq!(entries(&j), ["a.exit", "a.enter"]);
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.current_state().as_deref(), Some("a"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_reenter_on_empty_stack_is_ignored() {
        let cfg = Config::default();
        let bus = Bus::new(cfg.bus_capacity);
        let stack = StateStack::new(ContextRegistry::empty(), bus.clone(), &cfg);
        let mut rx = bus.subscribe();

        stack.reenter_current().await.unwrap();

        assert_eq!(stack.depth(), 0);
        assert_eq!(rx.try_recv().unwrap().kind, EventKind::RequestIgnored);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_depth_warning_past_soft_threshold() {
        let cfg = Config {
            depth_warn: 2,
            ..Config::default()
        };
        let bus = Bus::new(cfg.bus_capacity);
        let j = journal();
        let stack = StateStack::new(ContextRegistry::empty(), bus.clone(), &cfg);
        let mut rx = bus.subscribe();

        for name in ["a", "b", "c"] {
            stack.push(Probe::arc(name, &j)).await.unwrap();
        }

        let mut warned = false;
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::DepthWarning {
                assert_eq!(ev.depth, Some(3));
                warned = true;
            }
        }
        assert!(warned);
        // Non-fatal: the push itself proceeded.
        assert_eq!(stack.depth(), 3);
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_failed_enter_leaves_state_half_entered_on_top() {
        struct Broken;

        #[async_trait]
        impl State for Broken {
            fn name(&self) -> &str {
                "broken"
            }
            async fn enter(&self, ctx: &ContextRegistry) -> Result<(), StateError> {
                struct NeverRegistered;
                ctx.require::<NeverRegistered>()?;
                Ok(())
            }
            async fn exit(&self) -> Result<(), StateError> {
                Ok(())
            }
        }

        let stack = stack();
        let err = stack.push(Arc::new(Broken)).await.unwrap_err();
        assert_eq!(err.as_label(), "transition_enter_failed");

        // No rollback: the state stays on top, half-entered.
        assert_eq!(stack.depth(), 1);
        assert_eq!(stack.current_state().as_deref(), Some("broken"));
    }
}
