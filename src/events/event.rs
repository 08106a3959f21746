//! # Runtime events emitted by the director and state stacks.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Supervisor lifecycle**: switch requested, unloading, loading, active
//! - **Stack lifecycle**: push/replace/pop/clear/reenter and the individual
//!   enter/exit completions
//! - **Diagnostics**: non-fatal caller misuse and depth warnings
//!
//! The [`Event`] struct carries additional metadata such as timestamps,
//! supervisor/state names, stack depth, and reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases
//! monotonically. Use `seq` to restore the exact order when events are
//! delivered out of order.
//!
//! ## Example
//! ```rust
//! use statevisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::StatePushed)
//!     .with_state("pause")
//!     .with_depth(2);
//!
//! assert_eq!(ev.kind, EventKind::StatePushed);
//! assert_eq!(ev.state.as_deref(), Some("pause"));
//! assert_eq!(ev.depth, Some(2));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Supervisor lifecycle ===
    /// A supervisor switch was requested.
    ///
    /// Sets:
    /// - `supervisor`: name of the incoming supervisor
    /// - `at`: wall-clock timestamp
    /// - `seq`: global sequence
    SwitchRequested,

    /// The outgoing supervisor is unloading (its stack has been drained).
    ///
    /// Sets:
    /// - `supervisor`: name of the outgoing supervisor
    /// - `at`, `seq`
    SupervisorUnloading,

    /// The incoming supervisor is loading.
    ///
    /// Sets:
    /// - `supervisor`: name of the incoming supervisor
    /// - `at`, `seq`
    SupervisorLoading,

    /// The incoming supervisor finished loading and is now current.
    ///
    /// Sets:
    /// - `supervisor`: name of the now-active supervisor
    /// - `at`, `seq`
    SupervisorActive,

    // === Stack lifecycle ===
    /// A state's enter hook completed.
    ///
    /// Sets:
    /// - `state`: state name
    /// - `depth`: stack depth after the transition
    /// - `at`, `seq`
    StateEntered,

    /// A state's exit hook completed.
    ///
    /// Sets:
    /// - `state`: state name
    /// - `at`, `seq`
    StateExited,

    /// A push transition completed.
    ///
    /// Sets:
    /// - `state`: pushed state name
    /// - `depth`: stack depth after the push
    /// - `at`, `seq`
    StatePushed,

    /// A replace-top transition completed.
    ///
    /// Sets:
    /// - `state`: new top state name
    /// - `depth`: stack depth (unchanged by a replace)
    /// - `at`, `seq`
    StateReplaced,

    /// A pop transition completed.
    ///
    /// Sets:
    /// - `state`: newly exposed top state name (absent if the stack emptied)
    /// - `count`: number of entries discarded
    /// - `depth`: stack depth after the pop
    /// - `at`, `seq`
    StatePopped,

    /// The whole stack was torn down (every stacked state exited).
    ///
    /// Sets:
    /// - `count`: number of states exited
    /// - `at`, `seq`
    StackCleared,

    // === Diagnostics (non-fatal) ===
    /// A push grew the stack beyond the configured soft depth threshold.
    ///
    /// Sets:
    /// - `state`: pushed state name
    /// - `depth`: current stack depth
    /// - `at`, `seq`
    DepthWarning,

    /// A pop requested more entries than the stack holds; nothing was mutated.
    ///
    /// Sets:
    /// - `count`: requested pop count
    /// - `depth`: current stack depth
    /// - `at`, `seq`
    PopOutOfRange,

    /// A request was ignored (no active supervisor/stack, empty-stack reenter,
    /// late `set_context`).
    ///
    /// Sets:
    /// - `reason`: which operation was ignored and why
    /// - `at`, `seq`
    RequestIgnored,

    /// A transition failed; the error was surfaced to its logical caller.
    ///
    /// Sets:
    /// - `state`: state whose hook failed, if known
    /// - `reason`: error label/message
    /// - `at`, `seq`
    TransitionFailed,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Name of the supervisor, if applicable.
    pub supervisor: Option<Arc<str>>,
    /// Name of the state, if applicable.
    pub state: Option<Arc<str>>,
    /// Stack depth observed when the event was emitted.
    pub depth: Option<usize>,
    /// Entry count (pop requests, clear teardown size).
    pub count: Option<usize>,
    /// Human-readable reason (errors, ignored-request details).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next
    /// sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            supervisor: None,
            state: None,
            depth: None,
            count: None,
            reason: None,
        }
    }

    /// Attaches a supervisor name.
    #[inline]
    pub fn with_supervisor(mut self, supervisor: impl Into<Arc<str>>) -> Self {
        self.supervisor = Some(supervisor.into());
        self
    }

    /// Attaches a state name.
    #[inline]
    pub fn with_state(mut self, state: impl Into<Arc<str>>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Attaches the observed stack depth.
    #[inline]
    pub fn with_depth(mut self, depth: usize) -> Self {
        self.depth = Some(depth);
        self
    }

    /// Attaches an entry count.
    #[inline]
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// True for the non-fatal diagnostic kinds.
    #[inline]
    pub fn is_diagnostic(&self) -> bool {
        matches!(
            self.kind,
            EventKind::DepthWarning | EventKind::PopOutOfRange | EventKind::RequestIgnored
        )
    }
}
