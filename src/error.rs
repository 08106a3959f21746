//! Error types used by the orchestration core.
//!
//! This module defines the error enums raised at each layer:
//!
//! - [`OrchestratorError`] — errors surfaced by the [`Director`](crate::Director)
//!   (supervisor switches and forwarded stack operations).
//! - [`TransitionError`] — errors raised while executing one stack transition.
//! - [`StateError`] — errors returned by a state's own enter/exit hooks.
//! - [`ContextError`] — failed lookups in the [`ContextRegistry`](crate::ContextRegistry).
//! - [`SupervisorError`] — load/unload failures reported by supervisor implementations.
//!
//! The two caller-facing enums provide `as_label` / `as_message` helpers for
//! logging and metrics.
//!
//! Caller misuse (popping more states than exist, forwarding an operation while
//! no supervisor is active, re-entering an empty stack) is deliberately **not**
//! represented here: those are non-fatal diagnostics reported on the event bus,
//! and the operation becomes a no-op.

use std::sync::Arc;

use thiserror::Error;

/// Failed lookup in a [`ContextRegistry`](crate::ContextRegistry).
///
/// Raised by `require` when no instance of the requested capability was
/// registered. Fatal to the transition that performed the lookup.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ContextError {
    /// No instance of the requested type was registered.
    #[error("no instance of `{type_name}` was registered")]
    Missing {
        /// Name of the requested type.
        type_name: &'static str,
    },
}

/// # Errors produced by a state's enter/exit hooks.
///
/// A missing required dependency converts from [`ContextError`] via `?`.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StateError {
    /// A required dependency was missing from the context registry.
    #[error(transparent)]
    Context(#[from] ContextError),

    /// The hook itself failed for a state-specific reason.
    #[error("state hook failed: {reason}")]
    Failed {
        /// Human-readable failure description.
        reason: String,
    },
}

impl StateError {
    /// Shorthand constructor for [`StateError::Failed`].
    pub fn failed(reason: impl Into<String>) -> Self {
        StateError::Failed {
            reason: reason.into(),
        }
    }
}

/// # Errors produced while executing one stack transition.
///
/// The failing transition is aborted in place; no rollback is attempted. The
/// stack is left in a well-defined state (a failed enter leaves the new state
/// on top, "half-entered") that the caller must handle.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TransitionError {
    /// A state's enter hook failed; the state remains on top of the stack.
    #[error("enter of state '{state}' failed: {source}")]
    Enter {
        /// Name of the state whose enter failed.
        state: Arc<str>,
        /// Underlying hook error.
        source: StateError,
    },

    /// A state's exit hook failed; the planned stack mutation was abandoned.
    #[error("exit of state '{state}' failed: {source}")]
    Exit {
        /// Name of the state whose exit failed.
        state: Arc<str>,
        /// Underlying hook error.
        source: StateError,
    },

    /// The stack was dropped while this request was still queued.
    #[error("stack was dropped before the queued request ran")]
    StackDropped,
}

impl TransitionError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use statevisor::{StateError, TransitionError};
    ///
    /// let err = TransitionError::Enter {
    ///     state: "pause".into(),
    ///     source: StateError::failed("boom"),
    /// };
    /// assert_eq!(err.as_label(), "transition_enter_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TransitionError::Enter { .. } => "transition_enter_failed",
            TransitionError::Exit { .. } => "transition_exit_failed",
            TransitionError::StackDropped => "transition_stack_dropped",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TransitionError::Enter { state, source } => {
                format!("enter failed: state={state} err={source}")
            }
            TransitionError::Exit { state, source } => {
                format!("exit failed: state={state} err={source}")
            }
            TransitionError::StackDropped => "stack dropped with request queued".to_string(),
        }
    }
}

/// # Load/unload failures reported by supervisor implementations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SupervisorError {
    /// Supervisor load failed; the supervisor never became active.
    #[error("load of supervisor '{supervisor}' failed: {reason}")]
    Load {
        /// Name of the failing supervisor.
        supervisor: String,
        /// Human-readable failure description.
        reason: String,
    },

    /// Supervisor unload failed; the switch is abandoned mid-teardown.
    #[error("unload of supervisor '{supervisor}' failed: {reason}")]
    Unload {
        /// Name of the failing supervisor.
        supervisor: String,
        /// Human-readable failure description.
        reason: String,
    },
}

impl SupervisorError {
    /// Shorthand constructor for [`SupervisorError::Load`].
    pub fn load(supervisor: impl Into<String>, reason: impl Into<String>) -> Self {
        SupervisorError::Load {
            supervisor: supervisor.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand constructor for [`SupervisorError::Unload`].
    pub fn unload(supervisor: impl Into<String>, reason: impl Into<String>) -> Self {
        SupervisorError::Unload {
            supervisor: supervisor.into(),
            reason: reason.into(),
        }
    }
}

/// # Errors surfaced by the [`Director`](crate::Director).
///
/// `switch_to` propagates any failure raised during unload/load; the director
/// does not attempt automatic rollback. After a failure the director remains
/// in the failing phase (`Unloading` or `Loading`) and requires caller-level
/// recovery (log + abort is an acceptable default).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// A second `switch_to` arrived while a switch was still in flight.
    ///
    /// Concurrent switches are a caller-contract violation; the director
    /// rejects them with a typed error instead of interleaving lifecycles.
    #[error("a supervisor switch is already in flight")]
    SwitchInProgress,

    /// The outgoing or incoming supervisor failed to unload/load.
    #[error(transparent)]
    Supervisor(#[from] SupervisorError),

    /// Draining the outgoing supervisor's state stack failed.
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl OrchestratorError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use statevisor::OrchestratorError;
    ///
    /// let err = OrchestratorError::SwitchInProgress;
    /// assert_eq!(err.as_label(), "switch_in_progress");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            OrchestratorError::SwitchInProgress => "switch_in_progress",
            OrchestratorError::Supervisor(SupervisorError::Load { .. }) => "supervisor_load_failed",
            OrchestratorError::Supervisor(SupervisorError::Unload { .. }) => {
                "supervisor_unload_failed"
            }
            OrchestratorError::Transition(e) => e.as_label(),
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            OrchestratorError::SwitchInProgress => "switch already in flight".to_string(),
            OrchestratorError::Supervisor(e) => e.to_string(),
            OrchestratorError::Transition(e) => e.as_message(),
        }
    }
}
