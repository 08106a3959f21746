//! # State abstraction.
//!
//! This module defines the [`State`] trait: an asynchronous execution mode
//! within a supervisor (paused, playing, in-menu, ...) with enter/exit
//! lifecycle hooks. The common handle type is [`StateRef`], an
//! `Arc<dyn State>` suitable for sharing across the runtime.
//!
//! A state receives the owning stack's [`ContextRegistry`] on enter and pulls
//! its dependencies from there instead of using global singletons.

use async_trait::async_trait;
use std::sync::Arc;

use crate::contexts::ContextRegistry;
use crate::error::StateError;

/// Shared handle to a state.
pub type StateRef = Arc<dyn State>;

/// # Asynchronous execution mode with enter/exit lifecycle.
///
/// A `State` has a stable [`name`](State::name) and two async hooks driven by
/// the owning [`StateStack`](crate::StateStack):
///
/// - [`enter`](State::enter) runs once after the state becomes the top of the
///   stack.
/// - [`exit`](State::exit) runs once right before it stops being the top
///   (popped, replaced, or the whole stack is cleared).
///
/// Both hooks may suspend internally (resource loads, animations) before
/// completing; the stack awaits the completion and never inspects what
/// happens inside. A state object is never reused across stack slots:
/// "re-enter" means a fresh exit+enter cycle on the *same logical* object
/// already on top.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use statevisor::{ContextRegistry, State, StateError};
///
/// struct Paused;
///
/// #[async_trait]
/// impl State for Paused {
///     fn name(&self) -> &str { "paused" }
///
///     async fn enter(&self, ctx: &ContextRegistry) -> Result<(), StateError> {
///         let _ = ctx;
///         // dim the screen, open the pause menu...
///         Ok(())
///     }
///
///     async fn exit(&self) -> Result<(), StateError> {
///         // close the pause menu...
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait State: Send + Sync + 'static {
    /// Returns a stable, human-readable state name.
    fn name(&self) -> &str;

    /// Runs once after this state becomes the top of the stack.
    ///
    /// Required dependencies come from `ctx` via
    /// [`require`](ContextRegistry::require); a missing one aborts the
    /// transition with the propagated error.
    async fn enter(&self, ctx: &ContextRegistry) -> Result<(), StateError>;

    /// Runs once right before this state stops being the top of the stack.
    async fn exit(&self) -> Result<(), StateError>;
}
