//! # Supervisor abstraction.
//!
//! A [`Supervisor`] is a top-level, mutually-exclusive execution context (one
//! game level, the main menu, a loading hub) with an async load/unload
//! lifecycle and an optional owned [`StateStack`]. The common handle type is
//! [`SupervisorRef`], an `Arc<dyn Supervisor>`.
//!
//! Supervisors are constructed by the caller and handed to the
//! [`Director`](crate::Director); `load` runs exactly once per activation,
//! `unload` exactly once before the next supervisor loads, and the previous
//! supervisor is discarded (owned by the caller, never pooled) after its
//! unload completes.

use async_trait::async_trait;
use std::sync::Arc;

use crate::contexts::ContextRegistry;
use crate::error::SupervisorError;
use crate::stack::StateStack;

/// Shared handle to a supervisor.
pub type SupervisorRef = Arc<dyn Supervisor>;

/// Lifecycle phase of the director's current supervisor slot.
///
/// `Unloaded → Loading → Active → Unloading → Unloaded` under normal
/// operation. After a failed switch the phase stays at the failing step
/// (`Unloading` or `Loading`) and requires caller-level recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No supervisor is loaded.
    Unloaded,
    /// The incoming supervisor's `load` is in flight.
    Loading,
    /// A supervisor is loaded and serving transitions.
    Active,
    /// The outgoing supervisor is being torn down (stack drain + `unload`).
    Unloading,
}

/// # Top-level execution context with an async load/unload lifecycle.
///
/// Both hooks may suspend internally (scene loads, asset streaming, saves)
/// before completing; the director awaits completion and never inspects what
/// happens inside. A supervisor that manages states builds its
/// [`StateStack`] during [`load`](Supervisor::load) and hands the same
/// handle out through [`stack`](Supervisor::stack).
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use statevisor::{
///     Bus, Config, ContextRegistry, StateStack, Supervisor, SupervisorError,
/// };
/// use std::sync::Mutex;
///
/// struct Hub {
///     bus: Bus,
///     cfg: Config,
///     stack: Mutex<Option<StateStack>>,
/// }
///
/// #[async_trait]
/// impl Supervisor for Hub {
///     fn name(&self) -> &str { "hub" }
///
///     async fn load(&self, ctx: &ContextRegistry) -> Result<(), SupervisorError> {
///         let stack = StateStack::new(ctx.clone(), self.bus.clone(), &self.cfg);
///         *self.stack.lock().unwrap() = Some(stack);
///         Ok(())
///     }
///
///     async fn unload(&self) -> Result<(), SupervisorError> {
///         self.stack.lock().unwrap().take();
///         Ok(())
///     }
///
///     fn stack(&self) -> Option<StateStack> {
///         self.stack.lock().unwrap().clone()
///     }
/// }
/// ```
#[async_trait]
pub trait Supervisor: Send + Sync + 'static {
    /// Returns a stable, human-readable supervisor name.
    fn name(&self) -> &str;

    /// Activates the supervisor against the game-wide context.
    ///
    /// Invoked exactly once per activation; any state stack set up in here
    /// (including states pushed during load) is fully settled before the
    /// triggering `switch_to` returns.
    async fn load(&self, ctx: &ContextRegistry) -> Result<(), SupervisorError>;

    /// Tears the supervisor down. Invoked exactly once, after the director
    /// has drained the supervisor's state stack and before the next
    /// supervisor loads.
    async fn unload(&self) -> Result<(), SupervisorError>;

    /// Returns the supervisor's state stack handle, if it owns one.
    ///
    /// The default is `None` for stackless supervisors.
    fn stack(&self) -> Option<StateStack> {
        None
    }
}
