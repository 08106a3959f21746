//! # statevisor
//!
//! **Statevisor** is a lightweight supervisor/state orchestration core for Rust.
//!
//! It lets an application switch between large mutually-exclusive execution
//! contexts ("supervisors" — levels, menus, hubs) and, within each, manage a
//! stack of finer-grained execution modes ("states" — playing, paused,
//! in-dialog) via asynchronous, possibly-long-running enter/exit transitions.
//! The crate is designed as a building block for game runtimes and other
//! mode-driven applications; it knows nothing about rendering, input, or
//! persistence — it only sequences opaque asynchronous units of work.
//!
//! ## Architecture
//! ```text
//!     ┌──────────────┐        ┌──────────────┐
//!     │  Supervisor  │        │  Supervisor  │     (one active at a time)
//!     │   ("menu")   │        │  ("level-1") │
//!     └──────┬───────┘        └──────┬───────┘
//!            ▼                       ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Director (top-level orchestrator)                                │
//! │  - owns the single active Supervisor + game-wide ContextRegistry  │
//! │  - switch_to(): drain stack → unload current → load next          │
//! │  - forwards push/set/pop/reenter/clear to the active StateStack   │
//! │  - Bus (broadcast events) + SubscriberSet (fan-out)               │
//! └──────────────────────────────┬────────────────────────────────────┘
//!                                ▼
//!          ┌─────────────────────────────────────────────┐
//!          │  StateStack (one per loaded supervisor)     │
//!          │  - strict FIFO queue of transition requests │
//!          │  - exactly one exit/enter cycle in flight   │
//!          │  - ContextRegistry handed to every enter    │
//!          └───────┬─────────────────┬───────────────────┘
//!                  ▼                 ▼
//!            ┌──────────┐      ┌──────────┐
//!            │  State   │      │  State   │    (top = current)
//!            │("paused")│      │("playing")│
//!            └──────────┘      └──────────┘
//! ```
//!
//! ### Transition lifecycle
//! ```text
//! change(state, action)
//!   ├─► drain in flight? ──► enqueue FIFO; awaiting caller parks until the
//!   │                        queue it joined fully drains (it may land on a
//!   │                        different state than requested — documented)
//!   └─► idle?            ──► exit current top → apply mutation → enter new top
//!                            then drain whatever queued up meanwhile
//! ```
//!
//! ## Features
//! | Area              | Description                                                       | Key types / traits                  |
//! |-------------------|-------------------------------------------------------------------|-------------------------------------|
//! | **Supervision**   | Atomic supervisor switches with load/unload lifecycle.            | [`Director`], [`Supervisor`]        |
//! | **State stack**   | Serialized push/replace/pop/clear over async states.              | [`StateStack`], [`StackAction`]     |
//! | **Context**       | Typed dependency registry instead of global singletons.           | [`ContextRegistry`]                 |
//! | **Subscriber API**| Hook into lifecycle events (telemetry, UI glue).                  | [`Subscribe`], [`SubscriberSet`]    |
//! | **States**        | Define states as structs or closures.                             | [`State`], [`StateRef`], [`StateFn`]|
//! | **Errors**        | Typed errors per layer.                                           | [`OrchestratorError`], [`TransitionError`] |
//! | **Configuration** | Centralize runtime settings.                                      | [`Config`]                          |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Concurrency model
//! Single-threaded cooperative: there is no parallel execution of
//! transitions, and "concurrency" means interleaving of suspension points on
//! one logical thread of control (a current-thread tokio runtime is the
//! reference driver). Suspension points are exactly `enter`, `exit`, `load`,
//! and `unload`; each may suspend internally before signaling completion.
//! Cancellation of in-flight or queued transitions is not supported.
//!
//! ## Example
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use async_trait::async_trait;
//! use statevisor::{
//!     Bus, Config, ContextRegistry, Director, StateError, StateFn, StateStack,
//!     Supervisor, SupervisorError,
//! };
//!
//! struct Level {
//!     bus: Bus,
//!     cfg: Config,
//!     stack: Mutex<Option<StateStack>>,
//! }
//!
//! #[async_trait]
//! impl Supervisor for Level {
//!     fn name(&self) -> &str { "level-1" }
//!
//!     async fn load(&self, ctx: &ContextRegistry) -> Result<(), SupervisorError> {
//!         let stack = StateStack::new(ctx.clone(), self.bus.clone(), &self.cfg);
//!         *self.stack.lock().unwrap() = Some(stack);
//!         Ok(())
//!     }
//!
//!     async fn unload(&self) -> Result<(), SupervisorError> {
//!         self.stack.lock().unwrap().take();
//!         Ok(())
//!     }
//!
//!     fn stack(&self) -> Option<StateStack> {
//!         self.stack.lock().unwrap().clone()
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let director = Director::new(Config::default(), Vec::new());
//!
//!     let level = Arc::new(Level {
//!         bus: director.bus(),
//!         cfg: director.config().clone(),
//!         stack: Mutex::new(None),
//!     });
//!     director.switch_to(level).await?;
//!
//!     let playing = StateFn::arc(
//!         "playing",
//!         |_ctx: ContextRegistry| async { Ok::<_, StateError>(()) },
//!         || async { Ok::<_, StateError>(()) },
//!     );
//!     director.push_state(playing).await?;
//!
//!     assert_eq!(director.current_supervisor().as_deref(), Some("level-1"));
//!     assert_eq!(director.current_state().as_deref(), Some("playing"));
//!     Ok(())
//! }
//! ```

mod config;
mod contexts;
mod director;
mod error;
mod events;
mod stack;
mod states;
mod subscribers;

// ---- Public re-exports ----

pub use config::Config;
pub use contexts::{ContextRegistry, ContextRegistryBuilder};
pub use director::{Director, Phase, Supervisor, SupervisorRef};
pub use error::{
    ContextError, OrchestratorError, StateError, SupervisorError, TransitionError,
};
pub use events::{Bus, Event, EventKind};
pub use stack::{StackAction, StateStack};
pub use states::{State, StateFn, StateRef};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
