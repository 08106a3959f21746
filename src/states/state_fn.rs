//! # Closure-backed state (`StateFn`)
//!
//! [`StateFn`] wraps a pair of closures producing a fresh future per hook
//! invocation, so simple states need no struct boilerplate. The enter closure
//! receives an owned clone of the [`ContextRegistry`] (the registry handle is
//! cheap to clone).
//!
//! ## Example
//! ```rust
//! use statevisor::{ContextRegistry, StateError, StateFn, StateRef};
//!
//! let s: StateRef = StateFn::arc(
//!     "loading-screen",
//!     |_ctx: ContextRegistry| async move {
//!         // fade in, kick off the load...
//!         Ok::<_, StateError>(())
//!     },
//!     || async move {
//!         // fade out...
//!         Ok::<_, StateError>(())
//!     },
//! );
//!
//! assert_eq!(s.name(), "loading-screen");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::contexts::ContextRegistry;
use crate::error::StateError;
use crate::states::state::State;

/// Closure-backed state implementation.
///
/// Wraps closures that *create* a new future per hook invocation. No hidden
/// mutation across invocations; shared mutable data goes through an explicit
/// `Arc<...>` captured by the closures.
pub struct StateFn<E, X> {
    name: Cow<'static, str>,
    enter: E,
    exit: X,
}

impl<E, X> StateFn<E, X> {
    /// Creates a new closure-backed state.
    ///
    /// Prefer [`StateFn::arc`] when you immediately need a [`StateRef`](crate::StateRef).
    pub fn new(name: impl Into<Cow<'static, str>>, enter: E, exit: X) -> Self {
        Self {
            name: name.into(),
            enter,
            exit,
        }
    }

    /// Creates the state and returns it as a shared handle (`Arc<StateFn>`).
    pub fn arc(name: impl Into<Cow<'static, str>>, enter: E, exit: X) -> Arc<Self> {
        Arc::new(Self::new(name, enter, exit))
    }
}

#[async_trait]
impl<E, X, EFut, XFut> State for StateFn<E, X>
where
    E: Fn(ContextRegistry) -> EFut + Send + Sync + 'static,
    X: Fn() -> XFut + Send + Sync + 'static,
    EFut: Future<Output = Result<(), StateError>> + Send + 'static,
    XFut: Future<Output = Result<(), StateError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn enter(&self, ctx: &ContextRegistry) -> Result<(), StateError> {
        (self.enter)(ctx.clone()).await
    }

    async fn exit(&self) -> Result<(), StateError> {
        (self.exit)().await
    }
}
