//! State abstraction: the [`State`] trait, the shared [`StateRef`] handle,
//! and the closure-backed [`StateFn`] convenience implementation.

mod state;
mod state_fn;

pub use state::{State, StateRef};
pub use state_fn::StateFn;
