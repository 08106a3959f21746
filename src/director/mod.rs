//! Top level: the [`Director`] that owns the active supervisor, and the
//! [`Supervisor`] contract it drives.

mod core;
mod supervisor;

pub use core::Director;
pub use supervisor::{Phase, Supervisor, SupervisorRef};
