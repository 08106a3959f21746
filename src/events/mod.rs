//! Event surface: the broadcast [`Bus`] and the [`Event`]/[`EventKind`] types
//! published on it.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
