//! Subscriber surface: the [`Subscribe`] trait and the [`SubscriberSet`]
//! fan-out that drives each subscriber from its own bounded queue.

mod set;
mod subscribe;

pub use set::SubscriberSet;
pub use subscribe::Subscribe;

#[cfg(feature = "logging")]
mod log;
#[cfg(feature = "logging")]
pub use self::log::LogWriter;
