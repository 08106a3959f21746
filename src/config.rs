//! # Global runtime configuration.
//!
//! [`Config`] defines the orchestration core's tunables: the soft stack depth
//! warning threshold and the event bus capacity.
//!
//! # Example
//! ```
//! use statevisor::Config;
//!
//! let mut cfg = Config::default();
//! cfg.depth_warn = 12;
//!
//! assert_eq!(cfg.depth_warn, 12);
//! assert_eq!(cfg.bus_capacity, 1024);
//! ```

/// Configuration for the [`Director`](crate::Director) and its state stacks.
#[derive(Clone, Debug)]
pub struct Config {
    /// Soft stack depth threshold. A push that grows a stack beyond this
    /// depth emits a non-fatal [`DepthWarning`](crate::EventKind::DepthWarning)
    /// (possible runaway push loop). The operation itself proceeds.
    pub depth_warn: usize,
    /// Capacity of the event bus channel.
    pub bus_capacity: usize,
}

impl Default for Config {
    /// Provides a default configuration:
    /// - `depth_warn = 7`
    /// - `bus_capacity = 1024`
    fn default() -> Self {
        Self {
            depth_warn: 7,
            bus_capacity: 1024,
        }
    }
}
