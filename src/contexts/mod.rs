//! Typed dependency registry given to states by their owning supervisor.

mod registry;

pub use registry::{ContextRegistry, ContextRegistryBuilder};
