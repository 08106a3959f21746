//! # Typed dependency registry handed to states by their owning supervisor.
//!
//! [`ContextRegistry`] replaces global singletons with a small, explicit set
//! of references chosen by the owning supervisor: a frozen map from concrete
//! type to one shared instance. States pull dependencies out of it inside
//! their enter hook instead of reaching for statics.
//!
//! ## Rules
//! - Built once via [`ContextRegistryBuilder`] before the first enter call
//!   that might consume it; immutable afterward (states never write into it).
//! - Exactly one registered instance per type. Registering the same type
//!   twice replaces the earlier instance with a warning.
//! - [`require`](ContextRegistry::require) is a hard failure for mandatory
//!   dependencies; [`try_get`](ContextRegistry::try_get) is the explicit
//!   optional query.
//!
//! ## Example
//! ```rust
//! use statevisor::ContextRegistry;
//!
//! struct Audio { volume: f32 }
//! struct Save;
//!
//! let ctx = ContextRegistry::builder()
//!     .with(Audio { volume: 0.8 })
//!     .build();
//!
//! let audio = ctx.require::<Audio>().unwrap();
//! assert_eq!(audio.volume, 0.8);
//! assert!(ctx.try_get::<Save>().is_none());
//! assert!(ctx.require::<Save>().is_err());
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use log::warn;

use crate::error::ContextError;

type Entry = Arc<dyn Any + Send + Sync>;

/// Frozen, typed lookup table of shared dependencies.
///
/// Cheap to clone (internally holds an `Arc`-backed map). The same type also
/// serves as the game-wide context object passed to
/// [`Supervisor::load`](crate::Supervisor::load).
#[derive(Clone, Default)]
pub struct ContextRegistry {
    entries: Arc<HashMap<TypeId, Entry>>,
}

impl ContextRegistry {
    /// Starts building a registry.
    pub fn builder() -> ContextRegistryBuilder {
        ContextRegistryBuilder::default()
    }

    /// Returns an empty registry (no dependencies registered).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the registered instance of `T`.
    ///
    /// Fails with [`ContextError::Missing`] if no instance of `T` was
    /// registered. A missing required dependency is fatal to the transition
    /// performing the lookup; the error propagates out of the enter/exit hook.
    pub fn require<T: Any + Send + Sync>(&self) -> Result<Arc<T>, ContextError> {
        self.try_get::<T>().ok_or(ContextError::Missing {
            type_name: std::any::type_name::<T>(),
        })
    }

    /// Returns the registered instance of `T`, or `None` if absent.
    ///
    /// The explicit query for optional dependencies.
    pub fn try_get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.entries
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|entry| entry.downcast::<T>().ok())
    }

    /// True if an instance of `T` was registered.
    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    /// Number of registered entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if nothing was registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builder for [`ContextRegistry`]; the only phase in which entries can be
/// added.
#[derive(Default)]
pub struct ContextRegistryBuilder {
    entries: HashMap<TypeId, Entry>,
}

impl ContextRegistryBuilder {
    /// Registers `value` keyed by its concrete type.
    ///
    /// Registering the same type twice replaces the earlier instance and logs
    /// a warning.
    pub fn with<T: Any + Send + Sync>(self, value: T) -> Self {
        self.with_shared(Arc::new(value))
    }

    /// Registers an already-shared instance keyed by its concrete type.
    ///
    /// Use this when the same instance must also stay reachable from outside
    /// the registry.
    pub fn with_shared<T: Any + Send + Sync>(mut self, value: Arc<T>) -> Self {
        if self.entries.insert(TypeId::of::<T>(), value).is_some() {
            warn!(
                "context entry `{}` was already registered and has been replaced",
                std::any::type_name::<T>()
            );
        }
        self
    }

    /// Freezes the entries into an immutable [`ContextRegistry`].
    pub fn build(self) -> ContextRegistry {
        ContextRegistry {
            entries: Arc::new(self.entries),
        }
    }
}
