//! # Stack mutation requests.
//!
//! [`StackAction`] is the public classification of the single `change`
//! primitive; [`Request`] is the internal unit the scheduler serializes
//! (a change, a pop, or a full clear — pop and clear are structurally
//! distinct primitives that follow the same serialization rule).

use tokio::sync::oneshot;

use crate::error::TransitionError;
use crate::states::StateRef;

/// Stack mutation applied by a `change` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackAction {
    /// Tear down the entire stack (every stacked state exits, top-down),
    /// then push the new state.
    ClearAndPush,
    /// Push the new state on top; the previous top exits but stays stacked.
    Push,
    /// Pop the current top (after its exit) and push the new state.
    ReplaceTop,
}

/// One serialized transition request.
pub(crate) enum Request {
    /// Exit current top, apply `action`, enter the new top.
    Change {
        state: StateRef,
        action: StackAction,
    },
    /// Exit current top, discard `count` entries, enter the newly exposed top.
    Pop { count: usize },
    /// Repeated single-pop until empty; every stacked state exits.
    Clear,
}

/// A queued request plus the channel its awaiting caller is parked on.
///
/// `ack` is `None` for fire-and-forget submissions. Acks are resolved in a
/// batch once the queue the request joined has fully drained.
pub(crate) struct Queued {
    pub(crate) request: Request,
    pub(crate) ack: Option<oneshot::Sender<Result<(), TransitionError>>>,
}
