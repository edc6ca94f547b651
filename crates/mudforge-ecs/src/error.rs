//! Error types for the registry.

use crate::{EntityId, SystemId};

/// Errors returned by [`World`](crate::World) operations.
///
/// These are "benign absence" failures: the thing you asked about isn't
/// there (any more). Callers inside event handlers log them and move on;
/// nothing here should ever take down the dispatch loop.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EcsError {
    /// The entity was never created, or has already been released.
    #[error("entity {0} does not exist")]
    NoSuchEntity(EntityId),

    /// Every entity slot is live and none is free for reuse.
    #[error("no free entity slot ({0} in use)")]
    SlotsExhausted(usize),

    /// No system with this id is attached.
    #[error("system {0} is not attached")]
    NoSuchSystem(SystemId),
}
