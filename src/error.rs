//! Errors for the fallible constructors and `try_*` operations.
//!
//! Lookups never fail: a missing key reads back as the zero value of the
//! requested type. Only storage growth and engine lifetime can fail.

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapError {
    /// The allocation policy refused a growth request.
    #[error("allocation refused: {requested} bytes requested")]
    AllocationRefused {
        /// Total bytes the table storage would have occupied.
        requested: usize,
    },

    /// A capacity computation overflowed or the system allocator failed.
    #[error("table capacity overflow")]
    CapacityOverflow,

    /// The owning map was dropped and its engine closed.
    #[error("engine instance is closed")]
    EngineClosed,
}

impl From<hashbrown::TryReserveError> for MapError {
    fn from(_: hashbrown::TryReserveError) -> Self {
        MapError::CapacityOverflow
    }
}

impl From<std::collections::TryReserveError> for MapError {
    fn from(_: std::collections::TryReserveError) -> Self {
        MapError::CapacityOverflow
    }
}
