//! GATT attribute server core: configuration model, attribute table builder,
//! handle index, request dispatch, and the server lifecycle state machine.

pub use {config::*, index::*, io::*, server::*, table::*};

use crate::att::*;

mod config;
mod index;
mod io;
mod server;
mod table;

/// Error type returned by the GATT server core.
#[derive(Clone, Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The configuration cannot produce a valid attribute table. Fatal,
    /// detected at build time.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(&'static str),
    /// The stack-assigned handle range does not match the submitted table.
    /// Fatal, request routing cannot be trusted.
    #[error("attribute table has {expected} entries but the stack assigned {actual} handles")]
    HandleRangeMismatch { expected: u16, actual: u16 },
    /// A request referenced a handle outside the current index. The request
    /// is dropped, the server keeps running.
    #[error("no attribute registered for handle {0:#06X}")]
    UnknownHandle(u16),
    /// An application callback signaled an error for one request.
    #[error("callback failed with {0}")]
    Callback(#[from] ErrorCode),
    /// The stack reported a failure status for an operation.
    #[error("stack reported {0}")]
    Stack(#[from] Status),
    /// An event arrived that is not legal in the current lifecycle state.
    #[error("{event} event is not valid in the {state:?} state")]
    InvalidTransition { state: State, event: &'static str },
}

/// Common result type for the server core.
pub type Result<T> = std::result::Result<T, Error>;
