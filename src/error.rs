use failure::Fail;

use crate::Role;

/// Misuse faults raised by the transports.
///
/// Liveness faults (an endpoint that never shows up at the barrier) are not
/// detected; they block forever.
#[derive(Debug, Fail, PartialEq)]
pub enum PipeError {
    #[fail(display = "{:?} endpoint cannot be used as a {:?}", found, expected)]
    InvalidRole { expected: Role, found: Role },

    #[fail(display = "buffer capacity must be at least 1")]
    ZeroCapacity,

    #[fail(display = "transport already has a producer")]
    ProducerTaken,

    #[fail(display = "transport is sealed, data has started flowing")]
    Sealed,

    #[fail(display = "peer endpoint is gone")]
    Disconnected,
}

pub(crate) fn check_role(found: Role, expected: Role) -> Result<(), PipeError> {
    if found != expected {
        return Err(PipeError::InvalidRole { expected, found });
    }
    Ok(())
}
