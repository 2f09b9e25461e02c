//! Broadcast sample transports.
//!
//! Both pipes carry one producer's stream to every consumer, in order, one
//! sample per call. `BufPipe` batches the handoff behind a barrier,
//! `UnbufPipe` hands over every sample individually.

mod buffered;
mod unbuffered;

pub use buffered::{BufEnd, BufPipe};
pub use unbuffered::{UnbufEnd, UnbufPipe};

use crate::config::TransportKind;
use crate::{PipeError, Transport};

/// Build the transport a `TransportKind` names.
pub fn open(kind: TransportKind, capacity: usize) -> Result<Box<dyn Transport>, PipeError> {
    Ok(match kind {
        TransportKind::Buffered => Box::new(BufPipe::new(capacity)?),
        TransportKind::Unbuffered => Box::new(UnbufPipe::new()),
    })
}
