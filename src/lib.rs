pub mod config;
pub mod device;
pub mod error;
pub mod graph;
pub mod module;
pub mod pipe;

pub use config::{Config, TransportKind};
pub use error::PipeError;
pub use pipe::{BufPipe, UnbufPipe};

/// One amplitude value, nominally in [-1.0, 1.0]. Never clamped.
pub type Sample = f32;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Producer,
    Consumer,
}

/// A handle through which one thread talks to a transport.
///
/// Every endpoint is tagged with a role when it is created. `send` is only
/// valid on producers and `recv` only on consumers; the other call fails
/// with `PipeError::InvalidRole`.
pub trait Endpoint: Send {
    fn role(&self) -> Role;
    fn send(&mut self, s: Sample) -> Result<(), PipeError>;
    fn recv(&mut self) -> Result<Sample, PipeError>;
}

/// Something that hands out endpoints onto one broadcast stream.
pub trait Transport: Send + Sync {
    fn sender(&self) -> Result<Box<dyn Endpoint>, PipeError>;
    fn recver(&self) -> Result<Box<dyn Endpoint>, PipeError>;
}
