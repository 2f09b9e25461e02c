use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crossbeam_channel::{bounded, Receiver, Sender};
use log::*;

use crate::error::PipeError;
use crate::{Endpoint, Role, Sample, Transport};

#[derive(Default)]
struct Registry {
    queues: Vec<Sender<Sample>>,
    producer: bool,
    sealed: bool,
}

/// Per-consumer single-slot queues with a broadcasting producer.
///
/// The producer can get at most one sample ahead of the slowest consumer.
/// One synchronization per sample per consumer; kept as the simple baseline
/// for `BufPipe`.
#[derive(Clone, Default)]
pub struct UnbufPipe {
    registry: Arc<Mutex<Registry>>,
}

impl UnbufPipe {
    pub fn new() -> UnbufPipe {
        UnbufPipe::default()
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn recvers(&self) -> usize {
        self.lock().queues.len()
    }

    pub fn sender(&self) -> Result<UnbufEnd, PipeError> {
        let mut reg = self.lock();
        if reg.sealed {
            return Err(PipeError::Sealed);
        }
        if reg.producer {
            return Err(PipeError::ProducerTaken);
        }
        reg.producer = true;
        debug!("new unbuffered sender");

        Ok(UnbufEnd {
            side: Side::Source {
                registry: self.registry.clone(),
                queues: None,
            },
        })
    }

    pub fn recver(&self) -> Result<UnbufEnd, PipeError> {
        let mut reg = self.lock();
        if reg.sealed {
            return Err(PipeError::Sealed);
        }
        let (tx, rx) = bounded(1);
        reg.queues.push(tx);
        debug!("new unbuffered recver #{}", reg.queues.len() - 1);

        Ok(UnbufEnd {
            side: Side::Sink(rx),
        })
    }
}

impl Transport for UnbufPipe {
    fn sender(&self) -> Result<Box<dyn Endpoint>, PipeError> {
        Ok(Box::new(UnbufPipe::sender(self)?))
    }

    fn recver(&self) -> Result<Box<dyn Endpoint>, PipeError> {
        Ok(Box::new(UnbufPipe::recver(self)?))
    }
}

enum Side {
    // queues are taken from the registry on the first send
    Source {
        registry: Arc<Mutex<Registry>>,
        queues: Option<Vec<Sender<Sample>>>,
    },
    Sink(Receiver<Sample>),
}

pub struct UnbufEnd {
    side: Side,
}

impl Endpoint for UnbufEnd {
    fn role(&self) -> Role {
        match self.side {
            Side::Source { .. } => Role::Producer,
            Side::Sink(_) => Role::Consumer,
        }
    }

    fn send(&mut self, s: Sample) -> Result<(), PipeError> {
        let (registry, queues) = match &mut self.side {
            Side::Source { registry, queues } => (registry, queues),
            Side::Sink(_) => return Err(invalid(Role::Producer, Role::Consumer)),
        };

        let queues = queues.get_or_insert_with(|| {
            let mut reg = registry.lock().unwrap_or_else(PoisonError::into_inner);
            reg.sealed = true;
            trace!("sealing unbuffered pipe with {} recvers", reg.queues.len());
            mem::take(&mut reg.queues)
        });
        for q in queues.iter() {
            q.send(s).map_err(|_| PipeError::Disconnected)?;
        }
        Ok(())
    }

    fn recv(&mut self) -> Result<Sample, PipeError> {
        match &self.side {
            Side::Sink(rx) => rx.recv().map_err(|_| PipeError::Disconnected),
            Side::Source { .. } => Err(invalid(Role::Consumer, Role::Producer)),
        }
    }
}

fn invalid(expected: Role, found: Role) -> PipeError {
    PipeError::InvalidRole { expected, found }
}
