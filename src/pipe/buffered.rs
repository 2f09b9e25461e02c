use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use crossbeam_utils::CachePadded;
use log::*;

use crate::error::{check_role, PipeError};
use crate::{Endpoint, Role, Sample, Transport};

// Barrier bookkeeping. Everything in here is only touched under the lock.
struct Round {
    ends: usize,
    arrived: usize,
    generation: u64,
    producer: bool,
}

struct Shared {
    capacity: usize,
    // In generation g the producer writes bufs[g & 1] and the consumers read
    // the other one. Slots are relaxed atomics; ordering between rounds comes
    // from the round lock.
    bufs: [Box<[AtomicU32]>; 2],
    round: CachePadded<Mutex<Round>>,
    swapped: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Round> {
        self.round.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mark one endpoint done with its buffer. The last arriver of a round
    /// swaps the buffers inline and wakes everyone.
    fn arrive(&self) {
        let mut round = self.lock();
        round.arrived += 1;
        if round.arrived == round.ends {
            round.arrived = 0;
            round.generation += 1;
            trace!(
                "swapped buffers for {} ends, generation {}",
                round.ends,
                round.generation
            );
            self.swapped.notify_all();
        }
    }

    /// Block until the round after `generation` has started.
    fn wait(&self, generation: u64) -> u64 {
        let mut round = self.lock();
        // a wakeup only counts once the generation has actually moved
        while round.generation == generation {
            round = self
                .swapped
                .wait(round)
                .unwrap_or_else(PoisonError::into_inner);
        }
        debug_assert_eq!(round.generation, generation + 1);
        round.generation
    }
}

fn new_buf(capacity: usize) -> Box<[AtomicU32]> {
    (0..capacity).map(|_| AtomicU32::new(0)).collect()
}

/// Barrier-synchronized, double-buffered broadcast pipe.
///
/// One producer fills a buffer of `capacity` samples while every consumer
/// reads the previous one. When every endpoint has traversed its buffer the
/// two buffers trade roles. Endpoints only touch shared state once per
/// `capacity` samples.
///
/// Crossing the barrier happens in two halves. An endpoint arrives as soon as
/// it has written or read the last slot of its buffer, without blocking, and
/// only waits for the swap when it needs the next slot. A finished batch is
/// therefore published immediately, and a module reading two streams that
/// share a source cannot wedge itself by holding one of them back.
///
/// All endpoints must be created before data starts flowing, and every one
/// of them must keep being driven: a single idle endpoint stalls the whole
/// pipe at the next barrier.
#[derive(Clone)]
pub struct BufPipe {
    shared: Arc<Shared>,
}

impl BufPipe {
    pub fn new(capacity: usize) -> Result<BufPipe, PipeError> {
        if capacity == 0 {
            return Err(PipeError::ZeroCapacity);
        }

        Ok(BufPipe {
            shared: Arc::new(Shared {
                capacity,
                bufs: [new_buf(capacity), new_buf(capacity)],
                round: CachePadded::new(Mutex::new(Round {
                    ends: 0,
                    arrived: 0,
                    generation: 0,
                    producer: false,
                })),
                swapped: Condvar::new(),
            }),
        })
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Number of endpoints the barrier waits for.
    pub fn ends(&self) -> usize {
        self.shared.lock().ends
    }

    /// The single producer endpoint.
    pub fn sender(&self) -> Result<BufEnd, PipeError> {
        let mut round = self.shared.lock();
        if round.generation > 0 {
            return Err(PipeError::Sealed);
        }
        if round.producer {
            return Err(PipeError::ProducerTaken);
        }
        round.producer = true;
        round.ends += 1;
        debug!("new buffered sender, {} ends", round.ends);

        Ok(BufEnd {
            shared: self.shared.clone(),
            role: Role::Producer,
            cursor: 0,
            generation: round.generation,
            arrived: false,
        })
    }

    /// A consumer endpoint. It starts out arrived with nothing to read, so it
    /// never sees the unwritten initial buffer.
    pub fn recver(&self) -> Result<BufEnd, PipeError> {
        let mut round = self.shared.lock();
        if round.generation > 0 {
            return Err(PipeError::Sealed);
        }
        round.ends += 1;
        round.arrived += 1;
        debug!("new buffered recver, {} ends", round.ends);

        Ok(BufEnd {
            shared: self.shared.clone(),
            role: Role::Consumer,
            cursor: self.shared.capacity,
            generation: round.generation,
            arrived: true,
        })
    }
}

impl Transport for BufPipe {
    fn sender(&self) -> Result<Box<dyn Endpoint>, PipeError> {
        Ok(Box::new(BufPipe::sender(self)?))
    }

    fn recver(&self) -> Result<Box<dyn Endpoint>, PipeError> {
        Ok(Box::new(BufPipe::recver(self)?))
    }
}

pub struct BufEnd {
    shared: Arc<Shared>,
    role: Role,
    cursor: usize,
    generation: u64,
    arrived: bool,
}

impl BufEnd {
    fn slot(&self) -> &AtomicU32 {
        let parity = match self.role {
            Role::Producer => self.generation & 1,
            Role::Consumer => (self.generation + 1) & 1,
        };
        &self.shared.bufs[parity as usize][self.cursor]
    }

    fn arrive(&mut self) {
        trace!("{:?} arrived, generation {}", self.role, self.generation);
        self.shared.arrive();
        self.arrived = true;
    }

    fn wait(&mut self) {
        self.generation = self.shared.wait(self.generation);
        self.cursor = 0;
        self.arrived = false;
    }
}

impl Endpoint for BufEnd {
    fn role(&self) -> Role {
        self.role
    }

    fn send(&mut self, s: Sample) -> Result<(), PipeError> {
        check_role(self.role, Role::Producer)?;

        if self.arrived {
            self.wait();
        }
        self.slot().store(s.to_bits(), Ordering::Relaxed);
        self.cursor += 1;
        if self.cursor == self.shared.capacity {
            self.arrive();
        }
        Ok(())
    }

    fn recv(&mut self) -> Result<Sample, PipeError> {
        check_role(self.role, Role::Consumer)?;

        if self.arrived {
            self.wait();
        }
        let s = Sample::from_bits(self.slot().load(Ordering::Relaxed));
        self.cursor += 1;
        if self.cursor == self.shared.capacity {
            self.arrive();
        }
        Ok(s)
    }
}
