// src/ring.rs
//! Single-producer single-consumer byte queue between the receive interrupt
//! (or reader thread) and the terminal loop.

use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{TerminalError, TerminalResult};

#[derive(Debug)]
struct Shared {
    slots: Box<[AtomicU8]>,
    // next slot the consumer reads
    read: AtomicUsize,
    // next slot the producer writes
    write: AtomicUsize,
}

impl Shared {
    fn capacity(&self) -> usize {
        self.slots.len()
    }

    fn next(&self, index: usize) -> usize {
        (index + 1) % self.capacity()
    }

    fn len(&self) -> usize {
        let write = self.write.load(Ordering::Acquire);
        let read = self.read.load(Ordering::Acquire);
        (write + self.capacity() - read) % self.capacity()
    }
}

/// Fixed-size ring of `capacity` slots, one of which stays empty so a full
/// ring can be told apart from an empty one.
#[derive(Debug)]
pub struct ByteRing {
    shared: Arc<Shared>,
}

impl ByteRing {
    pub fn with_capacity(capacity: usize) -> TerminalResult<Self> {
        if capacity < 2 {
            return Err(TerminalError::RingCapacity { capacity });
        }
        let slots = (0..capacity).map(|_| AtomicU8::new(0)).collect();
        Ok(Self {
            shared: Arc::new(Shared {
                slots,
                read: AtomicUsize::new(0),
                write: AtomicUsize::new(0),
            }),
        })
    }

    pub fn split(self) -> (RingProducer, RingConsumer) {
        (
            RingProducer { shared: Arc::clone(&self.shared) },
            RingConsumer { shared: self.shared },
        )
    }
}

/// Writing end. Not `Clone`: there is exactly one producer.
#[derive(Debug)]
pub struct RingProducer {
    shared: Arc<Shared>,
}

impl RingProducer {
    /// Queue a byte. Returns false and drops the byte when the ring is full.
    pub fn push(&mut self, byte: u8) -> bool {
        let write = self.shared.write.load(Ordering::Relaxed);
        let next = self.shared.next(write);
        if next == self.shared.read.load(Ordering::Acquire) {
            return false;
        }
        self.shared.slots[write].store(byte, Ordering::Relaxed);
        self.shared.write.store(next, Ordering::Release);
        true
    }

    /// Queue as many bytes as fit and return how many were taken.
    pub fn push_slice(&mut self, bytes: &[u8]) -> usize {
        bytes.iter().take_while(|&&b| self.push(b)).count()
    }

    pub fn len(&self) -> usize {
        self.shared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Usable slots.
    pub fn capacity(&self) -> usize {
        self.shared.capacity() - 1
    }
}

/// Reading end.
#[derive(Debug)]
pub struct RingConsumer {
    shared: Arc<Shared>,
}

impl RingConsumer {
    pub fn pop(&mut self) -> Option<u8> {
        let read = self.shared.read.load(Ordering::Relaxed);
        if read == self.shared.write.load(Ordering::Acquire) {
            return None;
        }
        let byte = self.shared.slots[read].load(Ordering::Relaxed);
        self.shared.read.store(self.shared.next(read), Ordering::Release);
        Some(byte)
    }

    pub fn len(&self) -> usize {
        self.shared.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
