//! Admission gate: a fixed number of execution slots, no waiting

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::errors::ExecError;

/// Counting semaphore with non-blocking acquire.
///
/// Held slots never exceed the size and never drop below zero.
#[derive(Debug)]
pub struct Semaphore {
    size: usize,
    held: AtomicUsize,
}

/// A held slot, released on drop
#[derive(Debug)]
pub struct Permit<'a> {
    sem: &'a Semaphore,
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        self.sem.release();
    }
}

impl Semaphore {
    pub fn new(size: usize) -> Self {
        Self {
            size,
            held: AtomicUsize::new(0),
        }
    }

    /// Take a slot for the lifetime of the permit, or fail with
    /// [`ExecError::Busy`] right away
    pub fn try_acquire(&self) -> Result<Permit<'_>, ExecError> {
        self.acquire()?;
        Ok(Permit { sem: self })
    }

    /// Take a slot; the caller must [`release`](Self::release) it
    pub fn acquire(&self) -> Result<(), ExecError> {
        self.held
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |held| {
                (held < self.size).then_some(held + 1)
            })
            .map(|_| ())
            .map_err(|_| ExecError::Busy)
    }

    /// Return a slot. Releasing more than was acquired is a no-op.
    pub fn release(&self) {
        let _ = self
            .held
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |held| {
                held.checked_sub(1)
            });
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Slots currently held
    pub fn held(&self) -> usize {
        self.held.load(Ordering::Acquire)
    }
}
