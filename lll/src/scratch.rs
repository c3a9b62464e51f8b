//! Reusable scratch space for the inner loops of the reductions.
//!
//! The orthogonalization needs temporary vectors all the time. Instead of
//! allocating them anew on every column visit, they are taken from a
//! [`ScratchPool`] and given back when the [`Scratch`] guard is dropped.
//! Every so often (decided by a [`Checkpoint`]) the pool is compacted, so a
//! long running reduction doesn't hold on to buffers that grew large once.

use std::cell::{Cell, RefCell};
use std::ops::{Deref, DerefMut};

/// A pool of reusable buffers.
#[derive(Debug)]
pub struct ScratchPool<T> {
    free: RefCell<Vec<Vec<T>>>,

    /// At most this many buffers survive a compaction.
    retain: usize,

    /// Number of buffers handed out in total.
    acquired: Cell<usize>,

    /// Number of those that were served from the pool.
    reused: Cell<usize>,
}

impl<T: Clone> ScratchPool<T> {
    pub fn new(retain: usize) -> Self {
        Self {
            free: RefCell::new(Vec::new()),
            retain,
            acquired: Cell::new(0),
            reused: Cell::new(0),
        }
    }

    /// Returns a buffer of length `len` with every entry set to `fill`.
    /// The buffer goes back into the pool when the guard is dropped.
    pub fn acquire(&self, len: usize, fill: T) -> Scratch<'_, T> {
        self.acquired.set(self.acquired.get() + 1);
        let buf = match self.free.borrow_mut().pop() {
            Some(mut buf) => {
                self.reused.set(self.reused.get() + 1);
                buf.clear();
                buf.resize(len, fill);
                buf
            }
            None => vec![fill; len],
        };
        Scratch {
            pool: self,
            buf: Some(buf),
        }
    }

    /// Drops all pooled buffers beyond the retention cap and releases the
    /// memory held by the remaining ones.
    pub fn compact(&self) {
        let mut free = self.free.borrow_mut();
        let dropped = free.len().saturating_sub(self.retain);
        free.truncate(self.retain);
        for buf in free.iter_mut() {
            buf.clear();
            buf.shrink_to_fit();
        }
        log::trace!(
            "compacted scratch pool: kept {} buffers, dropped {dropped}, reused {} of {}",
            free.len(),
            self.reused.get(),
            self.acquired.get()
        );
    }

    /// Number of buffers currently in the pool.
    #[cfg(test)]
    pub fn pooled(&self) -> usize {
        self.free.borrow().len()
    }

    /// How many acquisitions were served from the pool.
    #[cfg(test)]
    pub fn reused(&self) -> usize {
        self.reused.get()
    }

    /// How many buffers were acquired in total.
    #[cfg(test)]
    pub fn acquired(&self) -> usize {
        self.acquired.get()
    }
}

/// A buffer borrowed from a [`ScratchPool`].
pub struct Scratch<'a, T> {
    pool: &'a ScratchPool<T>,
    buf: Option<Vec<T>>,
}

impl<T> Scratch<'_, T> {
    /// Keeps the buffer instead of returning it to the pool.
    #[cfg(test)]
    pub fn into_inner(mut self) -> Vec<T> {
        self.buf.take().unwrap_or_default()
    }
}

impl<T> Deref for Scratch<'_, T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Self::Target {
        // Only `into_inner` and `drop` take the buffer.
        self.buf.as_ref().unwrap_or_else(|| unreachable!())
    }
}

impl<T> DerefMut for Scratch<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.buf.as_mut().unwrap_or_else(|| unreachable!())
    }
}

impl<T> Drop for Scratch<'_, T> {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            self.pool.free.borrow_mut().push(buf);
        }
    }
}

/// Fires every `every` ticks.
#[derive(Clone, Debug)]
pub struct Checkpoint {
    every: usize,
    visits: usize,
}

impl Checkpoint {
    /// A checkpoint that fires every `every` ticks. Zero means never.
    pub fn new(every: usize) -> Self {
        Self { every, visits: 0 }
    }

    /// Counts a visit and returns whether the checkpoint was reached.
    pub fn tick(&mut self) -> bool {
        if self.every == 0 {
            return false;
        }
        self.visits += 1;
        if self.visits == self.every {
            self.visits = 0;
            true
        } else {
            false
        }
    }
}
