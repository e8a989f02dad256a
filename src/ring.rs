//! Bounded SPSC ring buffer for engine events.
//!
//! Capacity is rounded up to the next power of two so indexing is a single
//! bitmask; one slot stays unused to distinguish full from empty, so a ring
//! built with capacity N holds N-1 items. Push fails (returns false) when
//! full; the producer's policy is to drop the event.
//!
//! Safety contract: exactly one producer calls `push` and exactly one
//! consumer calls `pop` at a time. Writes are published with a release
//! store on `tail` and observed with an acquire load in `pop`; slot reuse
//! is guarded symmetrically through `head`. Under the single-threaded
//! engine facade this reduces to plain sequencing.

use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Cache-line aligned counter so head and tail never share a line.
#[repr(align(64))]
struct PaddedAtomic(AtomicUsize);

/// Lock-free single-producer/single-consumer ring buffer.
pub struct EventRing<T> {
    buffer: Box<[UnsafeCell<MaybeUninit<T>>]>,
    mask: usize,
    /// Consumer position (next slot to read).
    head: PaddedAtomic,
    /// Producer position (next slot to write).
    tail: PaddedAtomic,
}

// One producer and one consumer may sit on different threads.
unsafe impl<T: Send> Send for EventRing<T> {}
unsafe impl<T: Send> Sync for EventRing<T> {}

impl<T> EventRing<T> {
    /// Create a ring with at least `capacity` slots, rounded up to the
    /// next power of two.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(2).next_power_of_two();
        let buffer = (0..capacity)
            .map(|_| UnsafeCell::new(MaybeUninit::uninit()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            buffer,
            mask: capacity - 1,
            head: PaddedAtomic(AtomicUsize::new(0)),
            tail: PaddedAtomic(AtomicUsize::new(0)),
        }
    }

    /// Push an item (producer side). Returns false if the ring is full.
    #[inline]
    pub fn push(&self, item: T) -> bool {
        let tail = self.tail.0.load(Ordering::Relaxed);
        let next_tail = (tail + 1) & self.mask;

        if next_tail == self.head.0.load(Ordering::Acquire) {
            return false; // full
        }

        unsafe {
            (*self.buffer[tail].get()).write(item);
        }
        self.tail.0.store(next_tail, Ordering::Release);
        true
    }

    /// Pop one item (consumer side). Returns `None` when empty.
    #[inline]
    pub fn pop(&self) -> Option<T> {
        let head = self.head.0.load(Ordering::Relaxed);

        if head == self.tail.0.load(Ordering::Acquire) {
            return None; // empty
        }

        let item = unsafe { (*self.buffer[head].get()).assume_init_read() };
        self.head.0.store((head + 1) & self.mask, Ordering::Release);
        Some(item)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.head.0.load(Ordering::Acquire) == self.tail.0.load(Ordering::Acquire)
    }

    /// Number of items currently buffered.
    #[inline]
    pub fn len(&self) -> usize {
        let head = self.head.0.load(Ordering::Acquire);
        let tail = self.tail.0.load(Ordering::Acquire);
        tail.wrapping_sub(head) & self.mask
    }

    /// Total slots (one is always kept free).
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }
}

impl<T> Drop for EventRing<T> {
    fn drop(&mut self) {
        while self.pop().is_some() {}
    }
}
