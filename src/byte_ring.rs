//! Lock-free SPSC byte ring with backpressure, for interrupt-driven no-std I/O.
//!
//! # Overview
//! - Single producer, single consumer, each holding a role handle on the same ring.
//! - Capacity `N` is a power of two; at most `N - 1` bytes are ever stored, so
//!   `write_index == read_index` always means empty.
//! - A push into a ring holding `N - 1` bytes is rejected: the byte is discarded, the
//!   drop counter increments, queued data is never touched.
//! - The consumer drains byte by byte (`pop`) or in contiguous runs (`bulk_slice` +
//!   `bulk_remove`) for transports that take a whole slice at once.
//!
//! # Indices
//! Both indices count every byte ever written/read and are never folded; only
//! `index & (N - 1)` addresses storage. Arithmetic between them wraps, and since `N`
//! divides `2^32` a wrapped index still folds to the right slot. `reset` rebases
//! the pair during quiescent phases to keep the raw counters small.
//!
//! # Memory ordering
//! The producer stores the byte, then publishes `write_index` with `Release`. The
//! consumer loads the byte, then publishes `read_index` with `Release`. Each side
//! loads the other side's index with `Acquire`. Each index has exactly one writer,
//! so neither side ever needs a read-modify-write on it.

use core::cell::UnsafeCell;
use core::fmt;

use crate::atomic::{AtomicBool, AtomicU32, Ordering};
use crate::error::{ClaimError, PushError};

/// Both indices must exceed this before `reset` rebases them.
pub const ROLLOVER_THRESHOLD: u32 = 1 << 30;

/// Fixed-capacity byte ring shared by one producer and one consumer.
///
/// `N` must be a power of two in `2..=2^31`; anything else fails to compile as soon
/// as `new` is instantiated.
pub struct ByteRing<const N: usize> {
    write_index: AtomicU32,
    read_index: AtomicU32,
    dropped: AtomicU32,
    reset_count: AtomicU32,
    producer_claimed: AtomicBool,
    consumer_claimed: AtomicBool,
    storage: UnsafeCell<[u8; N]>,
}

// The producer only writes slots outside `[read_index, write_index)` and the consumer
// only reads slots inside it; the index publish orders the hand-over.
unsafe impl<const N: usize> Sync for ByteRing<N> {}

impl<const N: usize> ByteRing<N> {
    const VALID_CAPACITY: () = assert!(
        N >= 2 && N.is_power_of_two() && (N as u64) <= 1 << 31,
        "ByteRing capacity must be a power of two in 2..=2^31"
    );

    const MASK: u32 = (N - 1) as u32;

    pub const fn new() -> Self {
        let () = Self::VALID_CAPACITY;
        Self {
            write_index: AtomicU32::new(0),
            read_index: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
            reset_count: AtomicU32::new(0),
            producer_claimed: AtomicBool::new(false),
            consumer_claimed: AtomicBool::new(false),
            storage: UnsafeCell::new([0; N]),
        }
    }

    #[inline(always)]
    const fn slot(index: u32) -> usize {
        (index & Self::MASK) as usize
    }

    #[inline(always)]
    fn base(&self) -> *mut u8 {
        self.storage.get().cast::<u8>()
    }

    /// Size of the backing store.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Most bytes the ring will ever hold at once.
    #[inline]
    pub const fn usable_capacity(&self) -> usize {
        N - 1
    }

    /// Bytes currently stored. A snapshot: either side may have moved by the time
    /// the caller acts on it.
    #[inline]
    pub fn used(&self) -> usize {
        // Read first: `read_index` never passes a later `write_index`.
        let read = self.read_index.load(Ordering::Acquire);
        let write = self.write_index.load(Ordering::Acquire);
        (write.wrapping_sub(read) as usize).min(N - 1)
    }

    /// `N - used()`. Note the ring refuses bytes once this reaches 1, not 0.
    #[inline]
    pub fn free(&self) -> usize {
        N - self.used()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.used() == 0
    }

    /// Bytes rejected because the ring was full, since construction.
    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// How many times `reset` has rebased the indices.
    #[inline]
    pub fn reset_count(&self) -> u32 {
        self.reset_count.load(Ordering::Relaxed)
    }

    /// New `(read, write)` after a rebase, or `None` while either index is below
    /// [`ROLLOVER_THRESHOLD`].
    fn rebased(&self, read: u32, write: u32) -> Option<(u32, u32)> {
        if read < ROLLOVER_THRESHOLD || write < ROLLOVER_THRESHOLD {
            log::debug!("byte ring reset skipped: read={read} write={write}");
            return None;
        }
        let rebase = read & !Self::MASK;
        let resets = self.reset_count.load(Ordering::Relaxed).wrapping_add(1);
        self.reset_count.store(resets, Ordering::Relaxed);
        log::debug!(
            "byte ring rebased by {rebase}: read={} write={} resets={resets}",
            read.wrapping_sub(rebase),
            write.wrapping_sub(rebase)
        );
        Some((read.wrapping_sub(rebase), write.wrapping_sub(rebase)))
    }

    /// Rebase both indices once they have both passed [`ROLLOVER_THRESHOLD`].
    ///
    /// Returns `true` if the indices were rebased. The rebase amount is a multiple of
    /// `N`, so every queued byte keeps its slot and the contents are unchanged.
    ///
    /// Taking `&mut self` means no role handle can be alive: the quiescence this
    /// maintenance step needs is checked by the borrow checker. Rings shared through
    /// a `static` use [`try_reset`](Self::try_reset) instead.
    pub fn reset(&mut self) -> bool {
        let read = *self.read_index.get_mut();
        let write = *self.write_index.get_mut();
        match self.rebased(read, write) {
            Some((read, write)) => {
                *self.read_index.get_mut() = read;
                *self.write_index.get_mut() = write;
                true
            }
            None => false,
        }
    }

    /// `reset` through a shared reference.
    ///
    /// Claims both roles for the duration of the rebase, so it fails with a
    /// `ClaimError` while a producer or consumer handle is alive. `Ok(false)` means
    /// the indices are still below the threshold.
    pub fn try_reset(&self) -> Result<bool, ClaimError> {
        if self.producer_claimed.swap(true, Ordering::Acquire) {
            log::warn!("byte ring reset requested while a producer is active");
            return Err(ClaimError::ProducerActive);
        }
        if self.consumer_claimed.swap(true, Ordering::Acquire) {
            self.producer_claimed.store(false, Ordering::Release);
            log::warn!("byte ring reset requested while a consumer is active");
            return Err(ClaimError::ConsumerActive);
        }

        let read = self.read_index.load(Ordering::Relaxed);
        let write = self.write_index.load(Ordering::Relaxed);
        let rebased = self.rebased(read, write);
        if let Some((read, write)) = rebased {
            self.read_index.store(read, Ordering::Relaxed);
            self.write_index.store(write, Ordering::Relaxed);
        }

        // The Release stores order the rebase before the next handle's claim.
        self.consumer_claimed.store(false, Ordering::Release);
        self.producer_claimed.store(false, Ordering::Release);
        Ok(rebased.is_some())
    }

    /// Claim the producer role, failing if a producer handle is alive.
    pub fn try_producer(&self) -> Result<Producer<'_, N>, ClaimError> {
        if self.producer_claimed.swap(true, Ordering::Acquire) {
            log::warn!("byte ring producer requested while one is active");
            return Err(ClaimError::ProducerActive);
        }
        Ok(Producer { ring: self })
    }

    /// Claim the consumer role, failing if a consumer handle is alive.
    pub fn try_consumer(&self) -> Result<Consumer<'_, N>, ClaimError> {
        if self.consumer_claimed.swap(true, Ordering::Acquire) {
            log::warn!("byte ring consumer requested while one is active");
            return Err(ClaimError::ConsumerActive);
        }
        Ok(Consumer { ring: self })
    }

    /// Create the producer handle. Panics if one is already active.
    #[inline]
    pub fn producer(&self) -> Producer<'_, N> {
        match self.try_producer() {
            Ok(producer) => producer,
            Err(err) => panic!("{err}"),
        }
    }

    /// Create the consumer handle. Panics if one is already active.
    #[inline]
    pub fn consumer(&self) -> Consumer<'_, N> {
        match self.try_consumer() {
            Ok(consumer) => consumer,
            Err(err) => panic!("{err}"),
        }
    }

    /// Both handles at once. Exclusive access proves no other handle is alive.
    pub fn split(&mut self) -> (Producer<'_, N>, Consumer<'_, N>) {
        *self.producer_claimed.get_mut() = true;
        *self.consumer_claimed.get_mut() = true;
        let ring = &*self;
        (Producer { ring }, Consumer { ring })
    }
}

impl<const N: usize> Default for ByteRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> fmt::Debug for ByteRing<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteRing")
            .field("capacity", &N)
            .field("write_index", &self.write_index.load(Ordering::Relaxed))
            .field("read_index", &self.read_index.load(Ordering::Relaxed))
            .field("dropped", &self.dropped())
            .field("reset_count", &self.reset_count())
            .finish()
    }
}

/// Write side of a [`ByteRing`]. Owns `write_index` and the drop counter.
#[derive(Debug)]
pub struct Producer<'a, const N: usize> {
    ring: &'a ByteRing<N>,
}

impl<'a, const N: usize> Producer<'a, N> {
    /// Append one byte.
    ///
    /// Returns how many more bytes the ring accepts after this one. On a full ring
    /// the byte is discarded, `dropped` increments and `PushError::Full` is returned;
    /// what to do next (retry, discard, flow control) is the caller's call.
    #[inline]
    pub fn push(&mut self, byte: u8) -> Result<usize, PushError> {
        let ring = self.ring;
        let write = ring.write_index.load(Ordering::Relaxed);
        let read = ring.read_index.load(Ordering::Acquire);
        let used = write.wrapping_sub(read) as usize;

        if used >= N - 1 {
            let dropped = ring.dropped.load(Ordering::Relaxed).wrapping_add(1);
            ring.dropped.store(dropped, Ordering::Relaxed);
            log::trace!("byte ring full, dropped={dropped}");
            return Err(PushError::Full);
        }

        // SAFETY: the slot lies outside `[read, write)`, so the consumer is not reading
        // it; the Acquire load above ordered its last read of this slot before us.
        unsafe { ring.base().add(ByteRing::<N>::slot(write)).write(byte) };
        ring.write_index.store(write.wrapping_add(1), Ordering::Release);

        Ok(N - 2 - used)
    }

    #[inline]
    pub fn used(&self) -> usize {
        let write = self.ring.write_index.load(Ordering::Relaxed);
        let read = self.ring.read_index.load(Ordering::Acquire);
        write.wrapping_sub(read) as usize
    }

    #[inline]
    pub fn free(&self) -> usize {
        N - self.used()
    }

    /// True when the next `push` would be rejected.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.used() >= N - 1
    }

    #[inline]
    pub fn dropped(&self) -> u32 {
        self.ring.dropped()
    }
}

impl<const N: usize> Drop for Producer<'_, N> {
    fn drop(&mut self) {
        self.ring.producer_claimed.store(false, Ordering::Release);
    }
}

/// Read side of a [`ByteRing`]. Owns `read_index`.
#[derive(Debug)]
pub struct Consumer<'a, const N: usize> {
    ring: &'a ByteRing<N>,
}

impl<'a, const N: usize> Consumer<'a, N> {
    /// Own read index and the occupancy seen from here.
    #[inline(always)]
    fn snapshot(&self) -> (u32, usize) {
        let read = self.ring.read_index.load(Ordering::Relaxed);
        let write = self.ring.write_index.load(Ordering::Acquire);
        (read, write.wrapping_sub(read) as usize)
    }

    /// Remove and return the oldest byte, `None` if the ring is empty.
    #[inline]
    pub fn pop(&mut self) -> Option<u8> {
        let (read, used) = self.snapshot();
        if used == 0 {
            return None;
        }

        // SAFETY: `read < write`, the producer published this slot and will not touch
        // it again until `read_index` moves past it.
        let byte = unsafe { self.ring.base().add(ByteRing::<N>::slot(read)).read() };
        self.ring
            .read_index
            .store(read.wrapping_add(1), Ordering::Release);
        Some(byte)
    }

    /// The oldest byte, left in place.
    #[inline]
    pub fn peek(&self) -> Option<u8> {
        let (read, used) = self.snapshot();
        if used == 0 {
            return None;
        }
        // SAFETY: as in `pop`.
        Some(unsafe { self.ring.base().add(ByteRing::<N>::slot(read)).read() })
    }

    /// Length of the contiguous run starting at the read position, stopping at the
    /// physical end of storage. Zero when empty.
    #[inline]
    pub fn bulk_len(&self) -> usize {
        let (read, used) = self.snapshot();
        if used == 0 {
            return 0;
        }
        used.min(N - ByteRing::<N>::slot(read))
    }

    /// The contiguous run `bulk_len` describes, `None` when empty.
    ///
    /// The slice borrows the consumer, so it cannot outlive the next `bulk_remove`
    /// or `pop`.
    pub fn bulk_slice(&self) -> Option<&[u8]> {
        let (read, used) = self.snapshot();
        if used == 0 {
            return None;
        }
        let start = ByteRing::<N>::slot(read);
        let len = used.min(N - start);
        // SAFETY: `[start, start + len)` is inside storage and holds published bytes
        // the producer cannot reach while `read_index` stays put.
        Some(unsafe { core::slice::from_raw_parts(self.ring.base().add(start), len) })
    }

    /// Release `count` bytes after a bulk read.
    ///
    /// `count` must not exceed the last `bulk_len`. A larger value trips a debug
    /// assertion and is clamped to the occupied length in release builds, so the
    /// occupancy invariant survives misuse.
    #[inline]
    pub fn bulk_remove(&mut self, count: usize) {
        let (read, used) = self.snapshot();
        debug_assert!(
            count <= used,
            "bulk_remove({count}) with only {used} bytes queued"
        );
        let count = count.min(used);
        self.ring
            .read_index
            .store(read.wrapping_add(count as u32), Ordering::Release);
    }

    /// `bulk_remove` without the clamp.
    ///
    /// # Safety
    /// `count` must not exceed the bytes currently queued. A larger value lets the
    /// read index pass the write index, after which the consumer reads slots the
    /// producer is writing.
    #[inline]
    pub unsafe fn bulk_remove_unchecked(&mut self, count: usize) {
        let read = self.ring.read_index.load(Ordering::Relaxed);
        self.ring
            .read_index
            .store(read.wrapping_add(count as u32), Ordering::Release);
    }

    /// Copy up to `dst.len()` queued bytes into `dst` through the bulk path.
    /// Returns the number of bytes copied.
    pub fn read_into(&mut self, dst: &mut [u8]) -> usize {
        let mut copied = 0;
        while copied < dst.len() {
            let Some(run) = self.bulk_slice() else {
                break;
            };
            let n = run.len().min(dst.len() - copied);
            dst[copied..copied + n].copy_from_slice(&run[..n]);
            copied += n;
            self.bulk_remove(n);
        }
        copied
    }

    #[inline]
    pub fn used(&self) -> usize {
        self.snapshot().1
    }

    #[inline]
    pub fn free(&self) -> usize {
        N - self.used()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.used() == 0
    }
}

impl<const N: usize> Drop for Consumer<'_, N> {
    fn drop(&mut self) {
        self.ring.consumer_claimed.store(false, Ordering::Release);
    }
}
