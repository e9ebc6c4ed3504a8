//! Fixed-capacity circular buffer with a runtime element size
//!
//! Storage is a flat array of `N` bytes. `init` chooses how many elements it
//! holds and how wide each one is; all offsets are kept in bytes and a push
//! or poll that crosses the end of the span is copied in two segments.
//!
//! [`RingBuffer::split`] hands out one [`Producer`] and one [`Consumer`].
//! They run concurrently without a lock: the producer is the only writer of
//! the write index, the consumer the only writer of the read index.
//!
//! `write == read` alone is ambiguous between empty and full. Each index
//! therefore counts over two laps of the span (`0..2 * span`): equal offsets
//! on the same lap mean empty, on different laps full. Fullness lives in the
//! index its side publishes, so neither side ever stores state the other one
//! owns.
//!
//! Ordering: the producer copies bytes in, then publishes its index
//! (release). The consumer copies bytes out, then publishes its index
//! (release). Each side reads the other's index with acquire before touching
//! storage. Only atomic loads and stores are used, no read-modify-write.

use core::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

/// Ring buffer errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RingError {
    /// Bad layout, or a slice that is not a whole number of elements
    InvalidParameter,
    /// `init` has not been called
    NotReady,
    /// Not enough free space for the whole push
    Overflow,
    /// Fewer elements stored than requested
    Underrun,
    /// Nothing stored
    Empty,
}

#[allow(clippy::declare_interior_mutable_const)]
const ZERO: AtomicU8 = AtomicU8::new(0);

/// Single-producer single-consumer ring buffer over `N` bytes
#[derive(Debug)]
pub struct RingBuffer<const N: usize> {
    storage: [AtomicU8; N],
    /// Capacity in elements
    capacity: usize,
    /// Element width in bytes
    elem_size: usize,
    /// Write position in bytes, `0..2 * span`
    write: AtomicUsize,
    /// Read position in bytes, `0..2 * span`
    read: AtomicUsize,
    initialized: bool,
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RingBuffer<N> {
    /// Create an uninitialized buffer; every operation fails until `init`
    pub const fn new() -> Self {
        Self {
            storage: [ZERO; N],
            capacity: 0,
            elem_size: 0,
            write: AtomicUsize::new(0),
            read: AtomicUsize::new(0),
            initialized: false,
        }
    }

    /// Create and initialize in one step
    pub fn with_layout(capacity: usize, elem_size: usize) -> Result<Self, RingError> {
        let mut ring = Self::new();
        ring.init(capacity, elem_size)?;
        Ok(ring)
    }

    /// Set the layout and clear storage
    pub fn init(&mut self, capacity: usize, elem_size: usize) -> Result<(), RingError> {
        if capacity < 2 || elem_size == 0 {
            return Err(RingError::InvalidParameter);
        }
        match capacity.checked_mul(elem_size) {
            Some(span) if span <= N => {}
            _ => return Err(RingError::InvalidParameter),
        }

        for byte in self.storage.iter_mut() {
            *byte.get_mut() = 0;
        }
        self.capacity = capacity;
        self.elem_size = elem_size;
        *self.write.get_mut() = 0;
        *self.read.get_mut() = 0;
        self.initialized = true;
        Ok(())
    }

    /// Discard all contents; storage is left as is
    pub fn reset(&mut self) -> Result<(), RingError> {
        self.ensure_ready()?;
        *self.write.get_mut() = 0;
        *self.read.get_mut() = 0;
        Ok(())
    }

    /// Hand out the writer and reader halves
    ///
    /// Both borrow the buffer, so layout changes wait until they are dropped.
    pub fn split(&mut self) -> Result<(Producer<'_, N>, Consumer<'_, N>), RingError> {
        self.ensure_ready()?;
        let ring: &Self = self;
        Ok((Producer { ring }, Consumer { ring }))
    }

    /// Stored element count, `None` before `init`
    pub fn len(&self) -> Option<usize> {
        if !self.initialized {
            return None;
        }
        let used = self.used_bytes(
            self.write.load(Ordering::Acquire),
            self.read.load(Ordering::Acquire),
        );
        Some(used / self.elem_size)
    }

    /// True when nothing can be read (including before `init`)
    pub fn is_empty(&self) -> bool {
        matches!(self.len(), None | Some(0))
    }

    /// True when no element can be pushed
    pub fn is_full(&self) -> bool {
        self.len() == Some(self.capacity)
    }

    /// Free element slots, `None` before `init`
    pub fn free(&self) -> Option<usize> {
        self.len().map(|len| self.capacity - len)
    }

    /// Capacity in elements (0 before `init`)
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Element width in bytes (0 before `init`)
    pub fn elem_size(&self) -> usize {
        self.elem_size
    }

    /// Append whole elements; all or nothing
    pub fn push(&mut self, items: &[u8]) -> Result<(), RingError> {
        self.write_items(items)
    }

    /// Remove `out.len() / elem_size` elements into `out`
    pub fn poll(&mut self, out: &mut [u8]) -> Result<(), RingError> {
        self.read_items(out)
    }

    /// Copy the oldest element into `out` without consuming it
    pub fn peek(&self, out: &mut [u8]) -> Result<(), RingError> {
        self.ensure_ready()?;
        if out.len() != self.elem_size {
            return Err(RingError::InvalidParameter);
        }

        let read = self.read.load(Ordering::Relaxed);
        let write = self.write.load(Ordering::Acquire);
        if self.used_bytes(write, read) == 0 {
            return Err(RingError::Empty);
        }

        self.copy_out(read, out);
        Ok(())
    }

    // Producer side: only caller that stores `write`
    fn write_items(&self, items: &[u8]) -> Result<(), RingError> {
        self.ensure_ready()?;
        self.ensure_whole(items.len())?;

        let bytes = items.len();
        if bytes == 0 {
            return Ok(());
        }

        let write = self.write.load(Ordering::Relaxed);
        let read = self.read.load(Ordering::Acquire);
        if bytes > self.span() - self.used_bytes(write, read) {
            return Err(RingError::Overflow);
        }

        let start = self.offset(write);
        let first = bytes.min(self.span() - start);
        for (slot, &byte) in self.storage[start..start + first].iter().zip(&items[..first]) {
            slot.store(byte, Ordering::Relaxed);
        }
        for (slot, &byte) in self.storage.iter().zip(&items[first..]) {
            slot.store(byte, Ordering::Relaxed);
        }

        self.write.store(self.advance(write, bytes), Ordering::Release);
        Ok(())
    }

    // Consumer side: only caller that stores `read`
    fn read_items(&self, out: &mut [u8]) -> Result<(), RingError> {
        self.ensure_ready()?;
        self.ensure_whole(out.len())?;

        let read = self.read.load(Ordering::Relaxed);
        let write = self.write.load(Ordering::Acquire);
        let used = self.used_bytes(write, read);
        if used == 0 {
            return Err(RingError::Empty);
        }
        let bytes = out.len();
        if bytes > used {
            return Err(RingError::Underrun);
        }
        if bytes == 0 {
            return Ok(());
        }

        self.copy_out(read, out);
        self.read.store(self.advance(read, bytes), Ordering::Release);
        Ok(())
    }

    fn copy_out(&self, read: usize, out: &mut [u8]) {
        let bytes = out.len();
        let start = self.offset(read);
        let first = bytes.min(self.span() - start);
        for (byte, slot) in out[..first].iter_mut().zip(&self.storage[start..start + first]) {
            *byte = slot.load(Ordering::Relaxed);
        }
        for (byte, slot) in out[first..].iter_mut().zip(self.storage.iter()) {
            *byte = slot.load(Ordering::Relaxed);
        }
    }

    fn span(&self) -> usize {
        self.capacity * self.elem_size
    }

    /// Storage offset of a two-lap position
    fn offset(&self, position: usize) -> usize {
        position % self.span()
    }

    fn advance(&self, position: usize, bytes: usize) -> usize {
        (position + bytes) % (2 * self.span())
    }

    /// Bytes between the two positions; `span` when full
    fn used_bytes(&self, write: usize, read: usize) -> usize {
        let laps = 2 * self.span();
        (write + laps - read) % laps
    }

    fn ensure_ready(&self) -> Result<(), RingError> {
        if self.initialized {
            Ok(())
        } else {
            Err(RingError::NotReady)
        }
    }

    fn ensure_whole(&self, bytes: usize) -> Result<(), RingError> {
        if bytes % self.elem_size == 0 {
            Ok(())
        } else {
            Err(RingError::InvalidParameter)
        }
    }
}

/// Writer half, owned by the link receive path
#[derive(Debug)]
pub struct Producer<'a, const N: usize> {
    ring: &'a RingBuffer<N>,
}

impl<const N: usize> Producer<'_, N> {
    /// Append whole elements; all or nothing
    pub fn push(&mut self, items: &[u8]) -> Result<(), RingError> {
        self.ring.write_items(items)
    }

    /// Free element slots as seen by the writer
    pub fn free(&self) -> Option<usize> {
        self.ring.free()
    }
}

/// Reader half, owned by the decoder
#[derive(Debug)]
pub struct Consumer<'a, const N: usize> {
    ring: &'a RingBuffer<N>,
}

impl<const N: usize> Consumer<'_, N> {
    /// Remove `out.len() / elem_size` elements into `out`
    pub fn poll(&mut self, out: &mut [u8]) -> Result<(), RingError> {
        self.ring.read_items(out)
    }

    /// Copy the oldest element into `out` without consuming it
    pub fn peek(&self, out: &mut [u8]) -> Result<(), RingError> {
        self.ring.peek(out)
    }

    /// Stored element count as seen by the reader
    pub fn len(&self) -> Option<usize> {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }
}
