use std::{fmt, ptr::NonNull};

use crate::{
  align::checked_align4,
  block::{BlockInfo, BlockKind},
  error::AllocError,
  ledger::Ledger,
  pool::Pool,
  search::SearchMode,
  stats::{AllocationStats, Fragmentation},
};

/// Number of block records an [`Allocator::new`] ledger can hold.
pub const DEFAULT_LEDGER_CAPACITY: usize = 10_000;

/// Opaque reference to an allocated extent: its offset from the pool base.
///
/// A handle stays meaningful only until it is freed or the pool is destroyed.
/// Freeing a handle the allocator does not know about is a no-op.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(usize);

impl Handle {
  pub fn from_offset(
    offset: usize,
  ) -> Self {
    Self(offset)
  }

  pub fn offset(
    &self,
  ) -> usize {
    self.0
  }
}

/// A pool allocator with a pluggable placement strategy.
///
/// Each instance owns its pool, its ledger and its search state, so any
/// number of allocators can live side by side. Not thread-safe.
///
/// ```rust
/// use fitalloc::{Allocator, SearchMode};
///
/// let mut allocator = Allocator::new();
/// allocator.init(100, SearchMode::BestFit).unwrap();
///
/// let handle = allocator.allocate(10);
/// allocator.get_mut(handle.unwrap()).unwrap()[..6].copy_from_slice(b"Hello\n");
/// assert_eq!(allocator.block_count(), 2);
///
/// allocator.free(handle);
/// assert_eq!(allocator.block_count(), 1);
///
/// allocator.destroy();
/// ```
pub struct Allocator {
  pool: Option<Pool>,
  ledger: Ledger,
  mode: SearchMode,
  next_fit_cursor: Option<usize>,
  stats: AllocationStats,
}

impl Allocator {
  /// Creates an uninitialized allocator with room for
  /// [`DEFAULT_LEDGER_CAPACITY`] block records.
  pub fn new() -> Self {
    Self::with_ledger_capacity(DEFAULT_LEDGER_CAPACITY)
  }

  /// Creates an uninitialized allocator whose ledger holds at most
  /// `capacity` live blocks. The table is reserved once and never grows.
  pub fn with_ledger_capacity(
    capacity: usize,
  ) -> Self {
    Self {
      pool: None,
      ledger: Ledger::with_capacity(capacity),
      mode: SearchMode::default(),
      next_fit_cursor: None,
      stats: AllocationStats::default(),
    }
  }

  /// Reserves a pool of `capacity` bytes (rounded up to the alignment unit)
  /// and starts tracking it as a single hole.
  ///
  /// Any pool from an earlier `init` is released first. On error the
  /// allocator is left uninitialized.
  pub fn init(
    &mut self,
    capacity: usize,
    mode: SearchMode,
  ) -> Result<(), AllocError> {
    self.destroy();

    let aligned = checked_align4(capacity)
      .filter(|&aligned| aligned > 0)
      .ok_or(AllocError::InvalidSize { capacity })?;

    let pool = Pool::reserve(aligned)?;

    if !self.ledger.reset(aligned) {
      return Err(AllocError::LedgerFull {
        capacity: self.ledger.capacity(),
      });
    }

    self.pool = Some(pool);
    self.mode = mode;
    self.stats = AllocationStats::default();

    tracing::debug!(capacity = aligned, %mode, "pool initialized");

    Ok(())
  }

  /// Releases the pool and resets every ledger record. No-op on an
  /// allocator that holds no pool.
  pub fn destroy(
    &mut self,
  ) {
    let Some(pool) = self.pool.take() else {
      return;
    };

    self.ledger.clear();
    self.next_fit_cursor = None;

    tracing::debug!(capacity = pool.capacity(), "pool destroyed");
  }

  /// Allocates at least `size` bytes, or returns `None` if the request
  /// cannot be placed.
  pub fn allocate(
    &mut self,
    size: usize,
  ) -> Option<Handle> {
    self.try_allocate(size).ok()
  }

  /// Like [`allocate`](Self::allocate), reporting why a request failed.
  ///
  /// A failed request leaves the ledger and the search state untouched.
  pub fn try_allocate(
    &mut self,
    size: usize,
  ) -> Result<Handle, AllocError> {
    if self.pool.is_none() {
      return Err(AllocError::NotInitialized);
    }
    if size == 0 {
      self.stats.record_failure();
      return Err(AllocError::ZeroSized);
    }

    let Some(aligned) = checked_align4(size) else {
      self.stats.record_failure();
      return Err(AllocError::NoSuitableBlock { requested: size });
    };

    let cursor = self.next_fit_cursor;

    let Some(hole) = self
      .mode
      .select(&self.ledger, aligned, &mut self.next_fit_cursor)
    else {
      tracing::debug!(size = aligned, mode = %self.mode, "no suitable hole");
      self.stats.record_failure();
      return Err(AllocError::NoSuitableBlock { requested: size });
    };

    let index = if self.ledger.get(hole).size == aligned {
      self.ledger.get_mut(hole).kind = BlockKind::Process;
      hole
    } else {
      match self.ledger.split_front(hole, aligned) {
        Some(index) => index,
        None => {
          tracing::warn!(
            capacity = self.ledger.capacity(),
            "ledger full, cannot split hole"
          );
          self.next_fit_cursor = cursor;
          self.stats.record_failure();
          return Err(AllocError::LedgerFull {
            capacity: self.ledger.capacity(),
          });
        }
      }
    };

    let offset = self.ledger.get(index).offset;
    self.stats.record_allocation(aligned);

    tracing::trace!(offset, size = aligned, slot = index, "allocated");

    Ok(Handle(offset))
  }

  /// Returns the block at `handle` to the pool, merging it with free
  /// neighbours. `None` and handles not currently allocated are ignored.
  pub fn free(
    &mut self,
    handle: Option<Handle>,
  ) {
    let Some(index) = handle.and_then(|handle| self.ledger.find_process(handle.offset())) else {
      tracing::trace!(?handle, "ignoring free of untracked handle");
      self.stats.record_ignored_free();
      return;
    };

    let size = self.ledger.get(index).size;
    self.ledger.get_mut(index).kind = BlockKind::Hole;

    let mut current = index;

    let prev = self
      .ledger
      .get(current)
      .prev
      .filter(|&prev| self.ledger.get(prev).is_hole());

    if let Some(prev) = prev {
      self.ledger.get_mut(prev).size += size;
      self.release_slot(current, prev);
      current = prev;
    }

    let next = self
      .ledger
      .get(current)
      .next
      .filter(|&next| self.ledger.get(next).is_hole());

    if let Some(next) = next {
      let merged = self.ledger.get(next).size;
      self.ledger.get_mut(current).size += merged;
      self.release_slot(next, current);
    }

    self.stats.record_free(size);

    tracing::trace!(
      offset = self.ledger.get(current).offset,
      size = self.ledger.get(current).size,
      "freed"
    );
  }

  /// Unlinks a record merged into `survivor`, moving the next-fit cursor
  /// along with it.
  fn release_slot(
    &mut self,
    index: usize,
    survivor: usize,
  ) {
    self.ledger.unlink(index);

    if self.next_fit_cursor == Some(index) {
      self.next_fit_cursor = Some(survivor);
    }
  }

  /// Number of blocks, holes and allocations alike, currently tracked.
  /// Zero for an allocator without a pool.
  pub fn block_count(
    &self,
  ) -> usize {
    self.ledger.len()
  }

  /// Live blocks in address order.
  pub fn blocks(
    &self,
  ) -> impl Iterator<Item = BlockInfo> + '_ {
    self.ledger.iter().map(|(_, block)| block.info())
  }

  pub fn is_initialized(
    &self,
  ) -> bool {
    self.pool.is_some()
  }

  /// Aligned pool size in bytes, or zero without a pool.
  pub fn capacity(
    &self,
  ) -> usize {
    self.pool.as_ref().map_or(0, Pool::capacity)
  }

  pub fn mode(
    &self,
  ) -> SearchMode {
    self.mode
  }

  pub fn ledger_capacity(
    &self,
  ) -> usize {
    self.ledger.capacity()
  }

  pub fn stats(
    &self,
  ) -> &AllocationStats {
    &self.stats
  }

  pub fn fragmentation(
    &self,
  ) -> Fragmentation {
    self
      .blocks()
      .fold(Fragmentation::default(), |mut acc, block| {
        if block.is_hole() {
          acc.free_bytes += block.size;
          acc.holes += 1;
          acc.largest_hole = acc.largest_hole.max(block.size);
        } else {
          acc.used_bytes += block.size;
        }
        acc
      })
  }

  /// The allocated extent behind `handle`.
  pub fn get(
    &self,
    handle: Handle,
  ) -> Option<&[u8]> {
    let block = self.ledger.get(self.ledger.find_process(handle.offset())?);
    self.pool.as_ref()?.slice(block.offset, block.size)
  }

  /// The allocated extent behind `handle`, writable.
  pub fn get_mut(
    &mut self,
    handle: Handle,
  ) -> Option<&mut [u8]> {
    let block = *self.ledger.get(self.ledger.find_process(handle.offset())?);
    self.pool.as_mut()?.slice_mut(block.offset, block.size)
  }

  /// Raw address of the allocated extent behind `handle`.
  pub fn as_ptr(
    &self,
    handle: Handle,
  ) -> Option<NonNull<u8>> {
    self.ledger.find_process(handle.offset())?;
    self.pool.as_ref()?.address(handle.offset())
  }
}

impl Default for Allocator {
  fn default() -> Self {
    Self::new()
  }
}

impl fmt::Debug for Allocator {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_struct("Allocator")
      .field("capacity", &self.capacity())
      .field("mode", &self.mode)
      .field("blocks", &self.block_count())
      .field("ledger_capacity", &self.ledger.capacity())
      .finish()
  }
}
