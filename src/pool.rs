use std::{ptr::NonNull, slice};

use libc::{c_void, calloc, free};

use crate::error::AllocError;

/// The contiguous byte region handed out by an [`Allocator`](crate::Allocator).
///
/// Reserved once with `calloc(3)` and released with `free(3)` on drop. The
/// memory starts zeroed, so every byte is initialized and may be borrowed as
/// a slice.
pub(crate) struct Pool {
  base: NonNull<u8>,
  capacity: usize,
}

impl Pool {
  /// Reserves `capacity` bytes. `capacity` must already be aligned and
  /// non-zero.
  pub fn reserve(
    capacity: usize,
  ) -> Result<Self, AllocError> {
    if capacity == 0 || capacity > isize::MAX as usize {
      return Err(AllocError::InvalidSize { capacity });
    }

    let address = unsafe { calloc(capacity, 1) } as *mut u8;

    match NonNull::new(address) {
      Some(base) => Ok(Self { base, capacity }),
      None => Err(AllocError::OutOfMemory { capacity }),
    }
  }

  pub fn capacity(
    &self,
  ) -> usize {
    self.capacity
  }

  /// Raw address of `offset` within the pool.
  pub fn address(
    &self,
    offset: usize,
  ) -> Option<NonNull<u8>> {
    if offset >= self.capacity {
      return None;
    }

    // SAFETY: `offset` is in bounds of the reservation.
    Some(unsafe { self.base.add(offset) })
  }

  pub fn slice(
    &self,
    offset: usize,
    len: usize,
  ) -> Option<&[u8]> {
    if offset.checked_add(len)? > self.capacity {
      return None;
    }

    // SAFETY: the range is in bounds, the memory was zero-initialized on
    // reservation and the shared borrow of `self` rules out writers.
    Some(unsafe { slice::from_raw_parts(self.base.as_ptr().add(offset), len) })
  }

  pub fn slice_mut(
    &mut self,
    offset: usize,
    len: usize,
  ) -> Option<&mut [u8]> {
    if offset.checked_add(len)? > self.capacity {
      return None;
    }

    // SAFETY: as in `slice`, with exclusivity guaranteed by `&mut self`.
    Some(unsafe { slice::from_raw_parts_mut(self.base.as_ptr().add(offset), len) })
  }
}

impl Drop for Pool {
  fn drop(
    &mut self,
  ) {
    unsafe { free(self.base.as_ptr() as *mut c_void) };
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_reserve_zeroed() {
    let pool = Pool::reserve(64).unwrap();

    assert_eq!(pool.capacity(), 64);
    assert!(pool.slice(0, 64).unwrap().iter().all(|&b| b == 0));
  }

  #[test]
  fn test_reserve_rejects_zero_and_huge() {
    assert!(matches!(
      Pool::reserve(0),
      Err(AllocError::InvalidSize { capacity: 0 })
    ));
    assert!(matches!(
      Pool::reserve(usize::MAX),
      Err(AllocError::InvalidSize { .. })
    ));
  }

  #[test]
  fn test_slice_bounds() {
    let mut pool = Pool::reserve(16).unwrap();

    assert!(pool.slice(12, 4).is_some());
    assert!(pool.slice(12, 8).is_none());
    assert!(pool.slice(usize::MAX, 2).is_none());
    assert!(pool.address(16).is_none());

    pool.slice_mut(4, 4).unwrap().copy_from_slice(b"abcd");
    assert_eq!(pool.slice(4, 4).unwrap(), b"abcd");
  }
}
