//! Allocation counters and fragmentation snapshots.
//!
//! [`AllocationStats`] accumulates over the lifetime of one pool (it is reset
//! by `init`); [`Fragmentation`] is computed on demand from the ledger.

/// Cumulative counters for one initialized pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct AllocationStats {
  /// Allocation requests that returned a block.
  pub allocations: u64,
  /// Allocation requests that found no hole or no free ledger record.
  pub failed_allocations: u64,
  /// Frees that released a block.
  pub frees: u64,
  /// Frees of a null handle or of an address not currently allocated.
  pub ignored_frees: u64,
  /// Bytes currently held by `Process` blocks.
  pub bytes_in_use: usize,
  /// High-water mark of `bytes_in_use`.
  pub peak_bytes_in_use: usize,
}

impl AllocationStats {
  pub(crate) fn record_allocation(
    &mut self,
    size: usize,
  ) {
    self.allocations += 1;
    self.bytes_in_use += size;
    if self.bytes_in_use > self.peak_bytes_in_use {
      self.peak_bytes_in_use = self.bytes_in_use;
    }
  }

  pub(crate) fn record_failure(
    &mut self,
  ) {
    self.failed_allocations += 1;
  }

  pub(crate) fn record_free(
    &mut self,
    size: usize,
  ) {
    self.frees += 1;
    self.bytes_in_use -= size;
  }

  pub(crate) fn record_ignored_free(
    &mut self,
  ) {
    self.ignored_frees += 1;
  }

  /// Returns a one-line human-readable summary.
  pub fn summary(
    &self,
  ) -> String {
    format!(
      "{} allocations ({} failed), {} frees ({} ignored), {} bytes in use, peak {} bytes",
      self.allocations,
      self.failed_allocations,
      self.frees,
      self.ignored_frees,
      self.bytes_in_use,
      self.peak_bytes_in_use,
    )
  }
}

/// Point-in-time view of how the pool is carved up.
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize)]
pub struct Fragmentation {
  pub free_bytes: usize,
  pub used_bytes: usize,
  pub holes: usize,
  pub largest_hole: usize,
}

impl Fragmentation {
  /// External fragmentation in `[0.0, 1.0]`: the share of free memory that
  /// lies outside the largest hole. `0.0` when nothing is free.
  pub fn ratio(
    &self,
  ) -> f64 {
    if self.free_bytes == 0 {
      return 0.0;
    }
    1.0 - self.largest_hole as f64 / self.free_bytes as f64
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_peak_tracking() {
    let mut s = AllocationStats::default();
    s.record_allocation(100);
    s.record_allocation(50);
    s.record_free(100);
    s.record_allocation(20);

    assert_eq!(s.bytes_in_use, 70);
    assert_eq!(s.peak_bytes_in_use, 150);
    assert_eq!(s.allocations, 3);
    assert_eq!(s.frees, 1);
  }

  #[test]
  fn test_summary() {
    let mut s = AllocationStats::default();
    s.record_allocation(8);
    s.record_failure();
    s.record_ignored_free();

    let summary = s.summary();
    assert!(summary.contains("1 allocations (1 failed)"));
    assert!(summary.contains("0 frees (1 ignored)"));
  }

  #[test]
  fn test_fragmentation_ratio() {
    assert_eq!(Fragmentation::default().ratio(), 0.0);

    let single = Fragmentation {
      free_bytes: 80,
      used_bytes: 20,
      holes: 1,
      largest_hole: 80,
    };
    assert_eq!(single.ratio(), 0.0);

    let split = Fragmentation {
      free_bytes: 80,
      used_bytes: 20,
      holes: 2,
      largest_hole: 20,
    };
    assert!((split.ratio() - 0.75).abs() < 1e-9);
  }
}
