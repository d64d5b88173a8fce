//! Scripted allocation workload for comparing search modes.
//!
//! One iteration of the script:
//!
//! 1. allocate `allocations` blocks of `allocation_size` bytes, writing a
//!    short greeting into each;
//! 2. free every other block in the upper half;
//! 3. re-allocate those slots with `realloc_size` bytes, writing one byte;
//! 4. free everything.
//!
//! The same script runs against an [`Allocator`] or against the system heap
//! (`malloc`/`free`), so the timings are directly comparable.
//!
//! # TOML Format
//! ```toml
//! capacity = 300000
//! modes = ["first-fit", "best-fit"]
//! system = true
//! testcases = 5
//! iterations = 100
//! allocations = 1000
//! allocation_size = 10
//! realloc_size = 1
//! ```

use std::{
  fmt,
  path::Path,
  time::{Duration, Instant},
};

use libc::{c_void, free, malloc};
use serde::{Deserialize, Serialize};

use crate::{
  Allocator, Handle, SearchMode,
  align::checked_align4,
  allocator::DEFAULT_LEDGER_CAPACITY,
  error::{AllocError, ConfigError},
};

const GREETING: &[u8] = b"Hello\n\0";

/// Workload parameters. Every field has a default, so a TOML file only needs
/// the ones it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Workload {
  /// Pool size handed to `Allocator::init`.
  pub capacity: usize,
  /// Search modes to run the script under.
  pub modes: Vec<SearchMode>,
  /// Whether to also run the script against the system heap.
  pub system: bool,
  /// Number of timed repetitions of the whole measurement.
  pub testcases: usize,
  /// Script iterations summed into one testcase total.
  pub iterations: usize,
  /// Blocks allocated in step 1.
  pub allocations: usize,
  pub allocation_size: usize,
  pub realloc_size: usize,
}

impl Default for Workload {
  fn default() -> Self {
    Self {
      capacity: 300_000,
      modes: SearchMode::ALL.to_vec(),
      system: true,
      testcases: 5,
      iterations: 100,
      allocations: 1000,
      allocation_size: 10,
      realloc_size: 1,
    }
  }
}

/// Where a workload's allocations go.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
  Pool(SearchMode),
  System,
}

impl fmt::Display for Backend {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match self {
      Backend::Pool(mode) => f.pad(mode.name()),
      Backend::System => f.pad("system"),
    }
  }
}

impl Workload {
  pub fn from_file(
    path: &Path,
  ) -> Result<Self, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    Self::from_toml(&content)
  }

  /// Parses and validates a workload from a TOML string.
  pub fn from_toml(
    toml_str: &str,
  ) -> Result<Self, ConfigError> {
    let workload: Workload = toml::from_str(toml_str)?;
    workload.validate()?;
    Ok(workload)
  }

  pub fn to_toml(
    &self,
  ) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(self)?)
  }

  /// Checks that the script can run to completion on a fresh pool.
  pub fn validate(
    &self,
  ) -> Result<(), ConfigError> {
    if self.testcases == 0 || self.iterations == 0 {
      return Err(ConfigError::Invalid(
        "testcases and iterations must be positive".into(),
      ));
    }
    if self.allocations == 0 {
      return Err(ConfigError::Invalid("allocations must be positive".into()));
    }
    if self.allocation_size == 0 || self.realloc_size == 0 {
      return Err(ConfigError::Invalid("allocation sizes must be positive".into()));
    }
    if self.modes.is_empty() && !self.system {
      return Err(ConfigError::Invalid("no backend selected".into()));
    }

    let live_set = checked_align4(self.allocation_size.max(self.realloc_size))
      .and_then(|size| size.checked_mul(self.allocations));

    match live_set {
      Some(bytes) if bytes <= self.capacity => {}
      _ => {
        return Err(ConfigError::Invalid(format!(
          "{} blocks of {} bytes do not fit a {} byte pool",
          self.allocations, self.allocation_size, self.capacity
        )));
      }
    }

    match self.peak_records() {
      Some(records) if records <= DEFAULT_LEDGER_CAPACITY => {}
      _ => {
        return Err(ConfigError::Invalid(format!(
          "{} allocations need more than the ledger's {} records",
          self.allocations, DEFAULT_LEDGER_CAPACITY
        )));
      }
    }

    Ok(())
  }

  /// Upper bound on records live at once: every allocation, the tail hole,
  /// and one more per re-allocation that splits a hole.
  fn peak_records(
    &self,
  ) -> Option<usize> {
    self
      .allocations
      .checked_add(1)?
      .checked_add(self.upper_half().count())
  }

  /// Backends selected by this workload, pool modes first.
  pub fn backends(
    &self,
  ) -> Vec<Backend> {
    let mut backends: Vec<_> = self.modes.iter().copied().map(Backend::Pool).collect();
    if self.system {
      backends.push(Backend::System);
    }
    backends
  }

  /// Runs every testcase against `backend` and returns the per-testcase
  /// totals.
  pub fn run(
    &self,
    backend: Backend,
  ) -> Result<Vec<Duration>, AllocError> {
    let mut allocator = Allocator::new();
    let mut totals = Vec::with_capacity(self.testcases);

    for _ in 0..self.testcases {
      let mut total = Duration::ZERO;
      for _ in 0..self.iterations {
        total += match backend {
          Backend::Pool(mode) => self.run_pool_once(&mut allocator, mode)?,
          Backend::System => self.run_system_once()?,
        };
      }
      totals.push(total);
    }

    Ok(totals)
  }

  /// One script iteration on a freshly initialized pool. Pool setup and
  /// teardown are not timed. The pool is destroyed even when the script
  /// fails.
  pub fn run_pool_once(
    &self,
    allocator: &mut Allocator,
    mode: SearchMode,
  ) -> Result<Duration, AllocError> {
    allocator.init(self.capacity, mode)?;
    let result = self.pool_script(allocator);
    allocator.destroy();
    result
  }

  fn pool_script(
    &self,
    allocator: &mut Allocator,
  ) -> Result<Duration, AllocError> {
    let mut handles: Vec<Option<Handle>> = Vec::with_capacity(self.allocations);

    let start = Instant::now();

    for _ in 0..self.allocations {
      let handle = allocator.try_allocate(self.allocation_size)?;
      if let Some(region) = allocator.get_mut(handle) {
        let len = GREETING.len().min(self.allocation_size);
        region[..len].copy_from_slice(&GREETING[..len]);
      }
      handles.push(Some(handle));
    }

    for i in self.upper_half() {
      allocator.free(handles[i]);
    }

    for i in self.upper_half() {
      let handle = allocator.try_allocate(self.realloc_size)?;
      if let Some(region) = allocator.get_mut(handle) {
        region[0] = b'C';
      }
      handles[i] = Some(handle);
    }

    for handle in handles {
      allocator.free(handle);
    }

    let elapsed = start.elapsed();
    debug_assert_eq!(allocator.block_count(), 1);

    Ok(elapsed)
  }

  /// One script iteration against `malloc`/`free`.
  pub fn run_system_once(
    &self,
  ) -> Result<Duration, AllocError> {
    let mut blocks: Vec<*mut u8> = Vec::with_capacity(self.allocations);

    let start = Instant::now();

    let result = self.system_script(&mut blocks);

    for block in blocks {
      unsafe { free(block as *mut c_void) };
    }

    result.map(|()| start.elapsed())
  }

  fn system_script(
    &self,
    blocks: &mut Vec<*mut u8>,
  ) -> Result<(), AllocError> {
    for _ in 0..self.allocations {
      let block = system_alloc(self.allocation_size)?;
      let len = GREETING.len().min(self.allocation_size);
      unsafe { block.copy_from_nonoverlapping(GREETING.as_ptr(), len) };
      blocks.push(block);
    }

    for i in self.upper_half() {
      unsafe { free(blocks[i] as *mut c_void) };
      blocks[i] = std::ptr::null_mut();
    }

    for i in self.upper_half() {
      let block = system_alloc(self.realloc_size)?;
      unsafe { block.write(b'C') };
      blocks[i] = block;
    }

    Ok(())
  }

  fn upper_half(
    &self,
  ) -> impl Iterator<Item = usize> + use<> {
    (self.allocations / 2..self.allocations).step_by(2)
  }
}

fn system_alloc(
  size: usize,
) -> Result<*mut u8, AllocError> {
  let block = unsafe { malloc(size) } as *mut u8;
  if block.is_null() {
    return Err(AllocError::OutOfMemory { capacity: size });
  }
  Ok(block)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn small() -> Workload {
    Workload {
      capacity: 4096,
      testcases: 2,
      iterations: 3,
      allocations: 64,
      ..Workload::default()
    }
  }

  #[test]
  fn test_default_is_valid() {
    Workload::default().validate().unwrap();
    assert_eq!(Workload::default().backends().len(), 5);
  }

  #[test]
  fn test_from_toml_partial() {
    let workload = Workload::from_toml(
      r#"
        capacity = 12000
        modes = ["best-fit", "next-fit"]
        system = false
      "#,
    )
    .unwrap();

    assert_eq!(workload.capacity, 12000);
    assert_eq!(workload.modes, vec![SearchMode::BestFit, SearchMode::NextFit]);
    assert_eq!(
      workload.backends(),
      vec![
        Backend::Pool(SearchMode::BestFit),
        Backend::Pool(SearchMode::NextFit)
      ]
    );
    assert_eq!(workload.allocation_size, 10);
  }

  #[test]
  fn test_toml_roundtrip() {
    let workload = small();
    let parsed = Workload::from_toml(&workload.to_toml().unwrap()).unwrap();

    assert_eq!(parsed, workload);
  }

  #[test]
  fn test_from_toml_rejects_unknown_mode() {
    let result = Workload::from_toml(r#"modes = ["buddy"]"#);

    assert!(matches!(result, Err(ConfigError::Parse(_))));
  }

  #[test]
  fn test_validate_rejects_oversized_live_set() {
    let workload = Workload {
      capacity: 100,
      allocations: 10,
      allocation_size: 10,
      ..Workload::default()
    };

    assert!(matches!(workload.validate(), Err(ConfigError::Invalid(_))));
  }

  #[test]
  fn test_validate_rejects_empty_counts() {
    for workload in [
      Workload {
        iterations: 0,
        ..Workload::default()
      },
      Workload {
        allocations: 0,
        ..Workload::default()
      },
      Workload {
        modes: Vec::new(),
        system: false,
        ..Workload::default()
      },
    ] {
      assert!(matches!(workload.validate(), Err(ConfigError::Invalid(_))));
    }
  }

  #[test]
  fn test_from_file_missing() {
    let result = Workload::from_file(Path::new("/nonexistent/workload.toml"));

    assert!(matches!(result, Err(ConfigError::Read { .. })));
  }

  #[test]
  fn test_pool_iteration_leaves_allocator_destroyed() {
    let workload = small();
    let mut allocator = Allocator::new();

    for mode in SearchMode::ALL {
      workload.run_pool_once(&mut allocator, mode).unwrap();
      assert!(!allocator.is_initialized());
    }
  }

  #[test]
  fn test_run_every_backend() {
    let workload = small();

    for backend in workload.backends() {
      let totals = workload.run(backend).unwrap();
      assert_eq!(totals.len(), 2, "{backend}");
    }
  }

  #[test]
  fn test_pool_too_small_fails() {
    let workload = Workload {
      capacity: 16,
      ..small()
    };
    let mut allocator = Allocator::new();

    let result = workload.run_pool_once(&mut allocator, SearchMode::FirstFit);
    assert!(matches!(result, Err(AllocError::NoSuitableBlock { .. })));
    assert!(!allocator.is_initialized());
  }

  #[test]
  fn test_validate_counts_realloc_records() {
    // 7999 allocations peak at 7999 + 1 + 2000 records; 8000 would need 10001.
    let largest = Workload {
      testcases: 1,
      iterations: 1,
      allocations: 7999,
      ..Workload::default()
    };
    largest.validate().unwrap();

    for allocations in [8000, 9000] {
      let workload = Workload {
        allocations,
        ..largest.clone()
      };
      assert!(matches!(workload.validate(), Err(ConfigError::Invalid(_))));
    }

    let mut allocator = Allocator::new();
    for mode in SearchMode::ALL {
      largest.run_pool_once(&mut allocator, mode).unwrap();
      assert!(!allocator.is_initialized());
    }
  }

  #[test]
  fn test_ledger_exhaustion_destroys_pool() {
    let workload = small();
    let mut allocator = Allocator::with_ledger_capacity(16);

    let result = workload.run_pool_once(&mut allocator, SearchMode::BestFit);
    assert_eq!(result, Err(AllocError::LedgerFull { capacity: 16 }));
    assert!(!allocator.is_initialized());
  }
}
