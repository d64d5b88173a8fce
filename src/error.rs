//! Error types for the allocator and its workload configuration.

use std::path::PathBuf;

/// Errors returned by [`Allocator`](crate::Allocator) operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocError {
  /// The pool capacity is zero or cannot be represented once aligned.
  #[error("invalid pool capacity: {capacity} bytes")]
  InvalidSize { capacity: usize },

  /// The environment refused to reserve the pool.
  #[error("out of memory: could not reserve a pool of {capacity} bytes")]
  OutOfMemory { capacity: usize },

  /// Zero-byte requests are rejected.
  #[error("cannot allocate zero-sized block")]
  ZeroSized,

  /// No hole is large enough for the request under the active search mode.
  #[error("no suitable block for {requested} bytes")]
  NoSuitableBlock { requested: usize },

  /// Every ledger record is in use by a live block.
  #[error("ledger full: all {capacity} block records are live")]
  LedgerFull { capacity: usize },

  /// The allocator has no pool; call `init` first.
  #[error("allocator is not initialized")]
  NotInitialized,
}

/// A search mode name that matches none of [`SearchMode::ALL`](crate::SearchMode::ALL).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown search mode '{0}'")]
pub struct ParseModeError(pub String);

/// Errors raised while loading or validating a [`Workload`](crate::Workload).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("cannot read workload '{}': {source}", path.display())]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("workload parse error: {0}")]
  Parse(#[from] toml::de::Error),

  #[error("workload serialise error: {0}")]
  Serialize(#[from] toml::ser::Error),

  #[error("invalid workload: {0}")]
  Invalid(String),
}
