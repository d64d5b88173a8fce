//! # fitalloc - A Pool Allocator with Pluggable Placement
//!
//! This crate manages one contiguous memory pool and serves allocation and
//! release requests from it using one of four classical placement
//! strategies. It exists to compare those strategies under identical
//! workloads.
//!
//! ## Overview
//!
//! The pool is always partitioned into adjacent **holes** (free) and
//! **process** blocks (allocated):
//!
//! ```text
//!   Pool Partition:
//!
//!   offset 0                                                      capacity
//!   ┌──────────┬──────┬──────────────┬───────────────────────────────────┐
//!   │ Process  │ Hole │   Process    │               Hole                │
//!   └──────────┴──────┴──────────────┴───────────────────────────────────┘
//!
//!   No gaps, no overlaps, and never two holes side by side.
//! ```
//!
//! Blocks are tracked in a fixed table of records linked in address order
//! by slot index, so splitting and merging are O(1) splices.
//!
//! ## Crate Structure
//!
//! ```text
//!   fitalloc
//!   ├── align      - 4-byte alignment (align4!, checked_align4)
//!   ├── allocator  - Allocator: init / allocate / free / destroy
//!   ├── block      - Block records and read-only BlockInfo views
//!   ├── error      - AllocError, ConfigError
//!   ├── ledger     - Record table + address-ordered list (internal)
//!   ├── pool       - libc-backed byte region (internal)
//!   ├── search     - SearchMode: first / next / best / worst fit
//!   ├── stats      - AllocationStats, Fragmentation
//!   └── workload   - Scripted benchmark workload (TOML-configurable)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use fitalloc::{Allocator, SearchMode};
//!
//! let mut allocator = Allocator::new();
//! allocator.init(100, SearchMode::FirstFit).unwrap();
//!
//! // 10 bytes are rounded up to 12.
//! let handle = allocator.allocate(10).unwrap();
//! assert_eq!(allocator.get(handle).unwrap().len(), 12);
//! assert_eq!(allocator.block_count(), 2); // Process(12) + Hole(88)
//!
//! allocator.free(Some(handle));
//! assert_eq!(allocator.block_count(), 1);
//!
//! allocator.destroy();
//! ```
//!
//! ## How Allocation Works
//!
//! The active [`SearchMode`] picks a hole. If it fits exactly it simply
//! becomes a process block; otherwise a new record takes the low end of the
//! hole and the hole keeps the rest:
//!
//! ```text
//!   allocate(12):
//!
//!   before   ┌────────────────────────── Hole 100 ──────────────────────────┐
//!   after    ┌─ Process 12 ─┬─────────────────── Hole 88 ───────────────────┐
//! ```
//!
//! Freeing turns the block back into a hole and merges it with a free
//! neighbour on either side.
//!
//! ## Limitations
//!
//! - **Single-threaded only**: No synchronization primitives
//! - **Fixed size**: The pool never grows after `init`
//! - **Fixed alignment**: Every block is a multiple of 4 bytes
//! - **Trusted callers**: Freeing an unknown handle is silently ignored

pub mod align;
mod allocator;
mod block;
mod error;
mod ledger;
mod pool;
mod search;
mod stats;
pub mod workload;

pub use allocator::{Allocator, DEFAULT_LEDGER_CAPACITY, Handle};
pub use block::{BlockInfo, BlockKind};
pub use error::{AllocError, ConfigError, ParseModeError};
pub use search::SearchMode;
pub use stats::{AllocationStats, Fragmentation};
pub use workload::{Backend, Workload};
