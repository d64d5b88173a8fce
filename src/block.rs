use std::fmt;

/// Whether a block is free or handed out to a caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlockKind {
  /// Free extent, available to the placement search.
  Hole,
  /// Extent currently owned by a caller.
  Process,
}

impl fmt::Display for BlockKind {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match self {
      BlockKind::Hole => f.write_str("H"),
      BlockKind::Process => f.write_str("P"),
    }
  }
}

/// One ledger record. `prev`/`next` are slot indices in the ledger, not
/// addresses; `None` marks either end of the list.
///
/// A record with `size == 0` is a vacant slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Block {
  pub offset: usize,
  pub size: usize,
  pub kind: BlockKind,
  pub prev: Option<usize>,
  pub next: Option<usize>,
}

impl Block {
  pub const EMPTY: Block = Block {
    offset: 0,
    size: 0,
    kind: BlockKind::Hole,
    prev: None,
    next: None,
  };

  pub fn new(
    offset: usize,
    size: usize,
    kind: BlockKind,
  ) -> Self {
    Self {
      offset,
      size,
      kind,
      prev: None,
      next: None,
    }
  }

  pub fn is_vacant(
    &self,
  ) -> bool {
    self.size == 0
  }

  pub fn is_hole(
    &self,
  ) -> bool {
    self.kind == BlockKind::Hole
  }

  pub fn info(
    &self,
  ) -> BlockInfo {
    BlockInfo {
      offset: self.offset,
      size: self.size,
      kind: self.kind,
    }
  }
}

/// Read-only view of a live block, as yielded by
/// [`Allocator::blocks`](crate::Allocator::blocks).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BlockInfo {
  /// Start of the extent, relative to the pool base.
  pub offset: usize,
  /// Length of the extent in bytes; always a multiple of the alignment unit.
  pub size: usize,
  pub kind: BlockKind,
}

impl BlockInfo {
  pub fn end(
    &self,
  ) -> usize {
    self.offset + self.size
  }

  pub fn is_hole(
    &self,
  ) -> bool {
    self.kind == BlockKind::Hole
  }
}

impl fmt::Display for BlockInfo {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    write!(f, "{}[{}..{})", self.kind, self.offset, self.end())
  }
}
