//! Block bookkeeping for the pool.
//!
//! The ledger is a fixed table of [`Block`] records. The live records form one
//! doubly linked list, threaded through slot indices, whose order always
//! equals address order:
//!
//! ```text
//!   slots:   0        1        2        3        4
//!          ┌────────┬────────┬────────┬────────┬────────┐
//!          │ H 20.. │ P 0..  │ P 10.. │ vacant │ vacant │
//!          └────────┴────────┴────────┴────────┴────────┘
//!
//!   list:  head ─► [1] P[0..10) ─► [2] P[10..20) ─► [0] H[20..100) ─► end
//! ```
//!
//! Slots released by coalescing go on a vacant stack and are handed out again
//! by the next split, so the table only fills up when that many blocks are
//! live at once.

use std::cell::Cell;

use crate::block::{Block, BlockKind};

pub(crate) struct Ledger {
  records: Vec<Block>,
  vacant: Vec<usize>,
  live: usize,
  head_hint: Cell<usize>,
}

impl Ledger {
  pub fn with_capacity(
    capacity: usize,
  ) -> Self {
    Self {
      records: vec![Block::EMPTY; capacity],
      vacant: (0..capacity).rev().collect(),
      live: 0,
      head_hint: Cell::new(0),
    }
  }

  pub fn capacity(
    &self,
  ) -> usize {
    self.records.len()
  }

  /// Drops every record and installs a single hole spanning `pool_size`
  /// bytes. Returns `false` if the table has no slot for it.
  pub fn reset(
    &mut self,
    pool_size: usize,
  ) -> bool {
    self.clear();

    let Some(slot) = self.vacant.pop() else {
      return false;
    };

    self.records[slot] = Block::new(0, pool_size, BlockKind::Hole);
    self.live = 1;
    self.head_hint.set(slot);

    true
  }

  /// Returns every slot to the vacant state.
  pub fn clear(
    &mut self,
  ) {
    self.records.fill(Block::EMPTY);
    self.vacant.clear();
    self.vacant.extend((0..self.records.len()).rev());
    self.live = 0;
    self.head_hint.set(0);
  }

  pub fn is_live(
    &self,
    index: usize,
  ) -> bool {
    self
      .records
      .get(index)
      .is_some_and(|block| !block.is_vacant())
  }

  pub fn get(
    &self,
    index: usize,
  ) -> &Block {
    &self.records[index]
  }

  pub fn get_mut(
    &mut self,
    index: usize,
  ) -> &mut Block {
    &mut self.records[index]
  }

  /// Slot index of the lowest-addressed block.
  ///
  /// Starts from the head found by the previous lookup and follows `prev`
  /// links from there. If that slot has since been released, any live slot
  /// is as good a starting point, since every live record leads back to the
  /// head.
  pub fn head(
    &self,
  ) -> Option<usize> {
    let mut index = self.head_hint.get();

    if !self.is_live(index) {
      index = self.records.iter().position(|block| !block.is_vacant())?;
    }

    while let Some(prev) = self.records[index].prev {
      index = prev;
    }

    self.head_hint.set(index);

    Some(index)
  }

  /// Walks the list in address order, starting at the head.
  pub fn iter(
    &self,
  ) -> Iter<'_> {
    self.iter_from(self.head())
  }

  /// Walks the list in address order, starting at `start`.
  pub fn iter_from(
    &self,
    start: Option<usize>,
  ) -> Iter<'_> {
    Iter {
      ledger: self,
      cursor: start,
    }
  }

  /// Counts live records by walking from head to tail.
  pub fn len(
    &self,
  ) -> usize {
    let Some(head) = self.head() else {
      return 0;
    };

    if self.records[head].size == 0 {
      return 0;
    }

    let count = self.iter_from(Some(head)).count();
    debug_assert_eq!(count, self.live);

    count
  }

  /// Carves a `Process` block of `size` bytes off the low end of the hole
  /// in slot `hole`, linking it in just before the hole.
  ///
  /// Returns the new block's slot, or `None` if the table is full. The hole
  /// must be strictly larger than `size`.
  pub fn split_front(
    &mut self,
    hole: usize,
    size: usize,
  ) -> Option<usize> {
    debug_assert!(self.records[hole].is_hole());
    debug_assert!(self.records[hole].size > size);

    let slot = self.vacant.pop()?;
    let remainder = self.records[hole];

    let mut block = Block::new(remainder.offset, size, BlockKind::Process);
    block.prev = remainder.prev;
    block.next = Some(hole);

    if let Some(prev) = remainder.prev {
      self.records[prev].next = Some(slot);
    }

    let hole_block = &mut self.records[hole];
    hole_block.prev = Some(slot);
    hole_block.offset += size;
    hole_block.size -= size;

    self.records[slot] = block;
    self.live += 1;

    Some(slot)
  }

  /// Splices the record in slot `index` out of the list and releases the
  /// slot.
  pub fn unlink(
    &mut self,
    index: usize,
  ) {
    let Block { prev, next, .. } = self.records[index];

    if let Some(prev) = prev {
      self.records[prev].next = next;
    }
    if let Some(next) = next {
      self.records[next].prev = prev;
    }

    if self.head_hint.get() == index {
      self.head_hint.set(prev.or(next).unwrap_or(0));
    }

    self.records[index] = Block::EMPTY;
    self.vacant.push(index);
    self.live -= 1;
  }

  /// Slot of the `Process` block starting at `offset`, if any.
  pub fn find_process(
    &self,
    offset: usize,
  ) -> Option<usize> {
    self
      .iter()
      .take_while(|(_, block)| block.offset <= offset)
      .find(|(_, block)| block.offset == offset && block.kind == BlockKind::Process)
      .map(|(index, _)| index)
  }
}

pub(crate) struct Iter<'a> {
  ledger: &'a Ledger,
  cursor: Option<usize>,
}

impl<'a> Iterator for Iter<'a> {
  type Item = (usize, &'a Block);

  fn next(
    &mut self,
  ) -> Option<Self::Item> {
    let index = self.cursor?;
    let block = &self.ledger.records[index];
    self.cursor = block.next;

    Some((index, block))
  }
}
