//! Placement strategies.
//!
//! Every mode looks only at holes at least as large as the (already aligned)
//! request and returns the slot index of the chosen hole, or `None`.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{error::ParseModeError, ledger::Ledger};

/// Which hole an allocation request is carved from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchMode {
  /// First hole in address order that fits.
  #[default]
  FirstFit,
  /// Like first-fit, but resumes at the hole the previous successful search
  /// picked and wraps around to the head once.
  NextFit,
  /// Smallest hole that fits; the lowest address wins ties.
  BestFit,
  /// Largest hole; the lowest address wins ties.
  WorstFit,
}

impl SearchMode {
  pub const ALL: [SearchMode; 4] = [
    SearchMode::FirstFit,
    SearchMode::NextFit,
    SearchMode::BestFit,
    SearchMode::WorstFit,
  ];

  pub fn name(
    &self,
  ) -> &'static str {
    match self {
      SearchMode::FirstFit => "first-fit",
      SearchMode::NextFit => "next-fit",
      SearchMode::BestFit => "best-fit",
      SearchMode::WorstFit => "worst-fit",
    }
  }

  /// Picks a hole for `size` bytes. `cursor` is the next-fit resume point
  /// and is only read and updated by [`SearchMode::NextFit`].
  pub(crate) fn select(
    &self,
    ledger: &Ledger,
    size: usize,
    cursor: &mut Option<usize>,
  ) -> Option<usize> {
    match self {
      SearchMode::FirstFit => first_fit(ledger, size),
      SearchMode::NextFit => next_fit(ledger, size, cursor),
      SearchMode::BestFit => best_fit(ledger, size),
      SearchMode::WorstFit => worst_fit(ledger, size),
    }
  }
}

impl fmt::Display for SearchMode {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.pad(self.name())
  }
}

impl FromStr for SearchMode {
  type Err = ParseModeError;

  fn from_str(
    s: &str,
  ) -> Result<Self, Self::Err> {
    SearchMode::ALL
      .into_iter()
      .find(|mode| mode.name().eq_ignore_ascii_case(s.trim()))
      .ok_or_else(|| ParseModeError(s.to_string()))
  }
}

fn fits(
  ledger: &Ledger,
  start: Option<usize>,
  size: usize,
) -> impl Iterator<Item = (usize, usize)> + '_ {
  ledger
    .iter_from(start)
    .filter(move |(_, block)| block.is_hole() && block.size >= size)
    .map(|(index, block)| (index, block.size))
}

fn first_fit(
  ledger: &Ledger,
  size: usize,
) -> Option<usize> {
  fits(ledger, ledger.head(), size)
    .next()
    .map(|(index, _)| index)
}

fn next_fit(
  ledger: &Ledger,
  size: usize,
  cursor: &mut Option<usize>,
) -> Option<usize> {
  // A released cursor slot no longer sits in the list; start over.
  let start = cursor
    .filter(|&index| ledger.is_live(index))
    .or_else(|| ledger.head());

  let found = fits(ledger, start, size)
    .next()
    .map(|(index, _)| index)
    .or_else(|| first_fit(ledger, size));

  if found.is_some() {
    *cursor = found;
  }

  found
}

fn best_fit(
  ledger: &Ledger,
  size: usize,
) -> Option<usize> {
  let mut best: Option<(usize, usize)> = None;

  for (index, hole) in fits(ledger, ledger.head(), size) {
    if best.is_none_or(|(_, smallest)| hole < smallest) {
      best = Some((index, hole));
    }
  }

  best.map(|(index, _)| index)
}

fn worst_fit(
  ledger: &Ledger,
  size: usize,
) -> Option<usize> {
  let mut worst: Option<(usize, usize)> = None;

  for (index, hole) in fits(ledger, ledger.head(), size) {
    if worst.is_none_or(|(_, largest)| hole > largest) {
      worst = Some((index, hole));
    }
  }

  worst.map(|(index, _)| index)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::block::BlockKind;

  /// Builds `[H20][P4][H50][P4][H30][P8][H4]` (sizes in bytes) and returns
  /// the first three hole slots in address order.
  fn fragmented() -> (Ledger, [usize; 3]) {
    let mut ledger = Ledger::with_capacity(16);
    ledger.reset(120);
    let tail = ledger.head().unwrap();

    let mut holes = Vec::new();
    for (hole, process) in [(20, 4), (50, 4), (30, 8)] {
      let h = ledger.split_front(tail, hole).unwrap();
      ledger.get_mut(h).kind = BlockKind::Hole;
      holes.push(h);
      ledger.split_front(tail, process).unwrap();
    }
    assert_eq!(ledger.get(tail).size, 4);

    (ledger, [holes[0], holes[1], holes[2]])
  }

  #[test]
  fn test_from_str() {
    assert_eq!("first-fit".parse::<SearchMode>(), Ok(SearchMode::FirstFit));
    assert_eq!(" Worst-Fit ".parse::<SearchMode>(), Ok(SearchMode::WorstFit));
    assert_eq!(
      "buddy".parse::<SearchMode>(),
      Err(ParseModeError("buddy".to_string()))
    );
    assert_eq!(
      ParseModeError("buddy".to_string()).to_string(),
      "unknown search mode 'buddy'"
    );

    for mode in SearchMode::ALL {
      assert_eq!(mode.to_string().parse::<SearchMode>(), Ok(mode));
    }
  }

  #[test]
  fn test_first_fit_takes_lowest_address() {
    let (ledger, [small, medium, _]) = fragmented();

    assert_eq!(first_fit(&ledger, 8), Some(small));
    assert_eq!(first_fit(&ledger, 24), Some(medium));
    assert_eq!(first_fit(&ledger, 52), None);
  }

  #[test]
  fn test_best_fit_takes_smallest() {
    let (ledger, [_, _, thirty]) = fragmented();

    assert_eq!(best_fit(&ledger, 25), Some(thirty));
  }

  #[test]
  fn test_worst_fit_takes_largest() {
    let (ledger, [_, fifty, _]) = fragmented();

    assert_eq!(worst_fit(&ledger, 25), Some(fifty));
    assert_eq!(worst_fit(&ledger, 4), Some(fifty));
  }

  #[test]
  fn test_ties_go_to_lowest_address() {
    let mut ledger = Ledger::with_capacity(8);
    ledger.reset(24);
    let tail = ledger.head().unwrap();

    let first = ledger.split_front(tail, 8).unwrap();
    ledger.get_mut(first).kind = BlockKind::Hole;
    ledger.split_front(tail, 8).unwrap();
    // Layout: [H8][P8][H8]

    assert_eq!(best_fit(&ledger, 4), Some(first));
    assert_eq!(worst_fit(&ledger, 4), Some(first));
  }

  #[test]
  fn test_next_fit_resumes_and_wraps() {
    let (ledger, [small, medium, thirty]) = fragmented();
    let mut cursor = None;

    assert_eq!(next_fit(&ledger, 8, &mut cursor), Some(small));
    assert_eq!(cursor, Some(small));

    cursor = Some(medium);
    assert_eq!(next_fit(&ledger, 8, &mut cursor), Some(medium));

    cursor = Some(thirty);
    assert_eq!(next_fit(&ledger, 40, &mut cursor), Some(medium));
    assert_eq!(cursor, Some(medium));

    assert_eq!(next_fit(&ledger, 64, &mut cursor), None);
    assert_eq!(cursor, Some(medium));
  }

  #[test]
  fn test_next_fit_ignores_released_cursor() {
    let (ledger, [small, ..]) = fragmented();
    let mut cursor = Some(15);

    assert_eq!(next_fit(&ledger, 8, &mut cursor), Some(small));
  }
}
