/// Alignment unit, in bytes, of every size tracked by the allocator.
pub const ALIGNMENT: usize = 4;

/// Rounds the given size up to the next multiple of [`ALIGNMENT`].
///
/// The expression must not overflow when rounded; use [`checked_align4`] for
/// sizes that come from untrusted input.
///
/// # Examples
///
/// ```rust
/// use fitalloc::align4;
///
/// assert_eq!(align4!(0), 0);
/// assert_eq!(align4!(1), 4);
/// assert_eq!(align4!(13), 16);
/// assert_eq!(align4!(16), 16);
/// ```
#[macro_export]
macro_rules! align4 {
  ($value:expr) => {
    ($value + $crate::align::ALIGNMENT - 1) & !($crate::align::ALIGNMENT - 1)
  };
}

/// Rounds `size` up to the alignment unit, or `None` if the result does not
/// fit in a `usize`.
pub fn checked_align4(
  size: usize,
) -> Option<usize> {
  size
    .checked_add(ALIGNMENT - 1)
    .map(|value| value & !(ALIGNMENT - 1))
}
