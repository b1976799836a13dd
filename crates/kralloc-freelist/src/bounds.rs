//! Size range a [`SharedFreeList`](crate::SharedFreeList) serves from its cache.
//!
//! Each bound lives in its own atomic cell. A bound given at construction is final, a bound
//! left to [`CHOOSE_AT_RUNTIME`] can be set exactly once afterwards. Until both bounds are
//! known every request bypasses the cache.

use core::sync::atomic::{
  AtomicUsize,
  Ordering,
};

use crate::{
  FreeListError,
  FreeListResult,
  config::{
    CHOOSE_AT_RUNTIME,
    NODE_SIZE,
    UNBOUNDED,
  },
};

#[derive(Debug)]
pub struct Bounds {
  min: AtomicUsize,
  max: AtomicUsize,
}

impl Bounds {
  pub const fn fixed(min: usize, max: usize) -> Self {
    Self {
      min: AtomicUsize::new(min),
      max: AtomicUsize::new(max),
    }
  }

  /// A single size class.
  pub const fn exact(size: usize) -> Self {
    Self::fixed(size, size)
  }

  /// Every request of at least one byte. Cached blocks keep their own length.
  pub const fn unbounded() -> Self {
    Self::fixed(0, UNBOUNDED)
  }

  pub const fn runtime() -> Self {
    Self::fixed(CHOOSE_AT_RUNTIME, CHOOSE_AT_RUNTIME)
  }

  pub fn min(&self) -> FreeListResult<usize> {
    Self::read(&self.min)
  }

  pub fn max(&self) -> FreeListResult<usize> {
    Self::read(&self.max)
  }

  pub fn set_min(&self, min: usize) -> FreeListResult<()> {
    if let Ok(max) = self.max() {
      check(min, max)?;
    }
    Self::set_once(&self.min, min)
  }

  pub fn set_max(&self, max: usize) -> FreeListResult<()> {
    match self.min() {
      Ok(min) => check(min, max)?,
      Err(_) => check(0, max)?,
    }
    Self::set_once(&self.max, max)
  }

  /// Both bounds, once they are known.
  #[inline(always)]
  pub(crate) fn get(&self) -> Option<(usize, usize)> {
    Some((self.min().ok()?, self.max().ok()?))
  }

  /// Checks bounds handed over at construction.
  pub(crate) fn validate(&self) -> FreeListResult<()> {
    match (self.min(), self.max()) {
      (Ok(min), Ok(max)) => check(min, max),
      (Err(_), Ok(max)) => check(0, max),
      _ => Ok(()),
    }
  }

  fn read(cell: &AtomicUsize) -> FreeListResult<usize> {
    match cell.load(Ordering::Acquire) {
      CHOOSE_AT_RUNTIME => Err(FreeListError::Unset),
      value => Ok(value),
    }
  }

  fn set_once(cell: &AtomicUsize, value: usize) -> FreeListResult<()> {
    if value == CHOOSE_AT_RUNTIME {
      return Err(FreeListError::InvalidBounds);
    }

    cell
      .compare_exchange(CHOOSE_AT_RUNTIME, value, Ordering::AcqRel, Ordering::Acquire)
      .map(|_| ())
      .map_err(|_| FreeListError::BoundAlreadySet)
  }
}

fn check(min: usize, max: usize) -> FreeListResult<()> {
  if max == UNBOUNDED {
    return Ok(());
  }

  if max < min || max < NODE_SIZE {
    return Err(FreeListError::InvalidBounds);
  }
  Ok(())
}

/// Whether a request of `size` bytes is served by the cache.
#[inline(always)]
pub(crate) fn in_range(min: usize, max: usize, size: usize) -> bool {
  match (min, max) {
    (0, UNBOUNDED) => true,
    (0, max) => size <= max,
    (min, UNBOUNDED) => size >= min,
    (min, max) => min <= size && size <= max,
  }
}

/// Length of the blocks the cache hands out for an in-range `size`.
#[inline(always)]
pub(crate) fn canonical(size: usize, max: usize) -> usize {
  match max {
    UNBOUNDED => size.max(NODE_SIZE),
    max => max,
  }
}
