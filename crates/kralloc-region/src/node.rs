//! Free-list headers living inside the memory they describe.
//!
//! A [`FreeNode`] is a handle to a free block whose first two words hold `{ next, size }`.
//! Handles are only ever created by [`FreeNode::write`], whose caller vouches that the
//! range is inside the region buffer, unit aligned and currently unused. Every other method
//! relies on that and on the region not handing the block out while the handle is live.

use core::ptr::NonNull;

use kralloc_core::{
  Block,
  block,
};

use crate::config::{
  ALIGNMENT,
  UNIT,
};

#[repr(C)]
struct Header {
  next: Option<FreeNode>,
  size: usize,
}

const _: () = assert!(core::mem::size_of::<Header>() == UNIT);
const _: () = assert!(core::mem::align_of::<Header>() == ALIGNMENT);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct FreeNode(NonNull<Header>);

impl FreeNode {
  /// Writes a header of `size` bytes at `at`.
  ///
  /// # Safety
  ///
  /// `at..at + size` must lie in the region buffer, be aligned to [`ALIGNMENT`], hold at
  /// least one [`UNIT`] and not be handed out to anybody.
  pub(crate) unsafe fn write(at: NonNull<u8>, size: usize, next: Option<FreeNode>) -> Self {
    debug_assert!(size >= UNIT && size % UNIT == 0);
    debug_assert!(at.as_ptr() as usize % ALIGNMENT == 0);

    let header = at.cast::<Header>();
    unsafe { header.as_ptr().write(Header { next, size }) };
    Self(header)
  }

  #[inline(always)]
  fn header(&self) -> &Header {
    unsafe { self.0.as_ref() }
  }

  #[inline(always)]
  pub(crate) fn addr(self) -> usize {
    self.0.as_ptr() as usize
  }

  #[inline(always)]
  pub(crate) fn size(self) -> usize {
    self.header().size
  }

  #[inline(always)]
  pub(crate) fn end(self) -> usize {
    self.addr() + self.size()
  }

  #[inline(always)]
  pub(crate) fn next(self) -> Option<FreeNode> {
    self.header().next
  }

  #[inline(always)]
  pub(crate) fn set_next(self, next: Option<FreeNode>) {
    unsafe { (*self.0.as_ptr()).next = next };
  }

  /// The first `len` bytes of this block, handed to a caller.
  pub(crate) fn block(self, len: usize) -> Block {
    debug_assert!(len <= self.size());
    block::from_raw_parts(self.0.cast::<u8>(), len)
  }

  /// No gap between the end of `self` and the start of `other`.
  #[inline(always)]
  pub(crate) fn adjacent(self, other: FreeNode) -> bool {
    self.end() == other.addr()
  }

  /// Absorbs the list successor when it starts exactly where `self` ends.
  pub(crate) fn coalesce(self) -> bool {
    let Some(next) = self.next() else {
      return false;
    };

    if next == self || !self.adjacent(next) {
      return false;
    }

    let merged = self.size() + next.size();
    let after = next.next();
    unsafe {
      let header = self.0.as_ptr();
      (*header).size = merged;
      (*header).next = after;
    }
    true
  }

  /// Splits `bytes` off the front of the block. Returns the handed-out front and, when the
  /// tail can carry a header, the free remainder linked to `self.next()`.
  ///
  /// When nothing worth keeping is left, the whole block is handed out.
  pub(crate) fn carve(self, bytes: usize) -> Option<(Block, Option<FreeNode>)> {
    let size = self.size();
    if size < bytes {
      return None;
    }

    let leftover = size - bytes;
    if leftover < UNIT {
      return Some((self.block(size), None));
    }

    let next = self.next();
    let tail = unsafe { self.0.cast::<u8>().add(bytes) };
    // SAFETY: the tail lies inside this free block and stays unit aligned.
    let remainder = unsafe { FreeNode::write(tail, leftover, next) };
    Some((self.block(bytes), Some(remainder)))
  }
}
