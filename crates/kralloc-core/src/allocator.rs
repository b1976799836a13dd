use crate::{
  Block,
  Ternary,
};

/// Capability contract shared by every building block in the workspace.
///
/// Allocators are composed by value: a building block owns (or borrows) its parent and
/// forwards to it. Every method takes `&self`; single-threaded implementations keep their
/// state in cells and are not `Sync`, shareable ones use atomics or sit behind
/// [`Locked`](crate::Locked).
///
/// Running out of memory is never an error. `allocate` answers `None` and the caller is
/// free to try something else.
pub trait Allocator {
  /// Whether [`Allocator::deallocate_all`] actually releases everything. Wrappers use this
  /// to decide between a bulk release and walking their own bookkeeping.
  const DEALLOCATE_ALL: bool = false;

  /// Returns a block of at least `size` bytes, or `None`. A zero-sized request always
  /// yields `None`.
  fn allocate(&self, size: usize) -> Option<Block>;

  /// Returns `block` to the allocator.
  ///
  /// # Safety
  ///
  /// `block` must have been produced by `allocate` (or `allocate_all`) on this same instance,
  /// must not have been released already and must not be accessed after this call.
  unsafe fn deallocate(&self, block: Block) -> bool {
    _ = block;
    false
  }

  /// Range-membership check. Never scans contents.
  fn owns(&self, block: Block) -> Ternary {
    _ = block;
    Ternary::Unknown
  }

  /// The size actually granted for a request of `size` bytes.
  fn good_alloc_size(&self, size: usize) -> usize {
    size
  }

  /// Whether no allocation is currently outstanding.
  fn empty(&self) -> Ternary {
    Ternary::Unknown
  }

  /// Releases every outstanding block at once. Blocks handed out earlier become invalid.
  fn deallocate_all(&self) -> bool {
    false
  }

  /// Grows `block` in place by `delta` bytes.
  ///
  /// # Safety
  ///
  /// Same provenance requirements as [`Allocator::deallocate`].
  unsafe fn expand(&self, block: &mut Block, delta: usize) -> bool {
    _ = block;
    delta == 0
  }

  /// Hands out all remaining memory as one block, if the allocator can.
  fn allocate_all(&self) -> Option<Block> {
    None
  }
}

impl<A> Allocator for &A
where
  A: Allocator,
{
  const DEALLOCATE_ALL: bool = A::DEALLOCATE_ALL;

  fn allocate(&self, size: usize) -> Option<Block> {
    (**self).allocate(size)
  }

  unsafe fn deallocate(&self, block: Block) -> bool {
    unsafe { (**self).deallocate(block) }
  }

  fn owns(&self, block: Block) -> Ternary {
    (**self).owns(block)
  }

  fn good_alloc_size(&self, size: usize) -> usize {
    (**self).good_alloc_size(size)
  }

  fn empty(&self) -> Ternary {
    (**self).empty()
  }

  fn deallocate_all(&self) -> bool {
    (**self).deallocate_all()
  }

  unsafe fn expand(&self, block: &mut Block, delta: usize) -> bool {
    unsafe { (**self).expand(block, delta) }
  }

  fn allocate_all(&self) -> Option<Block> {
    (**self).allocate_all()
  }
}

/// Owns nothing and never hands anything out. Default parent for building blocks that
/// work over borrowed memory.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullAllocator;

impl Allocator for NullAllocator {
  const DEALLOCATE_ALL: bool = true;

  fn allocate(&self, size: usize) -> Option<Block> {
    _ = size;
    None
  }

  fn owns(&self, block: Block) -> Ternary {
    _ = block;
    Ternary::No
  }

  fn empty(&self) -> Ternary {
    Ternary::Yes
  }

  fn deallocate_all(&self) -> bool {
    true
  }
}
