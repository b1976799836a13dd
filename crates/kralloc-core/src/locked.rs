use spin::{
  Mutex,
  MutexGuard,
};

use crate::{
  Allocator,
  Block,
  Ternary,
};

/// Serializes a single-threaded allocator behind a spin lock so it can act as the parent
/// of a shared building block.
pub struct Locked<A> {
  inner: Mutex<A>,
}

impl<A> Locked<A> {
  pub const fn new(inner: A) -> Self {
    Self {
      inner: Mutex::new(inner),
    }
  }

  pub fn lock(&self) -> MutexGuard<'_, A> {
    self.inner.lock()
  }

  pub fn into_inner(self) -> A {
    self.inner.into_inner()
  }
}

impl<A> Allocator for Locked<A>
where
  A: Allocator,
{
  const DEALLOCATE_ALL: bool = A::DEALLOCATE_ALL;

  fn allocate(&self, size: usize) -> Option<Block> {
    self.lock().allocate(size)
  }

  unsafe fn deallocate(&self, block: Block) -> bool {
    unsafe { self.lock().deallocate(block) }
  }

  fn owns(&self, block: Block) -> Ternary {
    self.lock().owns(block)
  }

  fn good_alloc_size(&self, size: usize) -> usize {
    self.lock().good_alloc_size(size)
  }

  fn empty(&self) -> Ternary {
    self.lock().empty()
  }

  fn deallocate_all(&self) -> bool {
    self.lock().deallocate_all()
  }

  unsafe fn expand(&self, block: &mut Block, delta: usize) -> bool {
    unsafe { self.lock().expand(block, delta) }
  }

  fn allocate_all(&self) -> Option<Block> {
    self.lock().allocate_all()
  }
}
