use core::sync::atomic::{
  AtomicUsize,
  Ordering,
};

use getset::{
  CopyGetters,
  Getters,
};
use kralloc_core::{
  Allocator,
  Block,
  Ternary,
  block,
};

use crate::{
  FreeListResult,
  bounds::{
    self,
    Bounds,
  },
  config::{
    NODE_SIZE,
    UNBOUNDED,
  },
  tagged::Stack,
};

/// Lock-free cache of equally sized blocks in front of a parent allocator.
///
/// Requests inside [`Bounds`] are served from a stack of previously freed blocks, all of
/// length `max`, and fall through to the parent when the stack is empty. Everything else
/// goes straight to the parent. Allocation and deallocation are CAS loops on a tagged head,
/// so the cache is `Sync` whenever the parent is.
///
/// With an [`UNBOUNDED`] `max` cached blocks keep the length they were freed with and a pop
/// only succeeds if the head is large enough.
///
/// On 64-bit targets the head keeps 48 address bits, so caching a block mapped above that
/// range panics.
#[derive(Getters, CopyGetters)]
pub struct SharedFreeList<P>
where
  P: Allocator,
{
  #[getset(get = "pub")]
  parent: P,
  #[getset(get = "pub")]
  bounds: Bounds,
  #[getset(get_copy = "pub")]
  max_nodes: usize,
  nodes: AtomicUsize,
  live: AtomicUsize,
  stack: Stack,
}

impl<P> SharedFreeList<P>
where
  P: Allocator,
{
  pub fn new(parent: P, bounds: Bounds) -> FreeListResult<Self> {
    bounds.validate()?;
    Ok(Self {
      parent,
      bounds,
      max_nodes: usize::MAX,
      nodes: AtomicUsize::new(0),
      live: AtomicUsize::new(0),
      stack: Stack::new(),
    })
  }

  /// Caps the number of cached blocks. The count is approximate under contention; frees
  /// beyond it go to the parent.
  pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
    self.max_nodes = max_nodes;
    self
  }

  pub fn min(&self) -> FreeListResult<usize> {
    self.bounds.min()
  }

  pub fn max(&self) -> FreeListResult<usize> {
    self.bounds.max()
  }

  /// Sets a runtime `min`.
  ///
  /// # Panics
  ///
  /// If `min` is already set or does not fit `max`. See [`SharedFreeList::try_set_min`].
  pub fn set_min(&self, min: usize) {
    if let Err(err) = self.try_set_min(min) {
      panic!("shared free list: cannot set min to {min}: {err:?}");
    }
  }

  /// Sets a runtime `max`.
  ///
  /// # Panics
  ///
  /// If `max` is already set or does not fit `min`. See [`SharedFreeList::try_set_max`].
  pub fn set_max(&self, max: usize) {
    if let Err(err) = self.try_set_max(max) {
      panic!("shared free list: cannot set max to {max}: {err:?}");
    }
  }

  pub fn try_set_min(&self, min: usize) -> FreeListResult<()> {
    self.bounds.set_min(min)
  }

  pub fn try_set_max(&self, max: usize) -> FreeListResult<()> {
    self.bounds.set_max(max)
  }

  /// Whether a request of `size` bytes is served by the cache. Always false until both
  /// bounds are known.
  pub fn in_range(&self, size: usize) -> bool {
    self
      .bounds
      .get()
      .is_some_and(|(min, max)| bounds::in_range(min, max, size))
  }

  /// Approximate number of cached blocks.
  pub fn cached(&self) -> usize {
    self.nodes.load(Ordering::Relaxed)
  }

  /// Returns every cached block to the parent. The cache keeps working afterwards.
  pub fn minimize(&self) -> usize {
    let mut released = 0;
    for (at, size) in self.stack.drain() {
      // SAFETY: cached blocks came from the parent with this length.
      if !unsafe { self.parent.deallocate(block::from_raw_parts(at, size)) } {
        log::debug!(
          "shared free list: parent refused {size} bytes at {:#x}",
          at.as_ptr() as usize
        );
      }
      released += 1;
    }

    if released > 0 {
      self.nodes.fetch_sub(released, Ordering::Relaxed);
      log::debug!("shared free list: released {released} cached blocks to the parent");
    }
    released
  }

  fn pop(&self, size: usize, max: usize) -> Option<Block> {
    let (at, len) = match max {
      UNBOUNDED => self.stack.pop_if(|len| len >= size)?,
      _ => self.stack.pop()?,
    };
    self.nodes.fetch_sub(1, Ordering::Relaxed);
    Some(block::from_raw_parts(at, len))
  }

  fn refill(&self, size: usize, max: usize) -> Option<Block> {
    let canonical = bounds::canonical(size, max);
    log::trace!("shared free list: cache miss, {canonical} bytes from the parent");

    let fresh = self.parent.allocate(canonical)?;
    debug_assert!(fresh.len() >= canonical);
    debug_assert_eq!(block::addr(fresh) % core::mem::align_of::<usize>(), 0);
    Some(block::from_raw_parts(block::start(fresh), canonical))
  }

  /// Out-of-range request. A grant whose length would look in range is trimmed back to the
  /// request so its length still routes it to the parent on deallocation.
  fn forward(&self, size: usize) -> Option<Block> {
    log::trace!("shared free list: {size} bytes out of range, forwarding to the parent");
    let granted = self.parent.allocate(size)?;
    if self.in_range(granted.len()) {
      return Some(block::from_raw_parts(block::start(granted), size));
    }
    Some(granted)
  }

  fn reserve_slot(&self) -> bool {
    if self.nodes.fetch_add(1, Ordering::Relaxed) < self.max_nodes {
      return true;
    }
    self.nodes.fetch_sub(1, Ordering::Relaxed);
    false
  }
}

impl<P> Allocator for SharedFreeList<P>
where
  P: Allocator,
{
  fn allocate(&self, size: usize) -> Option<Block> {
    if size == 0 {
      return None;
    }

    let result = match self.bounds.get() {
      Some((min, max)) if bounds::in_range(min, max, size) => {
        self.pop(size, max).or_else(|| self.refill(size, max))
      }
      _ => self.forward(size),
    };

    if result.is_some() {
      self.live.fetch_add(1, Ordering::Relaxed);
    }
    result
  }

  unsafe fn deallocate(&self, block: Block) -> bool {
    if block.len() == 0 {
      return false;
    }

    let previous = self.live.fetch_sub(1, Ordering::Relaxed);
    debug_assert!(previous > 0, "shared free list: more frees than allocations");

    match self.bounds.get() {
      Some((min, max)) if bounds::in_range(min, max, block.len()) && self.reserve_slot() => {
        let size = bounds::canonical(block.len(), max);
        debug_assert!(size >= NODE_SIZE);
        // SAFETY: the block is in range, so it holds `size` bytes handed out by this cache.
        unsafe { self.stack.push(block::start(block), size) };
        true
      }
      _ => unsafe { self.parent.deallocate(block) },
    }
  }

  fn owns(&self, block: Block) -> Ternary {
    self.parent.owns(block)
  }

  fn good_alloc_size(&self, size: usize) -> usize {
    match self.bounds.get() {
      Some((min, max)) if bounds::in_range(min, max, size) => {
        return bounds::canonical(size, max);
      }
      _ => {}
    }

    match self.parent.good_alloc_size(size) {
      granted if self.in_range(granted) => size,
      granted => granted,
    }
  }

  fn empty(&self) -> Ternary {
    (self.live.load(Ordering::Relaxed) == 0).into()
  }

  /// With a bulk-releasing parent everything goes back at once. Otherwise only the cached
  /// blocks are released and the call succeeds iff nothing handed out is still live.
  fn deallocate_all(&self) -> bool {
    if P::DEALLOCATE_ALL {
      let forgotten = self.stack.drain().count();
      self.nodes.fetch_sub(forgotten, Ordering::Relaxed);
      self.live.store(0, Ordering::Relaxed);
      log::debug!("shared free list: bulk release through the parent");
      return self.parent.deallocate_all();
    }

    self.minimize();
    self.live.load(Ordering::Relaxed) == 0
  }
}

impl<P> Drop for SharedFreeList<P>
where
  P: Allocator,
{
  fn drop(&mut self) {
    if !self.stack.is_empty() {
      self.minimize();
    }
  }
}
