use core::{
  cell::Cell,
  marker::PhantomData,
  ops::Range,
  ptr::NonNull,
};

use getset::{
  CopyGetters,
  Getters,
};
use kralloc_core::{
  Allocator,
  Block,
  NullAllocator,
  Ternary,
  block,
};
use kralloc_sys::math::{
  align_down,
  align_up,
  is_aligned,
};

use crate::{
  RegionError,
  RegionResult,
  config::{
    ALIGNMENT,
    UNIT,
  },
  node::FreeNode,
  sort,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
  /// Bump allocation off `bump`. Blocks freed meanwhile hang unsorted off `bump.next`.
  Region { bump: Option<FreeNode> },
  /// Address-ordered, circular, coalesced free list.
  FreeList { root: Option<FreeNode> },
}

/// Snapshot of the free memory of a [`KrRegion`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct RegionStats {
  free_bytes: usize,
  free_blocks: usize,
  largest_free: usize,
  /// Nodes visited by free-list insertions since construction.
  probes: usize,
}

/// Region allocator that degrades into a Kernighan-Ritchie free list.
///
/// Starts out bumping through its buffer. Frees are parked unsorted until the bump block
/// runs dry; from then on the region keeps an address-ordered circular free list with
/// first-fit allocation and coalescing on free. The switch is one-way.
///
/// Sizes are granted in whole [`UNIT`]s and no per-block prefix is kept, so callers must
/// hand back the block they got (or one of the same length).
#[derive(Getters)]
pub struct KrRegion<'buf, P = NullAllocator>
where
  P: Allocator,
{
  buffer: Block,
  raw: Block,
  state: Cell<State>,
  probes: Cell<usize>,
  #[getset(get = "pub")]
  parent: P,
  owned: bool,
  _marker: PhantomData<&'buf mut [u8]>,
}

impl<'buf> KrRegion<'buf, NullAllocator> {
  /// Manages `buffer` for as long as the region lives.
  pub fn new(buffer: &'buf mut [u8]) -> Self {
    Self::from_parts(NonNull::from(buffer), NullAllocator, false)
  }
}

impl<P> KrRegion<'static, P>
where
  P: Allocator,
{
  /// Acquires `size` bytes from `parent` and returns them to it on drop.
  pub fn with_parent(parent: P, size: usize) -> RegionResult<Self> {
    if size < UNIT {
      return Err(RegionError::TooSmall { size, min: UNIT });
    }

    let raw = parent.allocate(size).ok_or(RegionError::Parent)?;
    Ok(Self::from_parts(raw, parent, true))
  }
}

impl<'buf, P> KrRegion<'buf, P>
where
  P: Allocator,
{
  fn from_parts(raw: Block, parent: P, owned: bool) -> Self {
    let region = Self {
      buffer: Self::managed(raw),
      raw,
      state: Cell::new(State::Region { bump: None }),
      probes: Cell::new(0),
      parent,
      owned,
      _marker: PhantomData,
    };
    region.reset();
    region
  }

  /// The aligned, unit-trimmed part of `raw` the region actually hands out.
  fn managed(raw: Block) -> Block {
    let start = block::addr(raw);
    let skew = align_up(start, ALIGNMENT).map(|aligned| aligned - start);

    match skew {
      Some(skew) if skew <= raw.len() => {
        let len = align_down(raw.len() - skew, UNIT).unwrap_or(0);
        let at = unsafe { block::start(raw).add(skew) };
        block::from_raw_parts(at, len)
      }
      _ => block::from_raw_parts(block::start(raw), 0),
    }
  }

  fn reset(&self) {
    let whole = match self.capacity() {
      0 => None,
      len => Some(unsafe { FreeNode::write(block::start(self.buffer), len, None) }),
    };

    let state = match self.state.get() {
      State::Region { .. } => State::Region { bump: whole },
      State::FreeList { .. } => {
        if let Some(node) = whole {
          node.set_next(Some(node));
        }
        State::FreeList { root: whole }
      }
    };
    self.state.set(state);
  }

  fn root(&self) -> Option<FreeNode> {
    match self.state.get() {
      State::Region { bump } => bump,
      State::FreeList { root } => root,
    }
  }

  pub fn capacity(&self) -> usize {
    self.buffer.len()
  }

  pub fn is_region_mode(&self) -> bool {
    matches!(self.state.get(), State::Region { .. })
  }

  /// Leaves region mode for good: sorts the parked frees by address and coalesces them
  /// into a circular free list. Does nothing when already switched.
  pub fn switch_to_free_list(&self) {
    let State::Region { bump } = self.state.get() else {
      return;
    };

    let root = sort::sort(bump).map(|head| {
      let mut node = head;
      loop {
        match node.next() {
          Some(next) if node.adjacent(next) => {
            node.coalesce();
          }
          Some(next) => node = next,
          None => {
            node.set_next(Some(head));
            break head;
          }
        }
      }
    });

    self.state.set(State::FreeList { root });
    log::debug!(
      "kr region {:#x}: switched to free list ({} free bytes)",
      block::addr(self.buffer),
      self.stats().free_bytes
    );
    self.sanity();
  }

  fn bump(&self, bump: FreeNode, actual: usize) -> Option<Block> {
    let parked = bump.next();
    let (front, remainder) = bump.carve(actual)?;
    match remainder {
      Some(rest) => self.state.set(State::Region { bump: Some(rest) }),
      None => {
        self.state.set(State::Region { bump: parked });
        self.switch_to_free_list();
      }
    }
    Some(front)
  }

  /// First fit over the circular list, looking at the successor of each node so the
  /// predecessor is at hand for unlinking.
  fn first_fit(&self, root: Option<FreeNode>, actual: usize) -> Option<Block> {
    let root = root?;
    let mut prev = root;
    loop {
      let node = prev.next()?;
      let next = node.next();

      if let Some((front, remainder)) = node.carve(actual) {
        let alone = node == prev;
        let successor = match remainder {
          Some(rest) if alone => {
            rest.set_next(Some(rest));
            Some(rest)
          }
          Some(rest) => Some(rest),
          None if alone => None,
          None => next,
        };

        if !alone {
          prev.set_next(successor);
        }
        if node == root {
          self.state.set(State::FreeList { root: successor });
        }
        return Some(front);
      }

      prev = node;
      if prev == root {
        log::trace!(
          "kr region {:#x}: no free block of {actual} bytes",
          block::addr(self.buffer)
        );
        return None;
      }
    }
  }

  /// Writes a free node of `size` bytes at `at` and links it in address order, merging
  /// with whichever neighbours touch it.
  fn insert(&self, root: Option<FreeNode>, at: NonNull<u8>, size: usize) {
    // SAFETY (all writes below): `at..at + size` is a block this region handed out.
    let Some(root) = root else {
      let node = unsafe { FreeNode::write(at, size, None) };
      node.set_next(Some(node));
      self.state.set(State::FreeList { root: Some(node) });
      return;
    };

    let addr = at.as_ptr() as usize;
    let mut prev = root;
    loop {
      self.probes.set(self.probes.get() + 1);
      let Some(next) = prev.next() else {
        unreachable!("free list is circular");
      };
      assert!(
        prev.addr() != addr && next.addr() != addr,
        "kr region: double free"
      );

      let placed = if prev < next {
        prev.addr() < addr && addr < next.addr()
      } else {
        prev.addr() < addr || addr < next.addr()
      };

      if placed {
        assert!(
          addr < prev.addr() || prev.end() <= addr,
          "kr region: double free of a block merged into {:#x}",
          prev.addr()
        );
        assert!(
          next.addr() < addr || addr + size <= next.addr(),
          "kr region: double free overlapping {:#x}",
          next.addr()
        );

        let node = unsafe { FreeNode::write(at, size, Some(next)) };
        prev.set_next(Some(node));
        node.coalesce();

        // In front of the lowest node (or of the only node) the new node becomes the root,
        // since it may have just absorbed that node. Everything else roots at the predecessor
        // so that runs of neighbouring frees stay O(1).
        let new_root = if prev >= next && node < next { node } else { prev };
        if new_root == prev {
          prev.coalesce();
        }
        self.state.set(State::FreeList {
          root: Some(new_root),
        });
        return;
      }

      prev = next;
      if prev == root {
        panic!("kr region: block cannot be placed in the free list");
      }
    }
  }

  /// Free blocks as address ranges, in list order.
  pub fn free_blocks(&self) -> FreeBlocks<'_> {
    let first = self.root();
    FreeBlocks {
      next: first,
      first,
      limit: self.capacity() / UNIT + 1,
      _marker: PhantomData,
    }
  }

  pub fn stats(&self) -> RegionStats {
    let mut stats = self
      .free_blocks()
      .fold(RegionStats::default(), |mut stats, range| {
        let len = range.end - range.start;
        stats.free_bytes += len;
        stats.free_blocks += 1;
        stats.largest_free = stats.largest_free.max(len);
        stats
      });
    stats.probes = self.probes.get();
    stats
  }

  /// Checks every structural invariant and panics on the first violation.
  pub fn assert_valid(&self) {
    let lo = block::addr(self.buffer);
    let hi = lo + self.capacity();
    let limit = self.capacity() / UNIT + 1;

    let (first, circular) = match self.state.get() {
      State::Region { bump } => (bump, false),
      State::FreeList { root } => (root, true),
    };

    let Some(first) = first else {
      return;
    };

    let mut node = first;
    let mut total = 0usize;
    let mut descents = 0usize;
    for _ in 0..limit {
      assert!(node.addr() >= lo && node.end() <= hi, "kr region: node outside buffer");
      assert_eq!(is_aligned(node.addr(), ALIGNMENT), Some(true));
      assert!(node.size() >= UNIT && node.size() % UNIT == 0, "kr region: bad node size");
      total += node.size();
      assert!(total <= self.capacity(), "kr region: more free bytes than capacity");

      let Some(next) = node.next() else {
        assert!(!circular, "kr region: free list is not circular");
        return;
      };

      if circular {
        if next <= node {
          descents += 1;
        } else {
          assert!(!node.adjacent(next), "kr region: free list not coalesced");
          assert!(node.end() < next.addr(), "kr region: free blocks overlap");
        }
        if next == first {
          assert!(descents == 1, "kr region: free list not address ordered");
          return;
        }
      }
      node = next;
    }

    panic!("kr region: free list does not terminate");
  }

  #[inline(always)]
  fn sanity(&self) {
    #[cfg(feature = "sanity")]
    self.assert_valid();
  }
}

impl<'buf, P> Allocator for KrRegion<'buf, P>
where
  P: Allocator,
{
  const DEALLOCATE_ALL: bool = true;

  fn allocate(&self, size: usize) -> Option<Block> {
    if size == 0 {
      return None;
    }

    let actual = self.good_alloc_size(size);
    let result = match self.state.get() {
      State::Region { bump: Some(bump) } if bump.size() >= actual => self.bump(bump, actual),
      State::Region { .. } => {
        self.switch_to_free_list();
        self.first_fit(self.root(), actual)
      }
      State::FreeList { root } => self.first_fit(root, actual),
    };

    self.sanity();
    result
  }

  unsafe fn deallocate(&self, block: Block) -> bool {
    if block.len() == 0 {
      return false;
    }

    assert!(
      self.owns(block).is_yes(),
      "kr region: block does not belong to this region"
    );
    debug_assert_eq!(is_aligned(block::addr(block), ALIGNMENT), Some(true));

    let size = self.good_alloc_size(block.len());
    let at = block::start(block);
    debug_assert!(block::addr(block) + size <= block::end(self.buffer));

    // SAFETY: the block came from this region, so it is in bounds, aligned and unit sized.
    match self.state.get() {
      State::Region { bump: Some(bump) } => {
        let node = unsafe { FreeNode::write(at, size, bump.next()) };
        bump.set_next(Some(node));
      }
      State::Region { bump: None } => {
        let node = unsafe { FreeNode::write(at, size, None) };
        self.state.set(State::Region { bump: Some(node) });
      }
      State::FreeList { root } => self.insert(root, at, size),
    }

    self.sanity();
    true
  }

  fn owns(&self, block: Block) -> Ternary {
    block::starts_within(self.buffer, block).into()
  }

  fn good_alloc_size(&self, size: usize) -> usize {
    align_up(size.max(UNIT), UNIT).unwrap_or(usize::MAX)
  }

  fn empty(&self) -> Ternary {
    (self.stats().free_bytes == self.capacity()).into()
  }

  /// Forgets every outstanding block and makes the whole buffer one free block again.
  fn deallocate_all(&self) -> bool {
    self.reset();
    log::debug!(
      "kr region {:#x}: reset to {} free bytes",
      block::addr(self.buffer),
      self.capacity()
    );
    true
  }

  /// The whole buffer, provided nothing is allocated from it.
  fn allocate_all(&self) -> Option<Block> {
    self.switch_to_free_list();
    match self.state.get() {
      State::FreeList { root: Some(root) }
        if root.next() == Some(root) && root.size() == self.capacity() =>
      {
        self.allocate(root.size())
      }
      _ => None,
    }
  }
}

impl<'buf, P> Drop for KrRegion<'buf, P>
where
  P: Allocator,
{
  fn drop(&mut self) {
    if self.owned && !unsafe { self.parent.deallocate(self.raw) } {
      log::debug!(
        "kr region {:#x}: parent refused the buffer back",
        block::addr(self.raw)
      );
    }
  }
}

unsafe impl<'buf, P> Send for KrRegion<'buf, P> where P: Allocator + Send {}

/// Iterator over the free blocks of a [`KrRegion`], see [`KrRegion::free_blocks`].
pub struct FreeBlocks<'region> {
  next: Option<FreeNode>,
  first: Option<FreeNode>,
  limit: usize,
  _marker: PhantomData<&'region ()>,
}

impl Iterator for FreeBlocks<'_> {
  type Item = Range<usize>;

  fn next(&mut self) -> Option<Self::Item> {
    let node = self.next?;
    if self.limit == 0 {
      return None;
    }
    self.limit -= 1;

    self.next = node.next().filter(|next| Some(*next) != self.first);
    Some(node.addr()..node.end())
  }
}
