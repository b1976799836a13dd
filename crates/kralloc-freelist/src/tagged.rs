//! Lock-free stack of cached blocks.
//!
//! A cached block carries a [`CacheNode`] in its first [`NODE_SIZE`] bytes. The head is one
//! `AtomicU64` packing the node address with a generation tag that every successful push or
//! pop bumps, so a head that was popped and pushed again in between never compares equal to
//! a stale snapshot.
//!
//! A pop may read the link of a node that another thread popped a moment earlier. The read
//! goes through an atomic and its result is thrown away once the tag check fails, but the
//! memory must still be mapped: draining the stack while pops are in flight needs a parent
//! that does not unmap what it gets back.

use core::{
  ptr::{
    self,
    NonNull,
  },
  sync::atomic::{
    AtomicPtr,
    AtomicU64,
    AtomicUsize,
    Ordering,
  },
};

use crate::config::NODE_SIZE;

#[repr(C)]
struct CacheNode {
  next: AtomicPtr<CacheNode>,
  size: AtomicUsize,
}

const _: () = assert!(core::mem::size_of::<CacheNode>() == NODE_SIZE);

const ADDR_BITS: u32 = if usize::BITS >= 64 { 48 } else { usize::BITS };
const ADDR_MASK: u64 = (1 << ADDR_BITS) - 1;
const TAG_MASK: u64 = u64::MAX >> ADDR_BITS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Head(u64);

impl Head {
  fn pack(node: *mut CacheNode, tag: u64) -> Self {
    let addr = node.expose_provenance() as u64;
    assert!(
      addr & !ADDR_MASK == 0,
      "shared free list: cache node {addr:#x} above the tagged address range"
    );
    Self(addr | ((tag & TAG_MASK) << ADDR_BITS))
  }

  fn node(self) -> *mut CacheNode {
    ptr::with_exposed_provenance_mut((self.0 & ADDR_MASK) as usize)
  }

  fn bumped(self, node: *mut CacheNode) -> Self {
    Self::pack(node, (self.0 >> ADDR_BITS).wrapping_add(1))
  }
}

pub(crate) struct Stack {
  head: AtomicU64,
}

impl Stack {
  pub(crate) const fn new() -> Self {
    Self {
      head: AtomicU64::new(0),
    }
  }

  /// Caches the block at `at`, recording `size` as its length.
  ///
  /// # Safety
  ///
  /// `at` must be aligned to a word, point to at least [`NODE_SIZE`] bytes the caller owns
  /// and hands over to the stack, and stay valid until it is popped or drained.
  pub(crate) unsafe fn push(&self, at: NonNull<u8>, size: usize) {
    debug_assert!(size >= NODE_SIZE);
    let node = at.cast::<CacheNode>().as_ptr();
    unsafe {
      node.write(CacheNode {
        next: AtomicPtr::new(ptr::null_mut()),
        size: AtomicUsize::new(size),
      })
    };

    let mut head = Head(self.head.load(Ordering::Relaxed));
    loop {
      unsafe { (*node).next.store(head.node(), Ordering::Relaxed) };
      match self.head.compare_exchange_weak(
        head.0,
        head.bumped(node).0,
        Ordering::Release,
        Ordering::Relaxed,
      ) {
        Ok(_) => return,
        Err(actual) => head = Head(actual),
      }
    }
  }

  pub(crate) fn pop(&self) -> Option<(NonNull<u8>, usize)> {
    self.pop_if(|_| true)
  }

  /// Pops the head if its recorded length passes `fits`. Leaves the stack alone otherwise.
  pub(crate) fn pop_if(&self, fits: impl Fn(usize) -> bool) -> Option<(NonNull<u8>, usize)> {
    let mut head = Head(self.head.load(Ordering::Acquire));
    loop {
      let node = NonNull::new(head.node())?;
      let (next, size) = unsafe {
        let node = node.as_ref();
        (
          node.next.load(Ordering::Relaxed),
          node.size.load(Ordering::Relaxed),
        )
      };

      if !fits(size) {
        return None;
      }

      match self.head.compare_exchange_weak(
        head.0,
        head.bumped(next).0,
        Ordering::Acquire,
        Ordering::Acquire,
      ) {
        Ok(_) => return Some((node.cast(), size)),
        Err(actual) => head = Head(actual),
      }
    }
  }

  /// Detaches every cached node at once.
  pub(crate) fn drain(&self) -> Drain {
    let mut head = Head(self.head.load(Ordering::Acquire));
    loop {
      match self.head.compare_exchange_weak(
        head.0,
        head.bumped(ptr::null_mut()).0,
        Ordering::Acquire,
        Ordering::Acquire,
      ) {
        Ok(_) => return Drain { next: head.node() },
        Err(actual) => head = Head(actual),
      }
    }
  }

  pub(crate) fn is_empty(&self) -> bool {
    Head(self.head.load(Ordering::Relaxed)).node().is_null()
  }
}

/// Detached chain of cached blocks, yielded as `(start, recorded length)`.
pub(crate) struct Drain {
  next: *mut CacheNode,
}

impl Iterator for Drain {
  type Item = (NonNull<u8>, usize);

  fn next(&mut self) -> Option<Self::Item> {
    let node = NonNull::new(self.next)?;
    // SAFETY: the chain is detached, nobody else reaches these nodes any more.
    let (next, size) = unsafe {
      let node = node.as_ref();
      (
        node.next.load(Ordering::Relaxed),
        node.size.load(Ordering::Relaxed),
      )
    };
    self.next = next;
    Some((node.cast(), size))
  }
}
