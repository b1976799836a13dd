use core::{
  ptr::NonNull,
  sync::atomic::{
    AtomicUsize,
    Ordering,
  },
};

use kralloc_core::{
  Allocator,
  Block,
  Ternary,
  block,
};

use crate::{
  GLOBAL_SYSTEM,
  prim::page_align,
};

/// Hands out whole pages straight from the system. Has no internal structure; it exists so
/// the building blocks can own their buffers.
pub struct Pages {
  live: AtomicUsize,
}

pub static PAGES: Pages = Pages::new();

impl Pages {
  pub const fn new() -> Self {
    Self {
      live: AtomicUsize::new(0),
    }
  }

  pub fn live(&self) -> usize {
    self.live.load(Ordering::Relaxed)
  }
}

impl Default for Pages {
  fn default() -> Self {
    Self::new()
  }
}

impl Allocator for Pages {
  fn allocate(&self, size: usize) -> Option<Block> {
    if size == 0 {
      return None;
    }

    let len = page_align(size).ok()?;
    let slice = match unsafe { GLOBAL_SYSTEM.map(len) } {
      Ok(slice) => slice,
      Err(err) => {
        log::debug!("pages: mapping {len} bytes failed: {err:?}");
        return None;
      }
    };

    self.live.fetch_add(1, Ordering::Relaxed);
    Some(NonNull::from(slice))
  }

  unsafe fn deallocate(&self, block: Block) -> bool {
    let Ok(len) = page_align(block.len()) else {
      return false;
    };

    let slice = unsafe { core::slice::from_raw_parts(block::start(block).as_ptr(), len) };
    match unsafe { GLOBAL_SYSTEM.unmap(slice) } {
      Ok(()) => {
        self.live.fetch_sub(1, Ordering::Relaxed);
        true
      }
      Err(_) => false,
    }
  }

  fn good_alloc_size(&self, size: usize) -> usize {
    page_align(size).unwrap_or(size)
  }

  fn empty(&self) -> Ternary {
    (self.live() == 0).into()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::prim::page_size;

  #[test]
  #[cfg(any(target_os = "linux", target_os = "macos"))]
  fn pages_round_to_page_size() {
    let pages = Pages::new();
    let block = pages.allocate(10).unwrap();
    assert_eq!(block.len(), page_size());
    assert_eq!(block::addr(block) % page_size(), 0);
    assert_eq!(pages.good_alloc_size(10), page_size());
    assert_eq!(pages.empty(), Ternary::No);

    unsafe {
      block::start(block).as_ptr().write_bytes(0xAB, block.len());
      assert!(pages.deallocate(block));
    }
    assert_eq!(pages.empty(), Ternary::Yes);
  }

  #[test]
  fn pages_refuse_zero() {
    let pages = Pages::new();
    assert!(pages.allocate(0).is_none());
    assert_eq!(pages.owns(NonNull::from(&mut [0u8; 4][..])), Ternary::Unknown);
  }
}
