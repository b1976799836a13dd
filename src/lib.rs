#![cfg_attr(not(test), no_std)]

//! Composable allocation building blocks.
//!
//! [`KrRegion`] manages one buffer, bumping through it until it runs dry and then keeping an
//! address-ordered free list. [`SharedFreeList`] caches blocks of one size class in front of
//! any parent and can be shared between threads. Both speak the [`Allocator`] contract and
//! stack by value:
//!
//! ```
//! use kralloc::prelude::*;
//!
//! let mut buffer = [0usize; 128];
//! let bytes = unsafe { core::slice::from_raw_parts_mut(buffer.as_mut_ptr().cast::<u8>(), 1024) };
//! let region = Locked::new(KrRegion::new(bytes));
//! let cache = SharedFreeList::new(&region, Bounds::fixed(32, 64)).unwrap();
//!
//! let block = cache.allocate(48).unwrap();
//! assert_eq!(block.len(), 64);
//! unsafe { cache.deallocate(block) };
//! ```

pub use kralloc_core::{
  Allocator,
  Block,
  Locked,
  NullAllocator,
  Ternary,
};
pub use kralloc_freelist::{
  Bounds,
  SharedFreeList,
};
pub use kralloc_region::KrRegion;
pub use kralloc_sys::Pages;

pub mod prelude {
  pub use kralloc_core::prelude::*;
  pub use kralloc_freelist::prelude::*;
  pub use kralloc_region::prelude::*;
  pub use kralloc_sys::prelude::*;
}
