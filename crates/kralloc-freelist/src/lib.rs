#![cfg_attr(not(test), no_std)]

pub mod bounds;
pub mod config;
pub mod shared;
mod tagged;

pub use bounds::Bounds;
pub use shared::SharedFreeList;

#[derive(Debug, PartialEq, Eq)]
pub enum FreeListError {
  /// The bound was fixed at construction or already set at runtime.
  BoundAlreadySet,
  /// `max` below `min`, or a bounded `max` too small to hold a cache node.
  InvalidBounds,
  Unset,
}

pub type FreeListResult<T> = Result<T, FreeListError>;

pub mod prelude {
  pub use super::{
    Bounds,
    FreeListError,
    FreeListResult,
    SharedFreeList,
    config::{
      NODE_SIZE,
      UNBOUNDED,
    },
  };
}
