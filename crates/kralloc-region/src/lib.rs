#![cfg_attr(not(test), no_std)]

pub mod config;
mod node;
pub mod region;
mod sort;

pub use region::{
  FreeBlocks,
  KrRegion,
  RegionStats,
};

#[derive(Debug, PartialEq, Eq)]
pub enum RegionError {
  /// The parent allocator could not provide the buffer.
  Parent,
  TooSmall { size: usize, min: usize },
}

pub type RegionResult<T> = Result<T, RegionError>;

pub mod prelude {
  pub use super::{
    KrRegion,
    RegionError,
    RegionResult,
    RegionStats,
    config::{
      ALIGNMENT,
      UNIT,
    },
  };
}
