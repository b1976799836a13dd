#![cfg_attr(not(test), no_std)]

pub mod allocator;
pub mod block;
pub mod locked;
pub mod ternary;

pub use allocator::{
  Allocator,
  NullAllocator,
};
pub use block::Block;
pub use locked::Locked;
pub use ternary::Ternary;

pub mod prelude {
  pub use super::{
    Allocator,
    Block,
    Locked,
    NullAllocator,
    Ternary,
    block,
  };
}
