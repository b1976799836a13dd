#![cfg_attr(not(test), no_std)]

pub mod math;
pub mod pages;
pub mod prim;
pub mod system;
pub mod unix;

pub use pages::{
  PAGES,
  Pages,
};
pub use system::GLOBAL_SYSTEM;

pub mod prelude {
  pub use super::{
    GLOBAL_SYSTEM,
    PAGES,
    Pages,
    math::{
      align_down,
      align_up,
      is_aligned,
    },
    prim::{
      page_align,
      page_size,
      word_width,
    },
    system::{
      SysError,
      SysResult,
      System,
    },
  };
}
