use core::sync::atomic::{
  AtomicUsize,
  Ordering,
};

use crate::math::{
  align_up,
  is_aligned,
};

#[derive(Debug, PartialEq)]
pub enum PrimError {
  InvalidAlignment,
  Overflow,
}

pub type PrimResult<T> = Result<T, PrimError>;

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
const COMMON_PAGE_SIZE: usize = 4096;

pub const fn word_width() -> usize {
  core::mem::size_of::<usize>()
}

#[cfg(any(target_os = "linux", target_os = "macos"))]
fn query_page_size() -> usize {
  unsafe { libc::sysconf(libc::_SC_PAGESIZE) as usize }
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn query_page_size() -> usize {
  COMMON_PAGE_SIZE
}

pub fn page_size() -> usize {
  static PAGE_SIZE: AtomicUsize = AtomicUsize::new(0);

  match PAGE_SIZE.load(Ordering::Relaxed) {
    0 => {
      let size = query_page_size();
      PAGE_SIZE.store(size, Ordering::Relaxed);
      size
    }
    size => size,
  }
}

pub fn page_align(value: usize) -> PrimResult<usize> {
  align_up(value, page_size()).ok_or(PrimError::Overflow)
}

pub fn is_page_aligned(value: usize) -> PrimResult<bool> {
  is_aligned(value, page_size()).ok_or(PrimError::InvalidAlignment)
}
