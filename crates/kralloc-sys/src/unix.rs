#[cfg(any(target_os = "linux", target_os = "macos"))]
use crate::{
  prim::is_page_aligned,
  system::{
    SysError,
    SysResult,
    System,
  },
};

pub struct UnixSystem {}

#[cfg(any(target_os = "linux", target_os = "macos"))]
pub static UNIX_SYSTEM: UnixSystem = UnixSystem {};

#[cfg(any(target_os = "linux", target_os = "macos"))]
impl UnixSystem {
  const fn prot() -> i32 {
    libc::PROT_READ | libc::PROT_WRITE
  }

  const fn flags() -> i32 {
    libc::MAP_PRIVATE | libc::MAP_ANONYMOUS
  }

  const fn as_c(slice: &[u8]) -> *mut libc::c_void {
    slice.as_ptr() as *mut libc::c_void
  }

  fn check(result: i32) -> SysResult<()> {
    match result {
      0 => Ok(()),
      _ => Err(SysError::InvalidArgument),
    }
  }
}

#[cfg(any(target_os = "linux", target_os = "macos"))]
unsafe impl System for UnixSystem {
  unsafe fn map<'mem>(&self, size: usize) -> SysResult<&'mem mut [u8]> {
    if size == 0 || is_page_aligned(size) != Ok(true) {
      return Err(SysError::InvalidArgument);
    }

    let ptr = unsafe { libc::mmap(core::ptr::null_mut(), size, Self::prot(), Self::flags(), -1, 0) };

    match ptr {
      libc::MAP_FAILED => Err(SysError::OutOfMemory),
      _ => Ok(unsafe { core::slice::from_raw_parts_mut(ptr as *mut u8, size) }),
    }
  }

  unsafe fn unmap(&self, slice: &[u8]) -> SysResult<()> {
    Self::check(unsafe { libc::munmap(Self::as_c(slice), slice.len()) })
  }
}
