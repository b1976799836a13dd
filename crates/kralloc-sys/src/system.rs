#[cfg(any(target_os = "linux", target_os = "macos"))]
use crate::unix::UNIX_SYSTEM;

#[derive(Debug, PartialEq)]
pub enum SysError {
  Unsupported,
  OutOfMemory,
  InvalidArgument,
}

pub type SysResult<T> = Result<T, SysError>;

/// Source of page-granular memory underneath every parent chain.
///
/// # Safety
///
/// Implementors must ensure that:
/// - `map` returns readable, writable, page-aligned memory of exactly the requested length
/// - `unmap` only releases memory previously returned by `map` on this system
pub unsafe trait System
where
  Self: Send + Sync,
{
  /// Maps `size` bytes of fresh memory.
  ///
  /// # Safety
  ///
  /// `size` must be page-aligned and non-zero.
  unsafe fn map<'mem>(&self, size: usize) -> SysResult<&'mem mut [u8]> {
    _ = size;
    Err(SysError::Unsupported)
  }

  /// Unmaps memory.
  ///
  /// # Safety
  ///
  /// `slice` must come from `map` and must not be accessed afterwards.
  unsafe fn unmap(&self, slice: &[u8]) -> SysResult<()> {
    _ = slice;
    Err(SysError::Unsupported)
  }
}

pub struct UnsupportedSystem {}
unsafe impl System for UnsupportedSystem {}

#[cfg(any(target_os = "linux", target_os = "macos"))]
pub static GLOBAL_SYSTEM: &dyn System = &UNIX_SYSTEM;

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
pub static GLOBAL_SYSTEM: &dyn System = &UnsupportedSystem {};
