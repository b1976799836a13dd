use core::ptr::NonNull;

/// An untyped byte range handed out by an allocator.
pub type Block = NonNull<[u8]>;

#[inline(always)]
pub fn from_raw_parts(ptr: NonNull<u8>, len: usize) -> Block {
  NonNull::slice_from_raw_parts(ptr, len)
}

#[inline(always)]
pub fn start(block: Block) -> NonNull<u8> {
  block.cast::<u8>()
}

#[inline(always)]
pub fn addr(block: Block) -> usize {
  block.cast::<u8>().as_ptr() as usize
}

#[inline(always)]
pub fn end(block: Block) -> usize {
  addr(block) + block.len()
}

/// Whether the first byte of `inner` falls inside `outer`.
#[inline(always)]
pub fn starts_within(outer: Block, inner: Block) -> bool {
  let at = addr(inner);
  at >= addr(outer) && at < end(outer)
}

pub fn from_slice(slice: &mut [u8]) -> Block {
  NonNull::from(slice)
}
