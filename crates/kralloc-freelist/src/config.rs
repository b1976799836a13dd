use kralloc_sys::prim::word_width;

/// `max` value that lets every request of at least `min` bytes through the cache.
pub const UNBOUNDED: usize = usize::MAX;

/// Marks a bound that will be chosen once at runtime.
pub const CHOOSE_AT_RUNTIME: usize = usize::MAX - 1;

/// Bytes a cached block must hold for its link and recorded size.
pub const NODE_SIZE: usize = 2 * word_width();
