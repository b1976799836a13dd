use kralloc_sys::prim::word_width;

/// Alignment of every block the region hands out.
pub const ALIGNMENT: usize = word_width();

/// Allocation granule: one free-list header, two machine words. Sizes are rounded to whole
/// units so a split never leaves a remainder too small to carry a header.
pub const UNIT: usize = 2 * word_width();
