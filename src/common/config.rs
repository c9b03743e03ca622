//! Configuration constants for pagepool.

/// Size of a page in bytes (4KB).
///
/// Matches the OS page size on most systems, so page-granular I/O maps
/// cleanly onto what the kernel and the storage device already do. The page
/// size is a constant agreed between the buffer pool and the disk manager;
/// the replacement logic never looks inside a page. Together with the u32
/// [`PageId`](crate::common::PageId) this caps a database file at 16TB.
pub const PAGE_SIZE: usize = 4096;
