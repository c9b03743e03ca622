//! Page - the fundamental 4KB unit of storage.
//!
//! A [`Page`] is a raw 4KB byte array, the unit of I/O between disk and
//! memory. The buffer pool stores these inside frames; the pool and the
//! replacement logic treat the contents as opaque.

use crate::common::config::PAGE_SIZE;

/// A page of data (4KB, 4KB-aligned).
///
/// # Memory Layout
/// - Size: 4096 bytes
/// - Alignment: 4096 bytes, so Direct I/O (O_DIRECT) stays an option
///
/// `Page` does NOT implement `Clone` in library code: copying 4KB should be
/// explicit. A `#[cfg(test)]` Clone is provided for tests.
///
/// # Example
/// ```
/// use pagepool::storage::Page;
///
/// let mut page = Page::new();
/// page.as_mut_slice()[0] = 0xFF;
/// assert_eq!(page.as_slice()[0], 0xFF);
/// ```
#[repr(align(4096))]
pub struct Page {
    data: [u8; PAGE_SIZE],
}

impl Page {
    /// Create a new zeroed page.
    #[inline]
    pub fn new() -> Self {
        Self {
            data: [0u8; PAGE_SIZE],
        }
    }

    /// Get immutable slice of page data.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Get mutable slice of page data.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Zero out the entire page.
    pub fn reset(&mut self) {
        self.data.fill(0);
    }

    /// Get the size of a page.
    #[inline]
    pub const fn size() -> usize {
        PAGE_SIZE
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new()
    }
}

// Clone only available in tests - forces explicit copying in library code
#[cfg(test)]
impl Clone for Page {
    fn clone(&self) -> Self {
        let mut new_page = Page::new();
        new_page.data.copy_from_slice(&self.data);
        new_page
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_and_alignment() {
        assert_eq!(std::mem::size_of::<Page>(), PAGE_SIZE);
        assert_eq!(std::mem::align_of::<Page>(), 4096);
    }

    #[test]
    fn test_page_new_is_zeroed() {
        let page = Page::new();
        assert_eq!(page.as_slice()[0], 0);
        assert_eq!(page.as_slice()[4095], 0);
    }

    #[test]
    fn test_page_read_write() {
        let mut page = Page::new();

        page.as_mut_slice()[0] = 0xFF;
        page.as_mut_slice()[100] = 0xAB;
        page.as_mut_slice()[4095] = 0xCD;

        assert_eq!(page.as_slice()[0], 0xFF);
        assert_eq!(page.as_slice()[100], 0xAB);
        assert_eq!(page.as_slice()[4095], 0xCD);
    }

    #[test]
    fn test_page_reset() {
        let mut page = Page::new();
        page.as_mut_slice()[0] = 0xFF;
        page.as_mut_slice()[100] = 0xAB;

        page.reset();

        assert_eq!(page.as_slice()[0], 0);
        assert_eq!(page.as_slice()[100], 0);
    }
}
