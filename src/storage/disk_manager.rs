//! Disk Manager - low-level file I/O for database pages.
//!
//! The [`DiskManager`] handles all direct file operations:
//! - Reading and writing pages
//! - Allocating and deallocating page ids
//! - Managing the database file

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageId, Result};
use crate::storage::Page;

/// Manages disk I/O for a single database file.
///
/// # File Layout
/// Pages are laid out sequentially; page N lives at file offset
/// `N × PAGE_SIZE`:
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┬─────────┐
/// │ Page 0  │ Page 1  │ Page 2  │  ...    │ Page N  │
/// │ (4KB)   │ (4KB)   │ (4KB)   │         │ (4KB)   │
/// └─────────┴─────────┴─────────┴─────────┴─────────┘
/// ```
///
/// # Thread Safety
/// `DiskManager` is single-threaded. The `BufferPoolManager` serializes
/// access to it inside its critical section.
///
/// # Durability
/// All writes are followed by `fsync()`.
///
/// # Id Reuse
/// `deallocate_page` returns a page id to an in-memory free list; the next
/// `allocate_page` hands out a freed id before growing the file. The free
/// list does not survive a restart, which only makes reuse less eager.
pub struct DiskManager {
    file: File,
    /// Number of pages in the file.
    page_count: u32,
    /// Ids released by `deallocate_page`, available for reuse.
    free_ids: Vec<PageId>,
}

impl DiskManager {
    /// Create a new database file.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;

        Ok(Self {
            file,
            page_count: 0,
            free_ids: Vec::new(),
        })
    }

    /// Open an existing database file.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist or cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(&path)?;

        // Page count is derived from the file size
        let metadata = file.metadata()?;
        let page_count = (metadata.len() / PAGE_SIZE as u64) as u32;

        Ok(Self {
            file,
            page_count,
            free_ids: Vec::new(),
        })
    }

    /// Open an existing database file, or create it if it doesn't exist.
    pub fn open_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::open(path)
        } else {
            Self::create(path)
        }
    }

    /// Read a page from disk.
    ///
    /// # Errors
    /// Returns `Error::PageNotFound` if the page was never allocated.
    pub fn read_page(&mut self, page_id: PageId) -> Result<Page> {
        if page_id.0 >= self.page_count {
            return Err(Error::PageNotFound(page_id.0));
        }

        let offset = (page_id.0 as u64) * (PAGE_SIZE as u64);
        self.file.seek(SeekFrom::Start(offset))?;

        let mut page = Page::new();
        self.file.read_exact(page.as_mut_slice())?;

        Ok(page)
    }

    /// Write a page to disk, followed by `fsync()`.
    ///
    /// The page must have been previously allocated with `allocate_page()`.
    ///
    /// # Errors
    /// Returns `Error::PageNotFound` if the page hasn't been allocated.
    pub fn write_page(&mut self, page_id: PageId, page: &Page) -> Result<()> {
        if page_id.0 >= self.page_count {
            return Err(Error::PageNotFound(page_id.0));
        }

        let offset = (page_id.0 as u64) * (PAGE_SIZE as u64);
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(page.as_slice())?;
        self.file.sync_all()?;

        Ok(())
    }

    /// Allocate a page id, reusing a deallocated id when one is available.
    ///
    /// The page's on-disk region is zeroed, extending the file if needed.
    pub fn allocate_page(&mut self) -> Result<PageId> {
        let (page_id, grows_file) = match self.free_ids.pop() {
            Some(reused) => (reused, false),
            None => (PageId::new(self.page_count), true),
        };

        let offset = (page_id.0 as u64) * (PAGE_SIZE as u64);
        self.file.seek(SeekFrom::Start(offset))?;

        let zeros = [0u8; PAGE_SIZE];
        self.file.write_all(&zeros)?;
        self.file.sync_all()?;

        if grows_file {
            self.page_count += 1;
        }
        Ok(page_id)
    }

    /// Release a page id for reuse.
    ///
    /// Fire-and-forget: deallocating an id that was never allocated, or one
    /// that is already free, has no effect.
    pub fn deallocate_page(&mut self, page_id: PageId) {
        if page_id.0 < self.page_count && !self.free_ids.contains(&page_id) {
            self.free_ids.push(page_id);
        }
    }

    /// Get the number of pages in the database file.
    #[inline]
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Get the total size of the database file in bytes.
    #[inline]
    pub fn file_size(&self) -> u64 {
        (self.page_count as u64) * (PAGE_SIZE as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_new_database() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let dm = DiskManager::create(&path).unwrap();
        assert_eq!(dm.page_count(), 0);
        assert_eq!(dm.file_size(), 0);
    }

    #[test]
    fn test_create_existing_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        DiskManager::create(&path).unwrap();
        assert!(DiskManager::create(&path).is_err());
    }

    #[test]
    fn test_open_nonexistent_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nonexistent.db");

        assert!(DiskManager::open(&path).is_err());
    }

    #[test]
    fn test_allocate_and_read_page() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let mut dm = DiskManager::create(&path).unwrap();

        let page_id = dm.allocate_page().unwrap();
        assert_eq!(page_id, PageId::new(0));
        assert_eq!(dm.page_count(), 1);

        // Freshly allocated pages read back as zeros
        let page = dm.read_page(page_id).unwrap();
        assert_eq!(page.as_slice()[0], 0);
        assert_eq!(page.as_slice()[4095], 0);
    }

    #[test]
    fn test_write_and_read_page() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let mut dm = DiskManager::create(&path).unwrap();
        let page_id = dm.allocate_page().unwrap();

        let mut page = Page::new();
        page.as_mut_slice()[0] = 0xAB;
        page.as_mut_slice()[100] = 0xCD;
        page.as_mut_slice()[4095] = 0xEF;

        dm.write_page(page_id, &page).unwrap();

        let read_page = dm.read_page(page_id).unwrap();
        assert_eq!(read_page.as_slice()[0], 0xAB);
        assert_eq!(read_page.as_slice()[100], 0xCD);
        assert_eq!(read_page.as_slice()[4095], 0xEF);
    }

    #[test]
    fn test_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        // Create and write
        {
            let mut dm = DiskManager::create(&path).unwrap();
            let page_id = dm.allocate_page().unwrap();

            let mut page = Page::new();
            page.as_mut_slice()[0] = 0x42;
            dm.write_page(page_id, &page).unwrap();
        }

        // Reopen and verify
        {
            let mut dm = DiskManager::open(&path).unwrap();
            assert_eq!(dm.page_count(), 1);

            let page = dm.read_page(PageId::new(0)).unwrap();
            assert_eq!(page.as_slice()[0], 0x42);
        }
    }

    #[test]
    fn test_deallocate_and_reuse() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let mut dm = DiskManager::create(&path).unwrap();

        let p0 = dm.allocate_page().unwrap();
        let p1 = dm.allocate_page().unwrap();
        assert_eq!(dm.page_count(), 2);

        let mut page = Page::new();
        page.as_mut_slice()[0] = 0x99;
        dm.write_page(p0, &page).unwrap();

        // Freeing p0 makes it the next id handed out, zeroed again
        dm.deallocate_page(p0);
        let reused = dm.allocate_page().unwrap();
        assert_eq!(reused, p0);
        assert_eq!(dm.page_count(), 2);

        let read_back = dm.read_page(reused).unwrap();
        assert_eq!(read_back.as_slice()[0], 0);

        // p1 untouched by the reuse
        assert!(dm.read_page(p1).is_ok());
    }

    #[test]
    fn test_double_deallocate_is_harmless() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let mut dm = DiskManager::create(&path).unwrap();
        let p0 = dm.allocate_page().unwrap();

        dm.deallocate_page(p0);
        dm.deallocate_page(p0);
        dm.deallocate_page(PageId::new(999)); // never allocated

        assert_eq!(dm.allocate_page().unwrap(), p0);
        // The double free must not hand out p0 twice
        assert_eq!(dm.allocate_page().unwrap(), PageId::new(1));
    }

    #[test]
    fn test_multiple_pages() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let mut dm = DiskManager::create(&path).unwrap();

        for i in 0..10 {
            let page_id = dm.allocate_page().unwrap();
            assert_eq!(page_id.0, i);

            let mut page = Page::new();
            page.as_mut_slice()[0] = i as u8;
            dm.write_page(page_id, &page).unwrap();
        }

        assert_eq!(dm.page_count(), 10);
        assert_eq!(dm.file_size(), 10 * PAGE_SIZE as u64);

        for i in 0..10 {
            let page = dm.read_page(PageId::new(i)).unwrap();
            assert_eq!(page.as_slice()[0], i as u8);
        }
    }

    #[test]
    fn test_read_invalid_page() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let mut dm = DiskManager::create(&path).unwrap();
        dm.allocate_page().unwrap(); // Page 0 exists

        assert!(dm.read_page(PageId::new(1)).is_err());
    }

    #[test]
    fn test_write_invalid_page() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        let mut dm = DiskManager::create(&path).unwrap();

        let page = Page::new();
        assert!(dm.write_page(PageId::new(0), &page).is_err());
    }

    #[test]
    fn test_open_or_create() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.db");

        // First call creates
        {
            let mut dm = DiskManager::open_or_create(&path).unwrap();
            assert_eq!(dm.page_count(), 0);
            dm.allocate_page().unwrap();
        }

        // Second call opens existing
        {
            let dm = DiskManager::open_or_create(&path).unwrap();
            assert_eq!(dm.page_count(), 1);
        }
    }
}
