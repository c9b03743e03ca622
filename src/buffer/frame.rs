//! Frame - a slot in the buffer pool.
//!
//! A [`Frame`] holds a [`Page`] plus the metadata buffer management needs:
//! which page is loaded (if any), a pin count, and a dirty flag.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::common::PageId;
use crate::storage::Page;

/// A frame in the buffer pool.
///
/// The pool allocates a fixed array of frames at construction and reuses
/// each slot for its entire lifetime; only the contents and metadata change
/// as pages are faulted in and evicted.
///
/// At any time a frame is in exactly one of three states:
/// 1. *Free* - on the pool's free list, no page id, pin count 0.
/// 2. *Pinned-resident* - page id set, pin count ≥ 1, not evictable.
/// 3. *Unpinned-resident* - page id set, pin count 0, tracked by the
///    replacer as an eviction candidate.
///
/// # Thread Safety
/// All fields use interior mutability:
/// - `page`: `RwLock` so readers share and writers exclude
/// - `page_id`: `Mutex` for safe updates
/// - `pin_count`: `AtomicU32` for lock-free reference counting
/// - `is_dirty`: `AtomicBool` for lock-free dirty tracking
pub struct Frame {
    /// The page data, protected by RwLock.
    page: RwLock<Page>,

    /// Which page is currently loaded, or None if the frame is empty.
    page_id: Mutex<Option<PageId>>,

    /// Number of active holders of this frame.
    pin_count: AtomicU32,

    /// Whether the contents have diverged from the durable copy.
    is_dirty: AtomicBool,
}

impl Frame {
    /// Create a new empty frame.
    pub fn new() -> Self {
        Self {
            page: RwLock::new(Page::new()),
            page_id: Mutex::new(None),
            pin_count: AtomicU32::new(0),
            is_dirty: AtomicBool::new(false),
        }
    }

    /// Acquire read lock on the page.
    #[inline]
    pub fn page(&self) -> RwLockReadGuard<'_, Page> {
        self.page.read()
    }

    /// Acquire write lock on the page.
    #[inline]
    pub fn page_mut(&self) -> RwLockWriteGuard<'_, Page> {
        self.page.write()
    }

    /// Get the page id of the loaded page.
    #[inline]
    pub fn page_id(&self) -> Option<PageId> {
        *self.page_id.lock()
    }

    /// Set the page id.
    #[inline]
    pub fn set_page_id(&self, page_id: Option<PageId>) {
        *self.page_id.lock() = page_id;
    }

    /// Increment the pin count. Returns the new pin count.
    #[inline]
    pub fn pin(&self) -> u32 {
        self.pin_count.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Decrement the pin count. Returns the new pin count.
    ///
    /// # Panics
    /// Panics if the pin count is already 0; the pool's residency checks
    /// must reject unbalanced unpins before reaching here.
    #[inline]
    pub fn unpin(&self) -> u32 {
        let old = self.pin_count.fetch_sub(1, Ordering::Relaxed);
        assert!(old > 0, "pin count underflow");
        old - 1
    }

    /// Get the current pin count.
    #[inline]
    pub fn pin_count(&self) -> u32 {
        self.pin_count.load(Ordering::Relaxed)
    }

    /// Check if the frame is currently pinned.
    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.pin_count() > 0
    }

    /// Mark the frame as dirty (modified since the last durable write).
    #[inline]
    pub fn mark_dirty(&self) {
        self.is_dirty.store(true, Ordering::Relaxed);
    }

    /// Clear the dirty flag.
    #[inline]
    pub fn clear_dirty(&self) {
        self.is_dirty.store(false, Ordering::Relaxed);
    }

    /// Check if the frame is dirty.
    #[inline]
    pub fn is_dirty(&self) -> bool {
        self.is_dirty.load(Ordering::Relaxed)
    }

    /// Check if the frame is empty (no page loaded).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.page_id().is_none()
    }

    /// Check if the frame could be evicted (resident and unpinned).
    #[inline]
    pub fn is_evictable(&self) -> bool {
        self.page_id().is_some() && !self.is_pinned()
    }

    /// Reset the frame to the empty state: zeroed buffer, no page id,
    /// pin count 0, not dirty. Called before the slot is reused.
    pub fn reset(&self) {
        self.page_mut().reset();
        self.set_page_id(None);
        self.pin_count.store(0, Ordering::Relaxed);
        self.is_dirty.store(false, Ordering::Relaxed);
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}
