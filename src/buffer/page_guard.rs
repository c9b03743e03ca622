//! RAII guards for page access.
//!
//! A guard is the caller-facing page handle: it holds both the pin and the
//! frame's content lock, so the frame cannot be reused underneath the caller
//! and a stale handle cannot alias a recycled slot. Dropping the guard
//! unpins the page; a write guard additionally marks it dirty, which per the
//! write-through discipline also persists the contents at unpin time.

use std::ops::{Deref, DerefMut};

use parking_lot::{RwLockReadGuard, RwLockWriteGuard};

use crate::common::{FrameId, PageId};
use crate::storage::Page;

use super::buffer_pool_manager::BufferPoolManager;

/// Guard for read-only page access.
///
/// Multiple read guards can exist for the same page simultaneously.
///
/// # Example
/// ```ignore
/// let guard = bpm.fetch_page_read(page_id)?;
/// let data = guard.as_slice();
/// // guard drops here, page unpinned
/// ```
pub struct PageReadGuard<'a> {
    /// Reference back to the pool for unpin on drop.
    bpm: &'a BufferPoolManager,
    /// Frame holding this page.
    frame_id: FrameId,
    /// Page id for convenience.
    page_id: PageId,
    /// Content lock; `None` once the guard has been released.
    lock: Option<RwLockReadGuard<'a, Page>>,
}

impl<'a> PageReadGuard<'a> {
    pub(crate) fn new(
        bpm: &'a BufferPoolManager,
        frame_id: FrameId,
        page_id: PageId,
        lock: RwLockReadGuard<'a, Page>,
    ) -> Self {
        Self {
            bpm,
            frame_id,
            page_id,
            lock: Some(lock),
        }
    }

    /// Get the page id.
    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Get the frame id.
    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    /// Release the guard early: content lock and pin both go. Calling this
    /// a second time has no effect.
    pub fn drop_guard(&mut self) {
        if let Some(lock) = self.lock.take() {
            drop(lock);
            self.bpm.unpin_frame(self.frame_id, false);
        }
    }

    /// Release the content lock but keep the pin, returning the page id.
    ///
    /// The caller takes over the pin and must balance it with an explicit
    /// [`BufferPoolManager::unpin_page`].
    pub fn forget(mut self) -> PageId {
        if let Some(lock) = self.lock.take() {
            drop(lock);
        }
        self.page_id
    }
}

impl Deref for PageReadGuard<'_> {
    type Target = Page;

    #[inline]
    fn deref(&self) -> &Page {
        match &self.lock {
            Some(lock) => lock,
            None => panic!("page guard used after drop_guard"),
        }
    }
}

impl Drop for PageReadGuard<'_> {
    fn drop(&mut self) {
        self.drop_guard();
    }
}

/// Guard for exclusive write access to a page.
///
/// Only one write guard can exist for a page at a time. Dropping it marks
/// the page dirty and unpins it; the unpin writes the contents through to
/// durable storage.
///
/// # Example
/// ```ignore
/// let mut guard = bpm.fetch_page_write(page_id)?;
/// guard.as_mut_slice()[0] = 0xFF;
/// // guard drops here: dirty, written through, unpinned
/// ```
pub struct PageWriteGuard<'a> {
    /// Reference back to the pool for unpin on drop.
    bpm: &'a BufferPoolManager,
    /// Frame holding this page.
    frame_id: FrameId,
    /// Page id for convenience.
    page_id: PageId,
    /// Content lock; `None` once the guard has been released.
    lock: Option<RwLockWriteGuard<'a, Page>>,
}

impl<'a> PageWriteGuard<'a> {
    pub(crate) fn new(
        bpm: &'a BufferPoolManager,
        frame_id: FrameId,
        page_id: PageId,
        lock: RwLockWriteGuard<'a, Page>,
    ) -> Self {
        Self {
            bpm,
            frame_id,
            page_id,
            lock: Some(lock),
        }
    }

    /// Get the page id.
    #[inline]
    pub fn page_id(&self) -> PageId {
        self.page_id
    }

    /// Get the frame id.
    #[inline]
    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    /// Release the guard early, marking the page dirty and writing it
    /// through. Calling this a second time has no effect.
    ///
    /// The content lock must be released before the unpin so the
    /// write-through can take its own read lock on the frame.
    pub fn drop_guard(&mut self) {
        if let Some(lock) = self.lock.take() {
            drop(lock);
            self.bpm.unpin_frame(self.frame_id, true);
        }
    }

    /// Release the content lock but keep the pin, returning the page id.
    ///
    /// The caller takes over the pin and must balance it with an explicit
    /// [`BufferPoolManager::unpin_page`]; whether the page gets marked dirty
    /// is then the caller's choice.
    pub fn forget(mut self) -> PageId {
        if let Some(lock) = self.lock.take() {
            drop(lock);
        }
        self.page_id
    }
}

impl Deref for PageWriteGuard<'_> {
    type Target = Page;

    #[inline]
    fn deref(&self) -> &Page {
        match &self.lock {
            Some(lock) => lock,
            None => panic!("page guard used after drop_guard"),
        }
    }
}

impl DerefMut for PageWriteGuard<'_> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Page {
        match &mut self.lock {
            Some(lock) => lock,
            None => panic!("page guard used after drop_guard"),
        }
    }
}

impl Drop for PageWriteGuard<'_> {
    fn drop(&mut self) {
        self.drop_guard();
    }
}
